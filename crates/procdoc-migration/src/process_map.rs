//! Parent → subprocess structure of a BPMN project
//!
//! ```yaml
//! files:
//!   mortgage-se-application.bpmn:
//!     - element_id: household
//!       called_file: mortgage-se-household.bpmn
//! ```

use crate::error::{MigrationError, MigrationResult};
use procdoc_artifact::{base_name, sanitize_element_id};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A call activity inside a parent file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallActivity {
    /// Element id in the parent file
    pub element_id: String,
    /// File the call activity invokes
    pub called_file: String,
    /// Display name, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One `(parent, element, subprocess)` relation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubprocessLink {
    pub parent_file: String,
    pub element_id: String,
    pub subprocess_file: String,
}

impl SubprocessLink {
    /// Base names a flat artifact for this link may carry:
    /// `base(subprocess)` and `base(subprocess)-{element}`
    #[must_use]
    pub fn legacy_names(&self) -> [String; 2] {
        let sub = base_name(&self.subprocess_file);
        [
            sub.to_string(),
            format!("{sub}-{}", sanitize_element_id(&self.element_id)),
        ]
    }

    /// Whether `file_base` is one of [`Self::legacy_names`]
    #[must_use]
    pub fn matches_legacy_name(&self, file_base: &str) -> bool {
        self.legacy_names().iter().any(|n| n == file_base)
    }
}

/// Call activities per parent file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMap {
    #[serde(default)]
    files: BTreeMap<String, Vec<CallActivity>>,
}

impl ProcessMap {
    /// Start building a map in code
    #[must_use]
    pub fn builder() -> ProcessMapBuilder {
        ProcessMapBuilder::default()
    }

    /// Parse JSON
    ///
    /// # Errors
    /// Malformed JSON or empty identifiers
    pub fn from_json_str(s: &str) -> MigrationResult<Self> {
        let map: Self = serde_json::from_str(s)?;
        map.validated()
    }

    /// Parse YAML
    ///
    /// # Errors
    /// Malformed YAML or empty identifiers
    pub fn from_yaml_str(s: &str) -> MigrationResult<Self> {
        let map: Self = serde_yaml::from_str(s)?;
        map.validated()
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Read failure, unknown extension, or invalid content
    pub async fn load(path: impl AsRef<Path>) -> MigrationResult<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| MigrationError::ProcessMapIo {
                path: path.to_path_buf(),
                source,
            })?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let map = match ext.as_deref() {
            Some("json") => Self::from_json_str(&text)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            _ => return Err(MigrationError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::debug!(path = %path.display(), files = map.files.len(), "loaded process map");
        Ok(map)
    }

    fn validated(self) -> MigrationResult<Self> {
        for (parent, calls) in &self.files {
            if parent.trim().is_empty() {
                return Err(MigrationError::InvalidProcessMap("empty parent file name".into()));
            }
            if let Some(call) = calls
                .iter()
                .find(|c| c.element_id.trim().is_empty() || c.called_file.trim().is_empty())
            {
                return Err(MigrationError::InvalidProcessMap(format!(
                    "call activity in {parent} has an empty element id or called file: {call:?}"
                )));
            }
        }
        Ok(self)
    }

    /// Parent files, sorted
    pub fn parent_files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Call activities of `parent_file`
    #[must_use]
    pub fn call_activities(&self, parent_file: &str) -> &[CallActivity] {
        self.files.get(parent_file).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every distinct relation, sorted
    #[must_use]
    pub fn links(&self) -> BTreeSet<SubprocessLink> {
        self.files
            .iter()
            .flat_map(|(parent, calls)| {
                calls.iter().map(move |call| SubprocessLink {
                    parent_file: parent.clone(),
                    element_id: call.element_id.clone(),
                    subprocess_file: call.called_file.clone(),
                })
            })
            .collect()
    }

    /// Links whose subprocess a flat artifact named `file_base` could belong to
    #[must_use]
    pub fn links_for_legacy_name(&self, file_base: &str) -> Vec<SubprocessLink> {
        self.links()
            .into_iter()
            .filter(|link| link.matches_legacy_name(file_base))
            .collect()
    }

    /// Number of call activities
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Whether the map has no call activities
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`ProcessMap`]
#[derive(Debug, Default)]
pub struct ProcessMapBuilder {
    files: BTreeMap<String, Vec<CallActivity>>,
}

impl ProcessMapBuilder {
    /// Declare a parent file, even without call activities
    #[must_use]
    pub fn file(mut self, parent_file: impl Into<String>) -> Self {
        self.files.entry(parent_file.into()).or_default();
        self
    }

    /// Add a call activity of `parent_file` invoking `called_file`
    #[must_use]
    pub fn call(
        mut self,
        parent_file: impl Into<String>,
        element_id: impl Into<String>,
        called_file: impl Into<String>,
    ) -> Self {
        let call = CallActivity {
            element_id: element_id.into(),
            called_file: called_file.into(),
            name: None,
        };
        let calls = self.files.entry(parent_file.into()).or_default();
        if !calls.contains(&call) {
            calls.push(call);
        }
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> ProcessMap {
        ProcessMap { files: self.files }
    }
}
