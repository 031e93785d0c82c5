//! Artifact lookup across canonical and legacy locations

use crate::error::StorageResult;
use crate::object::{content_type_for, ObjectStore};
use procdoc_artifact::ArtifactLocations;
use std::sync::Arc;

/// An artifact found at one of its candidate locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    /// Path the content was read from
    pub path: String,
    /// Whether `path` is the canonical write location
    pub canonical: bool,
    /// Stored bytes
    pub bytes: Vec<u8>,
}

/// Reads and writes artifacts through an [`ObjectStore`]
///
/// Reads try candidates in priority order (versioned, mode, legacy) and
/// stop at the first hit; writes always go to the canonical location.
#[derive(Clone)]
pub struct ArtifactLocator {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for ArtifactLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactLocator").finish_non_exhaustive()
    }
}

impl ArtifactLocator {
    /// Create locator over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// First candidate path that exists
    ///
    /// # Errors
    /// Backend failure during a lookup
    pub async fn locate(&self, locations: &ArtifactLocations) -> StorageResult<Option<String>> {
        for candidate in locations.candidates() {
            if self.store.exists(candidate).await? {
                tracing::debug!(path = candidate, key = %locations.key, "artifact located");
                return Ok(Some(candidate.to_string()));
            }
        }
        Ok(None)
    }

    /// Content of the first candidate that exists
    ///
    /// # Errors
    /// Backend failure during a lookup
    pub async fn read(&self, locations: &ArtifactLocations) -> StorageResult<Option<LocatedArtifact>> {
        let canonical = locations.write_path();
        for candidate in locations.candidates() {
            if let Some(bytes) = self.store.download(candidate).await? {
                if candidate != canonical {
                    tracing::debug!(path = candidate, canonical, "artifact served from fallback location");
                }
                return Ok(Some(LocatedArtifact {
                    path: candidate.to_string(),
                    canonical: candidate == canonical,
                    bytes,
                }));
            }
        }
        Ok(None)
    }

    /// Write `bytes` to the canonical location, replacing any previous content
    ///
    /// # Errors
    /// Backend failure
    pub async fn write(&self, locations: &ArtifactLocations, bytes: Vec<u8>) -> StorageResult<String> {
        let path = locations.write_path();
        self.store
            .upload(path, bytes, content_type_for(path), true)
            .await?;
        tracing::info!(path, "artifact written");
        Ok(path.to_string())
    }
}
