//! Subcommand implementations
//!
//! Each command returns its stdout text; `main` prints it.

use crate::config::ProcdocConfig;
use anyhow::{anyhow, bail, Context};
use clap::ArgMatches;
use procdoc_artifact::{
    ArtifactRequest, ContentHash, ContentHasher, GenerationMode, NamingScheme, Provider,
};
use procdoc_migration::{
    ExecutionOptions, MigrationExecutor, MigrationPlan, MigrationPlanner, ProcessMap,
};
use procdoc_storage::{LocalObjectStore, ObjectStore};
use procdoc_version::{FileVersion, SqliteMetadataStore, Upload, VersionStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run the selected subcommand under the configured timeout
///
/// # Errors
/// Any command failure, or the timeout elapsing
pub async fn run(matches: &ArgMatches, config: &ProcdocConfig) -> anyhow::Result<String> {
    let timeout = config.timeout();
    tokio::time::timeout(timeout, dispatch(matches, config))
        .await
        .map_err(|_| anyhow!("command timed out after {}s", timeout.as_secs()))?
}

async fn dispatch(matches: &ArgMatches, config: &ProcdocConfig) -> anyhow::Result<String> {
    match matches.subcommand() {
        Some(("hash", args)) => hash(required::<PathBuf>(args, "file")?).await,
        Some(("paths", args)) => paths(args, config).await,
        Some(("upload", args)) => upload(args, config).await,
        Some(("versions", args)) => versions(required::<String>(args, "name")?, config).await,
        Some(("set-current", args)) => {
            set_current(
                required::<String>(args, "name")?,
                required::<String>(args, "hash")?,
                config,
            )
            .await
        }
        Some(("plan-migration", args)) => {
            let plan = plan(required::<PathBuf>(args, "process-map")?, config).await?;
            if args.get_flag("json") {
                Ok(plan.to_json()?)
            } else {
                Ok(render_plan(&plan))
            }
        }
        Some(("migrate", args)) => {
            let options = if args.get_flag("destructive") {
                ExecutionOptions::destructive()
            } else {
                ExecutionOptions::copy_only()
            };
            migrate(required::<PathBuf>(args, "process-map")?, options, config).await
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    }
}

fn required<'a, T>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .ok_or_else(|| anyhow!("missing argument '{id}'"))
}

async fn version_store(config: &ProcdocConfig) -> anyhow::Result<VersionStore> {
    let metadata = SqliteMetadataStore::connect(&config.database_url, config.timeout())
        .await
        .with_context(|| format!("failed to open version database {}", config.database_url))?;
    Ok(VersionStore::new(Arc::new(metadata)))
}

fn object_store(config: &ProcdocConfig) -> Arc<dyn ObjectStore> {
    Arc::new(LocalObjectStore::new(&config.storage_root))
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

async fn hash(file: &Path) -> anyhow::Result<String> {
    let content = read_text(file).await?;
    Ok(ContentHasher::hash(&content).to_hex())
}

#[derive(Serialize)]
struct PathsOutput<'a> {
    key: &'a str,
    write_path: &'a str,
    mode_path: &'a str,
    legacy_path: &'a str,
    versioned_path: Option<&'a str>,
    candidates: Vec<&'a str>,
}

async fn paths(args: &ArgMatches, config: &ProcdocConfig) -> anyhow::Result<String> {
    let file = required::<String>(args, "file")?;
    let element = required::<String>(args, "element")?;
    let kind = required::<String>(args, "kind")?;

    let mut request = match kind.as_str() {
        "node-test" => ArtifactRequest::node_test(file, element),
        "feature-goal-doc" => {
            let scheme = args
                .get_one::<String>("parent")
                .map_or(NamingScheme::Flat, |p| NamingScheme::hierarchical(p.clone()));
            ArtifactRequest::feature_goal(file, element, scheme)
        }
        _ => ArtifactRequest::node_doc(file, element),
    };

    // Unrecognized values resolve to the legacy location
    if let Some(mode) = args.get_one::<String>("mode").and_then(|m| GenerationMode::parse(m)) {
        request = request.with_mode(mode);
    }
    if let Some(provider) = args.get_one::<String>("provider").and_then(|p| Provider::parse(p)) {
        request = request.with_provider(provider);
    }

    if args.get_flag("current-version") {
        let store = version_store(config).await?;
        let current = store
            .current_version(file)
            .await?
            .ok_or_else(|| anyhow!("no current version recorded for {file}"))?;
        request = request.with_version(current.handle());
    }

    let locations = request.locations();
    to_json(&PathsOutput {
        key: &locations.key,
        write_path: locations.write_path(),
        mode_path: &locations.paths.mode_path,
        legacy_path: &locations.paths.legacy_path,
        versioned_path: locations.versioned_path.as_deref(),
        candidates: locations.candidates(),
    })
}

#[derive(Serialize)]
struct VersionSummary<'a> {
    file_name: &'a str,
    version_number: u32,
    content_hash: ContentHash,
    uploaded_at: String,
    uploaded_by: Option<&'a str>,
    is_current: bool,
    change_summary: Option<&'a str>,
}

impl<'a> From<&'a FileVersion> for VersionSummary<'a> {
    fn from(v: &'a FileVersion) -> Self {
        Self {
            file_name: &v.file_name,
            version_number: v.version_number,
            content_hash: v.content_hash,
            uploaded_at: v.uploaded_at.to_rfc3339(),
            uploaded_by: v.uploaded_by.as_deref(),
            is_current: v.is_current,
            change_summary: v.change_summary.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    is_new: bool,
    #[serde(flatten)]
    version: VersionSummary<'a>,
}

async fn upload(args: &ArgMatches, config: &ProcdocConfig) -> anyhow::Result<String> {
    let path = required::<PathBuf>(args, "file")?;
    let content = read_text(path).await?;

    let name = match args.get_one::<String>("name") {
        Some(name) => name.clone(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("cannot derive a file name from {}", path.display()))?,
    };

    let mut upload = Upload::new(name, content);
    if let Some(raw) = args.get_one::<String>("metadata") {
        let metadata: serde_json::Value =
            serde_json::from_str(raw).context("--metadata is not valid JSON")?;
        if !metadata.is_object() {
            bail!("--metadata must be a JSON object");
        }
        upload = upload.with_metadata(metadata);
    }
    if let Some(by) = args.get_one::<String>("by") {
        upload = upload.uploaded_by(by.clone());
    }
    if let Some(summary) = args.get_one::<String>("summary") {
        upload = upload.with_change_summary(summary.clone());
    }

    let store = version_store(config).await?;
    let (version, is_new) = store.create_or_get_version(upload).await?;
    to_json(&UploadOutput {
        is_new,
        version: VersionSummary::from(&version),
    })
}

async fn versions(name: &str, config: &ProcdocConfig) -> anyhow::Result<String> {
    let store = version_store(config).await?;
    let all = store.all_versions(name).await?;
    let summaries: Vec<VersionSummary<'_>> = all.iter().map(VersionSummary::from).collect();
    to_json(&summaries)
}

async fn set_current(name: &str, hash: &str, config: &ProcdocConfig) -> anyhow::Result<String> {
    let hash = hash
        .parse::<ContentHash>()
        .with_context(|| format!("'{hash}' is not a content hash"))?;
    let store = version_store(config).await?;
    let current = store
        .set_version_as_current(name, &hash)
        .await?
        .ok_or_else(|| anyhow!("no version of {name} has hash {hash}"))?;
    to_json(&VersionSummary::from(&current))
}

async fn plan(process_map: &Path, config: &ProcdocConfig) -> anyhow::Result<MigrationPlan> {
    let map = ProcessMap::load(process_map).await?;
    let plan = MigrationPlanner::new(object_store(config))
        .plan(&map)
        .await
        .context("failed to plan migration")?;
    Ok(plan)
}

fn render_plan(plan: &MigrationPlan) -> String {
    let mut lines = Vec::with_capacity(plan.candidates.len() + 1);
    for candidate in &plan.candidates {
        match (candidate.target(), candidate.block_reason()) {
            (Some(target), _) => lines.push(format!("migrate  {} -> {target}", candidate.source)),
            (None, Some(reason)) => lines.push(format!("blocked  {} ({reason})", candidate.source)),
            (None, None) => {}
        }
    }
    let s = plan.summary();
    lines.push(format!(
        "{} candidates: {} migratable, {} no match, {} target exists, {} ambiguous, {} duplicate target; {} already canonical",
        s.total,
        s.migratable,
        s.no_match,
        s.target_exists,
        s.ambiguous,
        s.duplicate_target,
        s.already_canonical
    ));
    lines.join("\n")
}

async fn migrate(
    process_map: &Path,
    options: ExecutionOptions,
    config: &ProcdocConfig,
) -> anyhow::Result<String> {
    let plan = plan(process_map, config).await?;
    let report = MigrationExecutor::new(object_store(config))
        .with_options(options)
        .execute(&plan)
        .await;
    to_json(&report)
}
