//! Pre-launch checks and classification.

use std::path::PathBuf;

use launchpad_core::app_kind::NODE_MANIFEST;
use launchpad_core::{resolve_entry_point, AppKind, DbConfig, EntryPoint};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::launch::{plan_launch, LaunchPlan};

/// Everything needed to start the application.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub repo: PathBuf,
    pub db: DbConfig,
    pub kind: AppKind,
    pub entry: EntryPoint,
    pub plan: LaunchPlan,
}

/// Verify provisioning has run, then classify the repository and plan the
/// launch.
///
/// The repository is checked before the config file, so a fresh machine
/// reports the missing checkout first.
pub fn prepare(config: &RunnerConfig) -> Result<Prepared, RunnerError> {
    if !config.repo_dir.is_dir() {
        return Err(RunnerError::RepositoryNotFound(config.repo_dir.clone()));
    }

    let db = DbConfig::load(&config.db_config_path)?;

    let kind = AppKind::detect(&config.repo_dir);
    tracing::info!(app_type = %kind, "Detected application type");

    let entry = resolve_entry_point(&config.repo_dir, kind, config.entry_point.as_deref());
    tracing::info!(
        entry_point = %entry.path.display(),
        source = %entry.source,
        "Using entry point",
    );

    let has_manifest = config.repo_dir.join(NODE_MANIFEST).is_file();
    let plan = plan_launch(kind, &entry, has_manifest);

    Ok(Prepared {
        repo: config.repo_dir.clone(),
        db,
        kind,
        entry,
        plan,
    })
}
