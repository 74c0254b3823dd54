//! Application repository checkout.

use std::path::Path;

use tokio::process::Command;

use crate::error::ProvisionError;

/// Clone `url` into `dir` unless `dir` already exists.
///
/// Returns `true` when a clone was performed. An existing directory is
/// trusted as-is; it is never pulled or verified.
pub async fn ensure_cloned(dir: &Path, url: &str) -> Result<bool, ProvisionError> {
    if dir.exists() {
        tracing::debug!(repo = %dir.display(), "Repository already present");
        return Ok(false);
    }

    tracing::info!(url, repo = %dir.display(), "Cloning repository to analyze schema");

    let status = Command::new("git")
        .arg("clone")
        .arg(url)
        .arg(dir)
        .status()
        .await
        .map_err(ProvisionError::GitUnavailable)?;

    if !status.success() {
        return Err(ProvisionError::CloneFailed {
            url: url.to_string(),
            exit_code: status.code(),
        });
    }

    Ok(true)
}
