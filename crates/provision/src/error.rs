use std::path::PathBuf;

use launchpad_core::CoreError;
use launchpad_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("{var} must be a valid port number, got '{value}'")]
    InvalidPort { var: &'static str, value: String },

    #[error("Failed to run git: {0}")]
    GitUnavailable(#[source] std::io::Error),

    #[error("git clone of {url} failed with exit code {exit_code:?}")]
    CloneFailed { url: String, exit_code: Option<i32> },

    #[error("Failed to read schema script {}: {source}", path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] CoreError),
}
