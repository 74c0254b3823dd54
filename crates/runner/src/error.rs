use std::path::PathBuf;

use launchpad_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Repository not found at {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("{var} must be a non-negative integer, got '{value}'")]
    InvalidSetting { var: &'static str, value: String },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// Operator-facing message when the error means provisioning has not
    /// been run yet.
    pub fn setup_hint(&self) -> Option<&'static str> {
        match self {
            Self::RepositoryNotFound(_) => Some("Repository not found. Please run setup first."),
            Self::Config(CoreError::ConfigNotFound(_) | CoreError::InvalidConfig { .. }) => {
                Some("Database configuration not found. Please run setup first.")
            }
            _ => None,
        }
    }
}
