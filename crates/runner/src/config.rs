use std::path::PathBuf;
use std::time::Duration;

use launchpad_core::db_config::DB_CONFIG_FILE;

use crate::error::RunnerError;
use crate::registry::DEFAULT_GRACE_PERIOD;

/// Default checkout directory of the application repository.
pub const DEFAULT_REPO_DIR: &str = "CustoSmart-Replit";

/// How often the monitor checks tracked processes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Runner configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub repo_dir: PathBuf,
    pub db_config_path: PathBuf,
    /// Entry point declared by the operator, relative to `repo_dir`.
    pub entry_point: Option<String>,
    pub poll_interval: Duration,
    /// Time a process gets to exit after SIGTERM before it is killed.
    pub grace_period: Duration,
}

impl RunnerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default             |
    /// |----------------------------|---------------------|
    /// | `APP_REPO_DIR`             | `CustoSmart-Replit` |
    /// | `DB_CONFIG_PATH`           | `db_config.json`    |
    /// | `APP_ENTRY_POINT`          | unset               |
    /// | `RUNNER_POLL_INTERVAL_MS`  | `1000`              |
    /// | `RUNNER_GRACE_PERIOD_SECS` | `5`                 |
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RunnerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |var: &'static str| -> Result<Option<u64>, RunnerError> {
            lookup(var)
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| RunnerError::InvalidSetting { var, value })
                })
                .transpose()
        };

        let poll_interval = number("RUNNER_POLL_INTERVAL_MS")?
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis);
        let grace_period = number("RUNNER_GRACE_PERIOD_SECS")?
            .map_or(DEFAULT_GRACE_PERIOD, Duration::from_secs);

        Ok(Self {
            repo_dir: lookup("APP_REPO_DIR")
                .unwrap_or_else(|| DEFAULT_REPO_DIR.to_string())
                .into(),
            db_config_path: lookup("DB_CONFIG_PATH")
                .unwrap_or_else(|| DB_CONFIG_FILE.to_string())
                .into(),
            entry_point: lookup("APP_ENTRY_POINT").filter(|e| !e.trim().is_empty()),
            poll_interval,
            grace_period,
        })
    }
}
