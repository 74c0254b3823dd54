use std::path::PathBuf;

use launchpad_core::db_config::{DB_CONFIG_FILE, ENV_FILE};
use launchpad_core::DbConfig;
use launchpad_db::ConnectionParams;

use crate::error::ProvisionError;

/// Default checkout directory of the application repository.
pub const DEFAULT_REPO_DIR: &str = "CustoSmart-Replit";

/// Default clone URL of the application repository.
pub const DEFAULT_REPO_URL: &str = "https://github.com/leoalsantos/CustoSmart-Replit.git";

/// Default local schema script applied when the repository has none.
pub const DEFAULT_FIXED_SCRIPT: &str = "fixed_script.sql";

/// Provisioner configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database to create and apply the schema to.
    pub target_database: String,
    /// Whether `DATABASE_URL` was set. Only reported, never parsed.
    pub database_url_present: bool,
    pub repo_dir: PathBuf,
    pub repo_url: String,
    pub fixed_script: PathBuf,
    pub config_path: PathBuf,
    pub env_path: PathBuf,
}

impl ProvisionConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var               | Default                       |
    /// |-----------------------|-------------------------------|
    /// | `PGUSER`              | `postgres`                    |
    /// | `PGPASSWORD`          | `postgres`                    |
    /// | `PGHOST`              | `localhost`                   |
    /// | `PGPORT`              | `5432`                        |
    /// | `PGDATABASE`          | `custosmart`                  |
    /// | `APP_REPO_DIR`        | `CustoSmart-Replit`           |
    /// | `APP_REPO_URL`        | upstream GitHub clone URL     |
    /// | `FIXED_SCHEMA_SCRIPT` | `fixed_script.sql`            |
    /// | `DB_CONFIG_PATH`      | `db_config.json`              |
    /// | `DB_ENV_PATH`         | `.env`                        |
    pub fn from_env() -> Result<Self, ProvisionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProvisionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port_raw = var("PGPORT", "5432");
        let port = port_raw
            .trim()
            .parse()
            .map_err(|_| ProvisionError::InvalidPort {
                var: "PGPORT",
                value: port_raw.clone(),
            })?;

        Ok(Self {
            host: var("PGHOST", "localhost"),
            port,
            user: var("PGUSER", "postgres"),
            password: var("PGPASSWORD", "postgres"),
            target_database: var("PGDATABASE", "custosmart"),
            database_url_present: lookup("DATABASE_URL").is_some(),
            repo_dir: var("APP_REPO_DIR", DEFAULT_REPO_DIR).into(),
            repo_url: var("APP_REPO_URL", DEFAULT_REPO_URL),
            fixed_script: var("FIXED_SCHEMA_SCRIPT", DEFAULT_FIXED_SCRIPT).into(),
            config_path: var("DB_CONFIG_PATH", DB_CONFIG_FILE).into(),
            env_path: var("DB_ENV_PATH", ENV_FILE).into(),
        })
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    /// The record persisted once the target database is ready.
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            host: self.host.clone(),
            port: self.port,
            database: self.target_database.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ProvisionConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.user, "postgres");
        assert_eq!(config.password, "postgres");
        assert_eq!(config.target_database, "custosmart");
        assert!(!config.database_url_present);
        assert_eq!(config.repo_dir, PathBuf::from(DEFAULT_REPO_DIR));
        assert_eq!(config.config_path, PathBuf::from("db_config.json"));
        assert_eq!(config.env_path, PathBuf::from(".env"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ProvisionConfig::from_lookup(lookup_from(&[
            ("PGHOST", "localhost"),
            ("PGPORT", "5432"),
            ("PGDATABASE", "testdb"),
            ("PGUSER", "u"),
            ("PGPASSWORD", "p"),
            ("DATABASE_URL", "postgresql://u:p@localhost:5432/testdb"),
        ]))
        .unwrap();

        assert!(config.database_url_present);
        assert_eq!(
            config.db_config(),
            DbConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "testdb".to_string(),
                user: "u".to_string(),
                password: "p".to_string(),
            }
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = ProvisionConfig::from_lookup(lookup_from(&[("PGPORT", "fivefour")]));
        assert_matches!(
            result,
            Err(ProvisionError::InvalidPort { var: "PGPORT", value }) if value == "fivefour"
        );
    }
}
