//! Persisted database connection parameters.
//!
//! The provisioner writes a [`DbConfig`] to two artifacts, `db_config.json`
//! and a `.env` file. The runner reads the JSON file back and forwards the
//! same values to the launched application as environment variables.

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Default file name of the JSON config artifact.
pub const DB_CONFIG_FILE: &str = "db_config.json";

/// Default file name of the env-file artifact.
pub const ENV_FILE: &str = ".env";

/// Flat connection record shared between provisioning and launching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl DbConfig {
    /// Composed `postgresql://` URL. Credentials are not percent-encoded.
    pub fn database_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// The six variables exported to the launched application.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        vec![
            ("DATABASE_URL".to_string(), self.database_url()),
            ("PGUSER".to_string(), self.user.clone()),
            ("PGPASSWORD".to_string(), self.password.clone()),
            ("PGHOST".to_string(), self.host.clone()),
            ("PGPORT".to_string(), self.port.to_string()),
            ("PGDATABASE".to_string(), self.database.clone()),
        ]
    }

    /// Render the env-file body, one `KEY=value` line per variable.
    pub fn to_env_file(&self) -> String {
        self.env_vars()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect()
    }

    /// Load a config previously written by [`DbConfig::save`].
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::ConfigNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(CoreError::Io(e)),
        };

        serde_json::from_str(&contents).map_err(|source| CoreError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the config as pretty-printed JSON, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write the env-file artifact, replacing any existing file.
    pub fn write_env_file(&self, path: &Path) -> Result<(), CoreError> {
        std::fs::write(path, self.to_env_file())?;
        Ok(())
    }
}

/// Accept the port as a JSON number or as a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortRepr {
        Number(u16),
        Text(String),
    }

    match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(port) => Ok(port),
        PortRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| serde::de::Error::custom(format!("invalid port '{text}': {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
