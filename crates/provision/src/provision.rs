//! End-to-end database provisioning.
//!
//! Steps, in order:
//!
//! 1. Connect to the server's default database and create the target
//!    database if the catalog does not list it.
//! 2. Connect to the target database.
//! 3. Clone the application repository if it is not checked out yet.
//! 4. Decide on a schema source and apply it.
//! 5. Persist the connection parameters as `db_config.json` and `.env`.
//!
//! Any failure aborts the run. Nothing created before the failure is
//! rolled back.

use std::path::{Path, PathBuf};

use launchpad_core::{find_schema_files, DbConfig};
use launchpad_db::schema::{apply_fallback_schema, apply_script};
use launchpad_db::{DatabaseStatus, DbError, DEFAULT_DATABASE};
use sqlx::postgres::PgConnection;
use sqlx::Connection;

use crate::config::ProvisionConfig;
use crate::error::ProvisionError;
use crate::repository;

/// Where the schema will come from, decided before touching the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaPlan {
    /// Schema-like files exist in the repository. They are reported but not
    /// executed.
    LogDiscovered(Vec<PathBuf>),
    /// Run the local fixed script.
    FixedScript { path: PathBuf, sql: String },
    /// No usable script; create the built-in tables.
    Fallback { reason: String },
}

/// What was actually applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    DiscoveredOnly(Vec<PathBuf>),
    FixedScript,
    Fallback,
}

/// Summary of a successful provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub config: DbConfig,
    pub database: DatabaseStatus,
    pub cloned: bool,
    pub schema: SchemaOutcome,
}

/// Run every provisioning step against the configured server.
pub async fn provision(config: &ProvisionConfig) -> Result<ProvisionReport, ProvisionError> {
    if config.database_url_present {
        tracing::info!("Using DATABASE_URL environment variable");
    } else {
        tracing::info!("Using individual database environment variables");
    }

    let params = config.connection_params();
    tracing::info!(host = %params.host, port = params.port, "Connecting to PostgreSQL server");

    let mut admin = launchpad_db::connect(&params, DEFAULT_DATABASE).await?;
    launchpad_db::health_check(&mut admin).await?;
    let database = launchpad_db::ensure_database(&mut admin, &config.target_database).await?;
    admin.close().await.map_err(DbError::from)?;

    let mut conn = launchpad_db::connect(&params, &config.target_database).await?;
    launchpad_db::health_check(&mut conn).await?;
    tracing::info!(database = %config.target_database, "Connected to target database");

    let cloned = repository::ensure_cloned(&config.repo_dir, &config.repo_url).await?;

    let plan = plan_schema(&config.repo_dir, &config.fixed_script).await;
    let schema = apply_schema(&mut conn, plan).await?;

    let db_config = config.db_config();
    db_config.save(&config.config_path)?;
    tracing::info!(path = %config.config_path.display(), "Database configuration written");
    db_config.write_env_file(&config.env_path)?;
    tracing::info!(path = %config.env_path.display(), "Environment file written");

    conn.close().await.map_err(DbError::from)?;

    tracing::info!(database = %db_config.database, "Database setup completed successfully");

    Ok(ProvisionReport {
        config: db_config,
        database,
        cloned,
        schema,
    })
}

/// Choose the schema source for a checked-out repository.
///
/// Discovered files take priority over the fixed script, and a missing or
/// unreadable fixed script leads to the built-in fallback.
pub async fn plan_schema(repo: &Path, fixed_script: &Path) -> SchemaPlan {
    let discovered = find_schema_files(repo);
    if !discovered.is_empty() {
        return SchemaPlan::LogDiscovered(discovered);
    }

    match read_script(fixed_script).await {
        Ok(sql) => SchemaPlan::FixedScript {
            path: fixed_script.to_path_buf(),
            sql,
        },
        Err(e) => SchemaPlan::Fallback {
            reason: e.to_string(),
        },
    }
}

async fn read_script(path: &Path) -> Result<String, ProvisionError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ProvisionError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Execute `plan` on the target database.
///
/// A failing fixed script falls through to the built-in tables; a failing
/// fallback is fatal.
pub async fn apply_schema(
    conn: &mut PgConnection,
    plan: SchemaPlan,
) -> Result<SchemaOutcome, ProvisionError> {
    match plan {
        SchemaPlan::LogDiscovered(files) => {
            for file in &files {
                tracing::info!(file = %file.display(), "Found schema file");
            }
            tracing::warn!(
                count = files.len(),
                "Discovered schema files are not executed; apply them manually if needed"
            );
            Ok(SchemaOutcome::DiscoveredOnly(files))
        }
        SchemaPlan::FixedScript { path, sql } => {
            tracing::info!(script = %path.display(), "Creating schema from fixed script");
            match apply_script(conn, &sql).await {
                Ok(()) => {
                    tracing::info!("Executed fixed SQL script successfully");
                    Ok(SchemaOutcome::FixedScript)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error executing fixed SQL script");
                    fallback(conn).await
                }
            }
        }
        SchemaPlan::Fallback { reason } => {
            tracing::warn!(%reason, "Fixed SQL script unavailable");
            fallback(conn).await
        }
    }
}

async fn fallback(conn: &mut PgConnection) -> Result<SchemaOutcome, ProvisionError> {
    tracing::info!("Creating basic schema instead");
    apply_fallback_schema(conn).await?;
    Ok(SchemaOutcome::Fallback)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn discovered_files_take_priority() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("schema.ts"), "export {}").unwrap();
        let script = repo.path().join("fixed_script.sql");

        let plan = plan_schema(repo.path(), &script).await;
        assert_eq!(
            plan,
            SchemaPlan::LogDiscovered(vec![repo.path().join("schema.ts")])
        );
    }

    #[tokio::test]
    async fn fixed_script_used_when_repo_has_no_schema() {
        let repo = tempfile::tempdir().unwrap();
        let workdir = tempfile::tempdir().unwrap();
        let script = workdir.path().join("fixed_script.sql");
        std::fs::write(&script, "CREATE TABLE t (id INT);").unwrap();

        let plan = plan_schema(repo.path(), &script).await;
        assert_matches!(
            plan,
            SchemaPlan::FixedScript { sql, .. } if sql == "CREATE TABLE t (id INT);"
        );
    }

    #[tokio::test]
    async fn missing_script_falls_back() {
        let repo = tempfile::tempdir().unwrap();
        let plan = plan_schema(repo.path(), &repo.path().join("absent.sql")).await;
        assert_matches!(plan, SchemaPlan::Fallback { .. });
    }
}
