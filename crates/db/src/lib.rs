//! PostgreSQL access for the provisioner.
//!
//! Provisioning needs two separate connections (server default database,
//! then the target database) and runs DDL that cannot share a transaction,
//! so this crate works with single [`PgConnection`]s rather than a pool.

use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

pub mod schema;

/// The server's default database, used only to create the target database.
pub const DEFAULT_DATABASE: &str = "postgres";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to database '{database}' on {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to look up database '{name}': {source}")]
    Lookup {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create database '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema statement failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Server address and credentials, independent of the database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    /// Build connect options for `database` on this server.
    pub fn connect_options(&self, database: &str) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(database)
    }
}

/// Whether [`ensure_database`] had to create the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Created,
    AlreadyExists,
}

/// Open a single connection to `database`.
pub async fn connect(params: &ConnectionParams, database: &str) -> Result<PgConnection, DbError> {
    PgConnection::connect_with(&params.connect_options(database))
        .await
        .map_err(|source| DbError::Connect {
            host: params.host.clone(),
            port: params.port,
            database: database.to_string(),
            source,
        })
}

/// Verify the connection is usable.
pub async fn health_check(conn: &mut PgConnection) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}

/// Look `name` up in the server catalog.
pub async fn database_exists(conn: &mut PgConnection, name: &str) -> Result<bool, DbError> {
    let row = sqlx::query("SELECT 1 FROM pg_catalog.pg_database WHERE datname = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|source| DbError::Lookup {
            name: name.to_string(),
            source,
        })?;
    Ok(row.is_some())
}

/// Issue `CREATE DATABASE` for `name`.
///
/// Runs over the simple query protocol; `CREATE DATABASE` cannot run inside
/// a transaction block.
pub async fn create_database(conn: &mut PgConnection, name: &str) -> Result<(), DbError> {
    let statement = format!("CREATE DATABASE {}", quote_identifier(name));
    sqlx::raw_sql(&statement)
        .execute(&mut *conn)
        .await
        .map_err(|source| DbError::Create {
            name: name.to_string(),
            source,
        })?;
    Ok(())
}

/// Create `name` unless the catalog already lists it.
pub async fn ensure_database(
    conn: &mut PgConnection,
    name: &str,
) -> Result<DatabaseStatus, DbError> {
    if database_exists(conn, name).await? {
        tracing::info!(database = name, "Database already exists");
        return Ok(DatabaseStatus::AlreadyExists);
    }

    tracing::info!(database = name, "Creating database");
    create_database(conn, name).await?;
    tracing::info!(database = name, "Database created");
    Ok(DatabaseStatus::Created)
}

/// Quote an SQL identifier, doubling any embedded double quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_plain_identifier() {
        assert_eq!(quote_identifier("custosmart"), "\"custosmart\"");
    }

    #[test]
    fn quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn connect_options_carry_all_params() {
        let params = ConnectionParams {
            host: "db.internal".to_string(),
            port: 6543,
            user: "deploy".to_string(),
            password: "secret".to_string(),
        };
        let options = params.connect_options("testdb");
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "deploy");
        assert_eq!(options.get_database(), Some("testdb"));
    }
}
