//! Schema application for the target database.

use sqlx::postgres::PgConnection;

use crate::DbError;

/// Tables created by [`apply_fallback_schema`], in dependency order.
pub const FALLBACK_TABLES: [&str; 3] = ["users", "projects", "expenses"];

/// Minimal cost-tracking schema used when no usable script is available.
const FALLBACK_SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username VARCHAR(100) UNIQUE NOT NULL,
    email VARCHAR(255) UNIQUE NOT NULL,
    password VARCHAR(255) NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS projects (
    id SERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    user_id INTEGER REFERENCES users(id),
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS expenses (
    id SERIAL PRIMARY KEY,
    project_id INTEGER REFERENCES projects(id),
    name VARCHAR(255) NOT NULL,
    amount DECIMAL(10, 2) NOT NULL,
    date DATE NOT NULL,
    category VARCHAR(100),
    notes TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
";

/// Execute a multi-statement SQL script as-is.
pub async fn apply_script(conn: &mut PgConnection, script: &str) -> Result<(), DbError> {
    sqlx::raw_sql(script)
        .execute(&mut *conn)
        .await
        .map_err(DbError::Schema)?;
    Ok(())
}

/// Create the `users`, `projects` and `expenses` tables if missing.
pub async fn apply_fallback_schema(conn: &mut PgConnection) -> Result<(), DbError> {
    apply_script(conn, FALLBACK_SCHEMA).await?;
    tracing::info!(tables = ?FALLBACK_TABLES, "Fallback schema applied");
    Ok(())
}

/// Whether `table` exists in the connection's current schema.
pub async fn table_exists(conn: &mut PgConnection, table: &str) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
             SELECT 1 FROM information_schema.tables
             WHERE table_schema = current_schema() AND table_name = $1
         )",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}
