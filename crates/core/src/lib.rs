//! Pure domain logic shared by the provisioner and the runner.
//!
//! Nothing in this crate touches the database or spawns processes; it only
//! reads and writes files, which keeps it testable against temp directories.

pub mod app_kind;
pub mod db_config;
pub mod entry_point;
pub mod error;
pub mod schema_discovery;

pub use app_kind::AppKind;
pub use db_config::DbConfig;
pub use entry_point::{resolve_entry_point, EntryPoint, EntrySource};
pub use error::CoreError;
pub use schema_discovery::find_schema_files;
