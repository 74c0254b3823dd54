//! `launchpad-provision` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod provision;
pub mod repository;

pub use config::ProvisionConfig;
pub use error::ProvisionError;
pub use provision::{
    apply_schema, plan_schema, provision, ProvisionReport, SchemaOutcome, SchemaPlan,
};
