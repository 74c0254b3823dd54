//! `launchpad-runner` library crate.
//!
//! Classifies a checked-out application, launches it with the provisioned
//! database credentials and supervises the resulting processes. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod launch;
pub mod monitor;
pub mod prepare;
pub mod registry;
pub mod signal;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use launch::{launch, plan_launch, CommandSpec, LaunchPlan};
pub use monitor::{monitor, MonitorOutcome};
pub use prepare::{prepare, Prepared};
pub use registry::{ProcessRegistry, StopOutcome};
