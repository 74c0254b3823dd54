//! `launchpad-provision` -- one-shot database provisioner.
//!
//! Creates the target PostgreSQL database if missing, applies a schema and
//! writes `db_config.json` plus `.env` for the runner. See
//! [`ProvisionConfig::from_env`] for the environment variables it reads.
//!
//! Exits with status 1 on any failure.

use launchpad_provision::{provision, ProvisionConfig, SchemaOutcome};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launchpad_provision=info,launchpad_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProvisionConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid provisioning configuration");
        std::process::exit(1);
    });

    match provision(&config).await {
        Ok(report) => {
            let schema = match &report.schema {
                SchemaOutcome::DiscoveredOnly(files) => {
                    format!("{} discovered file(s), not executed", files.len())
                }
                SchemaOutcome::FixedScript => "fixed script".to_string(),
                SchemaOutcome::Fallback => "built-in fallback".to_string(),
            };
            tracing::info!(
                database = %report.config.database,
                status = ?report.database,
                cloned = report.cloned,
                %schema,
                "Provisioning finished",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Error setting up database");
            std::process::exit(1);
        }
    }
}
