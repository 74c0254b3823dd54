//! `launchpad-run` -- start a provisioned application and supervise it.
//!
//! Reads `db_config.json`, classifies the checked-out repository, launches
//! the application with the database credentials exported and waits until
//! it exits or the runner is interrupted. See [`RunnerConfig::from_env`] for
//! the environment variables it reads.
//!
//! Exits with status 1 when setup has not been run or the application
//! cannot be started, and 0 otherwise.

use launchpad_runner::signal::{cancel_on_signal, ShutdownSignals};
use launchpad_runner::{launch, monitor, prepare, MonitorOutcome, ProcessRegistry, RunnerConfig};
use tokio_util::sync::CancellationToken;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "launchpad_run=info,launchpad_runner=info,launchpad_core=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid runner configuration");
        std::process::exit(1);
    });

    let prepared = prepare(&config).unwrap_or_else(|e| {
        match e.setup_hint() {
            Some(hint) => tracing::error!(error = %e, "{hint}"),
            None => tracing::error!(error = %e, "Failed to prepare application"),
        }
        std::process::exit(1);
    });

    let signals = ShutdownSignals::install().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to install signal handlers");
        std::process::exit(1);
    });
    let cancel = CancellationToken::new();
    let signal_handle = cancel_on_signal(signals, cancel.clone());

    let mut registry = ProcessRegistry::new(config.grace_period);

    tracing::info!(repo = %prepared.repo.display(), "Starting the application");
    let launched = launch(
        &prepared.plan,
        &prepared.repo,
        &prepared.db,
        &mut registry,
        &cancel,
    )
    .await;
    if let Err(e) = launched {
        tracing::error!(error = %e, "Failed to start application");
        registry.shutdown().await;
        std::process::exit(1);
    }

    let outcome = monitor(&mut registry, &cancel, config.poll_interval).await;
    registry.shutdown().await;
    signal_handle.abort();

    match outcome {
        MonitorOutcome::Exited { label, status } => {
            tracing::info!(label = %label, %status, "Application exited");
        }
        MonitorOutcome::Cancelled => {
            tracing::info!("Application stopped.");
        }
    }
}
