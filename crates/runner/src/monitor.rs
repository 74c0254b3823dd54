//! Foreground wait loop over the tracked processes.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::registry::ProcessRegistry;

/// Why [`monitor`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// A tracked process exited on its own.
    Exited { label: String, status: ExitStatus },
    /// The token was cancelled, usually by a shutdown signal.
    Cancelled,
}

/// Poll `registry` every `interval` until a process exits or `cancel` fires.
///
/// Cleanup is left to the caller so that every exit path runs the same
/// [`ProcessRegistry::shutdown`].
pub async fn monitor(
    registry: &mut ProcessRegistry,
    cancel: &CancellationToken,
    interval: Duration,
) -> MonitorOutcome {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Monitor cancelled");
                return MonitorOutcome::Cancelled;
            }
            _ = ticker.tick() => {
                if let Some((label, status)) = registry.poll_exited() {
                    tracing::info!(label = %label, %status, "Tracked process exited");
                    return MonitorOutcome::Exited { label, status };
                }
            }
        }
    }
}
