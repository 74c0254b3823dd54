//! Shutdown signal handling.
//!
//! Handlers are registered synchronously by [`ShutdownSignals::install`], so
//! a signal that arrives before the waiting task is first polled is still
//! queued rather than taking the default action.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Registered SIGINT and SIGTERM streams.
#[cfg(unix)]
pub struct ShutdownSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    /// Register the handlers. Must be called from within the runtime.
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for SIGINT (Ctrl-C) or SIGTERM.
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {
                tracing::info!("Received SIGINT (Ctrl-C), stopping application");
            }
            _ = self.terminate.recv() => {
                tracing::info!("Received SIGTERM, stopping application");
            }
        }
    }
}

#[cfg(not(unix))]
pub struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl ShutdownSignals {
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    pub async fn recv(&mut self) {
        self.ctrl_c.recv().await;
        tracing::info!("Received Ctrl-C, stopping application");
    }
}

/// Cancel `cancel` once one of `signals` arrives.
pub fn cancel_on_signal(mut signals: ShutdownSignals, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        signals.recv().await;
        cancel.cancel();
    })
}
