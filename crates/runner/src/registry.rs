//! Ownership of every child process the runner starts.
//!
//! The registry is an explicit value threaded through launch, monitoring
//! and cleanup. Nothing else holds a process handle.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

/// Time a process gets to exit after SIGTERM before it is killed.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How [`ProcessRegistry::shutdown`] dealt with one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process had already exited; nothing was sent.
    AlreadyExited,
    /// The process exited within the grace period after SIGTERM.
    Terminated,
    /// The grace period elapsed and the process was killed.
    Killed,
}

struct TrackedProcess {
    label: String,
    child: Child,
}

/// Append-only list of spawned processes.
pub struct ProcessRegistry {
    processes: Vec<TrackedProcess>,
    grace_period: Duration,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl ProcessRegistry {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            processes: Vec::new(),
            grace_period,
        }
    }

    /// Take ownership of a spawned child.
    pub fn track(&mut self, label: impl Into<String>, child: Child) {
        let label = label.into();
        tracing::debug!(label = %label, pid = ?child.id(), "Tracking process");
        self.processes.push(TrackedProcess { label, child });
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// OS pids of processes that have not been reaped yet.
    pub fn pids(&self) -> Vec<u32> {
        self.processes.iter().filter_map(|p| p.child.id()).collect()
    }

    /// Return the first tracked process that has exited, without blocking.
    pub fn poll_exited(&mut self) -> Option<(String, ExitStatus)> {
        for process in &mut self.processes {
            match process.child.try_wait() {
                Ok(Some(status)) => return Some((process.label.clone(), status)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(label = %process.label, error = %e, "Failed to poll process");
                }
            }
        }
        None
    }

    /// Stop every process that is still running.
    ///
    /// Each process gets SIGTERM and the grace period to exit, then SIGKILL.
    /// Safe to call repeatedly; processes that already exited are skipped.
    pub async fn shutdown(&mut self) -> Vec<(String, StopOutcome)> {
        let mut outcomes = Vec::with_capacity(self.processes.len());
        for process in &mut self.processes {
            let outcome = stop(process, self.grace_period).await;
            outcomes.push((process.label.clone(), outcome));
        }
        outcomes
    }
}

async fn stop(process: &mut TrackedProcess, grace_period: Duration) -> StopOutcome {
    let label = &process.label;
    let child = &mut process.child;

    match child.try_wait() {
        Ok(Some(_)) => return StopOutcome::AlreadyExited,
        Ok(None) => {}
        Err(e) => tracing::warn!(label = %label, error = %e, "Failed to poll process"),
    }

    tracing::info!(label = %label, pid = ?child.id(), "Terminating process");
    if let Err(e) = send_terminate(child) {
        tracing::warn!(label = %label, error = %e, "Failed to send SIGTERM");
    }

    match tokio::time::timeout(grace_period, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::info!(label = %label, %status, "Process terminated");
            StopOutcome::Terminated
        }
        Ok(Err(e)) => {
            tracing::warn!(label = %label, error = %e, "Failed to wait for process, killing");
            force_kill(label, child).await;
            StopOutcome::Killed
        }
        Err(_elapsed) => {
            tracing::warn!(
                label = %label,
                grace_secs = grace_period.as_secs_f32(),
                "Process did not exit after SIGTERM, killing",
            );
            force_kill(label, child).await;
            StopOutcome::Killed
        }
    }
}

async fn force_kill(label: &str, child: &mut Child) {
    // `kill` sends SIGKILL and reaps the child.
    if let Err(e) = child.kill().await {
        tracing::error!(label, error = %e, "Failed to kill process");
    }
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    // Safety: kill(2) takes plain integers; the pid belongs to a child we
    // have not reaped yet, so it cannot have been recycled.
    let ret = unsafe { libc::kill(pid, libc::SIGTERM) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
