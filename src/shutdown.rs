//! Graceful termination.
//!
//! The coordinator owns the cancellation token shared by the background
//! workers and tracks their tasks. [`ShutdownCoordinator::shutdown`] stops
//! them, persists the store and reports how it went.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::app::{AppState, Workers};
use crate::error::Result;

/// How a shutdown went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers finished within the first wait
    pub workers_stopped: bool,
    /// Tasks written by the final save
    pub saved_tasks: Option<usize>,
    pub save_error: Option<String>,
    /// Workers finished by the end of the second wait
    pub final_wait_ok: bool,
}

#[derive(Debug)]
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    tracker: TaskTracker,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// `timeout` bounds each of the two waits for the workers.
    pub fn new(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            timeout,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start the logger and archiver on the current runtime.
    pub fn spawn_workers(&self, workers: Workers) {
        let Workers { logger, archiver } = workers;
        self.tracker.spawn(logger.run(self.cancel.clone()));
        self.tracker.spawn(archiver.run(self.cancel.clone()));
    }

    /// Cancel workers, save the store, close the logger.
    ///
    /// Never fails; problems are recorded in the report and emitted as
    /// diagnostics.
    pub async fn shutdown(&self, state: &AppState) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        state.logger.log("Application shutting down");
        self.cancel.cancel();
        self.tracker.close();

        report.workers_stopped = self.wait("first").await;

        let path = state.tasks_path();
        let store = Arc::clone(&state.store);
        let save_path = path.clone();
        match tokio::task::spawn_blocking(move || store.save_to(&save_path)).await {
            Ok(Ok(saved)) => {
                tracing::info!(path = %path.display(), saved, "tasks saved");
                report.saved_tasks = Some(saved);
            }
            Ok(Err(err)) => {
                tracing::error!(path = %path.display(), error = %err, "failed to save tasks");
                report.save_error = Some(err.to_string());
            }
            Err(err) => {
                tracing::error!(error = %err, "save task panicked");
                report.save_error = Some(err.to_string());
            }
        }

        state.logger.close();

        report.final_wait_ok = self.wait("final").await;
        report
    }

    async fn wait(&self, phase: &str) -> bool {
        match tokio::time::timeout(self.timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    phase,
                    timeout = ?self.timeout,
                    remaining = self.tracker.len(),
                    "timed out waiting for background workers"
                );
                false
            }
        }
    }
}

/// Listeners for SIGINT and, on unix, SIGTERM.
///
/// Handlers are registered by [`TerminationSignals::install`], so a signal
/// that arrives before [`TerminationSignals::recv`] is awaited is not lost.
pub struct TerminationSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl TerminationSignals {
    pub fn install() -> Result<Self> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            Ok(Self {
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        {
            Ok(Self {})
        }
    }

    /// Wait for the next signal and return its name.
    pub async fn recv(&mut self) -> Result<&'static str> {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = self.interrupt.recv() => Ok("SIGINT"),
                _ = self.terminate.recv() => Ok("SIGTERM"),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            Ok("Ctrl+C")
        }
    }
}
