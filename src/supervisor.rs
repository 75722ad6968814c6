use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{Error, Result};

/// Owns the process-wide shutdown token and the tracker of every long-running task.
#[derive(Debug, Default)]
pub struct Supervisor {
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn tasks(&self) -> TaskTracker {
        self.tasks.clone()
    }

    /// Cancels the shutdown token on SIGHUP, SIGINT, SIGTERM or SIGQUIT.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signal`] if a handler cannot be installed.
    pub fn listen_for_signals(&self) -> Result<()> {
        let mut hangup = signal(SignalKind::hangup()).map_err(Error::Signal)?;
        let mut interrupt = signal(SignalKind::interrupt()).map_err(Error::Signal)?;
        let mut terminate = signal(SignalKind::terminate()).map_err(Error::Signal)?;
        let mut quit = signal(SignalKind::quit()).map_err(Error::Signal)?;

        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            let name = tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = hangup.recv() => "SIGHUP",
                _ = interrupt.recv() => "SIGINT",
                _ = terminate.recv() => "SIGTERM",
                _ = quit.recv() => "SIGQUIT",
            };
            log::info!(target: "supervisor", "received {}, shutting down", name);
            shutdown.cancel();
        });

        Ok(())
    }

    /// Cancels every task and waits until all of them have finished.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.tasks.close();
        log::debug!(
            target: "supervisor",
            "waiting for {} tasks to finish",
            self.tasks.len()
        );
        self.tasks.wait().await;
        log::info!(target: "supervisor", "all tasks finished");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_tasks() {
        let supervisor = Supervisor::new();
        let finished = Arc::new(AtomicBool::new(false));

        supervisor.tasks().spawn({
            let shutdown = supervisor.shutdown_token();
            let finished = Arc::clone(&finished);
            async move {
                shutdown.cancelled().await;
                tokio::time::sleep(Duration::from_secs(1)).await;
                finished.store(true, Ordering::SeqCst);
            }
        });

        supervisor.shutdown().await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_signal_listener_exits_on_shutdown() {
        let supervisor = Supervisor::new();
        supervisor.listen_for_signals().unwrap();
        assert_eq!(supervisor.tasks().len(), 1);
        supervisor.shutdown().await;
    }
}
