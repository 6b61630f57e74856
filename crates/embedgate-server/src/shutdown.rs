//! Single-token graceful shutdown.
//!
//! One coordinator owns a `CancellationToken`; the HTTP listener and the
//! scheduled reload task each hold a clone and exit when it is cancelled.
//! Their join handles are registered on the coordinator so shutdown can
//! wait for them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long a graceful shutdown waits before giving up on stragglers.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinates graceful shutdown across the listener and background tasks.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with no registered tasks.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Clone of the cancellation token, for handing to spawned tasks.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Track a spawned task so [`ShutdownCoordinator::graceful_shutdown`]
    /// waits for it.
    pub fn register(&mut self, handle: JoinHandle<()>) {
        self.tasks.push(handle);
    }

    /// Signal cancellation without waiting. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once anything has signalled shutdown.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the token and wait for every registered task to finish.
    ///
    /// Tasks still running after `timeout` (default 30s) are left to the
    /// runtime rather than aborted, so a wedged task cannot hang the exit
    /// path forever.
    pub async fn graceful_shutdown(self, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);

        self.shutdown();
        info!(
            task_count = self.tasks.len(),
            timeout_secs = timeout.as_secs(),
            "draining background tasks"
        );

        let drain = futures::future::join_all(self.tasks);
        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, abandoning remaining tasks");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_shutting_down());
    }

    #[test]
    fn shutdown_flips_the_flag() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown();
        assert!(coordinator.is_shutting_down());
    }

    #[test]
    fn handed_out_tokens_observe_cancellation() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        assert!(!token.is_cancelled());
        coordinator.shutdown();
        assert!(token.is_cancelled());
    }

    #[test]
    fn repeated_shutdown_is_harmless() {
        let coordinator = ShutdownCoordinator::default();
        coordinator.shutdown();
        coordinator.shutdown();
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn graceful_shutdown_waits_for_registered_task() {
        let mut coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        let (tx, rx) = tokio::sync::oneshot::channel();

        coordinator.register(tokio::spawn(async move {
            token.cancelled().await;
            let _ = tx.send(());
        }));

        coordinator.graceful_shutdown(None).await;
        // The task observed cancellation before the coordinator returned
        rx.await.unwrap();
    }

    #[tokio::test]
    async fn graceful_shutdown_stops_a_ticking_task() {
        let mut coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();

        // Same shape as the scheduled reload loop: tick until cancelled.
        coordinator.register(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(10));
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
            }
        }));

        tokio::time::sleep(Duration::from_millis(30)).await;
        coordinator.graceful_shutdown(Some(Duration::from_secs(1))).await;
    }

    #[tokio::test]
    async fn graceful_shutdown_times_out_on_wedged_task() {
        let mut coordinator = ShutdownCoordinator::new();

        // Ignores cancellation entirely
        coordinator.register(tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }));

        // Returns after the timeout instead of hanging
        coordinator
            .graceful_shutdown(Some(Duration::from_millis(100)))
            .await;
    }
}
