//! Periodic sweep of expired session records.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use remit_core::error::AppError;

use super::manager::SessionManager;

/// Runs [`SessionManager::cleanup_expired`] on a fixed interval until
/// shutdown is signalled.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    sessions: Arc<SessionManager>,
    interval: Duration,
}

impl SessionCleanup {
    pub fn new(sessions: Arc<SessionManager>, interval: Duration) -> Self {
        Self { sessions, interval }
    }

    /// Runs a single cleanup cycle.
    ///
    /// Returns the number of sessions cleaned up.
    pub async fn run_cleanup(&self) -> Result<usize, AppError> {
        self.sessions.cleanup_expired().await
    }

    /// Loops until `shutdown` flips to `true`. Failed cycles are logged and
    /// retried on the next tick.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Session cleanup started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cleanup().await {
                        error!(error = %e, "Session cleanup cycle failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Session cleanup stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remit_cache::provider::CacheManager;
    use remit_core::config::session::SessionConfig;

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let sessions = Arc::new(SessionManager::new(
            Arc::new(CacheManager::in_memory()),
            &SessionConfig::default(),
        ));
        let cleanup = SessionCleanup::new(sessions, Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(cleanup.run(rx));

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
