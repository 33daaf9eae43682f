//! Periodic reclamation of expired sessions.
//!
//! Expired entries are already reported as not live; the sweeper only bounds
//! memory by removing them. Disabled unless `SESSION_SWEEP_INTERVAL_SECS > 0`.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::SessionRegistry;

/// Spawn the sweeper. It exits when `shutdown` flips to `true` or its sender
/// is dropped.
pub fn spawn_sweeper(
    registry: Arc<SessionRegistry>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = registry.purge_expired(Utc::now());
                    if purged > 0 {
                        tracing::debug!(purged, remaining = registry.len(), "[SWEEPER] expired sessions removed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("[SWEEPER] stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired() {
        let registry = Arc::new(SessionRegistry::new());
        registry.record("dead", Utc::now() - TimeDelta::seconds(1));
        registry.record("alive", Utc::now() + TimeDelta::hours(1));

        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweeper(registry.clone(), Duration::from_secs(30), rx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(registry.len(), 1);
        assert!(registry.is_live("alive"));

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_stops_when_sender_dropped() {
        let registry = Arc::new(SessionRegistry::new());
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweeper(registry, Duration::from_secs(60), rx);

        drop(tx);
        handle.await.unwrap();
    }
}
