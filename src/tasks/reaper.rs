//! Idle Expression Reaper
//!
//! Background task that periodically evicts compiled expressions that have
//! not been used for longer than their TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

// == Sweep ==
/// Runs one eviction pass at `now` and returns how many entries were removed.
///
/// Keys that vanish or are refreshed between the scan and their removal are
/// skipped; eviction is best-effort.
pub async fn sweep_expired(store: &CacheStore, now: Instant) -> usize {
    let mut removed = 0;
    for key in store.scan_expired(now).await {
        if store.remove_if_expired(&key, now).await {
            removed += 1;
        } else {
            debug!(key = %key, "expression refreshed or removed before eviction");
        }
    }
    removed
}

// == Reaper Handle ==
/// Owner-side handle of a running reaper.
///
/// Dropping the handle also stops the reaper, since the task treats a closed
/// cancellation channel as a stop request.
#[derive(Debug)]
pub struct ReaperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    // == Stop ==
    /// Signals the reaper to stop. Never blocks; calls after the first are ignored.
    pub fn stop(&self) {
        let first = !self.shutdown.send_replace(true);
        if first {
            info!("Reaper stop requested");
        }
    }

    /// True if a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// True while the reaper task has not yet exited.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    // == Join ==
    /// Stops the reaper and waits for its loop to exit.
    pub async fn join(self) {
        self.stop();
        if let Err(err) = self.task.await {
            warn!("Reaper task ended abnormally: {}", err);
        }
    }
}

// == Spawn Reaper ==
/// Spawns a reaper that sweeps `store` every `interval`.
///
/// The first sweep runs one interval after spawning. Each iteration waits
/// for either the next tick or a stop request; a stop request ends the loop.
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::new(1000));
/// let reaper = spawn_reaper(store.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// reaper.join().await;
/// ```
pub fn spawn_reaper(store: Arc<CacheStore>, interval: Duration) -> ReaperHandle {
    let interval = interval.max(Duration::from_millis(1));
    let (shutdown, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!("Starting reaper with interval of {:?}", interval);

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = stop_rx.changed() => {
                    // A closed channel means the handle was dropped
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let removed = sweep_expired(&store, Instant::now()).await;
                    if removed > 0 {
                        info!("Reaper: evicted {} idle expressions", removed);
                    } else {
                        debug!("Reaper: no idle expressions found");
                    }
                }
            }
        }

        info!("Reaper stopped");
    });

    ReaperHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CompiledExpression, Compiler, FormulaCompiler};

    fn compiled() -> Arc<dyn CompiledExpression> {
        FormulaCompiler::new().compile("1").unwrap()
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let store = CacheStore::new(100);
        let start = Instant::now();

        store
            .put_at("idle".to_string(), compiled(), Duration::from_secs(30), start)
            .await;
        store
            .put_at("busy".to_string(), compiled(), Duration::from_secs(30), start)
            .await;
        store.get_at("busy", start + Duration::from_secs(20)).await;

        let removed = sweep_expired(&store, start + Duration::from_secs(31)).await;

        assert_eq!(removed, 1);
        assert!(!store.contains("idle").await);
        assert!(store.contains("busy").await);
        assert_eq!(store.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_reaper_removes_idle_entries() {
        let store = Arc::new(CacheStore::new(100));
        store
            .put("expire_soon".to_string(), compiled(), Duration::from_millis(50))
            .await;

        let reaper = spawn_reaper(store.clone(), Duration::from_millis(100));

        // Wait for the entry to go idle and a sweep to run
        tokio::time::sleep(Duration::from_millis(350)).await;

        assert!(
            !store.contains("expire_soon").await,
            "Idle entry should have been evicted"
        );
        reaper.join().await;
    }

    #[tokio::test]
    async fn test_reaper_preserves_fresh_entries() {
        let store = Arc::new(CacheStore::new(100));
        store
            .put("long_lived".to_string(), compiled(), Duration::from_secs(3600))
            .await;

        let reaper = spawn_reaper(store.clone(), Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(store.contains("long_lived").await, "Fresh entry should not be removed");
        reaper.join().await;
    }

    #[tokio::test]
    async fn test_stop_ends_the_loop() {
        let store = Arc::new(CacheStore::new(100));
        let reaper = spawn_reaper(store, Duration::from_secs(3600));
        assert!(reaper.is_running());

        reaper.stop();
        assert!(reaper.is_stopping());

        // Well within one interval
        tokio::time::timeout(Duration::from_secs(1), reaper.join())
            .await
            .expect("reaper should exit promptly after stop");
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let store = Arc::new(CacheStore::new(100));
        let reaper = spawn_reaper(store, Duration::from_millis(50));

        reaper.stop();
        reaper.stop();
        tokio::time::sleep(Duration::from_millis(100)).await;
        reaper.stop();

        assert!(!reaper.is_running());
    }

    #[tokio::test]
    async fn test_no_evictions_after_stop() {
        let store = Arc::new(CacheStore::new(100));
        let reaper = spawn_reaper(store.clone(), Duration::from_millis(30));
        reaper.join().await;

        store
            .put("after_stop".to_string(), compiled(), Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.contains("after_stop").await);
        assert_eq!(store.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_reaper() {
        let store = Arc::new(CacheStore::new(100));
        let reaper = spawn_reaper(store.clone(), Duration::from_millis(30));
        drop(reaper);

        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .put("orphan".to_string(), compiled(), Duration::from_millis(1))
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.contains("orphan").await);
    }
}
