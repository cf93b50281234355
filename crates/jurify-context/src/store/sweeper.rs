use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::error::StoreError;
use crate::store::ContextStore;

/// Cancellation handle for a running sweeper task.
///
/// Dropping the handle leaves the task running; the store keeps its own
/// handle and cancels it in [`ContextStore::destroy`].
#[derive(Debug)]
pub struct SweepHandle {
    task: AbortHandle,
}

impl SweepHandle {
    pub(crate) fn new(task: AbortHandle) -> Self {
        Self { task }
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the sweep loop on the current runtime.
pub(crate) fn spawn(
    store: Weak<ContextStore>,
    period: Duration,
) -> Result<JoinHandle<()>, StoreError> {
    let rt = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

    Ok(rt.spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                debug!("Context store dropped, sweeper exiting");
                break;
            };
            store.sweep_expired();
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::time::ManualClock;
    use serde_json::json;
    use std::sync::Arc;

    fn store(clock: Arc<ManualClock>) -> Arc<ContextStore> {
        let cfg = StoreConfig::default()
            .with_capacity(10)
            .with_ttl_ms(1_000)
            .with_cleanup_interval_ms(500);
        ContextStore::with_clock(cfg, clock)
    }

    fn value() -> crate::store::ContextMap {
        json!({"x": 1}).as_object().cloned().unwrap()
    }

    #[test]
    fn test_start_without_runtime_fails() {
        let s = store(Arc::new(ManualClock::new(0)));
        assert!(matches!(s.start_sweeper(), Err(StoreError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_removes_write_only_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let s = store(clock.clone());
        let _handle = s.start_sweeper().unwrap();

        s.set("lead-1", value());
        clock.set(1_500);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(s.len(), 0);
        assert_eq!(s.stats().sweeps_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_halts_sweep() {
        let clock = Arc::new(ManualClock::new(0));
        let s = store(clock.clone());
        let handle = s.start_sweeper().unwrap();

        s.set("lead-1", value());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(s.stats().sweeps_total, 1);

        s.destroy();
        assert_eq!(s.len(), 0);

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(s.stats().sweeps_total, 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_sweeper() {
        let s = store(Arc::new(ManualClock::new(0)));
        let first = s.start_sweeper().unwrap();
        let second = s.start_sweeper().unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(first.is_finished());
        assert!(!second.is_finished());
        assert_eq!(s.stats().sweeps_total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_store_dropped() {
        let s = store(Arc::new(ManualClock::new(0)));
        let handle = s.start_sweeper().unwrap();
        drop(s);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweeper_started_during_destroy_never_outlives_it() {
        for _ in 0..200 {
            let s = store(Arc::new(ManualClock::new(0)));
            let racer = s.clone();
            let destroyer = std::thread::spawn(move || racer.destroy());
            let started = s.start_sweeper();
            destroyer.join().unwrap();

            assert!(s.is_destroyed());
            match started {
                Ok(handle) => {
                    for _ in 0..200 {
                        if handle.is_finished() {
                            break;
                        }
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                    assert!(handle.is_finished(), "sweeper kept running after destroy");
                }
                Err(e) => assert!(matches!(e, StoreError::Destroyed)),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_sweeping() {
        let s = store(Arc::new(ManualClock::new(0)));
        let handle = s.start_sweeper().unwrap();
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(handle.is_finished());
        assert_eq!(s.stats().sweeps_total, 0);
    }
}
