//! Periodic refresh of registered updaters.
//!
//! Each updater gets its own task. Every tick refreshes the snapshot; every
//! `reinit_rate` ticks the identity maps are reloaded first. Failures are
//! logged and the previously committed snapshot keeps serving queries.

use crate::config::UpdaterConfig;
use crate::mibs::{MibTree, MibUpdater};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Drives one updater's refresh cycle.
pub struct UpdaterRunner {
    updater: Arc<dyn MibUpdater>,
    frequency: Duration,
    reinit_rate: u32,
}

impl UpdaterRunner {
    pub fn new(updater: Arc<dyn MibUpdater>, frequency: Duration, reinit_rate: u32) -> Self {
        Self {
            updater,
            frequency,
            reinit_rate: reinit_rate.max(1),
        }
    }

    /// Runs until `shutdown` flips to true or its sender is dropped.
    ///
    /// The updater was seeded at construction, so the first refresh happens
    /// one period after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.frequency);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;

        let mut tick: u64 = 0;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tick += 1;
                    self.tick(tick).await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(updater = self.updater.name(), "Updater stopped");
    }

    /// One refresh cycle; reinit first when `tick` is a multiple of the
    /// reinit rate.
    #[instrument(skip(self), fields(updater = self.updater.name()))]
    pub async fn tick(&self, tick: u64) {
        if tick % u64::from(self.reinit_rate) == 0 {
            if let Err(e) = self.updater.reinit().await {
                if e.is_fatal() {
                    error!(error = %e, "Reinit failed, keeping previous identity");
                } else {
                    warn!(error = %e, "Reinit failed, keeping previous identity");
                }
            }
        }

        match self.updater.refresh().await {
            Ok(()) => debug!("Refresh complete"),
            Err(e) => warn!(error = %e, "Refresh failed, serving previous snapshot"),
        }
    }
}

/// Spawns a runner per registered updater.
pub fn spawn_all(
    tree: &MibTree,
    config: &UpdaterConfig,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let frequency = Duration::from_secs(config.frequency_secs);
    tree.updaters()
        .iter()
        .map(|updater| {
            let runner = UpdaterRunner::new(updater.clone(), frequency, config.reinit_rate);
            tokio::spawn(runner.run(shutdown.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SnmpAgentError};
    use crate::mibs::{MibValue, Oid, SubId, UpdaterState};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    #[derive(Default)]
    struct CountingMib {
        prefix: Oid,
        refreshes: AtomicU32,
        reinits: AtomicU32,
        fail_refresh: AtomicBool,
    }

    #[async_trait]
    impl MibUpdater for CountingMib {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn prefix(&self) -> &Oid {
            &self.prefix
        }

        async fn refresh(&self) -> Result<()> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh.load(Ordering::SeqCst) {
                return Err(SnmpAgentError::power_status("unavailable"));
            }
            Ok(())
        }

        async fn reinit(&self) -> Result<()> {
            self.reinits.fetch_add(1, Ordering::SeqCst);
            Err(SnmpAgentError::startup_inconsistency("PORT", "empty"))
        }

        fn value_at(&self, _sub_id: &[u32]) -> Option<MibValue> {
            None
        }

        fn next(&self, _sub_id: &[u32]) -> Option<SubId> {
            None
        }

        fn state(&self) -> UpdaterState {
            UpdaterState::Seeded
        }
    }

    #[tokio::test]
    async fn test_reinit_every_rate_ticks() {
        let mib = Arc::new(CountingMib::default());
        let runner = UpdaterRunner::new(mib.clone(), Duration::from_secs(5), 3);

        for tick in 1..=7 {
            runner.tick(tick).await;
        }

        assert_eq!(mib.refreshes.load(Ordering::SeqCst), 7);
        // Failed reinits do not stop the refresh that follows
        assert_eq!(mib.reinits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_running() {
        let mib = Arc::new(CountingMib::default());
        mib.fail_refresh.store(true, Ordering::SeqCst);
        let runner = UpdaterRunner::new(mib.clone(), Duration::from_secs(5), 60);

        runner.tick(1).await;
        runner.tick(2).await;
        assert_eq!(mib.refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mib = Arc::new(CountingMib::default());
        let runner = UpdaterRunner::new(mib.clone(), Duration::from_millis(10), 60);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(runner.run(rx));
        tokio::time::sleep(Duration::from_millis(55)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(mib.refreshes.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_run_stops_when_sender_dropped() {
        let mib = Arc::new(CountingMib::default());
        let runner = UpdaterRunner::new(mib, Duration::from_secs(3600), 60);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(runner.run(rx));
        drop(tx);
        handle.await.unwrap();
    }
}
