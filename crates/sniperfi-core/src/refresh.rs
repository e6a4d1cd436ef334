//! Periodic dashboard refresh
//!
//! A background task takes a snapshot on every tick and publishes it on a
//! watch channel. Dropping the handle cancels the task.
//!
//! The task only reads through the registry cache. The one registry write
//! it can cause is installing the engine-reported parent when no parent is
//! known yet, the same thing any first `get_parent` call does.

use crate::cancel::CancelToken;
use crate::dashboard::{self, DashboardSnapshot};
use crate::FleetRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Spawner for the refresh task
pub struct DashboardRefresher;

/// Owner of a running refresh task
pub struct RefresherHandle {
    receiver: watch::Receiver<Option<DashboardSnapshot>>,
    cancel: CancelToken,
    task: Option<JoinHandle<()>>,
}

impl DashboardRefresher {
    /// Start refreshing every `interval` until `cancel` fires or the handle is dropped
    pub fn spawn(
        registry: Arc<FleetRegistry>,
        interval: Duration,
        history_len: usize,
        cancel: CancelToken,
    ) -> RefresherHandle {
        let (sender, receiver) = watch::channel(None);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Dashboard refresh started ({}ms)", interval.as_millis());

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let snapshot = dashboard::snapshot(&registry, history_len).await;
                        debug!("Dashboard refreshed ({} errors)", snapshot.errors.len());
                        if sender.send(Some(snapshot)).is_err() {
                            break;
                        }
                    }
                }
            }
            info!("Dashboard refresh stopped");
        });

        RefresherHandle {
            receiver,
            cancel,
            task: Some(task),
        }
    }
}

impl RefresherHandle {
    /// Latest published snapshot
    pub fn latest(&self) -> Option<DashboardSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Additional receiver for the snapshot stream
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardSnapshot>> {
        self.receiver.clone()
    }

    /// Wait for the next snapshot; `None` once the task has stopped
    pub async fn next(&mut self) -> Option<DashboardSnapshot> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }

    /// Cancel and wait for the task to finish
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sniperfi_bridge::{commands, MockBridge, RetryPolicy};

    fn registry(bridge: &Arc<MockBridge>) -> Arc<FleetRegistry> {
        bridge
            .on(commands::INFO, Ok(json!({"public_key": null})))
            .on(commands::COUNT, Ok(json!({"count": 3})));
        Arc::new(FleetRegistry::new(
            bridge.clone(),
            Duration::from_millis(1),
            RetryPolicy::no_retry(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_on_every_tick() {
        let bridge = Arc::new(MockBridge::new());
        let mut handle = DashboardRefresher::spawn(
            registry(&bridge),
            Duration::from_secs(30),
            5,
            CancelToken::new(),
        );

        let first = handle.next().await.unwrap();
        assert_eq!(first.wallet_count, Some(3));
        handle.next().await.unwrap();
        assert!(bridge.call_count(commands::COUNT) >= 2);
        assert!(handle.latest().is_some());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let bridge = Arc::new(MockBridge::new());
        let cancel = CancelToken::new();
        let mut receiver = {
            let handle = DashboardRefresher::spawn(
                registry(&bridge),
                Duration::from_secs(30),
                5,
                cancel.clone(),
            );
            handle.subscribe()
        };

        assert!(cancel.is_cancelled());
        // Sender goes away once the task observes cancellation
        while receiver.changed().await.is_ok() {}
    }
}
