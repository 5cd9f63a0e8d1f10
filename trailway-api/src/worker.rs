use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use trailway_seats::LockManager;

/// Runs the lock expiry sweep every `interval` until the task is aborted.
pub fn spawn_expiry_sweeper(locks: Arc<LockManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Expiry sweeper started, interval {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let reclaimed = locks.sweep_expired().await;
            if reclaimed > 0 {
                debug!("Expiry sweep reclaimed {} holds", reclaimed);
            }
        }
    })
}
