use crate::Manager;
use log::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Period between heartbeat comments when none is configured.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Spawns the liveness keeper: every `period` a comment frame is written to
/// each open connection so idle streams are not cut by proxies or load
/// balancers. Dead connections are not pruned here; their own close signal
/// unregisters them.
///
/// The first heartbeat goes out one full `period` after spawning. A zero
/// `period` falls back to [`DEFAULT_HEARTBEAT_INTERVAL`].
pub fn spawn(manager: Arc<Manager>, period: Duration) -> JoinHandle<()> {
    let period = if period.is_zero() {
        warn!(
            "SSE heartbeat period must be non-zero, using {}s",
            DEFAULT_HEARTBEAT_INTERVAL.as_secs()
        );
        DEFAULT_HEARTBEAT_INTERVAL
    } else {
        period
    };
    info!("Starting SSE heartbeat every {}s", period.as_secs());

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval completes its first tick immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            manager.heartbeat();
        }
    })
}
