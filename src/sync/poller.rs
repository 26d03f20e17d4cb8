use super::engine::SyncEngine;
use crate::runtime::{self, AsyncHandle};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Periodic poll task bound to the lifetime of this value.
///
/// The first poll runs immediately, then one per `interval`. A failed poll
/// is logged by the engine and the next tick tries again. Dropping the
/// `Poller` (or calling [`Poller::stop`]) cancels the task.
pub struct Poller {
    handle: Option<Box<dyn AsyncHandle>>,
    interval: Duration,
}

impl Poller {
    /// Spawn the poll loop. Requires a running runtime (see [`crate::runtime`]).
    pub fn start(engine: SyncEngine, interval: Duration) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        log::debug!("starting poller every {:?}", interval);

        let handle = runtime::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures are already logged and published by the engine.
                let _ = engine.poll().await;
            }
        });

        Self {
            handle: Some(handle),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
            log::debug!("poller stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
