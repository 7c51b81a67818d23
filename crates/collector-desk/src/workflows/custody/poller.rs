use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::monitor::CustodyMonitor;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Re-runs the custody refresh on a fixed interval. The first refresh fires
/// immediately on `start`.
///
/// A monitor is driven by at most one poller. While one holds it, `start` on
/// any other poller for the same monitor does nothing.
pub struct StatusPoller {
    monitor: Arc<CustodyMonitor>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn new(monitor: Arc<CustodyMonitor>, interval: Duration) -> Self {
        Self {
            monitor,
            interval: interval.max(MIN_POLL_INTERVAL),
            task: None,
        }
    }

    pub fn monitor(&self) -> &Arc<CustodyMonitor> {
        &self.monitor
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Must be called from within a tokio runtime. Calling it while already
    /// running leaves the existing timer alone.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        // A finished task still holds the monitor's polling slot.
        let holds_slot = self.task.take().is_some();
        if !holds_slot && !self.monitor.claim_polling() {
            debug!(
                collector_id = self.monitor.collector_id(),
                "monitor already polled elsewhere"
            );
            return;
        }

        let monitor = Arc::clone(&self.monitor);
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                monitor.refresh().await;
            }
        }));

        info!(
            collector_id = self.monitor.collector_id(),
            interval_secs = period.as_secs_f64(),
            "status polling started"
        );
    }

    /// Aborts the loop. A refresh in progress is abandoned and never
    /// published.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.monitor.release_polling();
            info!(
                collector_id = self.monitor.collector_id(),
                "status polling stopped"
            );
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Lifetime of the dashboard view. Polling runs exactly as long as this
/// guard is alive.
///
/// Entering twice for the same monitor yields one timer: the second guard
/// reports `is_polling() == false` and leaves the first guard in charge.
pub struct ActiveDashboard {
    poller: StatusPoller,
}

impl ActiveDashboard {
    pub fn enter(monitor: Arc<CustodyMonitor>, interval: Duration) -> Self {
        let mut poller = StatusPoller::new(monitor, interval);
        poller.start();
        Self { poller }
    }

    pub fn monitor(&self) -> &Arc<CustodyMonitor> {
        self.poller.monitor()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub fn leave(self) {}
}
