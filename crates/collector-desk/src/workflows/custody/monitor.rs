use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::domain::{DaySnapshot, FloatDecisionState, StatusSignal};
use super::gate::{ActionGate, StatusFailurePolicy};
use super::source::{StatusFetchError, StatusSource};
use super::state::{classify, has_open_handover};

/// Owns the refresh step for one collector and publishes each snapshot.
pub struct CustodyMonitor {
    source: Arc<dyn StatusSource>,
    collector_id: String,
    policy: StatusFailurePolicy,
    latest: watch::Sender<Option<DaySnapshot>>,
    polled: AtomicBool,
}

impl CustodyMonitor {
    pub fn new(
        source: Arc<dyn StatusSource>,
        collector_id: impl Into<String>,
        policy: StatusFailurePolicy,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            source,
            collector_id: collector_id.into(),
            policy,
            latest,
            polled: AtomicBool::new(false),
        }
    }

    pub fn collector_id(&self) -> &str {
        &self.collector_id
    }

    pub fn policy(&self) -> StatusFailurePolicy {
        self.policy
    }

    /// Whether a poller currently drives this monitor.
    pub fn is_polled(&self) -> bool {
        self.polled.load(Ordering::SeqCst)
    }

    /// Takes the single polling slot. Returns false if another poller has it.
    pub(crate) fn claim_polling(&self) -> bool {
        self.polled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn release_polling(&self) {
        self.polled.store(false, Ordering::SeqCst);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DaySnapshot>> {
        self.latest.subscribe()
    }

    pub fn latest(&self) -> Option<DaySnapshot> {
        self.latest.borrow().clone()
    }

    pub fn gate(&self) -> Option<ActionGate> {
        self.latest
            .borrow()
            .as_ref()
            .map(|snapshot| ActionGate::evaluate(snapshot, self.policy))
    }

    /// Fetches all four signals concurrently. A failed fetch falls back to its
    /// permissive default and is recorded in `unconfirmed`; the gate decides
    /// whether that matters.
    pub async fn refresh(&self) -> DaySnapshot {
        let collector_id = self.collector_id.as_str();
        let (balance, floats, handovers, overdue) = tokio::join!(
            self.source.cash_balance(collector_id),
            self.source.pending_floats(),
            self.source.pending_handovers(),
            self.source.overdue_status(collector_id),
        );

        let mut unconfirmed = Vec::new();
        let balance = settle(StatusSignal::Balance, balance, &mut unconfirmed);
        let pending_floats = settle(StatusSignal::PendingFloats, floats, &mut unconfirmed);
        let handovers = settle(StatusSignal::PendingHandovers, handovers, &mut unconfirmed);
        let overdue = settle(StatusSignal::Overdue, overdue, &mut unconfirmed);

        let day_state = classify(collector_id, balance.as_ref(), &handovers, &overdue);
        let snapshot = DaySnapshot {
            collector_id: self.collector_id.clone(),
            day_state,
            handover_pending: has_open_handover(collector_id, &handovers),
            float: FloatDecisionState::from_offers(&pending_floats),
            balance,
            pending_floats,
            overdue,
            unconfirmed,
            refreshed_at: Utc::now(),
        };

        debug!(
            collector_id,
            day_state = snapshot.day_state.as_str(),
            unconfirmed = snapshot.unconfirmed.len(),
            "custody snapshot refreshed"
        );
        self.latest.send_replace(Some(snapshot.clone()));
        snapshot
    }
}

fn settle<T: Default>(
    signal: StatusSignal,
    outcome: Result<T, StatusFetchError>,
    unconfirmed: &mut Vec<StatusSignal>,
) -> T {
    match outcome {
        Ok(value) => value,
        Err(err) => {
            warn!(?signal, error = %err, "status fetch failed; using fallback");
            unconfirmed.push(signal);
            T::default()
        }
    }
}

impl std::fmt::Debug for CustodyMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyMonitor")
            .field("collector_id", &self.collector_id)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
