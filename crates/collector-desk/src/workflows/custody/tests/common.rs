use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::workflows::custody::{
    CashBalanceSnapshot, CustodyMonitor, FloatOffer, HandoverConfirmation, HandoverRecord,
    OverdueStatus, StatusFailurePolicy, StatusFetchError, StatusSource,
};

pub(super) const COLLECTOR: &str = "42";

/// In-memory status source whose answers can be swapped between refreshes.
pub(super) struct ScriptedSource {
    balance: Mutex<Result<Option<CashBalanceSnapshot>, StatusFetchError>>,
    floats: Mutex<Result<Vec<FloatOffer>, StatusFetchError>>,
    handovers: Mutex<Result<Vec<HandoverRecord>, StatusFetchError>>,
    overdue: Mutex<Result<OverdueStatus, StatusFetchError>>,
    balance_calls: AtomicUsize,
}

impl ScriptedSource {
    pub(super) fn open_day() -> Self {
        Self {
            balance: Mutex::new(Ok(Some(balance(false)))),
            floats: Mutex::new(Ok(Vec::new())),
            handovers: Mutex::new(Ok(Vec::new())),
            overdue: Mutex::new(Ok(OverdueStatus::default())),
            balance_calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn set_balance(&self, value: Result<Option<CashBalanceSnapshot>, StatusFetchError>) {
        *self.balance.lock().expect("balance mutex") = value;
    }

    pub(super) fn set_floats(&self, value: Result<Vec<FloatOffer>, StatusFetchError>) {
        *self.floats.lock().expect("floats mutex") = value;
    }

    pub(super) fn set_handovers(&self, value: Result<Vec<HandoverRecord>, StatusFetchError>) {
        *self.handovers.lock().expect("handovers mutex") = value;
    }

    pub(super) fn set_overdue(&self, value: Result<OverdueStatus, StatusFetchError>) {
        *self.overdue.lock().expect("overdue mutex") = value;
    }

    pub(super) fn refreshes(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn cash_balance(
        &self,
        _collector_id: &str,
    ) -> Result<Option<CashBalanceSnapshot>, StatusFetchError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance.lock().expect("balance mutex").clone()
    }

    async fn pending_floats(&self) -> Result<Vec<FloatOffer>, StatusFetchError> {
        self.floats.lock().expect("floats mutex").clone()
    }

    async fn pending_handovers(&self) -> Result<Vec<HandoverRecord>, StatusFetchError> {
        self.handovers.lock().expect("handovers mutex").clone()
    }

    async fn overdue_status(
        &self,
        _collector_id: &str,
    ) -> Result<OverdueStatus, StatusFetchError> {
        self.overdue.lock().expect("overdue mutex").clone()
    }
}

pub(super) fn balance(closed: bool) -> CashBalanceSnapshot {
    CashBalanceSnapshot {
        collector_id: Some(COLLECTOR.to_string()),
        balance_date: Some("2025-10-01".to_string()),
        opening_float: 5000.0,
        total_collections: 1200.0,
        total_disbursements: 3000.0,
        current_balance: 3200.0,
        daily_cap: 10_000.0,
        available_for_disbursement: 3200.0,
        is_float_confirmed: true,
        is_day_closed: closed,
    }
}

pub(super) fn handover_for(collector_id: &str) -> HandoverRecord {
    HandoverRecord {
        id: Some("h-1".to_string()),
        collector_id: Some(collector_id.to_string()),
        submitted_at: Some("2025-10-01T17:30:00Z".to_string()),
        actual_handover: Some(3200.0),
        confirmation: HandoverConfirmation::Pending,
    }
}

pub(super) fn float_offer(id: u32) -> FloatOffer {
    FloatOffer {
        id: Some(id.to_string()),
        amount: 2000.0,
        daily_cap: 10_000.0,
        float_date: Some("2025-10-01".to_string()),
        cashier_first_name: Some("Liza".to_string()),
        cashier_last_name: Some("Santos".to_string()),
        notes: None,
    }
}

pub(super) fn overdue(active_override: bool) -> OverdueStatus {
    OverdueStatus {
        is_overdue: true,
        date: Some("2025-09-30".to_string()),
        active_override,
    }
}

pub(super) fn monitor(
    source: Arc<ScriptedSource>,
    policy: StatusFailurePolicy,
) -> CustodyMonitor {
    CustodyMonitor::new(source, COLLECTOR, policy)
}
