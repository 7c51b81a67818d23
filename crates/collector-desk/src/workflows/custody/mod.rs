//! Daily cash custody: which day-scoped actions a collector may take.
//!
//! Four signals are fetched independently (balance, pending floats, pending
//! handovers, overdue status), folded into one [`DaySnapshot`], and judged
//! by the [`ActionGate`].

mod domain;
mod gate;
mod handover;
mod monitor;
mod poller;
mod source;
mod state;

#[cfg(test)]
mod tests;

pub use domain::{
    CashBalanceSnapshot, DaySnapshot, DayState, FloatDecisionState, FloatOffer,
    HandoverConfirmation, HandoverRecord, OverdueStatus, StatusSignal,
};
pub use gate::{
    ActionGate, Destination, GateSummary, GatedAction, LockReason, NavigationDecision,
    StatusFailurePolicy, CASH_FLOAT_PATH, LABEL_AWAITING_CONFIRMATION, LABEL_DAY_CLOSED,
    LABEL_HAND_OVER,
};
pub use handover::{
    BalanceHealth, HandoverPlan, HandoverRejection, HandoverSubmission, HealthBand,
    VarianceKind, VARIANCE_TOLERANCE,
};
pub use monitor::CustodyMonitor;
pub use poller::{ActiveDashboard, StatusPoller, DEFAULT_POLL_INTERVAL};
pub use source::{StatusFetchError, StatusSource};
pub use state::{classify, has_open_handover};
