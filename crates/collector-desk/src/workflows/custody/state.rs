use super::domain::{CashBalanceSnapshot, DayState, HandoverRecord, OverdueStatus};

/// Derives the day state from the latest fetched signals.
///
/// An unresolved overdue day wins over everything else, then a closed day,
/// then an open handover owned by this collector.
pub fn classify(
    collector_id: &str,
    balance: Option<&CashBalanceSnapshot>,
    handovers: &[HandoverRecord],
    overdue: &OverdueStatus,
) -> DayState {
    if overdue.locks_day() {
        return DayState::OverdueLocked;
    }

    if balance.is_some_and(|snapshot| snapshot.is_day_closed) {
        return DayState::Closed;
    }

    if has_open_handover(collector_id, handovers) {
        return DayState::PendingConfirmation;
    }

    DayState::Open
}

pub fn has_open_handover(collector_id: &str, handovers: &[HandoverRecord]) -> bool {
    handovers
        .iter()
        .any(|handover| handover.is_open() && handover.belongs_to(collector_id))
}
