use proptest::prelude::*;

use crate::workflows::custody::{
    classify, ActionGate, CashBalanceSnapshot, DayState, HandoverConfirmation, HandoverRecord,
    OverdueStatus,
};

fn day_state() -> impl Strategy<Value = DayState> {
    prop_oneof![
        Just(DayState::Open),
        Just(DayState::PendingConfirmation),
        Just(DayState::Closed),
        Just(DayState::OverdueLocked),
    ]
}

fn handovers() -> impl Strategy<Value = Vec<HandoverRecord>> {
    prop::collection::vec(
        (prop_oneof![Just("42"), Just("7")], any::<bool>()).prop_map(|(owner, open)| {
            HandoverRecord {
                id: None,
                collector_id: Some(owner.to_string()),
                submitted_at: None,
                actual_handover: None,
                confirmation: if open {
                    HandoverConfirmation::Pending
                } else {
                    HandoverConfirmation::Confirmed
                },
            }
        }),
        0..4,
    )
}

proptest! {
    #[test]
    fn disbursement_lock_never_weaker_than_action_lock(
        state in day_state(),
        float_pending in any::<bool>(),
        has_balance in any::<bool>(),
    ) {
        let gate = ActionGate::new(state, float_pending, has_balance);
        prop_assert!(!gate.actions_locked() || gate.disbursement_locked());
        prop_assert_eq!(gate.actions_locked(), state != DayState::Open);
    }

    #[test]
    fn classification_is_deterministic_and_overdue_first(
        closed in proptest::option::of(any::<bool>()),
        records in handovers(),
        is_overdue in any::<bool>(),
        active_override in any::<bool>(),
    ) {
        let balance = closed.map(|is_day_closed| CashBalanceSnapshot {
            is_day_closed,
            ..CashBalanceSnapshot::default()
        });
        let overdue = OverdueStatus { is_overdue, date: None, active_override };

        let first = classify("42", balance.as_ref(), &records, &overdue);
        let second = classify("42", balance.as_ref(), &records, &overdue);
        prop_assert_eq!(first, second);

        if is_overdue && !active_override {
            prop_assert_eq!(first, DayState::OverdueLocked);
        } else if closed == Some(true) {
            prop_assert_eq!(first, DayState::Closed);
        }
    }
}
