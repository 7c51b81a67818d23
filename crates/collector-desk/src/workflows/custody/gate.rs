use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{DayState, DaySnapshot};

pub const CASH_FLOAT_PATH: &str = "/collector/cash-float";

pub const LABEL_DAY_CLOSED: &str = "Day Closed";
pub const LABEL_AWAITING_CONFIRMATION: &str = "Awaiting Cashier Confirmation";
pub const LABEL_HAND_OVER: &str = "Hand Over Cash";

/// How a refresh treats signals it could not fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFailurePolicy {
    /// Missing signals take their permissive fallback.
    #[default]
    FailOpen,
    /// Any missing signal locks every day-scoped action.
    FailClosed,
}

impl FromStr for StatusFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_open" | "open" => Ok(Self::FailOpen),
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatedAction {
    Approve,
    Disburse,
    Waive,
    Visit,
    Collect,
}

/// Collector screens. Only some of them are day-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Dashboard,
    Applications,
    Disbursements,
    Waivers,
    Visits,
    Route,
    CashFloat,
    CashHandover,
}

impl Destination {
    pub fn path(self) -> &'static str {
        match self {
            Destination::Dashboard => "/collector/dashboard",
            Destination::Applications => "/collector/applications",
            Destination::Disbursements => "/collector/disbursements",
            Destination::Waivers => "/collector/waivers",
            Destination::Visits => "/collector/visits",
            Destination::Route => "/collector/route",
            Destination::CashFloat => CASH_FLOAT_PATH,
            Destination::CashHandover => "/collector/cash-handover",
        }
    }

    pub fn gated_action(self) -> Option<GatedAction> {
        match self {
            Destination::Applications => Some(GatedAction::Approve),
            Destination::Disbursements => Some(GatedAction::Disburse),
            Destination::Waivers => Some(GatedAction::Waive),
            Destination::Visits => Some(GatedAction::Visit),
            Destination::Route => Some(GatedAction::Collect),
            Destination::Dashboard | Destination::CashFloat | Destination::CashHandover => None,
        }
    }

    /// Accepts the last path segment (`disbursements`) or the full path.
    pub fn from_slug(raw: &str) -> Option<Self> {
        let slug = raw.trim().trim_end_matches('/').rsplit('/').next()?;
        match slug.to_ascii_lowercase().as_str() {
            "dashboard" => Some(Destination::Dashboard),
            "applications" => Some(Destination::Applications),
            "disbursements" => Some(Destination::Disbursements),
            "waivers" => Some(Destination::Waivers),
            "visits" | "visit" => Some(Destination::Visits),
            "route" | "collect" => Some(Destination::Route),
            "cash-float" | "cash_float" => Some(Destination::CashFloat),
            "cash-handover" | "cash_handover" => Some(Destination::CashHandover),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum LockReason {
    HandoverPending,
    DayClosed,
    Overdue { date: Option<String> },
    FloatPending,
    StatusUnconfirmed,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::HandoverPending => write!(
                f,
                "Your cash handover is awaiting cashier confirmation"
            ),
            LockReason::DayClosed => write!(f, "Today's operations are already closed"),
            LockReason::Overdue { date: Some(date) } => write!(
                f,
                "Operations for {date} were never closed; ask a manager for an override"
            ),
            LockReason::Overdue { date: None } => write!(
                f,
                "A previous operating day was never closed; ask a manager for an override"
            ),
            LockReason::FloatPending => {
                write!(f, "Accept or reject your pending cash float first")
            }
            LockReason::StatusUnconfirmed => {
                write!(f, "Cash status could not be confirmed; try again shortly")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum NavigationDecision {
    Allow,
    Redirect { to: String, reason: LockReason },
    Deny { reason: LockReason },
}

/// Pure decision over one snapshot. Holds no references so it can be handed
/// to templates or serialized for the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGate {
    day_state: DayState,
    float_pending: bool,
    has_balance: bool,
    day_closed: bool,
    handover_pending: bool,
    overdue_date: Option<String>,
    unconfirmed: bool,
}

impl ActionGate {
    pub fn new(day_state: DayState, float_pending: bool, has_balance: bool) -> Self {
        Self {
            day_state,
            float_pending,
            has_balance,
            day_closed: day_state == DayState::Closed,
            handover_pending: day_state == DayState::PendingConfirmation,
            overdue_date: None,
            unconfirmed: false,
        }
    }

    pub fn evaluate(snapshot: &DaySnapshot, policy: StatusFailurePolicy) -> Self {
        Self {
            day_state: snapshot.day_state,
            float_pending: snapshot.float.pending(),
            has_balance: snapshot.balance.is_some(),
            day_closed: snapshot
                .balance
                .as_ref()
                .is_some_and(|balance| balance.is_day_closed),
            handover_pending: snapshot.handover_pending,
            overdue_date: snapshot.overdue.date.clone(),
            unconfirmed: policy == StatusFailurePolicy::FailClosed
                && !snapshot.is_fully_confirmed(),
        }
    }

    pub fn day_state(&self) -> DayState {
        self.day_state
    }

    pub fn actions_locked(&self) -> bool {
        self.day_state.locks_actions() || self.unconfirmed
    }

    pub fn disbursement_locked(&self) -> bool {
        self.actions_locked() || self.float_pending
    }

    pub fn can_handover(&self) -> bool {
        self.has_balance
    }

    /// Follows the raw closure and handover flags so the button still reads
    /// correctly while an overdue lock hides them from the day state.
    pub fn handover_label(&self) -> &'static str {
        if self.day_closed {
            LABEL_DAY_CLOSED
        } else if self.handover_pending {
            LABEL_AWAITING_CONFIRMATION
        } else {
            LABEL_HAND_OVER
        }
    }

    /// Why day-scoped actions are locked, if they are.
    pub fn lock_reason(&self) -> Option<LockReason> {
        match self.day_state {
            DayState::OverdueLocked => Some(LockReason::Overdue {
                date: self.overdue_date.clone(),
            }),
            DayState::Closed => Some(LockReason::DayClosed),
            DayState::PendingConfirmation => Some(LockReason::HandoverPending),
            DayState::Open if self.unconfirmed => Some(LockReason::StatusUnconfirmed),
            DayState::Open => None,
        }
    }

    pub fn check(&self, action: GatedAction) -> Result<(), LockReason> {
        if let Some(reason) = self.lock_reason() {
            return Err(reason);
        }
        if action == GatedAction::Disburse && self.float_pending {
            return Err(LockReason::FloatPending);
        }
        Ok(())
    }

    /// Float denials send the collector to the float screen; every other
    /// denial stays on the current screen.
    pub fn navigate(&self, destination: Destination) -> NavigationDecision {
        let Some(action) = destination.gated_action() else {
            return NavigationDecision::Allow;
        };

        match self.check(action) {
            Ok(()) => NavigationDecision::Allow,
            Err(LockReason::FloatPending) => NavigationDecision::Redirect {
                to: CASH_FLOAT_PATH.to_string(),
                reason: LockReason::FloatPending,
            },
            Err(reason) => NavigationDecision::Deny { reason },
        }
    }

    pub fn summary(&self) -> GateSummary {
        GateSummary {
            day_state: self.day_state,
            actions_locked: self.actions_locked(),
            disbursement_locked: self.disbursement_locked(),
            can_handover: self.can_handover(),
            handover_label: self.handover_label().to_string(),
            lock_reason: self.lock_reason().map(|reason| reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateSummary {
    pub day_state: DayState,
    pub actions_locked: bool,
    pub disbursement_locked: bool,
    pub can_handover: bool,
    pub handover_label: String,
    pub lock_reason: Option<String>,
}
