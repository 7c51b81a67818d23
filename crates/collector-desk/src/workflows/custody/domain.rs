use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::payload::{lenient, resolve_identifier, resolve_number, resolve_string};

/// Collector's cash position for the current operating day. Read-only: the
/// server owns every figure and the client only polls it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashBalanceSnapshot {
    #[serde(alias = "collector_id", deserialize_with = "lenient::optional_identifier")]
    pub collector_id: Option<String>,
    #[serde(alias = "balance_date")]
    pub balance_date: Option<String>,
    #[serde(alias = "opening_float", deserialize_with = "lenient::amount")]
    pub opening_float: f64,
    #[serde(alias = "total_collections", deserialize_with = "lenient::amount")]
    pub total_collections: f64,
    #[serde(alias = "total_disbursements", deserialize_with = "lenient::amount")]
    pub total_disbursements: f64,
    #[serde(alias = "current_balance", deserialize_with = "lenient::amount")]
    pub current_balance: f64,
    #[serde(alias = "daily_cap", deserialize_with = "lenient::amount")]
    pub daily_cap: f64,
    #[serde(
        alias = "available_for_disbursement",
        deserialize_with = "lenient::amount"
    )]
    pub available_for_disbursement: f64,
    #[serde(alias = "is_float_confirmed", deserialize_with = "lenient::flag")]
    pub is_float_confirmed: bool,
    #[serde(alias = "is_day_closed", deserialize_with = "lenient::flag")]
    pub is_day_closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverConfirmation {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl HandoverConfirmation {
    /// Records without a recognizable status came from the pending endpoint
    /// and are treated as pending.
    fn from_status(raw: Option<&str>) -> Self {
        let normalized = raw.map(|value| value.trim().to_ascii_lowercase());
        match normalized.as_deref() {
            Some("confirmed" | "completed" | "received") => Self::Confirmed,
            Some("rejected" | "disputed" | "cancelled") => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

/// End-of-day handover awaiting (or past) cashier confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverRecord {
    pub id: Option<String>,
    pub collector_id: Option<String>,
    pub submitted_at: Option<String>,
    pub actual_handover: Option<f64>,
    #[serde(default)]
    pub confirmation: HandoverConfirmation,
}

const HANDOVER_ID_KEYS: &[&str] = &["id", "handoverId", "handover_id"];
const HANDOVER_COLLECTOR_KEYS: &[&str] = &["collectorId", "collector_id", "collector.id"];
const HANDOVER_SUBMITTED_KEYS: &[&str] = &[
    "submittedAt",
    "submitted_at",
    "handoverDate",
    "handover_date",
    "createdAt",
    "created_at",
];
const HANDOVER_AMOUNT_KEYS: &[&str] = &["actualHandover", "actual_handover", "amount"];
const HANDOVER_STATUS_KEYS: &[&str] = &["status", "confirmationStatus", "confirmation_status"];

impl HandoverRecord {
    /// Reads a handover row of any spelling. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            id: resolve_identifier(fields, HANDOVER_ID_KEYS),
            collector_id: resolve_identifier(fields, HANDOVER_COLLECTOR_KEYS),
            submitted_at: resolve_string(fields, HANDOVER_SUBMITTED_KEYS),
            actual_handover: resolve_number(fields, HANDOVER_AMOUNT_KEYS),
            confirmation: HandoverConfirmation::from_status(
                resolve_string(fields, HANDOVER_STATUS_KEYS).as_deref(),
            ),
        })
    }

    pub fn is_open(&self) -> bool {
        self.confirmation == HandoverConfirmation::Pending
    }

    pub fn belongs_to(&self, collector_id: &str) -> bool {
        self.collector_id
            .as_deref()
            .is_some_and(|owner| owner.trim() == collector_id.trim())
    }
}

/// Cash float issued by a cashier and not yet accepted or rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FloatOffer {
    #[serde(deserialize_with = "lenient::optional_identifier")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::amount")]
    pub amount: f64,
    #[serde(alias = "daily_cap", deserialize_with = "lenient::amount")]
    pub daily_cap: f64,
    #[serde(alias = "float_date")]
    pub float_date: Option<String>,
    #[serde(alias = "cashier_first_name")]
    pub cashier_first_name: Option<String>,
    #[serde(alias = "cashier_last_name")]
    pub cashier_last_name: Option<String>,
    pub notes: Option<String>,
}

impl FloatOffer {
    pub fn cashier_name(&self) -> String {
        let first = self.cashier_first_name.as_deref().unwrap_or_default();
        let last = self.cashier_last_name.as_deref().unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatDecisionState {
    pub pending_count: usize,
}

impl FloatDecisionState {
    pub fn from_offers(offers: &[FloatOffer]) -> Self {
        Self {
            pending_count: offers.len(),
        }
    }

    pub fn pending(&self) -> bool {
        self.pending_count > 0
    }
}

/// Whether the previous operating day was left unclosed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverdueStatus {
    #[serde(alias = "is_overdue", deserialize_with = "lenient::flag")]
    pub is_overdue: bool,
    #[serde(alias = "overdue_date")]
    pub date: Option<String>,
    #[serde(alias = "active_override", deserialize_with = "lenient::flag")]
    pub active_override: bool,
}

impl OverdueStatus {
    pub fn locks_day(&self) -> bool {
        self.is_overdue && !self.active_override
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayState {
    Open,
    PendingConfirmation,
    Closed,
    OverdueLocked,
}

impl DayState {
    pub fn as_str(self) -> &'static str {
        match self {
            DayState::Open => "open",
            DayState::PendingConfirmation => "pending_confirmation",
            DayState::Closed => "closed",
            DayState::OverdueLocked => "overdue_locked",
        }
    }

    pub fn locks_actions(self) -> bool {
        !matches!(self, DayState::Open)
    }
}

/// One of the independently fetched inputs to a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusSignal {
    Balance,
    PendingFloats,
    PendingHandovers,
    Overdue,
}

/// Everything the dashboard needs from one refresh, computed in one place so
/// no field can disagree with another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub collector_id: String,
    pub day_state: DayState,
    pub balance: Option<CashBalanceSnapshot>,
    pub handover_pending: bool,
    pub float: FloatDecisionState,
    pub pending_floats: Vec<FloatOffer>,
    pub overdue: OverdueStatus,
    /// Signals whose fetch failed and were replaced by their fallback.
    pub unconfirmed: Vec<StatusSignal>,
    pub refreshed_at: DateTime<Utc>,
}

impl DaySnapshot {
    pub fn is_fully_confirmed(&self) -> bool {
        self.unconfirmed.is_empty()
    }
}
