use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::calculation::{
    ApproveForm, CalculationRequest, CalculationRequestBuilder, FormOverrides,
    LoanApplicationRecord,
};
use crate::workflows::custody::{
    ActionGate, BalanceHealth, CustodyMonitor, DaySnapshot, Destination, GateSummary,
    HandoverPlan, NavigationDecision, StatusFailurePolicy, StatusSource,
};
use crate::workflows::payload::{collection_shape, into_collection, CollectionShape};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DeskServiceError {
    #[error("collector id must be letters, digits, '-' or '_'")]
    InvalidCollector,
    #[error("unknown destination '{0}'")]
    UnknownDestination(String),
    #[error("application payload must be a JSON object")]
    InvalidApplication,
}

/// Refreshed day state plus the derived figures the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStateView {
    pub snapshot: DaySnapshot,
    pub gate: GateSummary,
    pub expected_handover: Option<f64>,
    pub balance_health: Option<BalanceHealth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecisionView {
    pub collector_id: String,
    pub destination: Destination,
    pub path: &'static str,
    pub decision: NavigationDecision,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequestInput {
    pub application: Value,
    #[serde(default)]
    pub overrides: FormOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequestView {
    pub form: ApproveForm,
    pub request: CalculationRequest,
    pub term_days: u32,
    pub valid: bool,
    pub unmapped_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnwrapView {
    pub shape: &'static str,
    pub count: usize,
    pub items: Vec<Value>,
}

/// Facade the gateway routes call into. Every request refreshes a monitor
/// built for it; nothing is kept per collector between requests.
pub struct CollectorDeskService<S> {
    source: Arc<S>,
    policy: StatusFailurePolicy,
}

impl<S> CollectorDeskService<S>
where
    S: StatusSource + 'static,
{
    pub fn new(source: Arc<S>, policy: StatusFailurePolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> StatusFailurePolicy {
        self.policy
    }

    pub fn monitor(&self, collector_id: &str) -> Result<CustodyMonitor, DeskServiceError> {
        let collector_id = collector_id.trim();
        if !is_collector_id(collector_id) {
            return Err(DeskServiceError::InvalidCollector);
        }

        let source: Arc<dyn StatusSource> = self.source.clone();
        Ok(CustodyMonitor::new(source, collector_id, self.policy))
    }

    pub async fn day_state(&self, collector_id: &str) -> Result<DayStateView, DeskServiceError> {
        let monitor = self.monitor(collector_id)?;
        let snapshot = monitor.refresh().await;
        let gate = ActionGate::evaluate(&snapshot, self.policy);

        Ok(DayStateView {
            expected_handover: snapshot
                .balance
                .as_ref()
                .map(|balance| HandoverPlan::from_balance(balance).expected_handover()),
            balance_health: snapshot.balance.as_ref().map(BalanceHealth::from_balance),
            gate: gate.summary(),
            snapshot,
        })
    }

    pub async fn gate_decision(
        &self,
        collector_id: &str,
        destination: &str,
    ) -> Result<GateDecisionView, DeskServiceError> {
        let destination = Destination::from_slug(destination)
            .ok_or_else(|| DeskServiceError::UnknownDestination(destination.to_string()))?;
        let monitor = self.monitor(collector_id)?;
        let snapshot = monitor.refresh().await;
        let gate = ActionGate::evaluate(&snapshot, self.policy);

        Ok(GateDecisionView {
            collector_id: snapshot.collector_id,
            destination,
            path: destination.path(),
            decision: gate.navigate(destination),
        })
    }
}

/// Collector ids travel as one upstream path segment, so only
/// `[A-Za-z0-9_-]+` is accepted.
pub fn is_collector_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Prefills the approval form from the raw record, applies the collector's
/// edits, and builds the calculator request.
pub fn calculation_request(
    input: CalculationRequestInput,
    now: DateTime<Utc>,
) -> Result<CalculationRequestView, DeskServiceError> {
    if !input.application.is_object() {
        return Err(DeskServiceError::InvalidApplication);
    }

    let record = LoanApplicationRecord::from_value(input.application);
    let builder = CalculationRequestBuilder::for_record(&record);
    let mut form = builder.prefill_form(&record);
    form.apply(&input.overrides);
    let request = builder.build(&form, now);

    Ok(CalculationRequestView {
        valid: request.is_valid(),
        term_days: request.term_days,
        unmapped_keys: record
            .unmapped_keys()
            .into_iter()
            .map(str::to_string)
            .collect(),
        form,
        request,
    })
}

pub fn unwrap_payload(body: Value) -> UnwrapView {
    let shape = match collection_shape(&body) {
        CollectionShape::Bare => "bare",
        CollectionShape::Data => "data",
        CollectionShape::DataResults => "data.results",
        CollectionShape::DataItems => "data.items",
        CollectionShape::Unrecognized => "unrecognized",
    };
    let items = into_collection(body);
    UnwrapView {
        shape,
        count: items.len(),
        items,
    }
}
