use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::custody::{
    CashBalanceSnapshot, FloatOffer, HandoverConfirmation, HandoverRecord, OverdueStatus,
    StatusFailurePolicy, StatusFetchError, StatusSource,
};
use crate::workflows::desk::CollectorDeskService;

/// Status source with fixed answers per test.
#[derive(Debug, Clone, Default)]
pub(super) struct FixedSource {
    pub(super) closed: bool,
    pub(super) handover_owner: Option<&'static str>,
    pub(super) floats: usize,
    pub(super) overdue: bool,
    pub(super) overdue_unreachable: bool,
    /// Balance fetches, shared between clones.
    pub(super) balance_reads: Arc<AtomicUsize>,
}

impl FixedSource {
    pub(super) fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusSource for FixedSource {
    async fn cash_balance(
        &self,
        collector_id: &str,
    ) -> Result<Option<CashBalanceSnapshot>, StatusFetchError> {
        self.balance_reads.fetch_add(1, Ordering::SeqCst);
        Ok(Some(CashBalanceSnapshot {
            collector_id: Some(collector_id.to_string()),
            opening_float: 5000.0,
            total_collections: 2500.0,
            total_disbursements: 4000.0,
            current_balance: 3500.0,
            is_float_confirmed: true,
            is_day_closed: self.closed,
            ..CashBalanceSnapshot::default()
        }))
    }

    async fn pending_floats(&self) -> Result<Vec<FloatOffer>, StatusFetchError> {
        Ok((0..self.floats)
            .map(|index| FloatOffer {
                id: Some(index.to_string()),
                amount: 1000.0,
                ..FloatOffer::default()
            })
            .collect())
    }

    async fn pending_handovers(&self) -> Result<Vec<HandoverRecord>, StatusFetchError> {
        Ok(self
            .handover_owner
            .map(|owner| HandoverRecord {
                id: Some("h-9".to_string()),
                collector_id: Some(owner.to_string()),
                submitted_at: None,
                actual_handover: Some(3500.0),
                confirmation: HandoverConfirmation::Pending,
            })
            .into_iter()
            .collect())
    }

    async fn overdue_status(&self, _collector_id: &str) -> Result<OverdueStatus, StatusFetchError> {
        if self.overdue_unreachable {
            return Err(StatusFetchError::Transport("connection refused".to_string()));
        }
        Ok(OverdueStatus {
            is_overdue: self.overdue,
            date: self.overdue.then(|| "2025-09-30".to_string()),
            active_override: false,
        })
    }
}

pub(super) fn service(
    source: FixedSource,
    policy: StatusFailurePolicy,
) -> Arc<CollectorDeskService<FixedSource>> {
    Arc::new(CollectorDeskService::new(Arc::new(source), policy))
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub(super) fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub(super) async fn json_body(response: Response, expected: StatusCode) -> Value {
    assert_eq!(response.status(), expected);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
