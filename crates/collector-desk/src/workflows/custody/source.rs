use async_trait::async_trait;

use super::domain::{CashBalanceSnapshot, FloatOffer, HandoverRecord, OverdueStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusFetchError {
    #[error("status endpoint unreachable: {0}")]
    Transport(String),
    #[error("status endpoint answered {status}")]
    Status { status: u16 },
    #[error("status payload unreadable: {0}")]
    Decode(String),
}

/// The four independently fetched custody signals.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// `Ok(None)` when the collector has no balance row for today.
    async fn cash_balance(
        &self,
        collector_id: &str,
    ) -> Result<Option<CashBalanceSnapshot>, StatusFetchError>;

    async fn pending_floats(&self) -> Result<Vec<FloatOffer>, StatusFetchError>;

    /// Every pending handover visible to the caller; ownership is filtered by
    /// the classifier.
    async fn pending_handovers(&self) -> Result<Vec<HandoverRecord>, StatusFetchError>;

    async fn overdue_status(&self, collector_id: &str) -> Result<OverdueStatus, StatusFetchError>;
}
