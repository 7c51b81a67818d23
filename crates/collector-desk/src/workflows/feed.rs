use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::workflows::calculation::LoanApplicationRecord;
use crate::workflows::payload::into_collection;

/// Lists the collector screens load on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Applications,
    PendingDisbursements,
    PendingWaivers,
    Customers,
}

impl CollectionKind {
    /// Path segments relative to the lending API base. The collector id is
    /// one segment and is percent-encoded when the URL is built.
    pub fn segments(self, collector_id: &str) -> Vec<&str> {
        match self {
            CollectionKind::Applications => vec!["collectors", collector_id, "applications"],
            CollectionKind::PendingDisbursements => vec!["disbursements", "pending"],
            CollectionKind::PendingWaivers => vec!["waivers", "pending"],
            CollectionKind::Customers => vec!["customers"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("list endpoint unreachable: {0}")]
    Transport(String),
    #[error("list endpoint answered {status}")]
    Status { status: u16 },
    #[error("list payload unreadable: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Raw response body; unwrapping happens in the feed.
    async fn fetch_collection(
        &self,
        kind: CollectionKind,
        collector_id: &str,
    ) -> Result<Value, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTicket {
    pub kind: CollectionKind,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedList {
    pub sequence: u64,
    pub items: Vec<Value>,
    pub loaded_at: DateTime<Utc>,
}

/// Latest loaded list per kind.
///
/// Fetches are never cancelled and whichever resolves last is what the
/// screen shows, even if it was requested first.
#[derive(Debug, Default)]
pub struct CollectionFeed {
    sequence: AtomicU64,
    lists: Mutex<HashMap<CollectionKind, FeedList>>,
}

impl CollectionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, kind: CollectionKind) -> FeedTicket {
        FeedTicket {
            kind,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Stores `items` for the ticket's kind and returns how many were kept.
    pub fn apply(&self, ticket: FeedTicket, items: Vec<Value>) -> usize {
        let count = items.len();
        let mut lists = match self.lists.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = lists.get(&ticket.kind) {
            if previous.sequence > ticket.sequence {
                debug!(
                    kind = ?ticket.kind,
                    sequence = ticket.sequence,
                    replaced = previous.sequence,
                    "older request resolved last"
                );
            }
        }

        lists.insert(
            ticket.kind,
            FeedList {
                sequence: ticket.sequence,
                items,
                loaded_at: Utc::now(),
            },
        );
        count
    }

    pub fn current(&self, kind: CollectionKind) -> Option<FeedList> {
        let lists = match self.lists.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lists.get(&kind).cloned()
    }

    pub fn applications(&self) -> Vec<LoanApplicationRecord> {
        self.current(CollectionKind::Applications)
            .map(|list| {
                list.items
                    .into_iter()
                    .map(LoanApplicationRecord::from_value)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fetches and applies one list. A failed fetch leaves the previous list
    /// in place.
    pub async fn load(
        &self,
        source: &dyn CollectionSource,
        kind: CollectionKind,
        collector_id: &str,
    ) -> Result<usize, FeedError> {
        let ticket = self.begin(kind);
        let body = source.fetch_collection(kind, collector_id).await?;
        Ok(self.apply(ticket, into_collection(body)))
    }
}
