use crate::domain::draft::TransactionDraft;
use crate::domain::ports::{RiskAssessor, TransactionCommitter};
use crate::domain::record::{CommitAck, TransactionRecord};
use crate::domain::risk::RiskResult;
use crate::error::{AnalysisError, SendError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A risk assessor that answers every draft with the same verdict.
///
/// Counts calls so callers can verify that no analysis was issued, or that
/// exactly one was.
#[derive(Clone)]
pub struct StaticRiskAssessor {
    outcome: Result<RiskResult, AnalysisError>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticRiskAssessor {
    pub fn new(risk: RiskResult) -> Self {
        Self {
            outcome: Ok(risk),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(error: AnalysisError) -> Self {
        Self {
            outcome: Err(error),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delays every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskAssessor for StaticRiskAssessor {
    async fn analyze(&self, _draft: &TransactionDraft) -> Result<RiskResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.outcome.clone()
    }
}

/// A thread-safe in-memory history of committed records.
///
/// Uses `Arc<RwLock<Vec<TransactionRecord>>>` so clones share one history.
/// Stands in for the commit service in dry runs and tests.
#[derive(Default, Clone)]
pub struct InMemoryHistory {
    records: Arc<RwLock<Vec<TransactionRecord>>>,
    attempts: Arc<AtomicUsize>,
    failures_pending: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl InMemoryHistory {
    /// Creates a new, empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail with a 503.
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    /// Delays every commit by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of commit calls received, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn records(&self) -> Vec<TransactionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl TransactionCommitter for InMemoryHistory {
    async fn commit(&self, record: &TransactionRecord) -> Result<CommitAck, SendError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let failing = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SendError::Status(503));
        }

        let mut records = self.records.write().await;
        records.push(record.clone());
        Ok(CommitAck {
            id: Some(record.id().to_string()),
            timestamp: Some(record.timestamp().to_rfc3339()),
            status: Some(record.status().to_string()),
        })
    }
}
