use super::draft::TransactionDraft;
use super::record::{CommitAck, TransactionRecord};
use super::risk::RiskResult;
use crate::error::{AnalysisError, SendError};
use async_trait::async_trait;

/// The external Risk Scoring Service. One call is one scoring event.
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    async fn analyze(&self, draft: &TransactionDraft) -> Result<RiskResult, AnalysisError>;
}

/// The external Transaction Commit Service.
#[async_trait]
pub trait TransactionCommitter: Send + Sync {
    async fn commit(&self, record: &TransactionRecord) -> Result<CommitAck, SendError>;
}

pub type RiskAssessorBox = Box<dyn RiskAssessor>;
pub type TransactionCommitterBox = Box<dyn TransactionCommitter>;
