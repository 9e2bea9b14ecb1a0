use super::draft::{Amount, RecipientId, TransactionDraft};
use super::risk::RiskResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Completed,
    Cancelled,
    Blocked,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordStatus::Completed => "completed",
            RecordStatus::Cancelled => "cancelled",
            RecordStatus::Blocked => "blocked",
        };
        f.write_str(label)
    }
}

/// Append-only result of a terminal outcome.
///
/// Fields are private: a record is built once from the draft and the risk
/// snapshot at decision time and is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    id: Uuid,
    #[serde(rename = "recipientUPI")]
    recipient: RecipientId,
    amount: Amount,
    remarks: Option<String>,
    timestamp: DateTime<Utc>,
    status: RecordStatus,
    risk_result: RiskResult,
}

impl TransactionRecord {
    pub fn new(draft: &TransactionDraft, risk: &RiskResult, status: RecordStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: draft.recipient().clone(),
            amount: draft.amount(),
            remarks: draft.remarks().map(str::to_string),
            timestamp: Utc::now(),
            status,
            risk_result: risk.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn recipient(&self) -> &RecipientId {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn risk_result(&self) -> &RiskResult {
        &self.risk_result
    }
}

/// Acknowledgement returned by the commit service.
///
/// The server assigns identity, time and status; any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitAck {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub status: Option<String>,
}
