use crate::config::ServiceConfig;
use crate::domain::draft::{RecipientId, TransactionDraft};
use crate::domain::ports::{RiskAssessor, TransactionCommitter};
use crate::domain::record::{CommitAck, TransactionRecord};
use crate::domain::risk::RiskResult;
use crate::error::{AnalysisError, SendError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const SEND_PATH: &str = "/api/send";

/// Request body shared by the analyze and send endpoints.
#[derive(Debug, Serialize)]
struct PaymentPayload<'a> {
    #[serde(rename = "recipientUPI")]
    recipient_upi: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    remarks: &'a str,
}

impl<'a> PaymentPayload<'a> {
    fn new(recipient: &'a RecipientId, amount: Decimal, remarks: Option<&'a str>) -> Self {
        Self {
            recipient_upi: recipient.as_str(),
            amount,
            remarks: remarks.unwrap_or_default(),
        }
    }
}

impl<'a> From<&'a TransactionDraft> for PaymentPayload<'a> {
    fn from(draft: &'a TransactionDraft) -> Self {
        Self::new(draft.recipient(), draft.amount().value(), draft.remarks())
    }
}

impl<'a> From<&'a TransactionRecord> for PaymentPayload<'a> {
    fn from(record: &'a TransactionRecord) -> Self {
        Self::new(record.recipient(), record.amount().value(), record.remarks())
    }
}

/// HTTP client for the risk scoring and transaction commit services.
///
/// Implements both ports over one `reqwest::Client`; `Clone` shares the
/// underlying connection pool. Every call is a single attempt.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    config: ServiceConfig,
}

impl HttpGateway {
    pub fn new(config: ServiceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    async fn post(
        &self,
        path: &str,
        payload: &PaymentPayload<'_>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = self.config.endpoint(path);
        debug!(%url, recipient = payload.recipient_upi, "posting payment payload");
        self.client.post(url).json(payload).send().await
    }
}

#[async_trait]
impl RiskAssessor for HttpGateway {
    async fn analyze(&self, draft: &TransactionDraft) -> Result<RiskResult, AnalysisError> {
        let response = self
            .post(ANALYZE_PATH, &PaymentPayload::from(draft))
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout(self.config.request_timeout)
                } else {
                    AnalysisError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status(status.as_u16()));
        }

        response
            .json::<RiskResult>()
            .await
            .map_err(|e| AnalysisError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TransactionCommitter for HttpGateway {
    async fn commit(&self, record: &TransactionRecord) -> Result<CommitAck, SendError> {
        let response = self
            .post(SEND_PATH, &PaymentPayload::from(record))
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SendError::Timeout(self.config.request_timeout)
                } else {
                    SendError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status(status.as_u16()));
        }

        // Any 2xx is an ack; the body only carries optional server metadata.
        let body = response
            .bytes()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }
}
