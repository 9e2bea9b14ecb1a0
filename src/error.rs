use crate::application::machine::Phase;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("Send error: {0}")]
    Send(#[from] SendError),
    #[error("Command rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Workflow session is closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, TriageError>;

/// Reasons a raw payment request is refused before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in recipient UPI and amount.")]
    MissingFields,
    #[error("Invalid UPI ID: must contain \"@\" (e.g. name@upi).")]
    InvalidRecipient,
    #[error("Enter a valid amount.")]
    InvalidAmount,
}

/// Failure of the single `analyze` attempt for a draft.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("risk service unreachable: {0}")]
    Transport(String),
    #[error("risk service responded with status {0}")]
    Status(u16),
    #[error("risk service response could not be decoded: {0}")]
    Decode(String),
    #[error("risk analysis timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure of a `commit` attempt while sending.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("commit service unreachable: {0}")]
    Transport(String),
    #[error("commit service responded with status {0}")]
    Status(u16),
    #[error("commit timed out after {0:?}")]
    Timeout(Duration),
}

/// A command the state machine refused without changing state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("confirmation is not available for a blocked transaction")]
    Blocked,
    #[error("cooldown in progress, {remaining}s remaining")]
    CooldownPending { remaining: u32 },
    #[error("`{command}` is not allowed while {phase}")]
    InvalidState { command: &'static str, phase: Phase },
}

/// What the user is expected to do after a workflow error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Correct the form input and submit again.
    FixInput,
    /// Submit the form again; analysis is never repeated automatically.
    Resubmit,
    /// Press confirm again; the bound risk result is kept.
    Retry,
}

/// An error caught at the orchestrator boundary and kept on the machine for inspection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Send(#[from] SendError),
}

impl WorkflowError {
    /// Short user-facing message.
    pub fn message(&self) -> String {
        match self {
            WorkflowError::Validation(e) => e.to_string(),
            WorkflowError::Analysis(_) => "Failed to analyze. Is the backend running?".to_string(),
            WorkflowError::Send(_) => "Transaction failed. Please try again.".to_string(),
        }
    }

    pub fn next_action(&self) -> NextAction {
        match self {
            WorkflowError::Validation(_) => NextAction::FixInput,
            WorkflowError::Analysis(_) => NextAction::Resubmit,
            WorkflowError::Send(_) => NextAction::Retry,
        }
    }
}
