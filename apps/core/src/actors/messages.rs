use serde::Serialize;
use tokio::sync::oneshot;

use crate::history::{HistoryEntry, HistorySnapshot, HistoryStats};

/// Ways the remote classification path can fail.
///
/// Every variant is recovered by the supervisor through the local heuristic.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// No credential or endpoint configured; no request was attempted.
    #[error("Remote classifier not configured: {0}")]
    ConfigurationMissing(String),
    /// Network-level failure talking to the model service.
    #[error("Remote request failed: {0}")]
    Transport(String),
    /// The model service answered with a non-success status.
    #[error("Remote request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// The model's reply was not valid JSON. `raw` keeps the reply for diagnostics.
    #[error("Failed to parse JSON from model: {message}")]
    Decode { message: String, raw: String },
    /// The request did not complete within the configured bound.
    #[error("Remote request timed out: {0}")]
    Timeout(String),
}

impl From<tokio::time::error::Elapsed> for ClassifierError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        ClassifierError::Timeout(err.to_string())
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClassifierError::Timeout(err.to_string())
        } else {
            ClassifierError::Transport(err.to_string())
        }
    }
}

// Re-export AppError for convenience
pub use crate::error::AppError;

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A one-shot text generation request.
    Generate {
        instruction: String,
        /// A channel to send the raw completion text back.
        responder: oneshot::Sender<Result<String, ClassifierError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// Prepend a classified prompt to the history and reply with the new statistics.
    Record {
        entry: HistoryEntry,
        responder: oneshot::Sender<HistoryStats>,
    },
    /// Read the current history and its aggregate statistics.
    GetHistory {
        responder: oneshot::Sender<HistorySnapshot>,
    },
}
