// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rootledger_kernel::error::KernelError;
use rootledger_persistence::error::PersistenceError;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::events::event_commit::CommitError;
use crate::events::event_log::EventLogError;
use crate::events::event_replay::ReplayError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Kernel(KernelError),
    #[error("Commit failed: {0}")]
    Commit(CommitError),
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),
    #[error("Recovery failed: {0}")]
    Replay(#[from] ReplayError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Missing bearer credentials")]
    MissingCaller,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal server error")]
    Internal,
}

impl EngineError {
    /// The kernel error behind this one, if the request was refused by the ledger itself.
    pub fn kernel_error(&self) -> Option<&KernelError> {
        match self {
            EngineError::Kernel(e) => Some(e),
            EngineError::Commit(CommitError::Rejected(e)) => Some(e),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        if let Some(k) = self.kernel_error() {
            return k.kind();
        }
        match self {
            EngineError::MissingCaller => "missing_caller",
            EngineError::InvalidInput(_) => "invalid_input",
            EngineError::Config(_) => "invalid_config",
            _ => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        if let Some(k) = self.kernel_error() {
            return match k {
                KernelError::NotFound(_) | KernelError::EmptySeries | KernelError::OutOfRange { .. } => {
                    StatusCode::NOT_FOUND
                }
                KernelError::Unauthorized => StatusCode::FORBIDDEN,
                KernelError::NonConsecutiveEpoch { .. } => StatusCode::CONFLICT,
                KernelError::NotYetElapsed { .. } => {
                    StatusCode::from_u16(425).unwrap_or(StatusCode::CONFLICT)
                }
                KernelError::InvalidConfig => StatusCode::BAD_REQUEST,
                KernelError::Codec | KernelError::InvalidEvent => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }
        match self {
            EngineError::MissingCaller => StatusCode::UNAUTHORIZED,
            EngineError::InvalidInput(_) | EngineError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

impl From<KernelError> for EngineError {
    fn from(e: KernelError) -> Self {
        EngineError::Kernel(e)
    }
}

impl From<CommitError> for EngineError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::Rejected(k) => EngineError::Kernel(k),
            other => EngineError::Commit(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootledger_kernel::types::{DistributionId, Timestamp};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EngineError::from(KernelError::NotFound(DistributionId(3))), 404),
            (EngineError::from(KernelError::EmptySeries), 404),
            (EngineError::from(KernelError::Unauthorized), 403),
            (
                EngineError::from(KernelError::NonConsecutiveEpoch {
                    expected: Timestamp(2),
                    found: Timestamp(3),
                }),
                409,
            ),
            (
                EngineError::from(KernelError::NotYetElapsed {
                    end_timestamp: Timestamp(5),
                    now: Timestamp(4),
                }),
                425,
            ),
            (EngineError::from(KernelError::InvalidConfig), 400),
            (EngineError::MissingCaller, 401),
            (EngineError::Internal, 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{}", err);
        }
    }

    #[test]
    fn test_rejected_commit_unwraps_to_kernel() {
        let err = EngineError::from(CommitError::Rejected(KernelError::EmptySeries));
        assert!(matches!(err, EngineError::Kernel(KernelError::EmptySeries)));
        assert_eq!(err.kind(), "empty_series");
    }
}
