//! Session error types.

use std::time::Duration;

use okr_core::error::OkrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("auth backend error: {0}")]
    Backend(String),

    #[error("auth backend did not answer within {0:?}")]
    Timeout(Duration),

    #[error("client storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

impl From<SessionError> for OkrError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Backend(msg) => OkrError::Unavailable(msg),
            SessionError::Timeout(_) => OkrError::Timeout(err.to_string()),
            SessionError::Storage(msg) => OkrError::Internal(msg),
        }
    }
}
