//! Calendar error types.

use okr_core::error::OkrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar request failed: {0}")]
    Network(String),

    #[error("calendar API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected calendar response: {0}")]
    InvalidResponse(String),

    #[error("invalid calendar configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CalendarError {
    fn from(err: reqwest::Error) -> Self {
        CalendarError::Network(err.to_string())
    }
}

impl From<CalendarError> for OkrError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::Network(_) | CalendarError::Api { .. } => {
                OkrError::Unavailable(err.to_string())
            }
            CalendarError::InvalidResponse(msg) => OkrError::Internal(msg),
            CalendarError::Config(message) => OkrError::Validation { message },
        }
    }
}
