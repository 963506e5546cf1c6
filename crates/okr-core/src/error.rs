//! Error types for the OKR system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OkrError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Company context missing or invalid")]
    TenantContext,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OkrError {
    /// Whether retrying the same call may succeed.
    ///
    /// Backend and network failures are transient; a missing record,
    /// a rejected credential or invalid input will fail the same way
    /// on every attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            OkrError::Database(_) | OkrError::Unavailable(_) | OkrError::Timeout(_)
        )
    }
}

pub type OkrResult<T> = Result<T, OkrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_are_transient() {
        assert!(OkrError::Database("connection reset".into()).is_transient());
        assert!(OkrError::Unavailable("503".into()).is_transient());
        assert!(OkrError::Timeout("profile".into()).is_transient());
    }

    #[test]
    fn not_found_is_not_transient() {
        let err = OkrError::NotFound {
            entity: "profile".into(),
            id: "x".into(),
        };
        assert!(!err.is_transient());
        assert!(!OkrError::TenantContext.is_transient());
    }
}
