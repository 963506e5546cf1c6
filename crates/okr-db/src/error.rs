//! Errors raised by the SurrealDB layer.

use okr_core::error::OkrError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid {entity} row: {reason}")]
    InvalidRow { entity: &'static str, reason: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for OkrError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => OkrError::NotFound { entity, id },
            // A malformed row will not heal on retry.
            invalid @ DbError::InvalidRow { .. } => OkrError::Internal(invalid.to_string()),
            other => OkrError::Database(other.to_string()),
        }
    }
}
