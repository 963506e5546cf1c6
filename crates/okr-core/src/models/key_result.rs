//! Key result domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyResult {
    pub id: Uuid,
    pub objective_id: Uuid,
    /// The KR's own owner field. The owning objective's owner takes
    /// precedence when displaying who is responsible.
    pub owner_id: Option<Uuid>,
    pub title: String,
    /// Optional short code such as `KR1.2`.
    pub code: Option<String>,
    /// Cached percent-complete.
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKeyResult {
    pub objective_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub code: Option<String>,
    pub progress: f64,
}
