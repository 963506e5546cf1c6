//! Denormalized objective group summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached rollup of all objectives sharing a normalized title within
/// one company quarter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveGroupResult {
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub title: String,
    pub percentage: f64,
    pub objective_count: u64,
    pub kr_count: u64,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input, keyed by (company, quarter, title).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertObjectiveGroupResult {
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub title: String,
    pub percentage: f64,
    pub objective_count: u64,
    pub kr_count: u64,
}
