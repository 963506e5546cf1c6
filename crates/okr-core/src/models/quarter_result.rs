//! Finalized quarter results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authoritative attainment for a (company, user, quarter) triple.
///
/// A non-null `percentage` overrides anything computed from check-ins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarterResult {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub quarter_id: Uuid,
    pub percentage: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert input, keyed by (company, user, quarter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertQuarterResult {
    pub company_id: Uuid,
    pub user_id: Uuid,
    pub quarter_id: Uuid,
    pub percentage: Option<f64>,
}
