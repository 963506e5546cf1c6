//! Company (tenant) domain model.
//!
//! Companies isolate OKR data: quarters, objectives and key results are
//! all scoped to one company.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Company {
    pub id: Uuid,
    /// Display name; also the sort key for selection lists.
    pub name: String,
    /// Inactive companies are never offered for selection.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub active: Option<bool>,
}
