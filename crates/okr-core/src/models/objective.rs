//! Objective domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Objective {
    pub id: Uuid,
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub archived: bool,
    /// Cached percent-complete, maintained by the backend.
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateObjective {
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub progress: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateObjective {
    pub title: Option<String>,
    pub owner_id: Option<Uuid>,
    pub archived: Option<bool>,
    pub progress: Option<f64>,
}

/// Selection criteria for listing objectives of one company quarter.
#[derive(Debug, Clone)]
pub struct ObjectiveFilter {
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    /// Restrict to one owner; `None` lists every owner.
    pub owner_id: Option<Uuid>,
    pub include_archived: bool,
}

impl ObjectiveFilter {
    pub fn new(company_id: Uuid, quarter_id: Uuid) -> Self {
        Self {
            company_id,
            quarter_id,
            owner_id: None,
            include_archived: true,
        }
    }

    pub fn owned_by(mut self, owner_id: Option<Uuid>) -> Self {
        self.owner_id = owner_id;
        self
    }

    pub fn without_archived(mut self) -> Self {
        self.include_archived = false;
        self
    }
}
