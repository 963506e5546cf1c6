//! Quarter domain model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded period objectives are tracked against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quarter {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

/// Position of a quarter relative to a given day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuarterStatus {
    Current,
    Finished,
    Future,
}

impl Quarter {
    /// Inclusive on both ends.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    pub fn status_on(&self, day: NaiveDate) -> QuarterStatus {
        if day < self.start_date {
            QuarterStatus::Future
        } else if day > self.end_date {
            QuarterStatus::Finished
        } else {
            QuarterStatus::Current
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuarter {
    pub company_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}
