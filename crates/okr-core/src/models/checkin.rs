//! Check-in models.
//!
//! Two different things are called check-ins: attainment events
//! recorded against a key result ([`KrCheckin`]) and planned check-in
//! meetings within a quarter ([`ScheduledCheckin`]).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable attainment event for a key result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KrCheckin {
    pub id: Uuid,
    pub key_result_id: Uuid,
    pub author_id: Option<Uuid>,
    /// Attainment percentage at `recorded_at`.
    pub attainment: f64,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKrCheckin {
    pub key_result_id: Uuid,
    pub author_id: Option<Uuid>,
    pub attainment: f64,
    pub note: Option<String>,
    /// Defaults to now.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// A planned check-in meeting for a quarter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledCheckin {
    pub id: Uuid,
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduledCheckin {
    pub company_id: Uuid,
    pub quarter_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
}
