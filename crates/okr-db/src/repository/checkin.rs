//! SurrealDB implementations of [`KrCheckinRepository`] and
//! [`ScheduledCheckinRepository`].

use chrono::{DateTime, Utc};
use okr_core::error::OkrResult;
use okr_core::models::checkin::{
    CreateKrCheckin, CreateScheduledCheckin, KrCheckin, ScheduledCheckin,
};
use okr_core::repository::{KrCheckinRepository, ScheduledCheckinRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{format_date, parse_date, parse_opt_uuid, parse_uuid, uuid_strings};
use crate::error::DbError;

// ---------------------------------------------------------------------------
// Key result check-ins
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct KrCheckinRow {
    key_result_id: String,
    author_id: Option<String>,
    attainment: f64,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct KrCheckinRowWithId {
    record_id: String,
    key_result_id: String,
    author_id: Option<String>,
    attainment: f64,
    note: Option<String>,
    recorded_at: DateTime<Utc>,
}

impl KrCheckinRowWithId {
    fn try_into_checkin(self) -> Result<KrCheckin, DbError> {
        let id = parse_uuid("kr_checkin", "id", &self.record_id)?;
        KrCheckinRow {
            key_result_id: self.key_result_id,
            author_id: self.author_id,
            attainment: self.attainment,
            note: self.note,
            recorded_at: self.recorded_at,
        }
        .into_checkin(id)
    }
}

impl KrCheckinRow {
    fn into_checkin(self, id: Uuid) -> Result<KrCheckin, DbError> {
        Ok(KrCheckin {
            id,
            key_result_id: parse_uuid("kr_checkin", "key_result_id", &self.key_result_id)?,
            author_id: parse_opt_uuid("kr_checkin", "author_id", self.author_id.as_deref())?,
            attainment: self.attainment,
            note: self.note,
            recorded_at: self.recorded_at,
        })
    }
}

/// SurrealDB implementation of the key result check-in repository.
#[derive(Clone)]
pub struct SurrealKrCheckinRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealKrCheckinRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> KrCheckinRepository for SurrealKrCheckinRepository<C> {
    async fn create(&self, input: CreateKrCheckin) -> OkrResult<KrCheckin> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let recorded_at = input.recorded_at.unwrap_or_else(Utc::now);

        let result = self
            .db
            .query(
                "CREATE type::record('kr_checkin', $id) SET \
                 key_result_id = $key_result_id, \
                 author_id = $author_id, \
                 attainment = $attainment, \
                 note = $note, \
                 recorded_at = $recorded_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("key_result_id", input.key_result_id.to_string()))
            .bind(("author_id", input.author_id.map(|a| a.to_string())))
            .bind(("attainment", input.attainment))
            .bind(("note", input.note))
            .bind(("recorded_at", recorded_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<KrCheckinRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "kr_checkin".into(),
            id: id_str,
        })?;

        Ok(row.into_checkin(id)?)
    }

    async fn list_by_key_results(&self, key_result_ids: &[Uuid]) -> OkrResult<Vec<KrCheckin>> {
        if key_result_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM kr_checkin \
                 WHERE key_result_id IN $key_result_ids \
                 ORDER BY recorded_at ASC",
            )
            .bind(("key_result_ids", uuid_strings(key_result_ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<KrCheckinRowWithId> = result.take(0).map_err(DbError::from)?;
        let checkins = rows
            .into_iter()
            .map(KrCheckinRowWithId::try_into_checkin)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(checkins)
    }
}

// ---------------------------------------------------------------------------
// Scheduled check-in meetings
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct ScheduledCheckinRow {
    company_id: String,
    quarter_id: String,
    title: String,
    date: String,
}

#[derive(Debug, SurrealValue)]
struct ScheduledCheckinRowWithId {
    record_id: String,
    company_id: String,
    quarter_id: String,
    title: String,
    date: String,
}

impl ScheduledCheckinRowWithId {
    fn try_into_checkin(self) -> Result<ScheduledCheckin, DbError> {
        let id = parse_uuid("checkin", "id", &self.record_id)?;
        ScheduledCheckinRow {
            company_id: self.company_id,
            quarter_id: self.quarter_id,
            title: self.title,
            date: self.date,
        }
        .into_checkin(id)
    }
}

impl ScheduledCheckinRow {
    fn into_checkin(self, id: Uuid) -> Result<ScheduledCheckin, DbError> {
        Ok(ScheduledCheckin {
            id,
            company_id: parse_uuid("checkin", "company_id", &self.company_id)?,
            quarter_id: parse_uuid("checkin", "quarter_id", &self.quarter_id)?,
            title: self.title,
            date: parse_date("checkin", "date", &self.date)?,
        })
    }
}

/// SurrealDB implementation of the scheduled check-in repository.
#[derive(Clone)]
pub struct SurrealScheduledCheckinRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScheduledCheckinRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScheduledCheckinRepository for SurrealScheduledCheckinRepository<C> {
    async fn create(&self, input: CreateScheduledCheckin) -> OkrResult<ScheduledCheckin> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('checkin', $id) SET \
                 company_id = $company_id, \
                 quarter_id = $quarter_id, \
                 title = $title, \
                 date = $date",
            )
            .bind(("id", id_str.clone()))
            .bind(("company_id", input.company_id.to_string()))
            .bind(("quarter_id", input.quarter_id.to_string()))
            .bind(("title", input.title))
            .bind(("date", format_date(input.date)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ScheduledCheckinRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "checkin".into(),
            id: id_str,
        })?;

        Ok(row.into_checkin(id)?)
    }

    async fn list_by_quarter(&self, quarter_id: Uuid) -> OkrResult<Vec<ScheduledCheckin>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM checkin \
                 WHERE quarter_id = $quarter_id \
                 ORDER BY date ASC",
            )
            .bind(("quarter_id", quarter_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScheduledCheckinRowWithId> = result.take(0).map_err(DbError::from)?;
        let checkins = rows
            .into_iter()
            .map(ScheduledCheckinRowWithId::try_into_checkin)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(checkins)
    }
}
