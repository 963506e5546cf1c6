//! SurrealDB implementation of [`QuarterRepository`].

use okr_core::error::{OkrError, OkrResult};
use okr_core::models::quarter::{CreateQuarter, Quarter};
use okr_core::repository::QuarterRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{format_date, parse_date, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct QuarterRow {
    company_id: String,
    name: String,
    start_date: String,
    end_date: String,
    active: bool,
}

#[derive(Debug, SurrealValue)]
struct QuarterRowWithId {
    record_id: String,
    company_id: String,
    name: String,
    start_date: String,
    end_date: String,
    active: bool,
}

impl QuarterRow {
    fn into_quarter(self, id: Uuid) -> Result<Quarter, DbError> {
        Ok(Quarter {
            id,
            company_id: parse_uuid("quarter", "company_id", &self.company_id)?,
            name: self.name,
            start_date: parse_date("quarter", "start_date", &self.start_date)?,
            end_date: parse_date("quarter", "end_date", &self.end_date)?,
            active: self.active,
        })
    }
}

impl QuarterRowWithId {
    fn try_into_quarter(self) -> Result<Quarter, DbError> {
        let id = parse_uuid("quarter", "id", &self.record_id)?;
        QuarterRow {
            company_id: self.company_id,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active,
        }
        .into_quarter(id)
    }
}

/// SurrealDB implementation of the Quarter repository.
#[derive(Clone)]
pub struct SurrealQuarterRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealQuarterRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> QuarterRepository for SurrealQuarterRepository<C> {
    async fn create(&self, input: CreateQuarter) -> OkrResult<Quarter> {
        if input.end_date < input.start_date {
            return Err(OkrError::Validation {
                message: format!(
                    "quarter '{}' ends ({}) before it starts ({})",
                    input.name, input.end_date, input.start_date
                ),
            });
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('quarter', $id) SET \
                 company_id = $company_id, \
                 name = $name, \
                 start_date = $start_date, \
                 end_date = $end_date, \
                 active = $active",
            )
            .bind(("id", id_str.clone()))
            .bind(("company_id", input.company_id.to_string()))
            .bind(("name", input.name))
            .bind(("start_date", format_date(input.start_date)))
            .bind(("end_date", format_date(input.end_date)))
            .bind(("active", input.active))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<QuarterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "quarter".into(),
            id: id_str,
        })?;

        Ok(row.into_quarter(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> OkrResult<Quarter> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('quarter', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuarterRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "quarter".into(),
            id: id_str,
        })?;

        Ok(row.into_quarter(id)?)
    }

    async fn list_by_company(&self, company_id: Uuid) -> OkrResult<Vec<Quarter>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM quarter \
                 WHERE company_id = $company_id \
                 ORDER BY start_date DESC",
            )
            .bind(("company_id", company_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuarterRowWithId> = result.take(0).map_err(DbError::from)?;
        let quarters = rows
            .into_iter()
            .map(QuarterRowWithId::try_into_quarter)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(quarters)
    }
}
