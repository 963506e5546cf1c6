//! SurrealDB implementation of [`QuarterResultRepository`].
//!
//! Rows are keyed by `{company}_{user}_{quarter}`, so an upsert always
//! lands on the same record for a given triple.

use chrono::{DateTime, Utc};
use okr_core::error::OkrResult;
use okr_core::models::quarter_result::{QuarterResult, UpsertQuarterResult};
use okr_core::repository::QuarterResultRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct QuarterResultRow {
    company_id: String,
    user_id: String,
    quarter_id: String,
    percentage: Option<f64>,
    updated_at: DateTime<Utc>,
}

impl QuarterResultRow {
    fn try_into_result(self) -> Result<QuarterResult, DbError> {
        Ok(QuarterResult {
            company_id: parse_uuid("quarter_result", "company_id", &self.company_id)?,
            user_id: parse_uuid("quarter_result", "user_id", &self.user_id)?,
            quarter_id: parse_uuid("quarter_result", "quarter_id", &self.quarter_id)?,
            percentage: self.percentage,
            updated_at: self.updated_at,
        })
    }
}

fn record_key(company_id: Uuid, user_id: Uuid, quarter_id: Uuid) -> String {
    format!("{company_id}_{user_id}_{quarter_id}")
}

/// SurrealDB implementation of the QuarterResult repository.
#[derive(Clone)]
pub struct SurrealQuarterResultRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealQuarterResultRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select(
        &self,
        condition: &str,
        binds: Vec<(&'static str, String)>,
    ) -> OkrResult<Vec<QuarterResult>> {
        // Oldest write first, so equal percentages rank in a repeatable order.
        let query = format!(
            "SELECT * FROM quarter_result WHERE {condition} ORDER BY updated_at ASC, user_id ASC"
        );

        let mut builder = self.db.query(&query);
        for bind in binds {
            builder = builder.bind(bind);
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<QuarterResultRow> = result.take(0).map_err(DbError::from)?;
        let results = rows
            .into_iter()
            .map(QuarterResultRow::try_into_result)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(results)
    }
}

impl<C: Connection> QuarterResultRepository for SurrealQuarterResultRepository<C> {
    async fn upsert(&self, input: UpsertQuarterResult) -> OkrResult<QuarterResult> {
        let key = record_key(input.company_id, input.user_id, input.quarter_id);

        let result = self
            .db
            .query(
                "UPSERT type::record('quarter_result', $key) SET \
                 company_id = $company_id, \
                 user_id = $user_id, \
                 quarter_id = $quarter_id, \
                 percentage = $percentage, \
                 updated_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("company_id", input.company_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("quarter_id", input.quarter_id.to_string()))
            .bind(("percentage", input.percentage))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<QuarterResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "quarter_result".into(),
            id: key,
        })?;

        Ok(row.try_into_result()?)
    }

    async fn get(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        quarter_id: Uuid,
    ) -> OkrResult<Option<QuarterResult>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('quarter_result', $key)")
            .bind(("key", record_key(company_id, user_id, quarter_id)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<QuarterResultRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(QuarterResultRow::try_into_result)
            .transpose()
            .map_err(Into::into)
    }

    async fn list_by_quarter(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
    ) -> OkrResult<Vec<QuarterResult>> {
        self.select(
            "company_id = $company_id AND quarter_id = $quarter_id",
            vec![
                ("company_id", company_id.to_string()),
                ("quarter_id", quarter_id.to_string()),
            ],
        )
        .await
    }

    async fn list_by_user(&self, company_id: Uuid, user_id: Uuid) -> OkrResult<Vec<QuarterResult>> {
        self.select(
            "company_id = $company_id AND user_id = $user_id",
            vec![
                ("company_id", company_id.to_string()),
                ("user_id", user_id.to_string()),
            ],
        )
        .await
    }
}
