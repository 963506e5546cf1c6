//! SurrealDB implementation of [`ObjectiveGroupResultRepository`].

use chrono::{DateTime, Utc};
use okr_core::error::OkrResult;
use okr_core::models::objective_group::{ObjectiveGroupResult, UpsertObjectiveGroupResult};
use okr_core::repository::ObjectiveGroupResultRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ObjectiveGroupRow {
    company_id: String,
    quarter_id: String,
    title: String,
    percentage: f64,
    objective_count: u64,
    kr_count: u64,
    updated_at: DateTime<Utc>,
}

impl ObjectiveGroupRow {
    fn try_into_group(self) -> Result<ObjectiveGroupResult, DbError> {
        Ok(ObjectiveGroupResult {
            company_id: parse_uuid("objective_group_result", "company_id", &self.company_id)?,
            quarter_id: parse_uuid("objective_group_result", "quarter_id", &self.quarter_id)?,
            title: self.title,
            percentage: self.percentage,
            objective_count: self.objective_count,
            kr_count: self.kr_count,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the objective group cache table.
#[derive(Clone)]
pub struct SurrealObjectiveGroupResultRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealObjectiveGroupResultRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ObjectiveGroupResultRepository for SurrealObjectiveGroupResultRepository<C> {
    async fn upsert(&self, input: UpsertObjectiveGroupResult) -> OkrResult<ObjectiveGroupResult> {
        // Record key: company, quarter and title, so the natural key
        // also addresses the row.
        let key = format!("{}_{}_{}", input.company_id, input.quarter_id, input.title);

        let result = self
            .db
            .query(
                "UPSERT type::record('objective_group_result', $key) SET \
                 company_id = $company_id, \
                 quarter_id = $quarter_id, \
                 title = $title, \
                 percentage = $percentage, \
                 objective_count = $objective_count, \
                 kr_count = $kr_count, \
                 updated_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("company_id", input.company_id.to_string()))
            .bind(("quarter_id", input.quarter_id.to_string()))
            .bind(("title", input.title))
            .bind(("percentage", input.percentage))
            .bind(("objective_count", input.objective_count))
            .bind(("kr_count", input.kr_count))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ObjectiveGroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "objective_group_result".into(),
            id: key,
        })?;

        Ok(row.try_into_group()?)
    }

    async fn list(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
    ) -> OkrResult<Vec<ObjectiveGroupResult>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM objective_group_result \
                 WHERE company_id = $company_id AND quarter_id = $quarter_id \
                 ORDER BY percentage DESC",
            )
            .bind(("company_id", company_id.to_string()))
            .bind(("quarter_id", quarter_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ObjectiveGroupRow> = result.take(0).map_err(DbError::from)?;
        let groups = rows
            .into_iter()
            .map(ObjectiveGroupRow::try_into_group)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }
}
