//! SurrealDB implementation of [`KeyResultRepository`].

use okr_core::error::OkrResult;
use okr_core::models::key_result::{CreateKeyResult, KeyResult};
use okr_core::repository::KeyResultRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid, uuid_strings};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct KeyResultRow {
    objective_id: String,
    owner_id: Option<String>,
    title: String,
    code: Option<String>,
    progress: f64,
}

#[derive(Debug, SurrealValue)]
struct KeyResultRowWithId {
    record_id: String,
    objective_id: String,
    owner_id: Option<String>,
    title: String,
    code: Option<String>,
    progress: f64,
}

impl KeyResultRow {
    fn into_key_result(self, id: Uuid) -> Result<KeyResult, DbError> {
        Ok(KeyResult {
            id,
            objective_id: parse_uuid("key_result", "objective_id", &self.objective_id)?,
            owner_id: parse_opt_uuid("key_result", "owner_id", self.owner_id.as_deref())?,
            title: self.title,
            code: self.code,
            progress: self.progress,
        })
    }
}

impl KeyResultRowWithId {
    fn try_into_key_result(self) -> Result<KeyResult, DbError> {
        let id = parse_uuid("key_result", "id", &self.record_id)?;
        KeyResultRow {
            objective_id: self.objective_id,
            owner_id: self.owner_id,
            title: self.title,
            code: self.code,
            progress: self.progress,
        }
        .into_key_result(id)
    }
}

/// SurrealDB implementation of the KeyResult repository.
#[derive(Clone)]
pub struct SurrealKeyResultRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealKeyResultRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> KeyResultRepository for SurrealKeyResultRepository<C> {
    async fn create(&self, input: CreateKeyResult) -> OkrResult<KeyResult> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('key_result', $id) SET \
                 objective_id = $objective_id, \
                 owner_id = $owner_id, \
                 title = $title, \
                 code = $code, \
                 progress = $progress",
            )
            .bind(("id", id_str.clone()))
            .bind(("objective_id", input.objective_id.to_string()))
            .bind(("owner_id", input.owner_id.map(|o| o.to_string())))
            .bind(("title", input.title))
            .bind(("code", input.code))
            .bind(("progress", input.progress))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<KeyResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "key_result".into(),
            id: id_str,
        })?;

        Ok(row.into_key_result(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> OkrResult<KeyResult> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('key_result', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<KeyResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "key_result".into(),
            id: id_str,
        })?;

        Ok(row.into_key_result(id)?)
    }

    async fn update_progress(&self, id: Uuid, progress: f64) -> OkrResult<KeyResult> {
        let id_str = id.to_string();

        let result = self
            .db
            .query("UPDATE type::record('key_result', $id) SET progress = $progress")
            .bind(("id", id_str.clone()))
            .bind(("progress", progress))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<KeyResultRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "key_result".into(),
            id: id_str,
        })?;

        Ok(row.into_key_result(id)?)
    }

    async fn list_by_objectives(&self, objective_ids: &[Uuid]) -> OkrResult<Vec<KeyResult>> {
        if objective_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM key_result \
                 WHERE objective_id IN $objective_ids \
                 ORDER BY created_at ASC",
            )
            .bind(("objective_ids", uuid_strings(objective_ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<KeyResultRowWithId> = result.take(0).map_err(DbError::from)?;
        let key_results = rows
            .into_iter()
            .map(KeyResultRowWithId::try_into_key_result)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(key_results)
    }
}
