//! SurrealDB implementation of [`ObjectiveRepository`].

use okr_core::error::OkrResult;
use okr_core::models::objective::{CreateObjective, Objective, ObjectiveFilter, UpdateObjective};
use okr_core::repository::ObjectiveRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ObjectiveRow {
    company_id: String,
    quarter_id: String,
    owner_id: String,
    title: String,
    archived: bool,
    progress: f64,
}

#[derive(Debug, SurrealValue)]
struct ObjectiveRowWithId {
    record_id: String,
    company_id: String,
    quarter_id: String,
    owner_id: String,
    title: String,
    archived: bool,
    progress: f64,
}

impl ObjectiveRow {
    fn into_objective(self, id: Uuid) -> Result<Objective, DbError> {
        Ok(Objective {
            id,
            company_id: parse_uuid("objective", "company_id", &self.company_id)?,
            quarter_id: parse_uuid("objective", "quarter_id", &self.quarter_id)?,
            owner_id: parse_uuid("objective", "owner_id", &self.owner_id)?,
            title: self.title,
            archived: self.archived,
            progress: self.progress,
        })
    }
}

impl ObjectiveRowWithId {
    fn try_into_objective(self) -> Result<Objective, DbError> {
        let id = parse_uuid("objective", "id", &self.record_id)?;
        ObjectiveRow {
            company_id: self.company_id,
            quarter_id: self.quarter_id,
            owner_id: self.owner_id,
            title: self.title,
            archived: self.archived,
            progress: self.progress,
        }
        .into_objective(id)
    }
}

/// SurrealDB implementation of the Objective repository.
#[derive(Clone)]
pub struct SurrealObjectiveRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealObjectiveRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ObjectiveRepository for SurrealObjectiveRepository<C> {
    async fn create(&self, input: CreateObjective) -> OkrResult<Objective> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('objective', $id) SET \
                 company_id = $company_id, \
                 quarter_id = $quarter_id, \
                 owner_id = $owner_id, \
                 title = $title, \
                 archived = false, \
                 progress = $progress",
            )
            .bind(("id", id_str.clone()))
            .bind(("company_id", input.company_id.to_string()))
            .bind(("quarter_id", input.quarter_id.to_string()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("title", input.title))
            .bind(("progress", input.progress))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ObjectiveRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "objective".into(),
            id: id_str,
        })?;

        Ok(row.into_objective(id)?)
    }

    async fn get_by_id(&self, company_id: Uuid, id: Uuid) -> OkrResult<Objective> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('objective', $id) \
                 WHERE company_id = $company_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("company_id", company_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ObjectiveRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "objective".into(),
            id: id_str,
        })?;

        Ok(row.into_objective(id)?)
    }

    async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: UpdateObjective,
    ) -> OkrResult<Objective> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.owner_id.is_some() {
            sets.push("owner_id = $owner_id");
        }
        if input.archived.is_some() {
            sets.push("archived = $archived");
        }
        if input.progress.is_some() {
            sets.push("progress = $progress");
        }
        if sets.is_empty() {
            return self.get_by_id(company_id, id).await;
        }

        let query = format!(
            "UPDATE type::record('objective', $id) SET {} \
             WHERE company_id = $company_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("company_id", company_id.to_string()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(owner_id) = input.owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }
        if let Some(archived) = input.archived {
            builder = builder.bind(("archived", archived));
        }
        if let Some(progress) = input.progress {
            builder = builder.bind(("progress", progress));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ObjectiveRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "objective".into(),
            id: id_str,
        })?;

        Ok(row.into_objective(id)?)
    }

    async fn list(&self, filter: ObjectiveFilter) -> OkrResult<Vec<Objective>> {
        let mut conditions = vec!["company_id = $company_id", "quarter_id = $quarter_id"];
        if filter.owner_id.is_some() {
            conditions.push("owner_id = $owner_id");
        }
        if !filter.include_archived {
            conditions.push("archived = false");
        }

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM objective \
             WHERE {} \
             ORDER BY created_at ASC",
            conditions.join(" AND ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("company_id", filter.company_id.to_string()))
            .bind(("quarter_id", filter.quarter_id.to_string()));
        if let Some(owner_id) = filter.owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<ObjectiveRowWithId> = result.take(0).map_err(DbError::from)?;
        let objectives = rows
            .into_iter()
            .map(ObjectiveRowWithId::try_into_objective)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(objectives)
    }
}
