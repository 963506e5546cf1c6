//! SurrealDB implementation of [`CompanyRepository`], including
//! company membership.

use chrono::{DateTime, Utc};
use okr_core::error::OkrResult;
use okr_core::models::company::{Company, CreateCompany, UpdateCompany};
use okr_core::repository::CompanyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CompanyRow {
    name: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct CompanyRowWithId {
    record_id: String,
    name: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CompanyRow {
    fn into_company(self, id: Uuid) -> Company {
        Company {
            id,
            name: self.name,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl CompanyRowWithId {
    fn try_into_company(self) -> Result<Company, DbError> {
        let id = parse_uuid("company", "id", &self.record_id)?;
        Ok(Company {
            id,
            name: self.name,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Company repository.
#[derive(Clone)]
pub struct SurrealCompanyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCompanyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CompanyRepository for SurrealCompanyRepository<C> {
    async fn create(&self, input: CreateCompany) -> OkrResult<Company> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('company', $id) SET \
                 name = $name, active = $active",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("active", input.active))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id))
    }

    async fn get_by_id(&self, id: Uuid) -> OkrResult<Company> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('company', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id))
    }

    async fn update(&self, id: Uuid, input: UpdateCompany) -> OkrResult<Company> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('company', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CompanyRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "company".into(),
            id: id_str,
        })?;

        Ok(row.into_company(id))
    }

    async fn list_active(&self) -> OkrResult<Vec<Company>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM company \
                 WHERE active = true \
                 ORDER BY name ASC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRowWithId> = result.take(0).map_err(DbError::from)?;
        let companies = rows
            .into_iter()
            .map(CompanyRowWithId::try_into_company)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(companies)
    }

    async fn list_for_member(&self, user_id: Uuid) -> OkrResult<Vec<Company>> {
        let mut member_result = self
            .db
            .query("SELECT VALUE company_id FROM company_member WHERE user_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let company_ids: Vec<String> = member_result.take(0).map_err(DbError::from)?;

        debug!(%user_id, memberships = company_ids.len(), "Resolved company memberships");

        if company_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM company \
                 WHERE meta::id(id) IN $company_ids \
                 ORDER BY name ASC",
            )
            .bind(("company_ids", company_ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CompanyRowWithId> = result.take(0).map_err(DbError::from)?;
        let companies = rows
            .into_iter()
            .map(CompanyRowWithId::try_into_company)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(companies)
    }

    async fn add_member(&self, company_id: Uuid, user_id: Uuid) -> OkrResult<()> {
        // The pair itself is the record key, so re-adding is a no-op.
        let key = format!("{company_id}_{user_id}");

        self.db
            .query(
                "UPSERT type::record('company_member', $key) SET \
                 company_id = $company_id, user_id = $user_id",
            )
            .bind(("key", key))
            .bind(("company_id", company_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn remove_member(&self, company_id: Uuid, user_id: Uuid) -> OkrResult<()> {
        self.db
            .query(
                "DELETE company_member \
                 WHERE company_id = $company_id AND user_id = $user_id",
            )
            .bind(("company_id", company_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
