//! SurrealDB implementation of [`ProfileRepository`].

use chrono::{DateTime, Utc};
use okr_core::error::OkrResult;
use okr_core::models::profile::{CreateProfile, Profile, Role, UpdateProfile};
use okr_core::repository::ProfileRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_opt_uuid, parse_uuid, uuid_strings};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ProfileRow {
    email: String,
    full_name: String,
    avatar_url: Option<String>,
    active: bool,
    role: String,
    company_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ProfileRowWithId {
    record_id: String,
    email: String,
    full_name: String,
    avatar_url: Option<String>,
    active: bool,
    role: String,
    company_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, id: Uuid) -> Result<Profile, DbError> {
        Ok(Profile {
            id,
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            active: self.active,
            role: Role::parse(&self.role),
            company_id: parse_opt_uuid("profile", "company_id", self.company_id.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ProfileRowWithId {
    fn try_into_profile(self) -> Result<Profile, DbError> {
        let id = parse_uuid("profile", "id", &self.record_id)?;
        ProfileRow {
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            active: self.active,
            role: self.role,
            company_id: self.company_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_profile(id)
    }
}

/// SurrealDB implementation of the Profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn create(&self, input: CreateProfile) -> OkrResult<Profile> {
        let id_str = input.id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('profile', $id) SET \
                 email = $email, \
                 full_name = $full_name, \
                 avatar_url = $avatar_url, \
                 active = true, \
                 role = $role, \
                 company_id = $company_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("full_name", input.full_name))
            .bind(("avatar_url", input.avatar_url))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("company_id", input.company_id.map(|c| c.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(input.id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> OkrResult<Profile> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('profile', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProfile) -> OkrResult<Profile> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.avatar_url.is_some() {
            sets.push("avatar_url = $avatar_url");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.company_id.is_some() {
            sets.push("company_id = $company_id");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('profile', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(avatar_url) = input.avatar_url {
            // Some(None) clears the avatar.
            builder = builder.bind(("avatar_url", avatar_url));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(company_id) = input.company_id {
            builder = builder.bind(("company_id", company_id.map(|c| c.to_string())));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "profile".into(),
            id: id_str,
        })?;

        Ok(row.into_profile(id)?)
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> OkrResult<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE meta::id(id) IN $ids \
                 ORDER BY full_name ASC",
            )
            .bind(("ids", uuid_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        let profiles = rows
            .into_iter()
            .map(ProfileRowWithId::try_into_profile)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(profiles)
    }

    async fn list_by_company(&self, company_id: Uuid) -> OkrResult<Vec<Profile>> {
        let company_id_str = company_id.to_string();

        let mut member_result = self
            .db
            .query("SELECT VALUE user_id FROM company_member WHERE company_id = $company_id")
            .bind(("company_id", company_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let member_ids: Vec<String> = member_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM profile \
                 WHERE company_id = $company_id OR meta::id(id) IN $member_ids \
                 ORDER BY full_name ASC",
            )
            .bind(("company_id", company_id_str))
            .bind(("member_ids", member_ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRowWithId> = result.take(0).map_err(DbError::from)?;
        let profiles = rows
            .into_iter()
            .map(ProfileRowWithId::try_into_profile)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(profiles)
    }
}
