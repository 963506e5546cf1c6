//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and calendar dates (`YYYY-MM-DD`) are stored as strings.
//! Tables upserted by natural key also carry a UNIQUE index on it.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Companies (global scope)
-- =======================================================================
DEFINE TABLE company SCHEMAFULL;
DEFINE FIELD name ON TABLE company TYPE string;
DEFINE FIELD active ON TABLE company TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE company TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_company_name ON TABLE company COLUMNS name;

-- =======================================================================
-- Profiles (one per auth identity)
-- =======================================================================
DEFINE TABLE profile SCHEMAFULL;
DEFINE FIELD email ON TABLE profile TYPE string;
DEFINE FIELD full_name ON TABLE profile TYPE string;
DEFINE FIELD avatar_url ON TABLE profile TYPE option<string>;
DEFINE FIELD active ON TABLE profile TYPE bool DEFAULT true;
DEFINE FIELD role ON TABLE profile TYPE string \
    ASSERT $value IN ['user', 'manager', 'admin'];
DEFINE FIELD company_id ON TABLE profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_profile_email ON TABLE profile COLUMNS email UNIQUE;
DEFINE INDEX idx_profile_company ON TABLE profile COLUMNS company_id;

-- =======================================================================
-- Company membership
-- =======================================================================
DEFINE TABLE company_member SCHEMAFULL;
DEFINE FIELD company_id ON TABLE company_member TYPE string;
DEFINE FIELD user_id ON TABLE company_member TYPE string;
DEFINE FIELD created_at ON TABLE company_member TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_company_member_pair ON TABLE company_member \
    COLUMNS company_id, user_id UNIQUE;
DEFINE INDEX idx_company_member_user ON TABLE company_member \
    COLUMNS user_id;

-- =======================================================================
-- Quarters (company scope)
-- =======================================================================
DEFINE TABLE quarter SCHEMAFULL;
DEFINE FIELD company_id ON TABLE quarter TYPE string;
DEFINE FIELD name ON TABLE quarter TYPE string;
DEFINE FIELD start_date ON TABLE quarter TYPE string;
DEFINE FIELD end_date ON TABLE quarter TYPE string;
DEFINE FIELD active ON TABLE quarter TYPE bool DEFAULT true;
DEFINE INDEX idx_quarter_company ON TABLE quarter COLUMNS company_id;

-- =======================================================================
-- Objectives (company + quarter scope)
-- =======================================================================
DEFINE TABLE objective SCHEMAFULL;
DEFINE FIELD company_id ON TABLE objective TYPE string;
DEFINE FIELD quarter_id ON TABLE objective TYPE string;
DEFINE FIELD owner_id ON TABLE objective TYPE string;
DEFINE FIELD title ON TABLE objective TYPE string;
DEFINE FIELD archived ON TABLE objective TYPE bool DEFAULT false;
DEFINE FIELD progress ON TABLE objective TYPE float DEFAULT 0.0;
DEFINE FIELD created_at ON TABLE objective TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_objective_company_quarter ON TABLE objective \
    COLUMNS company_id, quarter_id;

-- =======================================================================
-- Key results (objective scope)
-- =======================================================================
DEFINE TABLE key_result SCHEMAFULL;
DEFINE FIELD objective_id ON TABLE key_result TYPE string;
DEFINE FIELD owner_id ON TABLE key_result TYPE option<string>;
DEFINE FIELD title ON TABLE key_result TYPE string;
DEFINE FIELD code ON TABLE key_result TYPE option<string>;
DEFINE FIELD progress ON TABLE key_result TYPE float DEFAULT 0.0;
DEFINE FIELD created_at ON TABLE key_result TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_key_result_objective ON TABLE key_result \
    COLUMNS objective_id;

-- =======================================================================
-- Key result check-ins (append-only)
-- =======================================================================
DEFINE TABLE kr_checkin SCHEMAFULL;
DEFINE FIELD key_result_id ON TABLE kr_checkin TYPE string;
DEFINE FIELD author_id ON TABLE kr_checkin TYPE option<string>;
DEFINE FIELD attainment ON TABLE kr_checkin TYPE float;
DEFINE FIELD note ON TABLE kr_checkin TYPE option<string>;
DEFINE FIELD recorded_at ON TABLE kr_checkin TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_kr_checkin_key_result ON TABLE kr_checkin \
    COLUMNS key_result_id;

-- =======================================================================
-- Scheduled check-in meetings (company + quarter scope)
-- =======================================================================
DEFINE TABLE checkin SCHEMAFULL;
DEFINE FIELD company_id ON TABLE checkin TYPE string;
DEFINE FIELD quarter_id ON TABLE checkin TYPE string;
DEFINE FIELD title ON TABLE checkin TYPE string;
DEFINE FIELD date ON TABLE checkin TYPE string;
DEFINE INDEX idx_checkin_quarter ON TABLE checkin COLUMNS quarter_id;

-- =======================================================================
-- Finalized quarter results
-- =======================================================================
DEFINE TABLE quarter_result SCHEMAFULL;
DEFINE FIELD company_id ON TABLE quarter_result TYPE string;
DEFINE FIELD user_id ON TABLE quarter_result TYPE string;
DEFINE FIELD quarter_id ON TABLE quarter_result TYPE string;
DEFINE FIELD percentage ON TABLE quarter_result TYPE option<float>;
DEFINE FIELD updated_at ON TABLE quarter_result TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_quarter_result_key ON TABLE quarter_result \
    COLUMNS company_id, user_id, quarter_id UNIQUE;

-- =======================================================================
-- Objective group summaries (denormalized cache)
-- =======================================================================
DEFINE TABLE objective_group_result SCHEMAFULL;
DEFINE FIELD company_id ON TABLE objective_group_result TYPE string;
DEFINE FIELD quarter_id ON TABLE objective_group_result TYPE string;
DEFINE FIELD title ON TABLE objective_group_result TYPE string;
DEFINE FIELD percentage ON TABLE objective_group_result TYPE float;
DEFINE FIELD objective_count ON TABLE objective_group_result TYPE int;
DEFINE FIELD kr_count ON TABLE objective_group_result TYPE int;
DEFINE FIELD updated_at ON TABLE objective_group_result TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_objective_group_key ON TABLE objective_group_result \
    COLUMNS company_id, quarter_id, title UNIQUE;
";

/// Run all pending migrations against the database.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "Migration v{} '{}' failed: {}",
                migration.version, migration.name, e,
            ))
        })?;

        db.query(
            "CREATE _migration SET version = $version, \
             name = $name",
        )
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!(
                "Failed to record migration v{}: {}",
                migration.version, e,
            ))
        })?;

        info!(version = migration.version, "Migration applied");
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
