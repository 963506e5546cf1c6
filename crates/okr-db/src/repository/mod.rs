//! SurrealDB repository implementations.

mod checkin;
mod company;
mod key_result;
mod objective;
mod objective_group;
mod profile;
mod quarter;
mod quarter_result;

pub use checkin::{SurrealKrCheckinRepository, SurrealScheduledCheckinRepository};
pub use company::SurrealCompanyRepository;
pub use key_result::SurrealKeyResultRepository;
pub use objective::SurrealObjectiveRepository;
pub use objective_group::SurrealObjectiveGroupResultRepository;
pub use profile::SurrealProfileRepository;
pub use quarter::SurrealQuarterRepository;
pub use quarter_result::SurrealQuarterResultRepository;

use chrono::NaiveDate;
use okr_core::repository::OkrRepositories;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use crate::error::DbError;

/// Every SurrealDB repository over one shared connection.
#[derive(Clone)]
pub struct SurrealRepositories<C: Connection> {
    profiles: SurrealProfileRepository<C>,
    companies: SurrealCompanyRepository<C>,
    quarters: SurrealQuarterRepository<C>,
    objectives: SurrealObjectiveRepository<C>,
    key_results: SurrealKeyResultRepository<C>,
    kr_checkins: SurrealKrCheckinRepository<C>,
    scheduled_checkins: SurrealScheduledCheckinRepository<C>,
    quarter_results: SurrealQuarterResultRepository<C>,
    objective_groups: SurrealObjectiveGroupResultRepository<C>,
}

impl<C: Connection> SurrealRepositories<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            profiles: SurrealProfileRepository::new(db.clone()),
            companies: SurrealCompanyRepository::new(db.clone()),
            quarters: SurrealQuarterRepository::new(db.clone()),
            objectives: SurrealObjectiveRepository::new(db.clone()),
            key_results: SurrealKeyResultRepository::new(db.clone()),
            kr_checkins: SurrealKrCheckinRepository::new(db.clone()),
            scheduled_checkins: SurrealScheduledCheckinRepository::new(db.clone()),
            quarter_results: SurrealQuarterResultRepository::new(db.clone()),
            objective_groups: SurrealObjectiveGroupResultRepository::new(db),
        }
    }
}

impl<C: Connection> OkrRepositories for SurrealRepositories<C> {
    type Profiles = SurrealProfileRepository<C>;
    type Companies = SurrealCompanyRepository<C>;
    type Quarters = SurrealQuarterRepository<C>;
    type Objectives = SurrealObjectiveRepository<C>;
    type KeyResults = SurrealKeyResultRepository<C>;
    type KrCheckins = SurrealKrCheckinRepository<C>;
    type ScheduledCheckins = SurrealScheduledCheckinRepository<C>;
    type QuarterResults = SurrealQuarterResultRepository<C>;
    type ObjectiveGroups = SurrealObjectiveGroupResultRepository<C>;

    fn profiles(&self) -> &Self::Profiles {
        &self.profiles
    }

    fn companies(&self) -> &Self::Companies {
        &self.companies
    }

    fn quarters(&self) -> &Self::Quarters {
        &self.quarters
    }

    fn objectives(&self) -> &Self::Objectives {
        &self.objectives
    }

    fn key_results(&self) -> &Self::KeyResults {
        &self.key_results
    }

    fn kr_checkins(&self) -> &Self::KrCheckins {
        &self.kr_checkins
    }

    fn scheduled_checkins(&self) -> &Self::ScheduledCheckins {
        &self.scheduled_checkins
    }

    fn quarter_results(&self) -> &Self::QuarterResults {
        &self.quarter_results
    }

    fn objective_groups(&self) -> &Self::ObjectiveGroups {
        &self.objective_groups
    }
}

// ---------------------------------------------------------------------------
// Row decoding helpers
// ---------------------------------------------------------------------------

pub(crate) fn parse_uuid(entity: &'static str, field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::InvalidRow {
        entity,
        reason: format!("invalid {field} UUID {raw:?}: {e}"),
    })
}

pub(crate) fn parse_opt_uuid(
    entity: &'static str,
    field: &str,
    raw: Option<&str>,
) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(entity, field, s)).transpose()
}

pub(crate) fn parse_date(entity: &'static str, field: &str, raw: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| DbError::InvalidRow {
        entity,
        reason: format!("invalid {field} date {raw:?}: {e}"),
    })
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn uuid_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

const DATE_FORMAT: &str = "%Y-%m-%d";
