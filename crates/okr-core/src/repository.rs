//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Company-scoped queries take the
//! `company_id` explicitly so no call can read across tenants by
//! accident.

use uuid::Uuid;

use crate::error::OkrResult;
use crate::models::{
    checkin::{CreateKrCheckin, CreateScheduledCheckin, KrCheckin, ScheduledCheckin},
    company::{Company, CreateCompany, UpdateCompany},
    key_result::{CreateKeyResult, KeyResult},
    objective::{CreateObjective, Objective, ObjectiveFilter, UpdateObjective},
    objective_group::{ObjectiveGroupResult, UpsertObjectiveGroupResult},
    profile::{CreateProfile, Profile, UpdateProfile},
    quarter::{CreateQuarter, Quarter},
    quarter_result::{QuarterResult, UpsertQuarterResult},
};

// ---------------------------------------------------------------------------
// Identity & company (global scope)
// ---------------------------------------------------------------------------

pub trait ProfileRepository: Send + Sync {
    fn create(&self, input: CreateProfile) -> impl Future<Output = OkrResult<Profile>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OkrResult<Profile>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProfile,
    ) -> impl Future<Output = OkrResult<Profile>> + Send;
    /// Fetch several profiles at once. Unknown ids are skipped.
    fn list_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = OkrResult<Vec<Profile>>> + Send;
    /// Active and inactive profiles that are members of a company,
    /// either through membership rows or their own `company_id`.
    fn list_by_company(
        &self,
        company_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<Profile>>> + Send;
}

pub trait CompanyRepository: Send + Sync {
    fn create(&self, input: CreateCompany) -> impl Future<Output = OkrResult<Company>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OkrResult<Company>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCompany,
    ) -> impl Future<Output = OkrResult<Company>> + Send;
    /// All companies with `active = true`, ordered by name.
    fn list_active(&self) -> impl Future<Output = OkrResult<Vec<Company>>> + Send;
    /// Companies the user is a member of (active or not), ordered by name.
    fn list_for_member(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<Company>>> + Send;
    /// Idempotent.
    fn add_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = OkrResult<()>> + Send;
    fn remove_member(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = OkrResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Company-scoped OKR data
// ---------------------------------------------------------------------------

pub trait QuarterRepository: Send + Sync {
    fn create(&self, input: CreateQuarter) -> impl Future<Output = OkrResult<Quarter>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OkrResult<Quarter>> + Send;
    /// All quarters of a company, most recently started first.
    fn list_by_company(
        &self,
        company_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<Quarter>>> + Send;
}

pub trait ObjectiveRepository: Send + Sync {
    fn create(&self, input: CreateObjective) -> impl Future<Output = OkrResult<Objective>> + Send;
    fn get_by_id(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = OkrResult<Objective>> + Send;
    fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: UpdateObjective,
    ) -> impl Future<Output = OkrResult<Objective>> + Send;
    fn list(&self, filter: ObjectiveFilter)
    -> impl Future<Output = OkrResult<Vec<Objective>>> + Send;
}

pub trait KeyResultRepository: Send + Sync {
    fn create(&self, input: CreateKeyResult) -> impl Future<Output = OkrResult<KeyResult>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = OkrResult<KeyResult>> + Send;
    fn update_progress(
        &self,
        id: Uuid,
        progress: f64,
    ) -> impl Future<Output = OkrResult<KeyResult>> + Send;
    /// Key results belonging to any of the given objectives.
    fn list_by_objectives(
        &self,
        objective_ids: &[Uuid],
    ) -> impl Future<Output = OkrResult<Vec<KeyResult>>> + Send;
}

pub trait KrCheckinRepository: Send + Sync {
    /// Append a check-in. Check-ins are never updated or deleted.
    fn create(&self, input: CreateKrCheckin) -> impl Future<Output = OkrResult<KrCheckin>> + Send;
    /// Check-ins for the given key results, oldest first.
    fn list_by_key_results(
        &self,
        key_result_ids: &[Uuid],
    ) -> impl Future<Output = OkrResult<Vec<KrCheckin>>> + Send;
}

pub trait ScheduledCheckinRepository: Send + Sync {
    fn create(
        &self,
        input: CreateScheduledCheckin,
    ) -> impl Future<Output = OkrResult<ScheduledCheckin>> + Send;
    /// Scheduled check-ins of a quarter, by date.
    fn list_by_quarter(
        &self,
        quarter_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<ScheduledCheckin>>> + Send;
}

pub trait QuarterResultRepository: Send + Sync {
    /// Insert or replace the row keyed by (company, user, quarter).
    fn upsert(
        &self,
        input: UpsertQuarterResult,
    ) -> impl Future<Output = OkrResult<QuarterResult>> + Send;
    fn get(
        &self,
        company_id: Uuid,
        user_id: Uuid,
        quarter_id: Uuid,
    ) -> impl Future<Output = OkrResult<Option<QuarterResult>>> + Send;
    /// Ordered by last write, oldest first.
    fn list_by_quarter(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<QuarterResult>>> + Send;
    fn list_by_user(
        &self,
        company_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<QuarterResult>>> + Send;
}

pub trait ObjectiveGroupResultRepository: Send + Sync {
    /// Insert or replace the row keyed by (company, quarter, title).
    fn upsert(
        &self,
        input: UpsertObjectiveGroupResult,
    ) -> impl Future<Output = OkrResult<ObjectiveGroupResult>> + Send;
    fn list(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
    ) -> impl Future<Output = OkrResult<Vec<ObjectiveGroupResult>>> + Send;
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// One handle exposing every repository, so services that read across
/// collections stay generic over a single type parameter.
pub trait OkrRepositories: Send + Sync {
    type Profiles: ProfileRepository;
    type Companies: CompanyRepository;
    type Quarters: QuarterRepository;
    type Objectives: ObjectiveRepository;
    type KeyResults: KeyResultRepository;
    type KrCheckins: KrCheckinRepository;
    type ScheduledCheckins: ScheduledCheckinRepository;
    type QuarterResults: QuarterResultRepository;
    type ObjectiveGroups: ObjectiveGroupResultRepository;

    fn profiles(&self) -> &Self::Profiles;
    fn companies(&self) -> &Self::Companies;
    fn quarters(&self) -> &Self::Quarters;
    fn objectives(&self) -> &Self::Objectives;
    fn key_results(&self) -> &Self::KeyResults;
    fn kr_checkins(&self) -> &Self::KrCheckins;
    fn scheduled_checkins(&self) -> &Self::ScheduledCheckins;
    fn quarter_results(&self) -> &Self::QuarterResults;
    fn objective_groups(&self) -> &Self::ObjectiveGroups;
}
