//! Dashboard aggregation over one company quarter.

use std::collections::HashMap;

use chrono::NaiveDate;
use okr_core::error::OkrResult;
use okr_core::models::objective::ObjectiveFilter;
use okr_core::models::profile::Role;
use okr_core::models::quarter::Quarter;
use okr_core::models::quarter_result::QuarterResult;
use okr_core::repository::{
    KeyResultRepository, KrCheckinRepository, ObjectiveRepository, OkrRepositories,
    ProfileRepository, QuarterRepository, QuarterResultRepository,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheRetryPolicy, ObjectiveGroupCache};
use crate::progress;
use crate::quarter::{self, QuarterPerformance};
use crate::ranking::{self, KrRanking, UserRanking};
use crate::rollup::{self, ObjectiveRollup};

/// Who is looking, and at which company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardScope {
    pub company_id: Uuid,
    pub viewer_id: Uuid,
    pub role: Role,
}

impl DashboardScope {
    pub fn new(company_id: Uuid, viewer_id: Uuid, role: Role) -> Self {
        Self {
            company_id,
            viewer_id,
            role,
        }
    }

    /// Admins see the whole company; everyone else sees their own
    /// objectives.
    pub fn owner_filter(&self) -> Option<Uuid> {
        if self.role.is_admin() {
            None
        } else {
            Some(self.viewer_id)
        }
    }
}

/// View model for one dashboard load. Sections that failed to compute
/// are empty (or zero).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub quarter: Option<Quarter>,
    pub progress: f64,
    pub history: Vec<QuarterPerformance>,
    pub user_rankings: Vec<UserRanking>,
    pub objective_rollups: Vec<ObjectiveRollup>,
    pub kr_rankings: Vec<KrRanking>,
}

pub struct DashboardEngine<R: OkrRepositories> {
    repos: R,
    cache_policy: CacheRetryPolicy,
}

impl<R: OkrRepositories> DashboardEngine<R> {
    pub fn new(repos: R) -> Self {
        Self::with_cache_policy(repos, CacheRetryPolicy::default())
    }

    pub fn with_cache_policy(repos: R, cache_policy: CacheRetryPolicy) -> Self {
        Self {
            repos,
            cache_policy,
        }
    }

    pub fn repositories(&self) -> &R {
        &self.repos
    }

    /// Compute the dashboard for `scope` as of `today`.
    ///
    /// The five sections run concurrently and fail independently: an
    /// error in one is logged and leaves that section empty.
    pub async fn load(&self, scope: DashboardScope, today: NaiveDate) -> Dashboard {
        let quarters = match self.repos.quarters().list_by_company(scope.company_id).await {
            Ok(quarters) => quarters,
            Err(e) => {
                warn!(company_id = %scope.company_id, error = %e, "Failed to load quarters");
                return Dashboard::default();
            }
        };

        let Some(effective) = quarter::effective_quarter(&quarters, today).cloned() else {
            debug!(company_id = %scope.company_id, "Company has no quarters");
            return Dashboard::default();
        };

        let (progress, history, user_rankings, objective_rollups, kr_rankings) = tokio::join!(
            self.quarter_progress(&scope, effective.id),
            self.history(&scope, &quarters, today),
            self.user_rankings(&scope, effective.id),
            self.objective_rollups(&scope, effective.id),
            self.kr_rankings(&scope, effective.id),
        );

        let dashboard = Dashboard {
            progress: or_empty("progress", &scope, progress),
            history: or_empty("history", &scope, history),
            user_rankings: or_empty("user_rankings", &scope, user_rankings),
            objective_rollups: or_empty("objective_rollups", &scope, objective_rollups),
            kr_rankings: or_empty("kr_rankings", &scope, kr_rankings),
            quarter: Some(effective),
        };

        info!(
            company_id = %scope.company_id,
            viewer_id = %scope.viewer_id,
            quarter = ?dashboard.quarter.as_ref().map(|q| &q.name),
            progress = dashboard.progress,
            "Dashboard computed"
        );
        dashboard
    }

    /// Progress for one quarter in `scope`, honouring finalized results
    /// for user-scoped views.
    pub async fn quarter_progress(&self, scope: &DashboardScope, quarter_id: Uuid) -> OkrResult<f64> {
        let owner = scope.owner_filter();
        if let Some(user_id) = owner {
            let result = self
                .repos
                .quarter_results()
                .get(scope.company_id, user_id, quarter_id)
                .await?;
            if let Some(percentage) = progress::finalized_percentage(result.as_ref()) {
                return Ok(percentage);
            }
        }
        self.computed_progress(scope.company_id, quarter_id, owner).await
    }

    /// Mean latest attainment across the key results of the matching
    /// objectives.
    async fn computed_progress(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
        owner: Option<Uuid>,
    ) -> OkrResult<f64> {
        let objectives = self
            .repos
            .objectives()
            .list(ObjectiveFilter::new(company_id, quarter_id).owned_by(owner))
            .await?;
        if objectives.is_empty() {
            return Ok(0.0);
        }

        let objective_ids: Vec<Uuid> = objectives.iter().map(|o| o.id).collect();
        let key_results = self
            .repos
            .key_results()
            .list_by_objectives(&objective_ids)
            .await?;
        if key_results.is_empty() {
            return Ok(0.0);
        }

        let kr_ids: Vec<Uuid> = key_results.iter().map(|kr| kr.id).collect();
        let checkins = self.repos.kr_checkins().list_by_key_results(&kr_ids).await?;
        Ok(progress::checkin_progress(&checkins))
    }

    async fn history(
        &self,
        scope: &DashboardScope,
        quarters: &[Quarter],
        today: NaiveDate,
    ) -> OkrResult<Vec<QuarterPerformance>> {
        let owner = scope.owner_filter();
        let results: HashMap<Uuid, QuarterResult> = match owner {
            Some(user_id) => self
                .repos
                .quarter_results()
                .list_by_user(scope.company_id, user_id)
                .await?
                .into_iter()
                .map(|r| (r.quarter_id, r))
                .collect(),
            None => HashMap::new(),
        };

        let mut history = Vec::with_capacity(quarters.len());
        for (q, status) in quarter::classify(quarters, today) {
            let percentage = match progress::finalized_percentage(results.get(&q.id)) {
                Some(percentage) => percentage,
                None => self.computed_progress(scope.company_id, q.id, owner).await?,
            };
            history.push(QuarterPerformance {
                quarter: q.clone(),
                status,
                percentage,
            });
        }
        Ok(history)
    }

    async fn user_rankings(
        &self,
        scope: &DashboardScope,
        quarter_id: Uuid,
    ) -> OkrResult<Vec<UserRanking>> {
        if !scope.role.is_manager() {
            return Ok(Vec::new());
        }

        let results = self
            .repos
            .quarter_results()
            .list_by_quarter(scope.company_id, quarter_id)
            .await?;
        let user_ids: Vec<Uuid> = results
            .iter()
            .filter(|r| r.percentage.is_some())
            .map(|r| r.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let profiles = self.repos.profiles().list_by_ids(&user_ids).await?;
        Ok(ranking::rank_users(&results, &profiles))
    }

    async fn objective_rollups(
        &self,
        scope: &DashboardScope,
        quarter_id: Uuid,
    ) -> OkrResult<Vec<ObjectiveRollup>> {
        let objectives = self
            .repos
            .objectives()
            .list(ObjectiveFilter::new(scope.company_id, quarter_id).without_archived())
            .await?;
        if objectives.is_empty() {
            return Ok(Vec::new());
        }

        let objective_ids: Vec<Uuid> = objectives.iter().map(|o| o.id).collect();
        let key_results = self
            .repos
            .key_results()
            .list_by_objectives(&objective_ids)
            .await?;
        let rollups = rollup::objective_rollups(&objectives, &key_results);

        ObjectiveGroupCache::new(self.repos.objective_groups(), self.cache_policy.clone())
            .write(scope.company_id, quarter_id, &rollups)
            .await;

        Ok(rollups)
    }

    async fn kr_rankings(
        &self,
        scope: &DashboardScope,
        quarter_id: Uuid,
    ) -> OkrResult<Vec<KrRanking>> {
        let objectives = self
            .repos
            .objectives()
            .list(ObjectiveFilter::new(scope.company_id, quarter_id).owned_by(scope.owner_filter()))
            .await?;
        if objectives.is_empty() {
            return Ok(Vec::new());
        }

        let objective_ids: Vec<Uuid> = objectives.iter().map(|o| o.id).collect();
        let key_results = self
            .repos
            .key_results()
            .list_by_objectives(&objective_ids)
            .await?;
        if key_results.is_empty() {
            return Ok(Vec::new());
        }

        let owners = ranking::owner_ids(&key_results, &objectives);
        let profiles = self.repos.profiles().list_by_ids(&owners).await?;
        Ok(ranking::rank_key_results(&key_results, &objectives, &profiles))
    }
}

fn or_empty<T: Default>(section: &'static str, scope: &DashboardScope, result: OkrResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(
            section,
            company_id = %scope.company_id,
            viewer_id = %scope.viewer_id,
            error = %e,
            "Dashboard section failed, showing no data"
        );
        T::default()
    })
}
