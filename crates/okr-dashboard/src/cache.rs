//! Write-through cache of objective rollups.
//!
//! Rollups are computed on every dashboard load; the cache keeps a
//! denormalized copy per (company, quarter, title) for cheaper reads
//! elsewhere. Writes retry on their own policy and never fail the
//! caller.

use std::time::Duration;

use okr_core::models::objective_group::UpsertObjectiveGroupResult;
use okr_core::repository::ObjectiveGroupResultRepository;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::rollup::ObjectiveRollup;

/// Retry policy for cache writes.
#[derive(Debug, Clone)]
pub struct CacheRetryPolicy {
    /// Total attempts per row, including the first (default: 2).
    pub max_attempts: u32,
    /// Pause between attempts (default: 200 ms).
    pub backoff: Duration,
}

impl Default for CacheRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheWriteReport {
    pub written: usize,
    pub failed: usize,
}

pub struct ObjectiveGroupCache<'a, G: ObjectiveGroupResultRepository> {
    repo: &'a G,
    policy: CacheRetryPolicy,
}

impl<'a, G: ObjectiveGroupResultRepository> ObjectiveGroupCache<'a, G> {
    pub fn new(repo: &'a G, policy: CacheRetryPolicy) -> Self {
        Self { repo, policy }
    }

    /// Upsert one row per rollup.
    pub async fn write(
        &self,
        company_id: Uuid,
        quarter_id: Uuid,
        rollups: &[ObjectiveRollup],
    ) -> CacheWriteReport {
        let mut report = CacheWriteReport::default();
        for rollup in rollups {
            let input = UpsertObjectiveGroupResult {
                company_id,
                quarter_id,
                title: rollup.title.clone(),
                percentage: rollup.percentage,
                objective_count: rollup.objective_count,
                kr_count: rollup.kr_count,
            };
            if self.upsert_with_retry(input).await {
                report.written += 1;
            } else {
                report.failed += 1;
            }
        }

        debug!(
            company_id = %company_id,
            quarter_id = %quarter_id,
            written = report.written,
            failed = report.failed,
            "Objective group cache updated"
        );
        report
    }

    async fn upsert_with_retry(&self, input: UpsertObjectiveGroupResult) -> bool {
        let attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=attempts {
            match self.repo.upsert(input.clone()).await {
                Ok(_) => return true,
                Err(e) if attempt < attempts => {
                    debug!(title = %input.title, attempt, error = %e, "Cache write failed, retrying");
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => {
                    warn!(
                        company_id = %input.company_id,
                        quarter_id = %input.quarter_id,
                        title = %input.title,
                        attempts,
                        error = %e,
                        "Giving up on objective group cache write"
                    );
                }
            }
        }
        false
    }
}
