//! User and key result rankings.

use std::collections::HashMap;

use okr_core::models::key_result::KeyResult;
use okr_core::models::objective::Objective;
use okr_core::models::profile::Profile;
use okr_core::models::quarter_result::QuarterResult;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRanking {
    /// 1-based.
    pub rank: usize,
    pub user_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KrRanking {
    pub key_result_id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub code: Option<String>,
    pub progress: f64,
    pub owner_id: Option<Uuid>,
    pub owner_name: Option<String>,
}

/// Rank users by finalized result, highest first.
///
/// Results without a percentage, or whose profile is missing or
/// inactive, are left out. Ties keep input order.
pub fn rank_users(results: &[QuarterResult], profiles: &[Profile]) -> Vec<UserRanking> {
    let by_id: HashMap<Uuid, &Profile> = profiles.iter().map(|p| (p.id, p)).collect();

    let mut rows: Vec<(&Profile, f64)> = results
        .iter()
        .filter_map(|r| {
            let percentage = r.percentage?;
            let profile = by_id.get(&r.user_id).filter(|p| p.active)?;
            Some((*profile, percentage))
        })
        .collect();
    rows.sort_by(|a, b| b.1.total_cmp(&a.1));

    rows.into_iter()
        .enumerate()
        .map(|(i, (profile, percentage))| UserRanking {
            rank: i + 1,
            user_id: profile.id,
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            percentage,
        })
        .collect()
}

/// Rank key results by cached progress, highest first.
///
/// The owner is the objective's owner when the objective is known,
/// since objectives are reassigned independently of their key results;
/// otherwise the key result's own owner.
pub fn rank_key_results(
    key_results: &[KeyResult],
    objectives: &[Objective],
    profiles: &[Profile],
) -> Vec<KrRanking> {
    let objective_owner: HashMap<Uuid, Uuid> =
        objectives.iter().map(|o| (o.id, o.owner_id)).collect();
    let names: HashMap<Uuid, &str> = profiles
        .iter()
        .map(|p| (p.id, p.full_name.as_str()))
        .collect();

    let mut rows: Vec<KrRanking> = key_results
        .iter()
        .map(|kr| {
            let owner_id = objective_owner
                .get(&kr.objective_id)
                .copied()
                .or(kr.owner_id);
            KrRanking {
                key_result_id: kr.id,
                objective_id: kr.objective_id,
                title: kr.title.clone(),
                code: kr.code.clone(),
                progress: kr.progress,
                owner_id,
                owner_name: owner_id
                    .and_then(|id| names.get(&id))
                    .map(|n| n.to_string()),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    rows
}

/// Distinct owners referenced by objectives and key results.
pub fn owner_ids(key_results: &[KeyResult], objectives: &[Objective]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = objectives
        .iter()
        .map(|o| o.owner_id)
        .chain(key_results.iter().filter_map(|kr| kr.owner_id))
        .collect();
    ids.sort();
    ids.dedup();
    ids
}
