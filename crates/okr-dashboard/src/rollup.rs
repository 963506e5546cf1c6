//! Objective rollups: objectives grouped by normalized title.

use std::collections::HashMap;

use okr_core::models::key_result::KeyResult;
use okr_core::models::objective::Objective;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveRollup {
    /// Trimmed title shared by the group.
    pub title: String,
    /// Mean of the members' cached progress.
    pub percentage: f64,
    pub objective_count: u64,
    pub kr_count: u64,
}

/// Group non-archived objectives by trimmed title.
///
/// Groups with neither progress nor key results are dropped. The rest
/// are ordered by percentage, highest first; ties keep first-seen
/// order.
pub fn objective_rollups(objectives: &[Objective], key_results: &[KeyResult]) -> Vec<ObjectiveRollup> {
    let mut kr_counts: HashMap<Uuid, u64> = HashMap::new();
    for kr in key_results {
        *kr_counts.entry(kr.objective_id).or_default() += 1;
    }

    struct Group<'a> {
        title: &'a str,
        progress_sum: f64,
        objective_count: u64,
        kr_count: u64,
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();
    for objective in objectives.iter().filter(|o| !o.archived) {
        let title = objective.title.trim();
        let slot = *index.entry(title).or_insert_with(|| {
            groups.push(Group {
                title,
                progress_sum: 0.0,
                objective_count: 0,
                kr_count: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.progress_sum += objective.progress;
        group.objective_count += 1;
        group.kr_count += kr_counts.get(&objective.id).copied().unwrap_or(0);
    }

    let mut rollups: Vec<ObjectiveRollup> = groups
        .into_iter()
        .map(|g| ObjectiveRollup {
            title: g.title.to_string(),
            percentage: g.progress_sum / g.objective_count as f64,
            objective_count: g.objective_count,
            kr_count: g.kr_count,
        })
        .filter(|r| !(r.percentage == 0.0 && r.kr_count == 0))
        .collect();
    rollups.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    rollups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective(title: &str, progress: f64, archived: bool) -> Objective {
        Objective {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            quarter_id: Uuid::nil(),
            owner_id: Uuid::new_v4(),
            title: title.into(),
            archived,
            progress,
        }
    }

    fn key_results(objective: &Objective, n: usize) -> Vec<KeyResult> {
        (0..n)
            .map(|i| KeyResult {
                id: Uuid::new_v4(),
                objective_id: objective.id,
                owner_id: None,
                title: format!("KR {i}"),
                code: None,
                progress: 0.0,
            })
            .collect()
    }

    #[test]
    fn groups_by_trimmed_title_and_averages_members() {
        let a = objective("Increase NPS", 80.0, false);
        let b = objective("  Increase NPS ", 40.0, false);
        let mut krs = key_results(&a, 2);
        krs.extend(key_results(&b, 3));

        let rollups = objective_rollups(&[a, b], &krs);
        assert_eq!(
            rollups,
            vec![ObjectiveRollup {
                title: "Increase NPS".into(),
                percentage: 60.0,
                objective_count: 2,
                kr_count: 5,
            }]
        );
    }

    #[test]
    fn archived_objectives_are_ignored() {
        let live = objective("Hire", 30.0, false);
        let archived = objective("Hire", 100.0, true);

        let rollups = objective_rollups(&[live, archived], &[]);
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].percentage, 30.0);
        assert_eq!(rollups[0].objective_count, 1);
    }

    #[test]
    fn empty_groups_are_dropped_and_rest_sorted() {
        let idle = objective("Idle", 0.0, false);
        let started = objective("Started", 0.0, false);
        let ahead = objective("Ahead", 75.0, false);
        let behind = objective("Behind", 25.0, false);
        let krs = key_results(&started, 1);

        let rollups = objective_rollups(&[idle, started, behind, ahead], &krs);
        let titles: Vec<&str> = rollups.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Ahead", "Behind", "Started"]);
    }
}
