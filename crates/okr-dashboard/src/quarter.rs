//! Effective quarter selection and history classification.

use chrono::NaiveDate;
use okr_core::models::quarter::{Quarter, QuarterStatus};
use serde::Serialize;

/// One row of the per-quarter performance history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterPerformance {
    pub quarter: Quarter,
    pub status: QuarterStatus,
    pub percentage: f64,
}

/// The quarter containing `today` (inclusive), else the most recently
/// started one. `None` only when there are no quarters.
pub fn effective_quarter(quarters: &[Quarter], today: NaiveDate) -> Option<&Quarter> {
    quarters
        .iter()
        .filter(|q| q.contains(today))
        .max_by_key(|q| q.start_date)
        .or_else(|| quarters.iter().max_by_key(|q| q.start_date))
}

/// Every quarter with its status on `today`, oldest first.
pub fn classify(quarters: &[Quarter], today: NaiveDate) -> Vec<(&Quarter, QuarterStatus)> {
    let mut ordered: Vec<&Quarter> = quarters.iter().collect();
    ordered.sort_by_key(|q| q.start_date);
    ordered
        .into_iter()
        .map(|q| (q, q.status_on(today)))
        .collect()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn quarter(name: &str, start: NaiveDate, end: NaiveDate) -> Quarter {
        Quarter {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            name: name.into(),
            start_date: start,
            end_date: end,
            active: true,
        }
    }

    fn q1_q2() -> Vec<Quarter> {
        vec![
            quarter("Q2", date(4, 1), date(6, 30)),
            quarter("Q1", date(1, 1), date(3, 31)),
        ]
    }

    #[test]
    fn quarter_containing_today_is_effective() {
        let quarters = q1_q2();
        let effective = effective_quarter(&quarters, date(5, 15)).unwrap();
        assert_eq!(effective.name, "Q2");

        let classified = classify(&quarters, date(5, 15));
        let summary: Vec<(&str, QuarterStatus)> = classified
            .iter()
            .map(|(q, s)| (q.name.as_str(), *s))
            .collect();
        assert_eq!(
            summary,
            vec![("Q1", QuarterStatus::Finished), ("Q2", QuarterStatus::Current)]
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        let quarters = q1_q2();
        assert_eq!(effective_quarter(&quarters, date(3, 31)).unwrap().name, "Q1");
        assert_eq!(effective_quarter(&quarters, date(4, 1)).unwrap().name, "Q2");
    }

    #[test]
    fn falls_back_to_latest_start() {
        let quarters = q1_q2();
        assert_eq!(effective_quarter(&quarters, date(9, 1)).unwrap().name, "Q2");

        let before_all = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(effective_quarter(&quarters, before_all).unwrap().name, "Q2");
        assert_eq!(
            classify(&quarters, before_all)[0].1,
            QuarterStatus::Future
        );
    }

    #[test]
    fn no_quarters_no_effective() {
        assert!(effective_quarter(&[], date(1, 1)).is_none());
    }
}
