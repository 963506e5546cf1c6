//! Progress from key result check-ins.

use std::collections::HashMap;

use okr_core::models::checkin::KrCheckin;
use okr_core::models::quarter_result::QuarterResult;
use uuid::Uuid;

/// Latest attainment per key result.
///
/// Check-ins are expected oldest first; on equal timestamps the one
/// listed later wins.
pub fn latest_per_key_result(checkins: &[KrCheckin]) -> HashMap<Uuid, f64> {
    let mut latest: HashMap<Uuid, &KrCheckin> = HashMap::new();
    for checkin in checkins {
        match latest.get(&checkin.key_result_id) {
            Some(seen) if seen.recorded_at > checkin.recorded_at => {}
            _ => {
                latest.insert(checkin.key_result_id, checkin);
            }
        }
    }
    latest
        .into_iter()
        .map(|(kr, c)| (kr, c.attainment))
        .collect()
}

/// Arithmetic mean rounded to the nearest integer, halves up. An empty
/// input is 0.
pub fn mean_rounded<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    (sum / f64::from(count)).round()
}

/// Mean of the latest attainment of every key result that has at least
/// one check-in.
pub fn checkin_progress(checkins: &[KrCheckin]) -> f64 {
    mean_rounded(latest_per_key_result(checkins).into_values())
}

/// The percentage that overrides computed progress: present only when
/// a quarter result exists and carries a non-null value.
pub fn finalized_percentage(result: Option<&QuarterResult>) -> Option<f64> {
    result.and_then(|r| r.percentage)
}
