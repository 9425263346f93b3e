use std::collections::BTreeSet;

use chrono::TimeDelta;

use crate::core::excursion::Excursion;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Round a duration in seconds to the nearest whole hour.
///
/// Exact half hours round to the even hour: 5400 s (1.5 h) gives 2, 9000 s
/// (2.5 h) gives 2.
pub fn round_to_nearest_hour(seconds: f64) -> i64 {
    (seconds / SECONDS_PER_HOUR).round_ties_even() as i64
}

/// Duration bucket of an excursion, in whole hours.
pub fn duration_bucket(duration: TimeDelta) -> i64 {
    let seconds = duration.num_milliseconds() as f64 / 1000.0;
    round_to_nearest_hour(seconds)
}

/// Hour bucket of every excursion, in excursion order.
pub fn duration_buckets(excursions: &[Excursion]) -> Vec<i64> {
    excursions
        .iter()
        .map(|e| duration_bucket(e.duration()))
        .collect()
}

/// Sorted distinct hour buckets across all excursions.
pub fn distinct_duration_buckets(excursions: &[Excursion]) -> Vec<i64> {
    excursions
        .iter()
        .map(|e| duration_bucket(e.duration()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
