use chrono::NaiveDateTime;
use serde::Serialize;

use crate::algorithms::duration::duration_bucket;
use crate::algorithms::insulin::{analyze_positions, split_by_speed, InsulinOffsets};
use crate::algorithms::similarity::{SimilarityEdge, SimilarityGraph};
use crate::core::config::Containment;
use crate::core::excursion::Excursion;
use crate::core::sample::InsulinEvent;

/// Analytical annotations of one excursion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcursionStats {
    /// Position of the excursion in the segmented list.
    pub index: usize,
    pub max_time: NaiveDateTime,
    pub min_time: NaiveDateTime,
    pub is_ascending: bool,
    /// Most similar other excursion, if any shape matched.
    pub best_match: Option<SimilarityEdge>,
    /// Duration rounded to whole hours.
    pub duration_category: i64,
    pub fast_insulin: Vec<InsulinEvent>,
    pub slow_insulin: Vec<InsulinEvent>,
    /// `None` when no fast-acting insulin was assigned.
    pub fast_offsets: Option<InsulinOffsets>,
    /// `None` when no slow-acting insulin was assigned.
    pub slow_offsets: Option<InsulinOffsets>,
}

impl ExcursionStats {
    /// Annotate excursion `index` from the similarity graph and the insulin
    /// events assigned to it.
    pub fn build(
        index: usize,
        excursion: &Excursion,
        graph: &SimilarityGraph,
        insulin: &[InsulinEvent],
        containment: Containment,
    ) -> Self {
        let by_speed = split_by_speed(insulin);
        let fast_offsets = analyze_positions(excursion, &by_speed.fast, containment);
        let slow_offsets = analyze_positions(excursion, &by_speed.slow, containment);

        Self {
            index,
            max_time: excursion.max_time(),
            min_time: excursion.min_time(),
            is_ascending: excursion.is_ascending(),
            best_match: graph.best_match(index).copied(),
            duration_category: duration_bucket(excursion.duration()),
            fast_insulin: by_speed.fast,
            slow_insulin: by_speed.slow,
            fast_offsets,
            slow_offsets,
        }
    }

    /// Best match rendered as `"{percent}% -from {i}-to {j}"`.
    pub fn best_match_summary(&self) -> Option<String> {
        self.best_match.as_ref().map(SimilarityEdge::to_string)
    }

    pub fn has_fast_insulin(&self) -> bool {
        !self.fast_insulin.is_empty()
    }

    pub fn has_slow_insulin(&self) -> bool {
        !self.slow_insulin.is_empty()
    }
}
