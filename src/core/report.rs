use serde::Serialize;

use crate::algorithms::similarity::SimilarityGraph;
use crate::algorithms::stats::ExcursionStats;
use crate::core::excursion::{Excursion, ExcursionSummary};

/// Everything produced by one pipeline run, indexed by excursion position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub(crate) excursions: Vec<Excursion>,
    pub(crate) graph: SimilarityGraph,
    pub(crate) durations: Vec<i64>,
    pub(crate) duration_buckets: Vec<i64>,
    pub(crate) stats: Vec<ExcursionStats>,
}

impl AnalysisReport {
    pub fn excursions(&self) -> &[Excursion] {
        &self.excursions
    }

    pub fn graph(&self) -> &SimilarityGraph {
        &self.graph
    }

    /// Hour bucket per excursion.
    pub fn durations(&self) -> &[i64] {
        &self.durations
    }

    /// Sorted distinct hour buckets.
    pub fn duration_buckets(&self) -> &[i64] {
        &self.duration_buckets
    }

    pub fn stats(&self) -> &[ExcursionStats] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.excursions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.excursions.is_empty()
    }

    /// Scalar export rows, one per excursion.
    pub fn summaries(&self) -> Vec<ExcursionSummary> {
        self.excursions.iter().map(Excursion::summary).collect()
    }
}
