pub mod algorithms;
pub mod core;
pub mod metrics;

pub use crate::algorithms::alignment::{align_interval, align_peaks, count_close, Alignment};
pub use crate::algorithms::duration::{
    distinct_duration_buckets, duration_bucket, duration_buckets, round_to_nearest_hour,
};
pub use crate::algorithms::insulin::{
    analyze_positions, split_by_excursion, split_by_speed, InsulinBySpeed, InsulinOffsets, Offset,
};
pub use crate::algorithms::similarity::{compare_graphs, SimilarityEdge, SimilarityGraph};
pub use crate::algorithms::stats::ExcursionStats;
pub use crate::algorithms::trend::{compute_trend, generate_excursions, partition};
pub use crate::core::config::{AnalysisConfig, Containment};
pub use crate::core::error::{Result, RippleError};
pub use crate::core::excursion::{Excursion, ExcursionSampleRow, ExcursionSummary};
pub use crate::core::report::AnalysisReport;
pub use crate::core::sample::{
    validate_insulin, validate_samples, InsulinEvent, InsulinKind, Sample,
};
pub use crate::core::shape_metric::ShapeMetric;
pub use crate::metrics::absolute::AbsoluteTolerance;
pub use crate::metrics::relative::RelativeTolerance;

use log::info;

use crate::algorithms::trend;

/// High-level facade for the ripple pipeline, generic over the shape
/// closeness rule.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use ripple_rs::{AnalysisConfig, GlucoseAnalyzer, Sample};
///
/// let t0 = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let samples: Vec<Sample> = [100.0, 105.0, 110.0, 105.0, 100.0]
///     .iter()
///     .enumerate()
///     .map(|(i, &v)| Sample::new(t0 + TimeDelta::hours(i as i64), v))
///     .collect();
///
/// let analyzer = GlucoseAnalyzer::new(AnalysisConfig::new(1, 0));
/// let report = analyzer.analyze(&samples, &[]).unwrap();
/// assert_eq!(report.len(), 1);
/// assert_eq!(report.excursions()[0].max_index(), 2);
/// ```
pub struct Analyzer<M: ShapeMetric> {
    config: AnalysisConfig,
    _metric: std::marker::PhantomData<M>,
}

impl<M: ShapeMetric> Analyzer<M> {
    /// Create a new analyzer with the given configuration.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            _metric: std::marker::PhantomData,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Validate the glucose series and cut it into excursions.
    pub fn segment(&self, samples: &[Sample]) -> Result<Vec<Excursion>> {
        validate_samples(samples)?;
        trend::segment(samples, &self.config)
    }

    /// Build the pairwise shape similarity graph.
    pub fn compare(&self, excursions: &[Excursion]) -> SimilarityGraph {
        compare_graphs::<M>(excursions, self.config.tolerance)
    }

    /// Assign insulin to excursions and annotate each excursion.
    ///
    /// With the `parallel` feature excursions are annotated on the rayon pool;
    /// the output is always in excursion order.
    pub fn correlate(
        &self,
        excursions: &[Excursion],
        graph: &SimilarityGraph,
        insulin: &[InsulinEvent],
    ) -> Result<Vec<ExcursionStats>> {
        validate_insulin(insulin)?;
        let groups = split_by_excursion(insulin, excursions);
        let containment = self.config.containment;

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            Ok(excursions
                .par_iter()
                .zip(groups.par_iter())
                .enumerate()
                .map(|(i, (excursion, events))| {
                    ExcursionStats::build(i, excursion, graph, events, containment)
                })
                .collect())
        }

        #[cfg(not(feature = "parallel"))]
        {
            Ok(excursions
                .iter()
                .zip(groups.iter())
                .enumerate()
                .map(|(i, (excursion, events))| {
                    ExcursionStats::build(i, excursion, graph, events, containment)
                })
                .collect())
        }
    }

    /// Run the whole pipeline: segment, compare, bucket and correlate.
    pub fn analyze(&self, samples: &[Sample], insulin: &[InsulinEvent]) -> Result<AnalysisReport> {
        self.config.validate()?;

        let excursions = self.segment(samples)?;
        let graph = self.compare(&excursions);
        let stats = self.correlate(&excursions, &graph, insulin)?;
        let durations = duration_buckets(&excursions);
        let duration_buckets = distinct_duration_buckets(&excursions);

        info!(
            "analyzed {} samples and {} insulin events: {} excursions, {} similarity edges",
            samples.len(),
            insulin.len(),
            excursions.len(),
            graph.edge_count()
        );

        Ok(AnalysisReport {
            excursions,
            graph,
            durations,
            duration_buckets,
            stats,
        })
    }
}

/// Convenience type alias for the most common use case.
pub type GlucoseAnalyzer = Analyzer<RelativeTolerance>;

/// Analyzer comparing shapes with an absolute tolerance.
pub type AbsoluteAnalyzer = Analyzer<AbsoluteTolerance>;
