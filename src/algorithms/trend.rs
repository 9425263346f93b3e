use log::debug;

use crate::core::config::AnalysisConfig;
use crate::core::error::Result;
use crate::core::excursion::Excursion;
use crate::core::sample::Sample;

/// Compute the trend of a glucose series.
///
/// Element `k` is `trunc(v[k+1]) - trunc(v[k])` (0 when equal); a terminal 0 is
/// appended so the trend has one entry per sample.
pub fn compute_trend(samples: &[Sample]) -> Vec<i64> {
    let mut trend: Vec<i64> = samples
        .windows(2)
        .map(|w| {
            let current = w[0].value as i64;
            let next = w[1].value as i64;
            if current == next {
                0
            } else {
                next - current
            }
        })
        .collect();
    if !samples.is_empty() {
        trend.push(0);
    }
    trend
}

/// Running state of the partition scan.
///
/// `positive` and `negative` hold the latest average run magnitude of each
/// direction. They are only zeroed when a cut is evaluated, and the run
/// counters they are divided by accumulate across runs until then.
#[derive(Debug, Default)]
struct RunState {
    /// Samples consumed since the last cut.
    count: usize,
    count_positive: usize,
    count_negative: usize,
    /// Completed runs since the last cut.
    switch: usize,
    positive: f64,
    negative: f64,
    positive_prev: f64,
    negative_prev: f64,
}

impl RunState {
    /// Consume a maximal run of non-negative trend values starting at `k`.
    /// Returns the index of the first sample not consumed.
    fn consume_rising(&mut self, trend: &[i64], mut k: usize) -> usize {
        let last = trend.len() - 1;
        while k < last && trend[k] >= 0 {
            self.positive += trend[k] as f64;
            self.count_positive += 1;
            self.count += 1;
            k += 1;
        }
        if self.count_positive > 0 {
            self.positive /= self.count_positive as f64;
        }
        self.switch += 1;
        k
    }

    /// Consume a maximal run of negative trend values starting at `k`.
    fn consume_falling(&mut self, trend: &[i64], mut k: usize) -> usize {
        let last = trend.len() - 1;
        while k < last && trend[k] < 0 {
            self.negative += trend[k] as f64;
            self.count_negative += 1;
            self.count += 1;
            k += 1;
        }
        if self.count_negative > 0 {
            self.negative = -(self.negative / self.count_negative as f64);
        }
        self.switch += 1;
        k
    }

    fn strong_enough(&self, threshold: f64) -> bool {
        (self.positive >= threshold && self.negative >= threshold)
            || (self.positive_prev >= threshold && self.negative >= threshold)
            || (self.positive >= threshold && self.negative_prev >= threshold)
    }

    /// Decide whether to cut after a completed run. Returns the segment length
    /// when a cut is made.
    fn evaluate(&mut self, threshold: f64, min_run_length: usize) -> Option<usize> {
        if self.switch < 2 || self.count <= min_run_length {
            return None;
        }

        self.count_positive = 0;
        self.count_negative = 0;

        let cut = if self.strong_enough(threshold) {
            let len = self.count;
            self.count = 0;
            self.switch = 0;
            Some(len)
        } else {
            None
        };

        self.positive_prev = self.positive;
        self.negative_prev = self.negative;
        self.positive = 0.0;
        self.negative = 0.0;

        cut
    }
}

/// Partition a trend into segment lengths at trend sign changes.
///
/// The scan alternates between maximal runs of non-negative and negative trend
/// values. Once at least two runs completed since the last cut and more than
/// `min_run_length` samples accumulated, a cut is emitted if the current or
/// previous run averages reach `threshold` in both directions.
///
/// A run that reaches the last sample consumes it. Samples after the last cut
/// are not part of any segment.
///
/// # Returns
/// Segment lengths, each > 0, summing to at most `trend.len()`. Empty when the
/// trend has fewer than 2 entries.
pub fn partition(trend: &[i64], threshold: i64, min_run_length: usize) -> Vec<usize> {
    let n = trend.len();
    let mut cuts = Vec::new();
    if n < 2 {
        return cuts;
    }

    let threshold = threshold as f64;
    let mut state = RunState::default();
    let mut k = 0;

    loop {
        k = if trend[k] >= 0 {
            state.consume_rising(trend, k)
        } else {
            state.consume_falling(trend, k)
        };

        let at_end = k == n - 1;
        if at_end {
            state.count += 1;
        }

        if let Some(len) = state.evaluate(threshold, min_run_length) {
            debug!("partition: cut after {len} samples (position {})", k);
            cuts.push(len);
        }

        if at_end {
            break;
        }
    }

    let covered: usize = cuts.iter().sum();
    if covered < n {
        debug!(
            "partition: {} trailing samples not assigned to any segment",
            n - covered
        );
    }

    cuts
}

/// Build one excursion per segment length, slicing `samples` consecutively.
pub fn generate_excursions(samples: &[Sample], lengths: &[usize]) -> Result<Vec<Excursion>> {
    let mut excursions = Vec::with_capacity(lengths.len());
    let mut start = 0;
    for &len in lengths {
        let end = (start + len).min(samples.len());
        excursions.push(Excursion::new(samples[start..end].to_vec())?);
        start = end;
    }
    Ok(excursions)
}

/// Full segmentation: trend, partition, and excursion construction.
pub fn segment(samples: &[Sample], config: &AnalysisConfig) -> Result<Vec<Excursion>> {
    let trend = compute_trend(samples);
    let lengths = partition(&trend, config.threshold, config.min_run_length);
    debug!(
        "segment: {} samples -> {} excursions",
        samples.len(),
        lengths.len()
    );
    generate_excursions(samples, &lengths)
}
