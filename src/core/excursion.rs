use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::algorithms::trend::compute_trend;
use crate::core::error::{Result, RippleError};
use crate::core::sample::Sample;

/// Round to 2 decimals, ties to even.
///
/// Rounds the exact binary value, not `x * 100`: the product can land on a
/// tie the stored value does not have (111/120 is slightly above 0.925).
pub(crate) fn round2(x: f64) -> f64 {
    format!("{x:.2}").parse().unwrap_or(x)
}

/// One glucose excursion ("ripple"): a contiguous slice of the series holding a
/// single rise-then-fall or fall-then-rise.
///
/// All derived attributes are computed once in [`Excursion::new`] and never
/// change afterwards.
///
/// Normalized values lie in `(0, 1]` as long as every sample is at least 0.5%
/// of the peak; a zero or near-zero reading normalizes to `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Excursion {
    samples: Vec<Sample>,
    trend: Vec<i64>,
    mean: f64,
    min_value: f64,
    min_index: usize,
    max_value: f64,
    max_index: usize,
    normalized_shape: Vec<f64>,
}

impl Excursion {
    /// Build an excursion from its own copy of the samples.
    ///
    /// Fails with `InvalidInput` when `samples` is empty or the peak value is
    /// not positive (normalization would divide by zero).
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(RippleError::invalid("an excursion needs at least 1 sample"));
        }

        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        let n = values.len() as f64;
        let mean = round2(values.iter().sum::<f64>() / n);

        // First occurrence wins on ties.
        let mut min_index = 0;
        let mut max_index = 0;
        for (i, &v) in values.iter().enumerate() {
            if v < values[min_index] {
                min_index = i;
            }
            if v > values[max_index] {
                max_index = i;
            }
        }
        let min_value = values[min_index];
        let max_value = values[max_index];

        if max_value.is_nan() || max_value <= 0.0 {
            return Err(RippleError::invalid(format!(
                "excursion starting at {} has non-positive peak {max_value}",
                samples[0].timestamp
            )));
        }

        let normalized_shape = values.iter().map(|v| round2(v / max_value)).collect();
        let trend = compute_trend(&samples);

        Ok(Self {
            samples,
            trend,
            mean,
            min_value,
            min_index,
            max_value,
            max_index,
            normalized_shape,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Integer-truncated deltas, one per sample, the last always 0.
    pub fn trend(&self) -> &[i64] {
        &self.trend
    }

    pub fn normalized_shape(&self) -> &[f64] {
        &self.normalized_shape
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean glucose, rounded to 2 decimals.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn start_time(&self) -> NaiveDateTime {
        self.samples[0].timestamp
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.samples[self.samples.len() - 1].timestamp
    }

    pub fn duration(&self) -> TimeDelta {
        self.end_time().signed_duration_since(self.start_time())
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn min_index(&self) -> usize {
        self.min_index
    }

    pub fn min_time(&self) -> NaiveDateTime {
        self.samples[self.min_index].timestamp
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn max_index(&self) -> usize {
        self.max_index
    }

    pub fn max_time(&self) -> NaiveDateTime {
        self.samples[self.max_index].timestamp
    }

    pub fn amplitude(&self) -> f64 {
        self.max_value - self.min_value
    }

    /// True unless the maximum occurs strictly before the minimum.
    pub fn is_ascending(&self) -> bool {
        self.max_time() >= self.min_time()
    }

    /// Scalar attributes, one row per excursion.
    pub fn summary(&self) -> ExcursionSummary {
        ExcursionSummary {
            len: self.len(),
            start_time: self.start_time(),
            end_time: self.end_time(),
            duration_seconds: self.duration().num_seconds(),
            mean: self.mean,
            amplitude: self.amplitude(),
            min_value: self.min_value,
            min_index: self.min_index,
            min_time: self.min_time(),
            max_value: self.max_value,
            max_index: self.max_index,
            max_time: self.max_time(),
        }
    }

    /// Per-sample sequences, one row per sample.
    pub fn detail_rows(&self) -> Vec<ExcursionSampleRow> {
        self.samples
            .iter()
            .zip(&self.trend)
            .zip(&self.normalized_shape)
            .map(|((s, &trend), &normalized)| ExcursionSampleRow {
                timestamp: s.timestamp,
                value: s.value,
                trend,
                normalized,
            })
            .collect()
    }
}

/// Scalar export row of an [`Excursion`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcursionSummary {
    pub len: usize,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: i64,
    pub mean: f64,
    pub amplitude: f64,
    pub min_value: f64,
    pub min_index: usize,
    pub min_time: NaiveDateTime,
    pub max_value: f64,
    pub max_index: usize,
    pub max_time: NaiveDateTime,
}

/// Per-sample export row of an [`Excursion`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcursionSampleRow {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    pub trend: i64,
    pub normalized: f64,
}

/// `H:MM:SS`, like the legacy exports.
pub(crate) fn fmt_hms(d: TimeDelta) -> String {
    let secs = d.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.abs();
    format!(
        "{sign}{}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Legend text, one attribute per line.
impl fmt::Display for Excursion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "amplitude={}", self.amplitude())?;
        writeln!(f, "average value={}mg/dL", self.mean)?;
        writeln!(f, "duration={}", fmt_hms(self.duration()))?;
        writeln!(f, "start time={}", self.start_time())?;
        writeln!(f, "end time={}", self.end_time())?;
        writeln!(f, "min={}mg/dL", self.min_value)?;
        writeln!(f, "min_time@={}", self.min_time())?;
        writeln!(f, "max={}mg/dL", self.max_value)?;
        write!(f, "max_time@={}", self.max_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hourly(values: &[f64]) -> Vec<Sample> {
        let t0 = NaiveDate::from_ymd_opt(2021, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(t0 + TimeDelta::hours(i as i64), v))
            .collect()
    }

    #[test]
    fn test_single_peak_attributes() {
        let e = Excursion::new(hourly(&[100.0, 105.0, 110.0, 105.0, 100.0])).unwrap();
        assert_eq!(e.len(), 5);
        assert_eq!(e.max_index(), 2);
        assert_eq!(e.max_value(), 110.0);
        assert_eq!(e.min_index(), 0);
        assert_eq!(e.min_value(), 100.0);
        assert_eq!(e.mean(), 104.0);
        assert_eq!(e.normalized_shape(), &[0.91, 0.95, 1.0, 0.95, 0.91]);
        assert_eq!(e.trend(), &[5, 5, -5, -5, 0]);
        assert_eq!(e.duration(), TimeDelta::hours(4));
        assert_eq!(e.max_time(), e.samples()[2].timestamp);
        assert_eq!(e.amplitude(), 10.0);
    }

    #[test]
    fn test_round2_uses_exact_value() {
        assert_eq!(round2(111.0 / 120.0), 0.93);
        assert_eq!(round2(74.0 / 80.0), 0.93);
        assert_eq!(round2(57.0 / 120.0), 0.47);
        // Exact binary ties go to the even digit.
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(100.0 / 110.0), 0.91);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn test_normalized_shape_on_rounding_boundary() {
        let e = Excursion::new(hourly(&[111.0, 120.0, 111.0])).unwrap();
        assert_eq!(e.normalized_shape(), &[0.93, 1.0, 0.93]);
        let e = Excursion::new(hourly(&[148.0, 156.0, 160.0, 84.0])).unwrap();
        assert_eq!(e.normalized_shape(), &[0.93, 0.97, 1.0, 0.53]);
    }

    #[test]
    fn test_near_zero_readings_normalize_to_zero() {
        let e = Excursion::new(hourly(&[0.0, 200.0, 0.9, 100.0])).unwrap();
        assert_eq!(e.normalized_shape(), &[0.0, 1.0, 0.0, 0.5]);
        assert_eq!(e.min_index(), 0);
    }

    #[test]
    fn test_ties_take_first_occurrence() {
        let e = Excursion::new(hourly(&[90.0, 120.0, 80.0, 120.0, 80.0])).unwrap();
        assert_eq!(e.max_index(), 1);
        assert_eq!(e.min_index(), 2);
    }

    #[test]
    fn test_orientation() {
        let rising = Excursion::new(hourly(&[80.0, 100.0, 140.0])).unwrap();
        assert!(rising.is_ascending());
        let falling = Excursion::new(hourly(&[140.0, 100.0, 80.0])).unwrap();
        assert!(!falling.is_ascending());
        // Single sample: max and min coincide.
        let flat = Excursion::new(hourly(&[100.0])).unwrap();
        assert!(flat.is_ascending());
    }

    #[test]
    fn test_mean_rounding() {
        let e = Excursion::new(hourly(&[100.0, 101.0, 101.0])).unwrap();
        assert_eq!(e.mean(), 100.67);
    }

    #[test]
    fn test_rejects_empty_and_zero_peak() {
        assert!(matches!(
            Excursion::new(Vec::new()),
            Err(RippleError::InvalidInput(_))
        ));
        assert!(matches!(
            Excursion::new(hourly(&[0.0, 0.0])),
            Err(RippleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_owns_its_samples() {
        let mut source = hourly(&[100.0, 120.0, 100.0]);
        let e = Excursion::new(source.clone()).unwrap();
        source[1].value = 500.0;
        assert_eq!(e.samples()[1].value, 120.0);
    }

    #[test]
    fn test_export_rows() {
        let e = Excursion::new(hourly(&[100.0, 120.0, 110.0])).unwrap();
        let summary = e.summary();
        assert_eq!(summary.len, 3);
        assert_eq!(summary.duration_seconds, 7200);
        assert_eq!(summary.max_index, 1);

        let rows = e.detail_rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].trend, 20);
        assert_eq!(rows[2].trend, 0);
        assert_eq!(rows[1].normalized, 1.0);
    }

    #[test]
    fn test_legend() {
        let e = Excursion::new(hourly(&[100.0, 120.0, 110.0])).unwrap();
        let legend = e.to_string();
        assert!(legend.starts_with("amplitude=20\n"));
        assert!(legend.contains("duration=2:00:00"));
        assert!(legend.contains("max=120mg/dL"));
    }
}
