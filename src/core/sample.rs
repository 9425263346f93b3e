use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RippleError};

/// One glucose reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// Glucose value in mg/dL.
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Insulin acting speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulinKind {
    FastActing,
    SlowActing,
}

/// One insulin dose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsulinEvent {
    pub timestamp: NaiveDateTime,
    pub kind: InsulinKind,
    /// Dose in units.
    pub dose: f64,
}

impl InsulinEvent {
    pub fn new(timestamp: NaiveDateTime, kind: InsulinKind, dose: f64) -> Self {
        Self {
            timestamp,
            kind,
            dose,
        }
    }
}

/// Check a glucose series before segmentation.
///
/// Requires at least 2 samples, strictly increasing timestamps, and finite
/// non-negative values.
pub fn validate_samples(samples: &[Sample]) -> Result<()> {
    if samples.len() < 2 {
        return Err(RippleError::invalid(format!(
            "need at least 2 glucose samples, got {}",
            samples.len()
        )));
    }
    for (i, s) in samples.iter().enumerate() {
        if !s.value.is_finite() || s.value < 0.0 {
            return Err(RippleError::invalid(format!(
                "glucose value at index {i} must be finite and >= 0, got {}",
                s.value
            )));
        }
    }
    if let Some(i) = samples
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        return Err(RippleError::invalid(format!(
            "glucose timestamps must be strictly increasing (index {} -> {})",
            i,
            i + 1
        )));
    }
    Ok(())
}

/// Check an insulin event list: ordered by timestamp, finite non-negative doses.
/// An empty list is valid.
pub fn validate_insulin(events: &[InsulinEvent]) -> Result<()> {
    for (i, e) in events.iter().enumerate() {
        if !e.dose.is_finite() || e.dose < 0.0 {
            return Err(RippleError::invalid(format!(
                "insulin dose at index {i} must be finite and >= 0, got {}",
                e.dose
            )));
        }
    }
    if let Some(i) = events
        .windows(2)
        .position(|w| w[1].timestamp < w[0].timestamp)
    {
        return Err(RippleError::invalid(format!(
            "insulin events must be ordered by timestamp (index {} -> {})",
            i,
            i + 1
        )));
    }
    Ok(())
}
