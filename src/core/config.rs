use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RippleError};

/// How an insulin event is tested against the `[max_time, min_time]` interval
/// of an excursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    /// Closed span between the two extrema, whichever comes first.
    #[default]
    Span,
    /// Clock-style range: when `max_time > min_time` the range wraps and an
    /// event is inside if it is at or after the max, or at or before the min.
    Wraparound,
}

/// Configuration for ripple segmentation and comparison.
///
/// Every field has a default, so a partial TOML document is enough:
///
/// ```
/// use ripple_rs::AnalysisConfig;
///
/// let config = AnalysisConfig::from_toml_str("min_run_length = 12").unwrap();
/// assert_eq!(config.min_run_length, 12);
/// assert_eq!(config.threshold, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum average run magnitude (mg/dL per sample) for a cut.
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// A cut is only considered once more than this many samples accumulated
    /// since the previous cut.
    #[serde(default = "default_min_run_length")]
    pub min_run_length: usize,
    /// Relative tolerance used when comparing normalized shapes.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub containment: Containment,
}

fn default_threshold() -> i64 {
    1
}

fn default_min_run_length() -> usize {
    50
}

fn default_tolerance() -> f64 {
    0.05
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            min_run_length: default_min_run_length(),
            tolerance: default_tolerance(),
            containment: Containment::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new(threshold: i64, min_run_length: usize) -> Self {
        Self {
            threshold,
            min_run_length,
            ..Self::default()
        }
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_containment(mut self, containment: Containment) -> Self {
        self.containment = containment;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return Err(RippleError::Configuration(format!(
                "tolerance must be in [0, 1), got {}",
                self.tolerance
            )));
        }
        if self.threshold < 0 {
            return Err(RippleError::Configuration(format!(
                "threshold must be non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}
