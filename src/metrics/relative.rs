use crate::core::shape_metric::ShapeMetric;

/// Relative closeness: `|a - b| <= tolerance * max(|a|, |b|)`.
///
/// This is the default rule. Being relative, a 5% tolerance is tighter for
/// low normalized values than for values near the peak.
#[derive(Debug, Clone)]
pub struct RelativeTolerance;

impl ShapeMetric for RelativeTolerance {
    #[inline]
    fn is_close(a: f64, b: f64, tolerance: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        (a - b).abs() <= tolerance * a.abs().max(b.abs())
    }
}
