use crate::core::shape_metric::ShapeMetric;

/// Absolute closeness: `|a - b| <= tolerance`.
///
/// Unlike [`RelativeTolerance`](crate::RelativeTolerance), the allowed gap is
/// the same everywhere on the normalized curve, which makes low troughs as
/// easy to match as peaks.
#[derive(Debug, Clone)]
pub struct AbsoluteTolerance;

impl ShapeMetric for AbsoluteTolerance {
    #[inline]
    fn is_close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }
}
