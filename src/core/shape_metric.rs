/// Trait for the closeness rule used when comparing normalized shapes.
///
/// Designed for static polymorphism: the comparator is generic over
/// `M: ShapeMetric`, so the per-sample test inlines into the pairwise loop.
pub trait ShapeMetric: Clone + Send + Sync {
    /// Whether `a` and `b` count as the same sample at the given tolerance.
    fn is_close(a: f64, b: f64, tolerance: f64) -> bool;

    /// Count close pairs between two equally long windows.
    ///
    /// Returns `(window length, close count)`. Windows of different length are
    /// compared over their common prefix.
    fn count_close(a: &[f64], b: &[f64], tolerance: f64) -> (usize, usize) {
        let len = a.len().min(b.len());
        let close = a
            .iter()
            .zip(b)
            .filter(|(x, y)| Self::is_close(**x, **y, tolerance))
            .count();
        (len, close)
    }
}
