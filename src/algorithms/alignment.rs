use std::ops::Range;

use serde::Serialize;

use crate::core::excursion::Excursion;
use crate::core::shape_metric::ShapeMetric;

/// Overlapping index windows of two normalized shapes, anchored on their peaks.
///
/// Both windows always have the same length. An empty alignment means the two
/// shapes are not comparable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub a: Range<usize>,
    pub b: Range<usize>,
}

impl Alignment {
    pub fn empty() -> Self {
        Self { a: 0..0, b: 0..0 }
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// The same alignment seen from the other excursion.
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b.clone(),
            b: self.a.clone(),
        }
    }
}

/// Align two shapes of lengths `len_a`/`len_b` with peaks at `max_a`/`max_b`.
///
/// Cases, in priority order:
/// 1. both peaks at index 0: `[0, min_len)` on both sides;
/// 2. both peaks at the last index: the last `min_len` samples of each;
/// 3. both peaks interior: extend from each peak backward by the shorter
///    pre-peak span and forward by the shorter post-peak span;
/// 4. anything else (one peak on an edge, the other not, or on opposite
///    edges): empty.
pub fn align_peaks(len_a: usize, max_a: usize, len_b: usize, max_b: usize) -> Alignment {
    if len_a == 0 || len_b == 0 || max_a >= len_a || max_b >= len_b {
        return Alignment::empty();
    }

    let last_a = len_a - 1;
    let last_b = len_b - 1;
    let min_len = len_a.min(len_b);

    if max_a == 0 && max_b == 0 {
        Alignment {
            a: 0..min_len,
            b: 0..min_len,
        }
    } else if max_a == last_a && max_b == last_b {
        Alignment {
            a: (len_a - min_len)..len_a,
            b: (len_b - min_len)..len_b,
        }
    } else if max_a != 0 && max_b != 0 && max_a != last_a && max_b != last_b {
        let before = max_a.min(max_b);
        let after = (last_a - max_a).min(last_b - max_b);
        Alignment {
            a: (max_a - before)..(max_a + after + 1),
            b: (max_b - before)..(max_b + after + 1),
        }
    } else {
        Alignment::empty()
    }
}

/// Align two excursions' normalized shapes on their peaks.
pub fn align_interval(a: &Excursion, b: &Excursion) -> Alignment {
    align_peaks(a.len(), a.max_index(), b.len(), b.max_index())
}

/// Count close samples between the aligned windows of two excursions.
///
/// Returns `(window length, close count)`; `(0, 0)` for incomparable shapes.
pub fn count_close<M: ShapeMetric>(
    a: &Excursion,
    b: &Excursion,
    alignment: &Alignment,
    tolerance: f64,
) -> (usize, usize) {
    if alignment.is_empty() {
        return (0, 0);
    }
    let window_a = &a.normalized_shape()[alignment.a.clone()];
    let window_b = &b.normalized_shape()[alignment.b.clone()];
    M::count_close(window_a, window_b, tolerance)
}

/// Align and compare two excursions in one step.
pub fn compare_pair<M: ShapeMetric>(
    a: &Excursion,
    b: &Excursion,
    tolerance: f64,
) -> (usize, usize) {
    let alignment = align_interval(a, b);
    count_close::<M>(a, b, &alignment, tolerance)
}
