use std::fmt;

use log::debug;
use serde::Serialize;

use crate::algorithms::alignment::compare_pair;
use crate::core::excursion::{round2, Excursion};
use crate::core::shape_metric::ShapeMetric;

/// A directed similarity edge: how much of excursion `from`'s own shape
/// matched excursion `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityEdge {
    /// Close samples divided by the length of `from`'s shape, 2 decimals.
    pub match_fraction: f64,
    pub from: usize,
    pub to: usize,
}

impl SimilarityEdge {
    /// Match fraction as a whole percentage.
    pub fn percent(&self) -> i64 {
        (self.match_fraction * 100.0).round_ties_even() as i64
    }

    /// One-line analysis sentence for this edge.
    pub fn describe(&self) -> String {
        format!(
            "from {} to {} there is a {}% match",
            self.from,
            self.to,
            self.percent()
        )
    }
}

/// Best-match annotation, e.g. `80% -from 1-to 0`.
impl fmt::Display for SimilarityEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% -from {}-to {}", self.percent(), self.from, self.to)
    }
}

/// Pairwise shape similarity across all excursions.
///
/// `connections[i]` holds the edges out of excursion `i`, sorted ascending by
/// match fraction, so the last edge is the best match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityGraph {
    connections: Vec<Vec<SimilarityEdge>>,
}

impl SimilarityGraph {
    pub fn connections(&self) -> &[Vec<SimilarityEdge>] {
        &self.connections
    }

    /// Edges out of excursion `i`; empty when `i` is out of range.
    pub fn edges(&self, i: usize) -> &[SimilarityEdge] {
        self.connections.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn best_match(&self, i: usize) -> Option<&SimilarityEdge> {
        self.edges(i).last()
    }

    /// Number of excursions the graph was built over.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.connections.iter().map(Vec::len).sum()
    }

    /// Best-match sentence per excursion; `None` for excursions with no edge.
    pub fn summary_lines(&self) -> Vec<Option<String>> {
        (0..self.len())
            .map(|i| self.best_match(i).map(SimilarityEdge::describe))
            .collect()
    }
}

fn sort_edges(edges: &mut [SimilarityEdge]) {
    edges.sort_by(|x, y| {
        x.match_fraction
            .total_cmp(&y.match_fraction)
            .then(x.from.cmp(&y.from))
            .then(x.to.cmp(&y.to))
    });
}

/// Minimum number of excursions before dispatching rows to rayon.
#[cfg(feature = "parallel")]
const MIN_PARALLEL_EXCURSIONS: usize = 16;

/// Close counts of excursion `i` against every later excursion.
fn compare_row<M: ShapeMetric>(
    excursions: &[Excursion],
    i: usize,
    tolerance: f64,
) -> Vec<(usize, usize)> {
    ((i + 1)..excursions.len())
        .filter_map(|j| {
            let (_, close) = compare_pair::<M>(&excursions[i], &excursions[j], tolerance);
            (close > 0).then_some((j, close))
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn compare_rows_parallel<M: ShapeMetric>(
    excursions: &[Excursion],
    tolerance: f64,
) -> Vec<Vec<(usize, usize)>> {
    use rayon::prelude::*;

    (0..excursions.len())
        .into_par_iter()
        .map(|i| compare_row::<M>(excursions, i, tolerance))
        .collect()
}

fn compare_rows<M: ShapeMetric>(
    excursions: &[Excursion],
    tolerance: f64,
) -> Vec<Vec<(usize, usize)>> {
    #[cfg(feature = "parallel")]
    if excursions.len() >= MIN_PARALLEL_EXCURSIONS {
        return compare_rows_parallel::<M>(excursions, tolerance);
    }
    (0..excursions.len())
        .map(|i| compare_row::<M>(excursions, i, tolerance))
        .collect()
}

/// Compare every unordered pair of excursions and build the similarity graph.
///
/// A pair with at least one close sample produces two edges, each normalized
/// by its own excursion's length, so the same close count gives different
/// fractions for excursions of different lengths.
///
/// Rows may be evaluated in parallel; they are merged by index, so the result
/// does not depend on scheduling.
pub fn compare_graphs<M: ShapeMetric>(excursions: &[Excursion], tolerance: f64) -> SimilarityGraph {
    let n = excursions.len();
    let rows = compare_rows::<M>(excursions, tolerance);

    let mut connections: Vec<Vec<SimilarityEdge>> = vec![Vec::new(); n];
    for (i, row) in rows.into_iter().enumerate() {
        for (j, close) in row {
            connections[i].push(SimilarityEdge {
                match_fraction: round2(close as f64 / excursions[i].len() as f64),
                from: i,
                to: j,
            });
            connections[j].push(SimilarityEdge {
                match_fraction: round2(close as f64 / excursions[j].len() as f64),
                from: j,
                to: i,
            });
        }
    }

    for edges in connections.iter_mut() {
        sort_edges(edges);
    }

    let graph = SimilarityGraph { connections };
    debug!(
        "compare_graphs: {} excursions, {} directed edges",
        n,
        graph.edge_count()
    );
    graph
}
