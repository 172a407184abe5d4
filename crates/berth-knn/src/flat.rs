//! Exact brute-force neighbour search.

use crate::metric::Metric;
use berth_core::{Error, Result};

/// One search hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row in the indexed matrix.
    pub row: usize,
    /// Distance from the query.
    pub distance: f64,
}

/// Exact, row-major flat index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    metric: Metric,
    dim: usize,
    vecs: Vec<f64>, // concatenated rows of length `dim`
}

impl FlatIndex {
    /// Index a row-major buffer of `dim`-wide vectors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if `dim` is zero or does not divide the buffer.
    pub fn new(metric: Metric, dim: usize, vecs: Vec<f64>) -> Result<Self> {
        if dim == 0 || vecs.len() % dim != 0 {
            return Err(Error::invalid_data(format!(
                "Cannot index {} values as rows of width {dim}",
                vecs.len()
            )));
        }
        Ok(Self { metric, dim, vecs })
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.vecs.len() / self.dim
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.vecs.is_empty()
    }

    /// Vector width.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The metric searches use.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The stored vector for a row.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.dim;
        &self.vecs[start..start + self.dim]
    }

    /// The `k` nearest rows to `query`.
    ///
    /// Hits are ordered by ascending distance; ties break on the lower row so
    /// results are deterministic.
    pub fn search(&self, query: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(Error::invalid_data(format!(
                "Query has {} values, index expects {}",
                query.len(),
                self.dim
            )));
        }

        let mut hits: Vec<Neighbor> = self
            .vecs
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(row, v)| Neighbor {
                row,
                distance: self.metric.distance(query, v),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.row.cmp(&b.row))
        });
        hits.truncate(k);
        Ok(hits)
    }
}
