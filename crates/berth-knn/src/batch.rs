//! Offline batch recommendations and catalog coverage.
//!
//! Cold recommendations are precomputed similar-yacht lists for every yacht,
//! exported for the marketplace to serve without a live index. Coverage
//! measures how much of the catalogue those lists reach.

use crate::index::YachtIndex;
use crate::metric::Metric;
use berth_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;

// ============================================================================
// Batch recommendations
// ============================================================================

/// Recommendations for one yacht in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// The query yacht.
    pub yacht_id: String,

    /// Recommended ids, most similar first. Empty on failure.
    pub recommendations: Vec<String>,

    /// Why the query failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Recommend for each id, capturing per-item failures.
pub fn recommend_batch<I, S>(index: &YachtIndex, ids: I, top_k: usize) -> Vec<BatchEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| {
            let id = id.as_ref();
            match index.recommend(id, top_k, None) {
                Ok(recs) => BatchEntry {
                    yacht_id: id.to_string(),
                    recommendations: recs.into_iter().map(|r| r.record.id).collect(),
                    error: None,
                },
                Err(e) => {
                    log::warn!("Skipping yacht '{id}': {e}");
                    BatchEntry {
                        yacht_id: id.to_string(),
                        recommendations: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect()
}

/// Cold recommendations for every indexed yacht, in row order.
pub fn recommend_all(index: &YachtIndex, top_k: usize) -> Vec<BatchEntry> {
    let entries = recommend_batch(index, index.ids(), top_k);
    log::info!("Computed cold recommendations for {} yachts", entries.len());
    entries
}

/// Write entries as `yacht_id,cold_recommendations` CSV, the list encoded as
/// a JSON array.
pub fn write_batch_csv<W: Write>(entries: &[BatchEntry], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["yacht_id", "cold_recommendations"])
        .map_err(|e| Error::io(e.into()))?;
    for entry in entries {
        let list = serde_json::to_string(&entry.recommendations)?;
        csv.write_record([entry.yacht_id.as_str(), list.as_str()])
            .map_err(|e| Error::io(e.into()))?;
    }
    csv.flush()?;
    Ok(())
}

// ============================================================================
// Coverage
// ============================================================================

/// How much of the catalogue a set of queries recommends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Index metric.
    pub metric: Metric,
    /// Queries issued.
    pub queried: usize,
    /// Distinct yachts recommended at least once.
    pub unique_recommended: usize,
    /// Indexed yachts.
    pub catalog_size: usize,
    /// `unique_recommended / catalog_size`, in `[0, 1]`.
    pub coverage: f64,
}

/// Catalog coverage of the top-`top_k` lists for `ids`.
///
/// Ids that fail to resolve are skipped with a warning.
pub fn catalog_coverage<I, S>(index: &YachtIndex, ids: I, top_k: usize) -> CoverageReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let entries = recommend_batch(index, ids, top_k);
    let unique: HashSet<&str> = entries
        .iter()
        .flat_map(|e| e.recommendations.iter().map(String::as_str))
        .collect();

    let catalog_size = index.len();
    let coverage = if catalog_size == 0 {
        0.0
    } else {
        unique.len() as f64 / catalog_size as f64
    };

    CoverageReport {
        metric: index.metric(),
        queried: entries.len(),
        unique_recommended: unique.len(),
        catalog_size,
        coverage,
    }
}

/// An evenly strided, deterministic sample of up to `n` indexed ids.
pub fn sample_ids(index: &YachtIndex, n: usize) -> Vec<String> {
    let len = index.len();
    if n >= len {
        return index.ids().map(str::to_string).collect();
    }
    (0..n)
        .map(|i| index.records()[i * len / n].id.clone())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
