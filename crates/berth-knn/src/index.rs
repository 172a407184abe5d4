//! The fitted yacht index.
//!
//! [`YachtIndex`] bundles everything a query needs: the country-resolved
//! records, the unscaled feature matrix, the optional scaler, the searchable
//! (scaled when the metric requires it) vectors and the id → row map. It is
//! immutable once built and can be shared across threads.

use crate::flat::{FlatIndex, Neighbor};
use crate::metric::Metric;
use crate::persistence::feature_fingerprint;
use crate::scaler::StandardScaler;
use berth_core::{Error, Result};
use berth_features::{Dataset, FeatureBuilder, FeatureConfig, FeatureMatrix, YachtRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Builder
// ============================================================================

/// Fits a [`YachtIndex`] from a dataset.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    metric: Metric,
    n_neighbors: usize,
    features: FeatureConfig,
}

impl IndexBuilder {
    /// Create a builder.
    ///
    /// `n_neighbors` counts the query yacht itself, so it is one more than the
    /// number of recommendations a query can return.
    pub fn new(metric: Metric, n_neighbors: usize) -> Self {
        Self {
            metric,
            n_neighbors,
            features: FeatureConfig::default(),
        }
    }

    /// Use a specific feature configuration.
    pub fn with_feature_config(mut self, config: FeatureConfig) -> Self {
        self.features = config;
        self
    }

    /// Build features, fit the scaler if needed and index every row.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the dataset is empty or `n_neighbors` is not in
    /// `1..=rows`.
    pub fn fit(&self, dataset: &Dataset) -> Result<YachtIndex> {
        let rows = dataset.len();
        if rows == 0 {
            return Err(Error::config("Cannot fit an index on an empty dataset"));
        }
        if self.n_neighbors == 0 || self.n_neighbors > rows {
            return Err(Error::config(format!(
                "n_neighbors must be between 1 and {rows} for {rows} yachts, got {}",
                self.n_neighbors
            )));
        }

        let builder = FeatureBuilder::new(self.features.clone());
        let features = builder.build(dataset.records());
        let records: Vec<YachtRecord> = dataset
            .records()
            .iter()
            .map(|r| {
                let mut fitted = r.clone();
                fitted.country = builder.resolve_country(r);
                fitted
            })
            .collect();

        let scaler = if self.metric.requires_scaling() {
            Some(StandardScaler::fit(&features)?)
        } else {
            None
        };

        let mut index = YachtIndex::from_parts(
            self.metric,
            self.n_neighbors,
            dataset.has_identifiers(),
            records,
            features,
            scaler,
        )?;
        index.feature_fingerprint = Some(feature_fingerprint(&self.features));

        log::info!(
            "Fitted {} index: {} yachts x {} features (n_neighbors = {})",
            index.metric,
            index.len(),
            index.dimension(),
            index.n_neighbors
        );
        Ok(index)
    }
}

/// Fit an index with the default feature configuration.
pub fn fit(dataset: &Dataset, metric: Metric, n_neighbors: usize) -> Result<YachtIndex> {
    IndexBuilder::new(metric, n_neighbors).fit(dataset)
}

// ============================================================================
// Index
// ============================================================================

/// An immutable, queryable yacht index.
#[derive(Debug, Clone)]
pub struct YachtIndex {
    pub(crate) metric: Metric,
    pub(crate) n_neighbors: usize,
    pub(crate) has_identifiers: bool,
    pub(crate) records: Vec<YachtRecord>,
    pub(crate) features: FeatureMatrix,
    pub(crate) scaler: Option<StandardScaler>,
    pub(crate) feature_fingerprint: Option<String>,
    search: FlatIndex,
    id_to_row: HashMap<String, usize>,
}

impl YachtIndex {
    /// Assemble an index from fitted parts, deriving the search vectors and
    /// the id map.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the parts are inconsistent.
    pub(crate) fn from_parts(
        metric: Metric,
        n_neighbors: usize,
        has_identifiers: bool,
        records: Vec<YachtRecord>,
        features: FeatureMatrix,
        scaler: Option<StandardScaler>,
    ) -> Result<Self> {
        if records.len() != features.n_rows() {
            return Err(Error::invalid_data(format!(
                "{} records but {} feature rows",
                records.len(),
                features.n_rows()
            )));
        }
        if n_neighbors == 0 || n_neighbors > records.len() {
            return Err(Error::invalid_data(format!(
                "n_neighbors {n_neighbors} is out of range for {} yachts",
                records.len()
            )));
        }

        let vectors = match (&scaler, metric.requires_scaling()) {
            (Some(scaler), true) => {
                if scaler.dimension() != features.dimension() {
                    return Err(Error::invalid_data(format!(
                        "Scaler has {} columns, features have {}",
                        scaler.dimension(),
                        features.dimension()
                    )));
                }
                scaler.transform_matrix(&features)?
            }
            (None, false) => features.as_slice().to_vec(),
            (Some(_), false) => {
                return Err(Error::invalid_data(format!(
                    "{metric} index must not carry a scaler"
                )));
            }
            (None, true) => {
                return Err(Error::invalid_data(format!("{metric} index requires a scaler")));
            }
        };
        let search = FlatIndex::new(metric, features.dimension(), vectors)?;

        let mut id_to_row = HashMap::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            if id_to_row.insert(record.id.clone(), row).is_some() {
                return Err(Error::invalid_data(format!(
                    "Duplicate yacht id '{}'",
                    record.id
                )));
            }
        }

        Ok(Self {
            metric,
            n_neighbors,
            has_identifiers,
            records,
            features,
            scaler,
            feature_fingerprint: None,
            search,
            id_to_row,
        })
    }

    /// The distance metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Neighbours fetched per query, including the query yacht.
    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    /// Whether identifiers came from the dataset rather than row positions.
    pub fn has_identifiers(&self) -> bool {
        self.has_identifiers
    }

    /// Number of indexed yachts.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing is indexed. A fitted index is never empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature dimension.
    pub fn dimension(&self) -> usize {
        self.features.dimension()
    }

    /// Fitted records in row order.
    pub fn records(&self) -> &[YachtRecord] {
        &self.records
    }

    /// Unscaled feature matrix.
    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    /// The scaler, for metrics that standardize.
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Fingerprint of the feature configuration the index was fitted with.
    pub fn feature_fingerprint(&self) -> Option<&str> {
        self.feature_fingerprint.as_deref()
    }

    /// Identifiers in row order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    /// True if the id is indexed.
    pub fn contains(&self, yacht_id: &str) -> bool {
        self.id_to_row.contains_key(yacht_id)
    }

    /// Row of an id.
    pub fn row_of(&self, yacht_id: &str) -> Option<usize> {
        self.id_to_row.get(yacht_id).copied()
    }

    /// The fitted record for an id, with its country resolved.
    pub fn get_record(&self, yacht_id: &str) -> Option<&YachtRecord> {
        self.row_of(yacht_id).map(|row| &self.records[row])
    }

    /// The `n_neighbors` nearest rows to an indexed row, self included.
    pub(crate) fn neighbors_of(&self, row: usize) -> Result<Vec<Neighbor>> {
        self.search.search(self.search.row(row), self.n_neighbors)
    }

    /// Summary statistics.
    pub fn stats(&self) -> IndexStats {
        let vocabulary = self.features.vocabulary();
        IndexStats {
            rows: self.len(),
            dimension: self.dimension(),
            type_categories: vocabulary.types.len(),
            country_categories: vocabulary.countries.len(),
            metric: self.metric,
            n_neighbors: self.n_neighbors,
            scaled: self.scaler.is_some(),
            has_identifiers: self.has_identifiers,
        }
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Summary of a fitted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Indexed yachts.
    pub rows: usize,
    /// Feature dimension.
    pub dimension: usize,
    /// Distinct yacht types.
    pub type_categories: usize,
    /// Distinct countries.
    pub country_categories: usize,
    /// Distance metric.
    pub metric: Metric,
    /// Neighbours per query, self included.
    pub n_neighbors: usize,
    /// Whether features are standardized.
    pub scaled: bool,
    /// Whether ids came from the dataset.
    pub has_identifiers: bool,
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Yachts:        {}", self.rows)?;
        writeln!(f, "Features:      {}", self.dimension)?;
        writeln!(f, "  types:       {}", self.type_categories)?;
        writeln!(f, "  countries:   {}", self.country_categories)?;
        writeln!(f, "Metric:        {}", self.metric)?;
        writeln!(f, "n_neighbors:   {}", self.n_neighbors)?;
        writeln!(f, "Scaled:        {}", self.scaled)?;
        write!(f, "Dataset ids:   {}", self.has_identifiers)
    }
}

// ============================================================================
// Tests
// ============================================================================
