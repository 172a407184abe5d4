//! Stateful recommender façade.
//!
//! [`Recommender`] owns the feature configuration and, once fitted, a shared
//! handle to the published index. A fit builds a complete index before it
//! replaces the previous one, so readers holding an `Arc` keep a consistent
//! view.

use crate::index::{IndexBuilder, YachtIndex};
use crate::metric::Metric;
use crate::query::{RecommendFilters, Recommendation};
use berth_core::{Error, Result};
use berth_features::{Dataset, FeatureConfig, YachtRecord};
use std::sync::Arc;

/// Fits and queries a yacht index.
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    features: FeatureConfig,
    index: Option<Arc<YachtIndex>>,
}

impl Recommender {
    /// Create an unfitted recommender.
    pub fn new(features: FeatureConfig) -> Self {
        Self {
            features,
            index: None,
        }
    }

    /// Wrap an already fitted (e.g. loaded) index.
    pub fn from_index(index: impl Into<Arc<YachtIndex>>) -> Self {
        Self {
            features: FeatureConfig::default(),
            index: Some(index.into()),
        }
    }

    /// Fit a new index and publish it.
    ///
    /// On error the previously published index, if any, stays in place.
    pub fn fit(
        &mut self,
        dataset: &Dataset,
        metric: Metric,
        n_neighbors: usize,
    ) -> Result<Arc<YachtIndex>> {
        let index = IndexBuilder::new(metric, n_neighbors)
            .with_feature_config(self.features.clone())
            .fit(dataset)?;
        let index = Arc::new(index);
        self.index = Some(Arc::clone(&index));
        Ok(index)
    }

    /// True once an index is published.
    pub fn is_fitted(&self) -> bool {
        self.index.is_some()
    }

    /// The published index.
    ///
    /// # Errors
    ///
    /// Returns `NotFitted` before a successful fit.
    pub fn index(&self) -> Result<&Arc<YachtIndex>> {
        self.index
            .as_ref()
            .ok_or_else(|| Error::not_fitted("call fit() or load an index before querying"))
    }

    /// See [`YachtIndex::recommend`].
    pub fn recommend(
        &self,
        yacht_id: &str,
        top_k: usize,
        filters: Option<&RecommendFilters>,
    ) -> Result<Vec<Recommendation>> {
        self.index()?.recommend(yacht_id, top_k, filters)
    }

    /// See [`YachtIndex::get_record`].
    pub fn get_record(&self, yacht_id: &str) -> Result<Option<&YachtRecord>> {
        Ok(self.index()?.get_record(yacht_id))
    }
}
