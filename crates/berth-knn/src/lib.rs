//! Nearest-neighbour yacht recommendations.
//!
//! This crate fits an exact k-nearest-neighbour index over the feature
//! matrix from `berth-features` and answers "yachts similar to this one"
//! queries.
//!
//! # Modules
//!
//! - [`metric`]: Cosine, euclidean and manhattan distances
//! - [`scaler`]: Per-column standardization for the non-cosine metrics
//! - [`flat`]: Exact brute-force search
//! - [`index`]: Fitting and the immutable `YachtIndex`
//! - [`query`]: Filters, similarity scores and `recommend`
//! - [`recommender`]: Fit-then-query façade
//! - [`persistence`]: Versioned JSON storage and freshness checks
//! - [`batch`]: Cold recommendations and catalog coverage
//!
//! # Example
//!
//! ```rust,ignore
//! use berth_features::Dataset;
//! use berth_knn::{fit, Metric, RecommendFilters};
//!
//! let dataset = Dataset::from_csv_path("data/yachts.csv")?;
//! let index = fit(&dataset, Metric::Cosine, 11)?;
//!
//! let filters = RecommendFilters::new().with_min_guests(8);
//! for rec in index.recommend("42", 10, Some(&filters))? {
//!     println!("{} ({:.3})", rec.record.id, rec.similarity_score);
//! }
//! ```

#![doc = include_str!("../README.md")]

pub mod batch;
pub mod flat;
pub mod index;
pub mod metric;
pub mod persistence;
pub mod query;
pub mod recommender;
pub mod scaler;

// Re-exports
pub use batch::{
    BatchEntry, CoverageReport, catalog_coverage, recommend_all, recommend_batch, sample_ids,
    write_batch_csv,
};
pub use flat::{FlatIndex, Neighbor};
pub use index::{IndexBuilder, IndexStats, YachtIndex, fit};
pub use metric::Metric;
pub use persistence::{
    FORMAT_VERSION, IndexMetadata, PersistedIndex, compute_file_hash, feature_fingerprint,
    is_index_fresh, load_index, load_metadata, save_index,
};
pub use query::{RecommendFilters, Recommendation};
pub use recommender::Recommender;
pub use scaler::StandardScaler;
