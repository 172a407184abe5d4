//! Feature construction for the Berth recommender.
//!
//! This crate turns the marketplace's yacht dataset into the numeric feature
//! matrix the nearest-neighbour index is fitted on.
//!
//! # Modules
//!
//! - [`record`]: The typed `YachtRecord` schema
//! - [`dataset`]: CSV ingestion with header validation
//! - [`marina`]: Marina → country reference table
//! - [`builder`]: Feature encoding (zero-fill, log price, one-hot categories)
//!
//! # Example
//!
//! ```rust,ignore
//! use berth_features::{Dataset, FeatureBuilder};
//!
//! let dataset = Dataset::from_csv_path("data/yachts.csv")?;
//! let matrix = FeatureBuilder::default().build(dataset.records());
//! println!("{} yachts x {} features", matrix.n_rows(), matrix.dimension());
//! ```

#![doc = include_str!("../README.md")]

pub mod builder;
pub mod dataset;
pub mod marina;
pub mod record;

// Re-exports
pub use builder::{CategoryVocabulary, FeatureBuilder, FeatureConfig, FeatureMatrix};
pub use dataset::{Dataset, Field};
pub use marina::MarinaCountries;
pub use record::{SeasonalPrices, YachtRecord};
