//! Feature construction.
//!
//! Turns yacht records into a dense, row-major feature matrix:
//!
//! ```text
//! guests | cabins | crew | length | year | rating | log_price | rating | type_* | country_*
//! ```
//!
//! Missing numeric inputs encode as zero, the four seasonal prices collapse
//! into `ln(1 + mean)`, and `type` / `country` are one-hot encoded against a
//! sorted vocabulary learned from the records. No scaling happens here; the
//! index decides that per distance metric.

use crate::marina::MarinaCountries;
use crate::record::YachtRecord;
use berth_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Numeric passthrough columns, in matrix order.
pub const NUMERIC_COLUMNS: [&str; 6] = ["guests", "cabins", "crew", "length", "year", "rating"];

/// Columns derived after the passthrough block, in matrix order.
pub const DERIVED_COLUMNS: [&str; 2] = ["log_price", "rating"];

/// Prefix of one-hot type columns.
pub const TYPE_PREFIX: &str = "type_";

/// Prefix of one-hot country columns.
pub const COUNTRY_PREFIX: &str = "country_";

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the feature builder.
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Fill a missing `country` from the record's base marina.
    pub derive_country_from_marina: bool,

    /// Marina → country lookup table.
    pub marina_countries: MarinaCountries,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            derive_country_from_marina: true,
            marina_countries: MarinaCountries::builtin(),
        }
    }
}

impl FeatureConfig {
    /// Enable or disable marina-based country derivation.
    pub fn with_country_derivation(mut self, enabled: bool) -> Self {
        self.derive_country_from_marina = enabled;
        self
    }

    /// Replace the marina lookup table.
    pub fn with_marina_countries(mut self, table: MarinaCountries) -> Self {
        self.marina_countries = table;
        self
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Categories observed at fit time, each sorted lexicographically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    /// Distinct yacht types.
    pub types: Vec<String>,

    /// Distinct countries.
    pub countries: Vec<String>,
}

impl CategoryVocabulary {
    /// Column index of a type within the type block.
    pub fn type_index(&self, value: &str) -> Option<usize> {
        self.types.binary_search_by(|t| t.as_str().cmp(value)).ok()
    }

    /// Column index of a country within the country block.
    pub fn country_index(&self, value: &str) -> Option<usize> {
        self.countries
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Total one-hot width.
    pub fn width(&self) -> usize {
        self.types.len() + self.countries.len()
    }

    /// Full matrix column names for this vocabulary.
    pub fn column_names(&self) -> Vec<String> {
        NUMERIC_COLUMNS
            .iter()
            .chain(DERIVED_COLUMNS.iter())
            .map(|c| c.to_string())
            .chain(self.types.iter().map(|t| format!("{TYPE_PREFIX}{t}")))
            .chain(self.countries.iter().map(|c| format!("{COUNTRY_PREFIX}{c}")))
            .collect()
    }

    /// Feature dimension for this vocabulary.
    pub fn dimension(&self) -> usize {
        NUMERIC_COLUMNS.len() + DERIVED_COLUMNS.len() + self.width()
    }
}

// ============================================================================
// Feature matrix
// ============================================================================

/// Dense row-major feature matrix, one row per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    n_rows: usize,
    data: Vec<f64>,
    vocabulary: CategoryVocabulary,
}

impl FeatureMatrix {
    /// Assemble a matrix from its parts, validating the shape.
    pub fn from_parts(
        vocabulary: CategoryVocabulary,
        n_rows: usize,
        data: Vec<f64>,
    ) -> Result<Self> {
        let columns = vocabulary.column_names();
        if data.len() != n_rows * columns.len() {
            return Err(Error::invalid_data(format!(
                "Feature matrix has {} values, expected {} rows x {} columns",
                data.len(),
                n_rows,
                columns.len()
            )));
        }
        Ok(Self {
            columns,
            n_rows,
            data,
            vocabulary,
        })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns (D).
    pub fn dimension(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The vocabulary the one-hot blocks were built from.
    pub fn vocabulary(&self) -> &CategoryVocabulary {
        &self.vocabulary
    }

    /// One row.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        let d = self.dimension();
        &self.data[i * d..(i + 1) * d]
    }

    /// Iterate over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.dimension())
    }

    /// Flat row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// True if the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builds feature matrices from yacht records.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
}

impl FeatureBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// The builder configuration.
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// The country used for encoding and filtering.
    ///
    /// An explicit country wins; otherwise the base marina is looked up when
    /// derivation is enabled.
    pub fn resolve_country(&self, record: &YachtRecord) -> Option<String> {
        if let Some(country) = non_blank(record.country.as_deref()) {
            return Some(country.to_string());
        }
        if !self.config.derive_country_from_marina {
            return None;
        }
        record
            .base_marina
            .as_deref()
            .and_then(|m| self.config.marina_countries.country_for(m))
            .map(str::to_string)
    }

    /// Learn the category vocabulary from records.
    pub fn vocabulary(&self, records: &[YachtRecord]) -> CategoryVocabulary {
        let mut types = BTreeSet::new();
        let mut countries = BTreeSet::new();
        for record in records {
            if let Some(t) = non_blank(record.yacht_type.as_deref()) {
                types.insert(t.to_string());
            }
            if let Some(c) = self.resolve_country(record) {
                countries.insert(c);
            }
        }
        CategoryVocabulary {
            types: types.into_iter().collect(),
            countries: countries.into_iter().collect(),
        }
    }

    /// Encode one record against a vocabulary.
    ///
    /// Categories outside the vocabulary leave their one-hot block all zero.
    pub fn encode(&self, record: &YachtRecord, vocabulary: &CategoryVocabulary) -> Vec<f64> {
        let mut row = Vec::with_capacity(vocabulary.dimension());

        let rating = record.rating.unwrap_or(0.0);
        row.extend([
            record.guests.map(f64::from).unwrap_or(0.0),
            record.cabins.map(f64::from).unwrap_or(0.0),
            record.crew.map(f64::from).unwrap_or(0.0),
            record.length.unwrap_or(0.0),
            record.year.map(f64::from).unwrap_or(0.0),
            rating,
        ]);

        let log_price = record.prices.average().ln_1p();
        row.extend([log_price, rating]);

        let offset = row.len();
        row.resize(offset + vocabulary.width(), 0.0);
        if let Some(i) = non_blank(record.yacht_type.as_deref())
            .and_then(|t| vocabulary.type_index(t))
        {
            row[offset + i] = 1.0;
        }
        let offset = offset + vocabulary.types.len();
        if let Some(i) = self
            .resolve_country(record)
            .and_then(|c| vocabulary.country_index(&c))
        {
            row[offset + i] = 1.0;
        }

        // Residual NaN/inf (e.g. ln of a negative price) becomes zero.
        for value in &mut row {
            if !value.is_finite() {
                *value = 0.0;
            }
        }
        row
    }

    /// Build the feature matrix for a set of records.
    ///
    /// Row `i` of the result corresponds to `records[i]`.
    pub fn build(&self, records: &[YachtRecord]) -> FeatureMatrix {
        let vocabulary = self.vocabulary(records);
        let mut data = Vec::with_capacity(records.len() * vocabulary.dimension());
        for record in records {
            data.extend(self.encode(record, &vocabulary));
        }

        log::debug!(
            "Feature matrix created: {} x {} ({} type columns, {} country columns)",
            records.len(),
            vocabulary.dimension(),
            vocabulary.types.len(),
            vocabulary.countries.len()
        );

        FeatureMatrix {
            columns: vocabulary.column_names(),
            n_rows: records.len(),
            data,
            vocabulary,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Tests
// ============================================================================
