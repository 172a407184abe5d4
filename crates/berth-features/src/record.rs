//! The yacht record schema.
//!
//! One [`YachtRecord`] is one row of the marketplace dataset. Only the
//! identifier is mandatory; every other attribute may be missing and is
//! carried as an `Option` so the feature builder can apply its zero-fill
//! policy explicitly.

use serde::{Deserialize, Serialize};

// ============================================================================
// Prices
// ============================================================================

/// Per-day charter prices for the four seasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPrices {
    /// Summer low-season price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summer_low: Option<f64>,

    /// Summer high-season price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summer_high: Option<f64>,

    /// Winter low-season price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winter_low: Option<f64>,

    /// Winter high-season price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winter_high: Option<f64>,
}

impl SeasonalPrices {
    /// Create prices from the four seasonal values.
    pub fn new(
        summer_low: Option<f64>,
        summer_high: Option<f64>,
        winter_low: Option<f64>,
        winter_high: Option<f64>,
    ) -> Self {
        Self {
            summer_low,
            summer_high,
            winter_low,
            winter_high,
        }
    }

    /// The same price in every season.
    pub fn uniform(price: f64) -> Self {
        Self::new(Some(price), Some(price), Some(price), Some(price))
    }

    /// Arithmetic mean of the four prices.
    ///
    /// Missing prices count as zero; the divisor is always four.
    pub fn average(&self) -> f64 {
        let sum: f64 = [
            self.summer_low,
            self.summer_high,
            self.winter_low,
            self.winter_high,
        ]
        .iter()
        .map(|p| p.unwrap_or(0.0))
        .sum();
        sum / 4.0
    }
}

// ============================================================================
// Record
// ============================================================================

/// One yacht listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YachtRecord {
    /// Unique, immutable identifier.
    pub id: String,

    /// Listing name (display only, not a feature).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Yacht category, e.g. "Motor Yachts".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub yacht_type: Option<String>,

    /// Guest capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,

    /// Number of cabins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabins: Option<u32>,

    /// Crew size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew: Option<u32>,

    /// Length in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,

    /// Build (or last refit) year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Rating between 3.0 and 5.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Seasonal per-day prices.
    #[serde(default)]
    pub prices: SeasonalPrices,

    /// Home marina.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_marina: Option<String>,

    /// Country of the home marina.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl YachtRecord {
    /// Create a record with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            yacht_type: None,
            guests: None,
            cabins: None,
            crew: None,
            length: None,
            year: None,
            rating: None,
            prices: SeasonalPrices::default(),
            base_marina: None,
            country: None,
        }
    }

    /// Set the listing name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the yacht category.
    pub fn with_type(mut self, yacht_type: impl Into<String>) -> Self {
        self.yacht_type = Some(yacht_type.into());
        self
    }

    /// Set the guest capacity.
    pub fn with_guests(mut self, guests: u32) -> Self {
        self.guests = Some(guests);
        self
    }

    /// Set the cabin count.
    pub fn with_cabins(mut self, cabins: u32) -> Self {
        self.cabins = Some(cabins);
        self
    }

    /// Set the crew size.
    pub fn with_crew(mut self, crew: u32) -> Self {
        self.crew = Some(crew);
        self
    }

    /// Set the length in meters.
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set the rating.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Set all four seasonal prices.
    pub fn with_prices(mut self, prices: SeasonalPrices) -> Self {
        self.prices = prices;
        self
    }

    /// Set the same price for every season.
    pub fn with_price(self, price: f64) -> Self {
        self.with_prices(SeasonalPrices::uniform(price))
    }

    /// Set the home marina.
    pub fn with_base_marina(mut self, marina: impl Into<String>) -> Self {
        self.base_marina = Some(marina.into());
        self
    }

    /// Set the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// The summer low-season price, the headline price used for budgets.
    pub fn headline_price(&self) -> Option<f64> {
        self.prices.summer_low
    }
}

// ============================================================================
// Tests
// ============================================================================
