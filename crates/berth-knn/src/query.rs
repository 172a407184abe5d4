//! Similar-yacht queries.
//!
//! A query looks up the yacht's indexed vector, fetches its `n_neighbors`
//! nearest rows, drops the yacht itself, turns distances into similarity
//! scores, applies filters to that candidate pool and truncates to `top_k`.
//! Filtering never triggers a wider search, so a restrictive filter can
//! return fewer than `top_k` results.

use crate::index::YachtIndex;
use crate::metric::Metric;
use berth_core::{Error, Result};
use berth_features::YachtRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// Filters
// ============================================================================

/// Optional constraints on recommended yachts.
///
/// Empty lists mean "no constraint". A yacht missing the attribute a
/// constraint tests is excluded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendFilters {
    /// Maximum summer low-season price per day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,

    /// Minimum guest capacity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_guests: Option<u32>,

    /// Allowed countries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,

    /// Allowed yacht types.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
}

impl RecommendFilters {
    /// No constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price ceiling.
    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    /// Set the guest floor.
    pub fn with_min_guests(mut self, min_guests: u32) -> Self {
        self.min_guests = Some(min_guests);
        self
    }

    /// Allow one more country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.countries.push(country.into());
        self
    }

    /// Replace the allowed countries.
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    /// Allow one more yacht type.
    pub fn with_type(mut self, yacht_type: impl Into<String>) -> Self {
        self.types.push(yacht_type.into());
        self
    }

    /// Replace the allowed yacht types.
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// True if no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.max_price.is_none()
            && self.min_guests.is_none()
            && self.countries.is_empty()
            && self.types.is_empty()
    }

    /// Whether a fitted record satisfies every constraint.
    pub fn matches(&self, record: &YachtRecord) -> bool {
        if let Some(max_price) = self.max_price
            && !record.headline_price().is_some_and(|p| p <= max_price)
        {
            return false;
        }
        if let Some(min_guests) = self.min_guests
            && !record.guests.is_some_and(|g| g >= min_guests)
        {
            return false;
        }
        if !self.countries.is_empty() && !contains(&self.countries, record.country.as_deref()) {
            return false;
        }
        if !self.types.is_empty() && !contains(&self.types, record.yacht_type.as_deref()) {
            return false;
        }
        true
    }
}

fn contains(allowed: &[String], value: Option<&str>) -> bool {
    value.is_some_and(|v| allowed.iter().any(|a| a == v))
}

// ============================================================================
// Results
// ============================================================================

/// One recommended yacht.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended yacht's attributes.
    #[serde(flatten)]
    pub record: YachtRecord,

    /// Similarity to the query yacht, in `[0, 1]`.
    pub similarity_score: f64,

    /// Raw distance in the index's (possibly scaled) feature space.
    pub distance: f64,
}

/// Convert candidate distances into `[0, 1]` similarity scores.
///
/// Cosine uses `1 - d`. Euclidean and manhattan normalize by the largest
/// distance in the candidate set (or 1 if every distance is zero).
pub fn similarity_scores(metric: Metric, distances: &[f64]) -> Vec<f64> {
    match metric {
        Metric::Cosine => distances
            .iter()
            .map(|d| (1.0 - d).clamp(0.0, 1.0))
            .collect(),
        Metric::Euclidean | Metric::Manhattan => {
            let max = distances.iter().copied().fold(0.0, f64::max);
            let max = if max > 0.0 { max } else { 1.0 };
            distances
                .iter()
                .map(|d| (1.0 - d / max).clamp(0.0, 1.0))
                .collect()
        }
    }
}

// ============================================================================
// Query
// ============================================================================

impl YachtIndex {
    /// Recommend up to `top_k` yachts similar to `yacht_id`.
    ///
    /// Results are ordered by descending similarity and never include the
    /// query yacht.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not indexed.
    pub fn recommend(
        &self,
        yacht_id: &str,
        top_k: usize,
        filters: Option<&RecommendFilters>,
    ) -> Result<Vec<Recommendation>> {
        let row = self
            .row_of(yacht_id)
            .ok_or_else(|| Error::not_found(format!("Yacht '{yacht_id}' is not in the index")))?;

        let mut candidates = self.neighbors_of(row)?;
        candidates.retain(|n| n.row != row);
        candidates.truncate(self.n_neighbors - 1);

        let distances: Vec<f64> = candidates.iter().map(|n| n.distance.max(0.0)).collect();
        let scores = similarity_scores(self.metric, &distances);

        let recommendations: Vec<Recommendation> = candidates
            .iter()
            .zip(distances)
            .zip(scores)
            .map(|((n, distance), similarity_score)| Recommendation {
                record: self.records[n.row].clone(),
                similarity_score,
                distance,
            })
            .filter(|r| filters.is_none_or(|f| f.matches(&r.record)))
            .take(top_k)
            .collect();

        log::debug!(
            "recommend({yacht_id}, top_k = {top_k}): {} of {} candidates",
            recommendations.len(),
            candidates.len()
        );
        Ok(recommendations)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::fit;
    use berth_features::Dataset;

    fn fleet() -> Dataset {
        Dataset::from_records(vec![
            YachtRecord::new("a")
                .with_type("Sail")
                .with_guests(4)
                .with_price(10_000.0)
                .with_country("Italy"),
            YachtRecord::new("b")
                .with_type("Sail")
                .with_guests(4)
                .with_price(11_000.0)
                .with_country("Italy"),
            YachtRecord::new("c")
                .with_type("Motor")
                .with_guests(20)
                .with_price(90_000.0)
                .with_country("USA"),
            YachtRecord::new("d")
                .with_type("Motor")
                .with_guests(12)
                .with_price(40_000.0)
                .with_base_marina("Dubai"),
            YachtRecord::new("e")
                .with_type("Sail")
                .with_guests(6)
                .with_price(15_000.0)
                .with_country("Greece"),
        ])
        .unwrap()
    }

    fn ids(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.record.id.as_str()).collect()
    }

    #[test]
    fn test_cosine_ranks_closest_first() {
        let index = fit(&fleet(), Metric::Cosine, 3).unwrap();
        let recs = index.recommend("a", 2, None).unwrap();

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].record.id, "b");
        assert!(recs[0].similarity_score >= recs[1].similarity_score);
    }

    #[test]
    fn test_self_excluded_and_scores_bounded() {
        for metric in Metric::ALL {
            let index = fit(&fleet(), metric, 4).unwrap();
            for id in ["a", "b", "c", "d", "e"] {
                let recs = index.recommend(id, 10, None).unwrap();
                assert_eq!(recs.len(), 3);
                assert!(!ids(&recs).contains(&id));
                assert!(recs.iter().all(|r| (0.0..=1.0).contains(&r.similarity_score)));
            }
        }
    }

    #[test]
    fn test_euclidean_farthest_candidate_scores_zero() {
        let index = fit(&fleet(), Metric::Euclidean, 4).unwrap();
        let recs = index.recommend("a", 3, None).unwrap();
        assert_eq!(recs.last().unwrap().similarity_score, 0.0);
        assert!(recs[0].distance <= recs[2].distance);
    }

    #[test]
    fn test_unknown_id() {
        let index = fit(&fleet(), Metric::Cosine, 2).unwrap();
        let err = index.recommend("zzz", 2, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_top_k_zero() {
        let index = fit(&fleet(), Metric::Cosine, 2).unwrap();
        assert!(index.recommend("a", 0, None).unwrap().is_empty());
    }

    #[test]
    fn test_filters_subset_of_pool() {
        let index = fit(&fleet(), Metric::Cosine, 4).unwrap();
        let pool = ids(&index.recommend("a", 10, None).unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();

        let filters = RecommendFilters::new().with_type("Motor");
        let recs = index.recommend("a", 10, Some(&filters)).unwrap();
        for r in &recs {
            assert_eq!(r.record.yacht_type.as_deref(), Some("Motor"));
            assert!(pool.contains(&r.record.id));
        }
    }

    #[test]
    fn test_country_filter_uses_resolved_country() {
        let index = fit(&fleet(), Metric::Cosine, 4).unwrap();
        let filters = RecommendFilters::new().with_country("UAE");
        let recs = index.recommend("c", 10, Some(&filters)).unwrap();
        assert_eq!(ids(&recs), vec!["d"]);
    }

    #[test]
    fn test_filter_predicates() {
        let record = YachtRecord::new("x")
            .with_type("Sail")
            .with_guests(6)
            .with_price(5_000.0)
            .with_country("Spain");

        assert!(RecommendFilters::new().matches(&record));
        assert!(RecommendFilters::new().with_max_price(5_000.0).matches(&record));
        assert!(!RecommendFilters::new().with_max_price(4_999.0).matches(&record));
        assert!(RecommendFilters::new().with_min_guests(6).matches(&record));
        assert!(!RecommendFilters::new().with_min_guests(7).matches(&record));
        assert!(
            RecommendFilters::new()
                .with_countries(["Italy", "Spain"])
                .matches(&record)
        );
        assert!(!RecommendFilters::new().with_types(["Motor"]).matches(&record));
    }

    #[test]
    fn test_missing_attribute_fails_predicate() {
        let bare = YachtRecord::new("x");
        assert!(!RecommendFilters::new().with_max_price(1e9).matches(&bare));
        assert!(!RecommendFilters::new().with_min_guests(0).matches(&bare));
        assert!(!RecommendFilters::new().with_country("Italy").matches(&bare));
        assert!(!RecommendFilters::new().with_type("Sail").matches(&bare));
    }

    #[test]
    fn test_filters_serde_defaults() {
        let filters: RecommendFilters = serde_json::from_str(r#"{"min_guests": 8}"#).unwrap();
        assert_eq!(filters.min_guests, Some(8));
        assert!(filters.countries.is_empty());
        assert!(!filters.is_empty());
    }

    #[test]
    fn test_similarity_scores() {
        assert_eq!(similarity_scores(Metric::Cosine, &[0.0, 0.25, 1.5]), vec![1.0, 0.75, 0.0]);
        assert_eq!(similarity_scores(Metric::Euclidean, &[1.0, 2.0, 4.0]), vec![0.75, 0.5, 0.0]);
        assert_eq!(similarity_scores(Metric::Manhattan, &[0.0, 0.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_recommendation_json_is_flat() {
        let index = fit(&fleet(), Metric::Cosine, 2).unwrap();
        let recs = index.recommend("a", 1, None).unwrap();
        let json = serde_json::to_value(&recs[0]).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("similarity_score").is_some());
        assert!(json.get("record").is_none());
    }
}
