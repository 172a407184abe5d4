//! Distance metrics.
//!
//! All distances are non-negative. Cosine distance is `1 - cos(a, b)`, where a
//! zero-norm vector has similarity 0 with everything (distance 1).

use berth_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Distance metric used by the neighbour index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 - cosine similarity`, computed on unscaled features.
    #[default]
    Cosine,
    /// L2 distance on standardized features.
    Euclidean,
    /// L1 distance on standardized features.
    Manhattan,
}

impl Metric {
    /// Every supported metric.
    pub const ALL: [Metric; 3] = [Metric::Cosine, Metric::Euclidean, Metric::Manhattan];

    /// Lowercase metric name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }

    /// Whether features are standardized before indexing.
    pub fn requires_scaling(self) -> bool {
        !matches!(self, Self::Cosine)
    }

    /// Distance between two vectors of equal length.
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Cosine => cosine_distance(a, b),
            Self::Euclidean => euclidean_distance(a, b),
            Self::Manhattan => manhattan_distance(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclidean" => Ok(Self::Euclidean),
            "manhattan" => Ok(Self::Manhattan),
            other => Err(Error::config(format!(
                "Unknown metric '{other}' (expected cosine, euclidean or manhattan)"
            ))),
        }
    }
}

/// `1 - cos(a, b)`, clamped to `[0, 2]`.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    (1.0 - similarity).max(0.0)
}

/// L2 distance.
pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// L1 distance.
pub fn manhattan_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}
