//! Per-column standardization.
//!
//! The standard score of a value is `z = (x - mean) / std`, with the
//! population standard deviation. Columns whose deviation is (numerically)
//! zero keep a scale of 1 so they center to zero instead of dividing by zero.

use berth_core::{Error, Result};
use berth_features::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Deviations at or below this are treated as constant columns.
const MIN_STD: f64 = 1e-10;

/// Fitted per-column mean and scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on every row of a feature matrix.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the matrix has no rows.
    pub fn fit(matrix: &FeatureMatrix) -> Result<Self> {
        if matrix.is_empty() {
            return Err(Error::config("Cannot fit a scaler on an empty matrix"));
        }

        let n = matrix.n_rows() as f64;
        let d = matrix.dimension();

        let mut mean = vec![0.0; d];
        for row in matrix.rows() {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; d];
        for row in matrix.rows() {
            for ((v, x), m) in variance.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }

        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > MIN_STD { std } else { 1.0 }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Rebuild a scaler from stored parameters.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the lengths differ or a scale is not a
    /// positive finite number.
    pub fn from_parts(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            return Err(Error::invalid_data(format!(
                "Scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        if scale.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(Error::invalid_data("Scaler contains a non-positive scale"));
        }
        Ok(Self { mean, scale })
    }

    /// Number of columns.
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    /// Column means.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Column scales.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize one row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` on a dimension mismatch.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.dimension() {
            return Err(Error::invalid_data(format!(
                "Row has {} values, scaler expects {}",
                row.len(),
                self.dimension()
            )));
        }
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((x, m), s)| (x - m) / s)
            .collect())
    }

    /// Standardize every row of a matrix into a flat row-major buffer.
    pub fn transform_matrix(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(matrix.as_slice().len());
        for row in matrix.rows() {
            out.extend(self.transform(row)?);
        }
        Ok(out)
    }
}
