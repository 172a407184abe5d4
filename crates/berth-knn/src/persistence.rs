//! Index persistence and freshness checking.
//!
//! A fitted index is stored as versioned JSON. Only the unscaled features and
//! the scaler parameters are written; the search vectors and the id map are
//! rebuilt on load. The blake3 hash of the source dataset is kept in the
//! metadata so callers can skip refitting when nothing changed.

use crate::index::YachtIndex;
use crate::metric::Metric;
use crate::scaler::StandardScaler;
use berth_core::{Error, Result};
use berth_features::{CategoryVocabulary, FeatureConfig, FeatureMatrix, YachtRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format version written by this build.
pub const FORMAT_VERSION: u32 = 1;

// ============================================================================
// Serializable types
// ============================================================================

/// Metadata about a persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Build timestamp (RFC 3339).
    pub built_at: String,

    /// Version of the builder.
    pub builder_version: String,

    /// blake3 hash of the dataset file, if known.
    pub content_hash: Option<String>,

    /// Number of indexed yachts.
    pub record_count: usize,

    /// Feature dimension.
    pub dimension: usize,

    /// Distance metric.
    pub metric: Metric,

    /// Neighbours per query, self included.
    pub n_neighbors: usize,

    /// Fingerprint of the feature configuration, see [`feature_fingerprint`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_fingerprint: Option<String>,
}

impl IndexMetadata {
    fn for_index(index: &YachtIndex, content_hash: Option<&str>) -> Self {
        Self {
            built_at: chrono::Utc::now().to_rfc3339(),
            builder_version: env!("CARGO_PKG_VERSION").to_string(),
            content_hash: content_hash.map(str::to_string),
            record_count: index.len(),
            dimension: index.dimension(),
            metric: index.metric(),
            n_neighbors: index.n_neighbors(),
            feature_fingerprint: index.feature_fingerprint().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// On-disk representation of a fitted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedIndex {
    /// Format version; loading rejects anything else.
    pub format_version: u32,
    /// Build metadata.
    pub metadata: IndexMetadata,
    /// Whether ids came from the dataset.
    pub has_identifiers: bool,
    /// Feature column names.
    pub columns: Vec<String>,
    /// One-hot vocabulary.
    pub vocabulary: CategoryVocabulary,
    /// Unscaled features, row-major.
    pub features: Vec<f64>,
    scaler: Option<StoredScaler>,
    /// Fitted records in row order.
    pub records: Vec<YachtRecord>,
}

/// Just enough of the file to read the metadata.
#[derive(Deserialize)]
struct PersistedHeader {
    format_version: u32,
    metadata: IndexMetadata,
}

impl PersistedIndex {
    /// Snapshot a fitted index.
    pub fn from_index(index: &YachtIndex, content_hash: Option<&str>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            metadata: IndexMetadata::for_index(index, content_hash),
            has_identifiers: index.has_identifiers(),
            columns: index.features().columns().to_vec(),
            vocabulary: index.features().vocabulary().clone(),
            features: index.features().as_slice().to_vec(),
            scaler: index.scaler().map(|s| StoredScaler {
                mean: s.mean().to_vec(),
                scale: s.scale().to_vec(),
            }),
            records: index.records().to_vec(),
        }
    }

    /// Rebuild the queryable index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` for an unsupported version or inconsistent
    /// contents.
    pub fn into_index(self) -> Result<YachtIndex> {
        check_version(self.format_version)?;

        let features =
            FeatureMatrix::from_parts(self.vocabulary, self.records.len(), self.features)?;
        if features.columns() != self.columns.as_slice() {
            return Err(Error::invalid_data(
                "Stored columns do not match the stored vocabulary",
            ));
        }
        if features.dimension() != self.metadata.dimension {
            return Err(Error::invalid_data(format!(
                "Metadata dimension {} does not match features ({})",
                self.metadata.dimension,
                features.dimension()
            )));
        }
        let scaler = self
            .scaler
            .map(|s| StandardScaler::from_parts(s.mean, s.scale))
            .transpose()?;

        let mut index = YachtIndex::from_parts(
            self.metadata.metric,
            self.metadata.n_neighbors,
            self.has_identifiers,
            self.records,
            features,
            scaler,
        )?;
        index.feature_fingerprint = self.metadata.feature_fingerprint;
        Ok(index)
    }
}

fn check_version(version: u32) -> Result<()> {
    if version == FORMAT_VERSION {
        Ok(())
    } else {
        Err(Error::invalid_data(format!(
            "Unsupported index format version {version} (expected {FORMAT_VERSION})"
        )))
    }
}

// ============================================================================
// Bytes
// ============================================================================

impl YachtIndex {
    /// Serialize to versioned JSON bytes (without a content hash).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&PersistedIndex::from_index(self, None))?)
    }

    /// Deserialize from bytes produced by [`YachtIndex::to_bytes`] or
    /// [`save_index`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let persisted: PersistedIndex = serde_json::from_slice(bytes)
            .map_err(|e| Error::parse(format!("Failed to parse index JSON: {e}")))?;
        persisted.into_index()
    }
}

// ============================================================================
// Save / Load
// ============================================================================

/// Save an index to a JSON file, creating parent directories.
///
/// Returns the metadata that was written.
pub fn save_index(
    index: &YachtIndex,
    path: impl AsRef<Path>,
    content_hash: Option<&str>,
) -> Result<IndexMetadata> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let persisted = PersistedIndex::from_index(index, content_hash);
    let json = serde_json::to_string_pretty(&persisted)?;
    std::fs::write(path, json).map_err(|e| Error::io_with_path(e, path))?;

    log::info!(
        "Saved {} index ({} yachts) to {}",
        persisted.metadata.metric,
        persisted.metadata.record_count,
        path.display()
    );
    Ok(persisted.metadata)
}

/// Load an index from a JSON file.
pub fn load_index(path: impl AsRef<Path>) -> Result<YachtIndex> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
    let index = YachtIndex::from_bytes(&bytes)?;
    log::debug!("Loaded index with {} yachts from {}", index.len(), path.display());
    Ok(index)
}

/// Load only the metadata of a persisted index.
pub fn load_metadata(path: impl AsRef<Path>) -> Result<IndexMetadata> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let header: PersistedHeader = serde_json::from_str(&json)
        .map_err(|e| Error::parse(format!("Failed to parse index JSON: {e}")))?;
    check_version(header.format_version)?;
    Ok(header.metadata)
}

/// Check if a persisted index was built from content with this hash.
///
/// Returns `false` if the file is missing or unreadable.
pub fn is_index_fresh(path: impl AsRef<Path>, content_hash: &str) -> bool {
    match load_metadata(path) {
        Ok(metadata) => metadata.content_hash.as_deref() == Some(content_hash),
        Err(_) => false,
    }
}

/// blake3 hash of a file's contents, hex encoded.
pub fn compute_file_hash(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// blake3 fingerprint of everything in a [`FeatureConfig`] that changes the
/// encoding: the derivation flag and the marina table.
pub fn feature_fingerprint(config: &FeatureConfig) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(if config.derive_country_from_marina {
        b"derive_country_from_marina=1\n"
    } else {
        b"derive_country_from_marina=0\n"
    });
    for (marina, country) in config.marina_countries.iter() {
        hasher.update(marina.as_bytes());
        hasher.update(b"\t");
        hasher.update(country.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

// ============================================================================
// Tests
// ============================================================================
