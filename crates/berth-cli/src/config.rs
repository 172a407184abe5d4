//! Configuration for the Berth CLI.
//!
//! Provides the [`BerthConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `BERTH_CONFIG` environment variable
//! 3. XDG default: `~/.config/berth/config.toml`
//! 4. Built-in defaults

use berth_core::traits::ConfigProvider;
use berth_core::{Error, Result};
use berth_features::{FeatureConfig, MarinaCountries};
use berth_knn::Metric;
use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Berth CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BerthConfig {
    /// Project name, used for env var prefixes and display.
    pub project_name: String,

    /// Base path for all project data.
    pub base_path: Option<String>,

    /// Dataset location.
    pub dataset: DatasetConfig,

    /// Index fitting parameters.
    pub model: ModelConfig,

    /// Query defaults.
    pub recommend: RecommendConfig,

    /// Feature construction options.
    pub features: FeaturesConfig,
}

/// Dataset configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the yacht CSV.
    pub path: Option<String>,
}

/// Index fitting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Distance metric.
    pub metric: Metric,

    /// Neighbours per query, including the yacht itself.
    pub n_neighbors: usize,

    /// Where the fitted index is saved.
    pub index_path: Option<String>,
}

/// Query configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// Default number of recommendations.
    pub top_k: usize,
}

/// Feature construction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Fill missing countries from the base marina.
    pub derive_country_from_marina: bool,

    /// Extra marina → country entries, merged over the built-in table.
    pub marina_countries: BTreeMap<String, String>,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for BerthConfig {
    fn default() -> Self {
        Self {
            project_name: "berth".to_string(),
            base_path: None,
            dataset: DatasetConfig::default(),
            model: ModelConfig::default(),
            recommend: RecommendConfig::default(),
            features: FeaturesConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            n_neighbors: 11,
            index_path: None,
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            derive_country_from_marina: true,
            marina_countries: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl BerthConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Loading priority:
    /// 1. Explicit `config_path` (from `--config` flag)
    /// 2. `BERTH_CONFIG` env var
    /// 3. XDG default: `~/.config/berth/config.toml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env_prefix(config_path, "BERTH")
    }

    /// Load with environment overrides read from `<prefix>_<SECTION>_<KEY>`.
    ///
    /// Env values arrive as strings; they are re-typed wherever the default
    /// configuration holds a number or boolean, so `BERTH_RECOMMEND_TOP_K=5`
    /// works like `top_k = 5` in the file.
    fn load_with_env_prefix(config_path: Option<&str>, env_prefix: &str) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level(env_prefix);
        env_opts.add_section("dataset");
        env_opts.add_section("model");
        env_opts.add_section("recommend");
        env_opts.add_section("features");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let merged: toml::Value = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;
        let template =
            toml::Value::try_from(Self::default()).map_err(|e| Error::config(e.to_string()))?;

        retype_strings(merged, &template)
            .try_into()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("BERTH_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("berth").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `BERTH_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "BERTH", &mut vars);
        Ok(vars)
    }

    /// Feature builder configuration: the built-in marina table plus any
    /// configured entries.
    pub fn feature_config(&self) -> FeatureConfig {
        let marinas = MarinaCountries::builtin().with_entries(
            self.features
                .marina_countries
                .iter()
                .map(|(m, c)| (m.clone(), c.clone())),
        );
        FeatureConfig::default()
            .with_country_derivation(self.features.derive_country_from_marina)
            .with_marina_countries(marinas)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for BerthConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine base path: {e}"))),
        }
    }

    fn dataset_path(&self) -> Result<PathBuf> {
        match &self.dataset.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(self.base_path()?.join("data").join("yachts.csv")),
        }
    }

    fn index_path(&self) -> Result<PathBuf> {
        match &self.model.index_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(self
                .base_path()?
                .join("data")
                .join("index")
                .join("yacht_index.json")),
        }
    }
}

// ============================================================================
// Helper: re-type env overrides
// ============================================================================

/// Parse string leaves of `value` into the scalar type found at the same
/// position in `template`. Unparseable strings are left for serde to reject.
fn retype_strings(value: toml::Value, template: &toml::Value) -> toml::Value {
    match (value, template) {
        (toml::Value::Table(table), toml::Value::Table(shape)) => toml::Value::Table(
            table
                .into_iter()
                .map(|(key, val)| match shape.get(&key) {
                    Some(t) => {
                        let val = retype_strings(val, t);
                        (key, val)
                    }
                    None => (key, val),
                })
                .collect(),
        ),
        (toml::Value::String(s), toml::Value::Integer(_)) => match s.trim().parse::<i64>() {
            Ok(i) => toml::Value::Integer(i),
            Err(_) => toml::Value::String(s),
        },
        (toml::Value::String(s), toml::Value::Float(_)) => match s.trim().parse::<f64>() {
            Ok(f) => toml::Value::Float(f),
            Err(_) => toml::Value::String(s),
        },
        (toml::Value::String(s), toml::Value::Boolean(_)) => match s.trim().parse::<bool>() {
            Ok(b) => toml::Value::Boolean(b),
            Err(_) => toml::Value::String(s),
        },
        (value, _) => value,
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// RAII guard for env var manipulation in tests.
    struct EnvGuard {
        key: String,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn new(key: &str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: each test touching the environment uses its own key.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                prev,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: restores the value captured in `new`.
            unsafe {
                match &self.prev {
                    Some(val) => std::env::set_var(&self.key, val),
                    None => std::env::remove_var(&self.key),
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Default tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_berth_config_default() {
        let config = BerthConfig::default();
        assert_eq!(config.project_name, "berth");
        assert!(config.base_path.is_none());
        assert!(config.dataset.path.is_none());
        assert_eq!(config.model.metric, Metric::Cosine);
        assert_eq!(config.model.n_neighbors, 11);
        assert_eq!(config.recommend.top_k, 10);
        assert!(config.features.derive_country_from_marina);
        assert!(config.features.marina_countries.is_empty());
    }

    // ------------------------------------------------------------------------
    // Serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_berth_config_from_toml() {
        let toml_str = r#"
            project_name = "charters"
            base_path = "/srv/berth"

            [dataset]
            path = "/srv/berth/yachts_filled.csv"

            [model]
            metric = "manhattan"
            n_neighbors = 6

            [recommend]
            top_k = 5

            [features]
            derive_country_from_marina = false

            [features.marina_countries]
            Split = "Croatia"
        "#;

        let config: BerthConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.project_name, "charters");
        assert_eq!(config.base_path.as_deref(), Some("/srv/berth"));
        assert_eq!(config.model.metric, Metric::Manhattan);
        assert_eq!(config.model.n_neighbors, 6);
        assert_eq!(config.recommend.top_k, 5);
        assert!(!config.features.derive_country_from_marina);
        assert_eq!(
            config.features.marina_countries.get("Split").map(String::as_str),
            Some("Croatia")
        );
    }

    #[test]
    fn test_berth_config_to_toml() {
        let config = BerthConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("project_name = \"berth\""));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("metric = \"cosine\""));

        let parsed: BerthConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.project_name, config.project_name);
        assert_eq!(parsed.model.n_neighbors, config.model.n_neighbors);
    }

    // ------------------------------------------------------------------------
    // Loading tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_berth_config_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                project_name = "loaded"
                [recommend]
                top_k = 3
            "#,
        )
        .unwrap();

        let config = BerthConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.project_name, "loaded");
        assert_eq!(config.recommend.top_k, 3);
    }

    #[test]
    fn test_berth_config_load_defaults() {
        let config = BerthConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.project_name, "berth");
        assert_eq!(config.model.n_neighbors, 11);
    }

    #[test]
    fn test_berth_config_load_env_overlay() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [model]
                metric = "cosine"
            "#,
        )
        .unwrap();

        let _guard = EnvGuard::new("BERTH_MODEL_METRIC", "euclidean");
        let config = BerthConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.model.metric, Metric::Euclidean);
    }

    #[test]
    fn test_berth_config_load_numeric_env_overlay() {
        let _top_k = EnvGuard::new("BERTHNUMERIC_RECOMMEND_TOP_K", "5");
        let _neighbors = EnvGuard::new("BERTHNUMERIC_MODEL_N_NEIGHBORS", "6");
        let _derive = EnvGuard::new("BERTHNUMERIC_FEATURES_DERIVE_COUNTRY_FROM_MARINA", "false");

        let config =
            BerthConfig::load_with_env_prefix(Some("/nonexistent/config.toml"), "BERTHNUMERIC")
                .unwrap();
        assert_eq!(config.recommend.top_k, 5);
        assert_eq!(config.model.n_neighbors, 6);
        assert!(!config.features.derive_country_from_marina);
    }

    #[test]
    fn test_berth_config_load_rejects_non_numeric_env() {
        let _guard = EnvGuard::new("BERTHBADNUM_RECOMMEND_TOP_K", "many");
        let err =
            BerthConfig::load_with_env_prefix(Some("/nonexistent/config.toml"), "BERTHBADNUM")
                .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_exported_env_vars_load_back() {
        let mut config = BerthConfig::default();
        config.recommend.top_k = 4;
        config.model.n_neighbors = 7;
        let guards: Vec<EnvGuard> = config
            .to_env_vars()
            .unwrap()
            .into_iter()
            .filter(|(key, _)| key != "BERTH_PROJECT_NAME")
            .map(|(key, value)| {
                let key = key.replacen("BERTH_", "BERTHEXPORT_", 1);
                EnvGuard::new(&key, &value)
            })
            .collect();

        let loaded =
            BerthConfig::load_with_env_prefix(Some("/nonexistent/config.toml"), "BERTHEXPORT")
                .unwrap();
        assert_eq!(loaded.recommend.top_k, 4);
        assert_eq!(loaded.model.n_neighbors, 7);
        assert_eq!(loaded.model.metric, config.model.metric);
        drop(guards);
    }

    #[test]
    fn test_retype_strings_follows_template() {
        let template = toml::Value::try_from(BerthConfig::default()).unwrap();
        let value: toml::Value = toml::from_str(
            r#"
                project_name = "42"
                [recommend]
                top_k = "8"
                [features.marina_countries]
                Split = "Croatia"
            "#,
        )
        .unwrap();

        let retyped = retype_strings(value, &template);
        assert_eq!(retyped["project_name"].as_str(), Some("42"));
        assert_eq!(retyped["recommend"]["top_k"].as_integer(), Some(8));
        assert_eq!(
            retyped["features"]["marina_countries"]["Split"].as_str(),
            Some("Croatia")
        );
    }

    // ------------------------------------------------------------------------
    // resolve_config_path tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_resolve_config_path_explicit() {
        let path = BerthConfig::resolve_config_path(Some("/explicit/config.toml"));
        assert_eq!(path, Some(PathBuf::from("/explicit/config.toml")));
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = BerthConfig::default_config_path() {
            assert!(p.ends_with("berth/config.toml"));
        }
    }

    // ------------------------------------------------------------------------
    // ConfigProvider tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_config_provider_paths_from_base() {
        let config = BerthConfig {
            base_path: Some("/project".into()),
            ..Default::default()
        };
        assert_eq!(config.project_name(), "berth");
        assert_eq!(
            config.dataset_path().unwrap(),
            PathBuf::from("/project/data/yachts.csv")
        );
        assert_eq!(
            config.index_path().unwrap(),
            PathBuf::from("/project/data/index/yacht_index.json")
        );
    }

    #[test]
    fn test_config_provider_explicit_paths() {
        let config = BerthConfig {
            dataset: DatasetConfig {
                path: Some("/exports/yachts.csv".into()),
            },
            model: ModelConfig {
                index_path: Some("/cache/index.json".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            config.dataset_path().unwrap(),
            PathBuf::from("/exports/yachts.csv")
        );
        assert_eq!(
            config.index_path().unwrap(),
            PathBuf::from("/cache/index.json")
        );
    }

    #[test]
    fn test_config_provider_base_path_default() {
        let config = BerthConfig::default();
        assert_eq!(config.base_path().unwrap(), std::env::current_dir().unwrap());
    }

    // ------------------------------------------------------------------------
    // Feature config tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_feature_config_merges_marinas() {
        let mut config = BerthConfig::default();
        config
            .features
            .marina_countries
            .insert("Split".into(), "Croatia".into());
        config.features.derive_country_from_marina = false;

        let features = config.feature_config();
        assert!(!features.derive_country_from_marina);
        assert_eq!(features.marina_countries.country_for("Split"), Some("Croatia"));
        assert_eq!(features.marina_countries.country_for("Dubai"), Some("UAE"));
    }

    // ------------------------------------------------------------------------
    // to_env_vars tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_berth_config_to_env_vars() {
        let vars = BerthConfig::default().to_env_vars().unwrap();
        let map: HashMap<_, _> = vars.into_iter().collect();
        assert_eq!(map.get("BERTH_PROJECT_NAME").unwrap(), "berth");
        assert_eq!(map.get("BERTH_MODEL_METRIC").unwrap(), "cosine");
        assert_eq!(map.get("BERTH_MODEL_N_NEIGHBORS").unwrap(), "11");
        assert_eq!(map.get("BERTH_RECOMMEND_TOP_K").unwrap(), "10");
    }

    #[test]
    fn test_berth_config_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BerthConfig>();
    }
}
