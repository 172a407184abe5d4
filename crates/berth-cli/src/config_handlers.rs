//! Handler functions for config CLI commands.
//!
//! Implements `berth config {path,get,set,init,export}` and the TOML
//! dotted-key helpers they share.

use crate::cli::ConfigAction;
use crate::config::BerthConfig;
use berth_core::{Error, Result};
use std::path::PathBuf;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because `path` and
/// `init` work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Get { key } => cmd_config_get(config_path, &key),
        ConfigAction::Set { key, value } => cmd_config_set(config_path, &key, &value),
        ConfigAction::Init { file, force } => cmd_config_init(file.as_deref(), force),
        ConfigAction::Export { docker_env } => {
            let config = BerthConfig::load(config_path)?;
            cmd_config_export(&config, docker_env)
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = BerthConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `berth config init` to create it)");
    }
    Ok(())
}

fn cmd_config_get(config_path: Option<&str>, key: &str) -> Result<()> {
    let config = BerthConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    let found = get_nested_value(&value, key)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    println!("{}", format_toml_value(found));
    Ok(())
}

/// Set a dotted key in the config file.
///
/// The edited document must still deserialize as a [`BerthConfig`], so a
/// typo such as `model.metric = "cosin"` is rejected before anything is
/// written.
fn cmd_config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<()> {
    let path = BerthConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory"))?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `berth config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;
    doc.clone()
        .try_into::<BerthConfig>()
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Set {key} = {value} in {}", path.display());
    Ok(())
}

fn cmd_config_init(file: Option<&str>, force: bool) -> Result<()> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => BerthConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    let toml_str = BerthConfig::default().to_toml_string()?;
    std::fs::write(&path, &toml_str).map_err(|e| Error::io_with_path(e, &path))?;

    println!("Config file created at {}", path.display());
    Ok(())
}

fn cmd_config_export(config: &BerthConfig, docker_env: bool) -> Result<()> {
    for (key, value) in config.to_env_vars()? {
        if docker_env {
            println!("--env {key}={value}");
        } else {
            println!("{key}={value}");
        }
    }
    Ok(())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

/// Format a TOML value for display on stdout.
fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_default_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, BerthConfig::default().to_toml_string().unwrap()).unwrap();
        path
    }

    // ------------------------------------------------------------------------
    // path / get
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_path_explicit() {
        assert!(cmd_config_path(Some("/explicit/config.toml")).is_ok());
    }

    #[test]
    fn test_cmd_config_get_keys() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(&dir);
        let path = path.to_str().unwrap();

        assert!(cmd_config_get(Some(path), "project_name").is_ok());
        assert!(cmd_config_get(Some(path), "model.n_neighbors").is_ok());
    }

    #[test]
    fn test_cmd_config_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(&dir);

        let err = cmd_config_get(Some(path.to_str().unwrap()), "model.leaf_size").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    // ------------------------------------------------------------------------
    // set
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_set_nested_key() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(&dir);

        cmd_config_set(Some(path.to_str().unwrap()), "recommend.top_k", "5").unwrap();

        let config = BerthConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.recommend.top_k, 5);
    }

    #[test]
    fn test_cmd_config_set_marina_entry() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(&dir);

        cmd_config_set(
            Some(path.to_str().unwrap()),
            "features.marina_countries.Split",
            "Croatia",
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Croatia"));
    }

    #[test]
    fn test_cmd_config_set_rejects_invalid_metric() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(&dir);
        let before = std::fs::read_to_string(&path).unwrap();

        let err =
            cmd_config_set(Some(path.to_str().unwrap()), "model.metric", "cosin").unwrap_err();
        assert!(err.is_config());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_cmd_config_set_missing_file() {
        let err = cmd_config_set(Some("/nonexistent/config.toml"), "key", "value").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    // ------------------------------------------------------------------------
    // init / export
    // ------------------------------------------------------------------------

    #[test]
    fn test_cmd_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("berth").join("config.toml");

        cmd_config_init(Some(path.to_str().unwrap()), false).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("project_name"));
        assert!(content.contains("[model]"));
    }

    #[test]
    fn test_cmd_config_init_no_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "existing").unwrap();

        let err = cmd_config_init(Some(path.to_str().unwrap()), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        cmd_config_init(Some(path.to_str().unwrap()), true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("project_name"));
    }

    #[test]
    fn test_cmd_config_export() {
        let config = BerthConfig::default();
        assert!(cmd_config_export(&config, false).is_ok());
        assert!(cmd_config_export(&config, true).is_ok());
    }

    // ------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------

    #[test]
    fn test_get_nested_value() {
        let val: toml::Value = toml::from_str("[model]\nn_neighbors = 11").unwrap();
        assert_eq!(
            get_nested_value(&val, "model.n_neighbors"),
            Some(&toml::Value::Integer(11))
        );
        assert!(get_nested_value(&val, "model.missing").is_none());
        assert!(get_nested_value(&val, "missing").is_none());
    }

    #[test]
    fn test_set_nested_value_creates_sections() {
        let mut val = toml::Value::Table(toml::map::Map::new());
        set_nested_value(&mut val, "recommend.top_k", toml::Value::Integer(3)).unwrap();
        set_nested_value(&mut val, "project_name", toml::Value::String("x".into())).unwrap();
        assert_eq!(
            get_nested_value(&val, "recommend.top_k"),
            Some(&toml::Value::Integer(3))
        );
        assert_eq!(
            get_nested_value(&val, "project_name"),
            Some(&toml::Value::String("x".into()))
        );
    }

    #[test]
    fn test_set_nested_value_rejects_non_table() {
        let mut val: toml::Value = toml::from_str("project_name = \"berth\"").unwrap();
        assert!(set_nested_value(&mut val, "project_name.inner", toml::Value::Integer(1)).is_err());
        assert!(set_nested_value(&mut val, "model.", toml::Value::Integer(1)).is_err());
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("11"), toml::Value::Integer(11));
        assert_eq!(parse_value("0.5"), toml::Value::Float(0.5));
        assert_eq!(
            parse_value("euclidean"),
            toml::Value::String("euclidean".to_string())
        );
    }

    #[test]
    fn test_format_toml_value() {
        assert_eq!(format_toml_value(&toml::Value::String("cosine".into())), "cosine");
        assert_eq!(format_toml_value(&toml::Value::Integer(11)), "11");
        assert_eq!(format_toml_value(&toml::Value::Boolean(false)), "false");
    }
}
