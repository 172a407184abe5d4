//! Handler functions for model CLI commands.
//!
//! These functions implement `fit`, `recommend`, `show`, `batch` and
//! `evaluate` on top of `berth-knn`.

use crate::config::BerthConfig;
use berth_core::traits::ConfigProvider;
use berth_core::{Error, Result};
use berth_features::{Dataset, YachtRecord};
use berth_knn::{
    IndexBuilder, Metric, RecommendFilters, Recommendation, Recommender, YachtIndex,
    catalog_coverage, compute_file_hash, feature_fingerprint, is_index_fresh, load_index,
    load_metadata, recommend_all, sample_ids, save_index, write_batch_csv,
};
use std::path::{Path, PathBuf};

// ============================================================================
// Option types
// ============================================================================

/// Options for `fit`.
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    /// Dataset CSV, overriding the configured path.
    pub dataset: Option<String>,
    /// Metric, overriding the configured one.
    pub metric: Option<Metric>,
    /// Neighbours per query, overriding the configured value.
    pub neighbors: Option<usize>,
    /// Output index file, overriding the configured path.
    pub output: Option<String>,
    /// Refit even when the saved index is fresh.
    pub force: bool,
    /// Only report freshness.
    pub check: bool,
}

/// Options for `recommend`.
#[derive(Debug, Clone)]
pub struct RecommendOptions {
    /// Query yacht.
    pub id: String,
    /// Result count, overriding the configured default.
    pub top_k: Option<usize>,
    /// Result filters.
    pub filters: RecommendFilters,
    /// Print JSON.
    pub json: bool,
}

/// Options for `evaluate`.
#[derive(Debug, Clone, Default)]
pub struct EvaluateOptions {
    /// Metrics to compare; empty means all.
    pub metrics: Vec<Metric>,
    /// Number of yachts to query; `None` means all.
    pub sample: Option<usize>,
    /// Result count, overriding the configured default.
    pub top_k: Option<usize>,
}

// ============================================================================
// Helpers
// ============================================================================

fn load_index_or_error(path: &Path) -> Result<YachtIndex> {
    if !path.exists() {
        return Err(Error::not_fitted(format!(
            "No index at {}. Run `berth fit` first.",
            path.display()
        )));
    }
    load_index(path)
}

/// What a saved index must have been fitted with to be reused.
struct FitParams<'a> {
    content_hash: &'a str,
    metric: Metric,
    n_neighbors: usize,
    feature_fingerprint: &'a str,
}

/// True if the index at `path` was fitted on this dataset with these
/// parameters and feature configuration.
fn index_matches(path: &Path, params: &FitParams<'_>) -> bool {
    is_index_fresh(path, params.content_hash)
        && load_metadata(path)
            .map(|m| {
                m.metric == params.metric
                    && m.n_neighbors == params.n_neighbors
                    && m.feature_fingerprint.as_deref() == Some(params.feature_fingerprint)
            })
            .unwrap_or(false)
}

fn format_price(price: Option<f64>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("{p:.0}"))
}

fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// Fit the index and save it, unless a fresh one already exists.
pub fn handle_fit(config: &BerthConfig, options: FitOptions) -> Result<()> {
    let dataset_path = match options.dataset {
        Some(p) => PathBuf::from(p),
        None => config.dataset_path()?,
    };
    let index_path = match options.output {
        Some(p) => PathBuf::from(p),
        None => config.index_path()?,
    };
    let metric = options.metric.unwrap_or(config.model.metric);
    let n_neighbors = options.neighbors.unwrap_or(config.model.n_neighbors);

    let feature_config = config.feature_config();
    let content_hash = compute_file_hash(&dataset_path)?;
    let fingerprint = feature_fingerprint(&feature_config);
    let fresh = index_matches(
        &index_path,
        &FitParams {
            content_hash: &content_hash,
            metric,
            n_neighbors,
            feature_fingerprint: &fingerprint,
        },
    );

    if options.check {
        if fresh {
            println!("Index is fresh: {}", index_path.display());
        } else {
            println!("Index is stale or missing: {}", index_path.display());
        }
        return Ok(());
    }
    if fresh && !options.force {
        println!(
            "Index is up to date ({}). Use --force to refit.",
            index_path.display()
        );
        return Ok(());
    }

    let dataset = Dataset::from_csv_path(&dataset_path)?;
    let index = IndexBuilder::new(metric, n_neighbors)
        .with_feature_config(feature_config)
        .fit(&dataset)?;
    save_index(&index, &index_path, Some(&content_hash))?;

    println!("Index fitted:");
    println!("{}", index.stats());
    println!("\nIndex saved to: {}", index_path.display());
    Ok(())
}

/// Print recommendations for one yacht.
pub fn handle_recommend(config: &BerthConfig, options: RecommendOptions) -> Result<()> {
    let index = load_index_or_error(&config.index_path()?)?;
    let recommender = Recommender::from_index(index);
    let top_k = options.top_k.unwrap_or(config.recommend.top_k);
    let filters = (!options.filters.is_empty()).then_some(&options.filters);

    let recs = recommender.recommend(&options.id, top_k, filters)?;
    tracing::debug!(id = %options.id, top_k, results = recs.len(), "recommend");

    if options.json {
        println!("{}", serde_json::to_string_pretty(&recs)?);
    } else {
        print_recommendations(&options.id, &recs);
    }
    Ok(())
}

fn print_recommendations(id: &str, recs: &[Recommendation]) {
    if recs.is_empty() {
        println!("No recommendations for '{id}'.");
        return;
    }
    println!("Yachts similar to '{id}':\n");
    println!(
        "{:<4} {:<10} {:<28} {:<14} {:>6} {:>10} {:<12} {:>7}",
        "#", "id", "name", "type", "guests", "price", "country", "score"
    );
    for (i, rec) in recs.iter().enumerate() {
        let r = &rec.record;
        println!(
            "{:<4} {:<10} {:<28} {:<14} {:>6} {:>10} {:<12} {:>7.3}",
            i + 1,
            r.id,
            r.name.as_deref().unwrap_or("-"),
            r.yacht_type.as_deref().unwrap_or("-"),
            format_opt(r.guests),
            format_price(r.headline_price()),
            r.country.as_deref().unwrap_or("-"),
            rec.similarity_score
        );
    }
}

/// Print one indexed yacht.
pub fn handle_show(config: &BerthConfig, id: &str, json: bool) -> Result<()> {
    let index = load_index_or_error(&config.index_path()?)?;
    let record = index
        .get_record(id)
        .ok_or_else(|| Error::not_found(format!("Yacht '{id}' is not in the index")))?;

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        print_record(record);
    }
    Ok(())
}

fn print_record(r: &YachtRecord) {
    println!("Yacht {}", r.id);
    println!("  Name:        {}", r.name.as_deref().unwrap_or("-"));
    println!("  Type:        {}", r.yacht_type.as_deref().unwrap_or("-"));
    println!("  Guests:      {}", format_opt(r.guests));
    println!("  Cabins:      {}", format_opt(r.cabins));
    println!("  Crew:        {}", format_opt(r.crew));
    println!("  Length (m):  {}", format_opt(r.length));
    println!("  Year:        {}", format_opt(r.year));
    println!("  Rating:      {}", format_opt(r.rating));
    println!(
        "  Prices/day:  summer {} / {}, winter {} / {}",
        format_price(r.prices.summer_low),
        format_price(r.prices.summer_high),
        format_price(r.prices.winter_low),
        format_price(r.prices.winter_high)
    );
    println!("  Marina:      {}", r.base_marina.as_deref().unwrap_or("-"));
    println!("  Country:     {}", r.country.as_deref().unwrap_or("-"));
}

/// Write cold recommendations for every yacht as CSV.
pub fn handle_batch(
    config: &BerthConfig,
    top_k: Option<usize>,
    output: Option<&str>,
) -> Result<()> {
    let index = load_index_or_error(&config.index_path()?)?;
    let top_k = top_k.unwrap_or(config.recommend.top_k);
    let entries = recommend_all(&index, top_k);

    match output {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
            }
            let file = std::fs::File::create(path).map_err(|e| Error::io_with_path(e, path))?;
            write_batch_csv(&entries, file)?;
            tracing::info!(
                "Wrote cold recommendations for {} yachts to {}",
                entries.len(),
                path.display()
            );
        }
        None => write_batch_csv(&entries, std::io::stdout().lock())?,
    }

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    if failed > 0 {
        tracing::warn!("{failed} yachts had no recommendations");
    }
    Ok(())
}

/// Fit one index per metric and compare catalog coverage.
pub fn handle_evaluate(config: &BerthConfig, options: EvaluateOptions) -> Result<()> {
    let dataset = Dataset::from_csv_path(config.dataset_path()?)?;
    let metrics = if options.metrics.is_empty() {
        Metric::ALL.to_vec()
    } else {
        options.metrics
    };
    let top_k = options.top_k.unwrap_or(config.recommend.top_k);
    let n_neighbors = config.model.n_neighbors;

    println!(
        "{:<10} {:>8} {:>10} {:>8} {:>9}",
        "metric", "queried", "distinct", "catalog", "coverage"
    );
    for metric in metrics {
        let index = IndexBuilder::new(metric, n_neighbors)
            .with_feature_config(config.feature_config())
            .fit(&dataset)?;
        let ids = match options.sample {
            Some(n) => sample_ids(&index, n),
            None => index.ids().map(str::to_string).collect(),
        };
        let report = catalog_coverage(&index, &ids, top_k);
        println!(
            "{:<10} {:>8} {:>10} {:>8} {:>8.1}%",
            report.metric.as_str(),
            report.queried,
            report.unique_recommended,
            report.catalog_size,
            report.coverage * 100.0
        );
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
