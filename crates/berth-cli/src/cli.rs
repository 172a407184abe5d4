//! CLI argument parsing and command definitions.
//!
//! `berth` fits the similar-yachts index from a dataset and answers
//! recommendation queries against the persisted index.

use berth_knn::Metric;
use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "BERTH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fit the index from the dataset and save it.
    Fit {
        /// Dataset CSV (defaults to the configured dataset path).
        #[arg(short, long)]
        dataset: Option<String>,

        /// Distance metric: cosine, euclidean or manhattan.
        #[arg(short, long)]
        metric: Option<Metric>,

        /// Neighbours per query, including the yacht itself.
        #[arg(short, long)]
        neighbors: Option<usize>,

        /// Output index file (defaults to the configured index path).
        #[arg(short, long)]
        output: Option<String>,

        /// Refit even if the saved index is fresh.
        #[arg(short, long)]
        force: bool,

        /// Check index freshness without fitting.
        #[arg(long)]
        check: bool,
    },

    /// Recommend yachts similar to one yacht.
    Recommend {
        /// Yacht identifier.
        #[arg(short, long)]
        id: String,

        /// Maximum number of recommendations.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Maximum summer low-season price per day.
        #[arg(long)]
        max_price: Option<f64>,

        /// Minimum guest capacity.
        #[arg(long)]
        min_guests: Option<u32>,

        /// Allowed country (repeatable).
        #[arg(long = "country")]
        countries: Vec<String>,

        /// Allowed yacht type (repeatable).
        #[arg(long = "type")]
        types: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one indexed yacht.
    Show {
        /// Yacht identifier.
        #[arg(short, long)]
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Compute cold recommendations for every yacht as CSV.
    Batch {
        /// Recommendations per yacht.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output CSV file (defaults to stdout).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Compare catalog coverage across metrics.
    Evaluate {
        /// Metrics to evaluate (repeatable, defaults to all).
        #[arg(short, long = "metric")]
        metrics: Vec<Metric>,

        /// Number of yachts to query (defaults to all).
        #[arg(short, long)]
        sample: Option<usize>,

        /// Recommendations per yacht.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "model.metric").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "recommend.top_k").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
