//! BerthCli application.
//!
//! Owns the loaded configuration and dispatches parsed commands to the
//! handler modules.

use crate::cli::{CliArgs, Command};
use crate::config::BerthConfig;
use crate::config_handlers;
use crate::model_handlers::{self, EvaluateOptions, FitOptions, RecommendOptions};
use berth_core::Result;
use berth_knn::RecommendFilters;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// BerthCli
// ============================================================================

/// The `berth` command-line application.
pub struct BerthCli {
    name: String,
    config: Arc<BerthConfig>,
    version: String,
}

impl BerthCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = BerthConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: BerthConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &BerthConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    /// Records emitted through `log` by the library crates are forwarded.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Fit {
                dataset,
                metric,
                neighbors,
                output,
                force,
                check,
            }) => {
                let options = FitOptions {
                    dataset,
                    metric,
                    neighbors,
                    output,
                    force,
                    check,
                };
                model_handlers::handle_fit(&self.config, options)
            }
            Some(Command::Recommend {
                id,
                top_k,
                max_price,
                min_guests,
                countries,
                types,
                json,
            }) => {
                let filters = RecommendFilters {
                    max_price,
                    min_guests,
                    countries,
                    types,
                };
                let options = RecommendOptions {
                    id,
                    top_k,
                    filters,
                    json,
                };
                model_handlers::handle_recommend(&self.config, options)
            }
            Some(Command::Show { id, json }) => {
                model_handlers::handle_show(&self.config, &id, json)
            }
            Some(Command::Batch { top_k, output }) => {
                model_handlers::handle_batch(&self.config, top_k, output.as_deref())
            }
            Some(Command::Evaluate {
                metrics,
                sample,
                top_k,
            }) => {
                let options = EvaluateOptions {
                    metrics,
                    sample,
                    top_k,
                };
                model_handlers::handle_evaluate(&self.config, options)
            }
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
