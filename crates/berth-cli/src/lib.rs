//! Command-line interface for the Berth similar-yachts recommender.
//!
//! # Commands
//!
//! - `fit`: build the index from the yacht CSV and save it
//! - `recommend` / `show`: query the saved index
//! - `batch`: cold recommendations for the whole catalog as CSV
//! - `evaluate`: compare catalog coverage across metrics
//! - `config`: inspect and edit the TOML configuration

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod model_handlers;

pub use app::BerthCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::BerthConfig;
