//! Berth Core: shared error type and configuration traits.
//!
//! This crate provides the foundational types used across all Berth crates.
//! It has no internal Berth dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`traits`]: Configuration provider trait

#![doc = include_str!("../README.md")]

pub mod error;
pub mod traits;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use traits::ConfigProvider;
