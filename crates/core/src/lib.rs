//! Core types and configuration for the surebet pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Raw, standardized and reconciled quote tables
//! - Configuration structures (sites, locators, preprocessing rules)
//! - Common error types
//! - A small CSV codec

pub mod config;
pub mod csv;
pub mod error;
pub mod types;

pub use config::{ColumnLocator, Config, OutputConfig, PreprocessRule, SiteConfig};
pub use error::{Error, Result};
pub use types::*;
