//! Quote ingestion and normalization for the surebet pipeline.
//!
//! This crate handles:
//! - Site-specific row preprocessing (live markers, combined team names, missing dates)
//! - Column selection through per-site locators
//! - Dropping incomplete rows and recording per-site anomalies

pub mod preprocess;
pub mod standardizer;

pub use standardizer::{parse_odds, Anomaly, QuoteStandardizer, StandardizeStats, Standardized};
