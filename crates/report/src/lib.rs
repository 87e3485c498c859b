//! Run orchestration and output for the surebet pipeline.
//!
//! This crate provides:
//! - The per-competition pipeline (standardize, reconcile, margin)
//! - Failure records for sites that returned no data
//! - Flat CSV output of the reconciled quotes and the failure report
//! - A run summary for the log

pub mod pipeline;
pub mod summary;
pub mod writer;

pub use pipeline::{load_snapshot, CompetitionRun, Pipeline, RunReport};
pub use summary::{opportunities, Opportunity, RunSummary};
pub use writer::QuoteTableWriter;
