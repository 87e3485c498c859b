//! Error types for the surebet pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the surebet pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (malformed input file or table).
    #[error("Data error: {0}")]
    Data(String),

    /// Locator indices do not fit the shape of the scraped rows.
    #[error("Layout drift for {site}: column {index} requested, rows have {width} columns")]
    LayoutDrift {
        site: String,
        index: usize,
        width: usize,
    },

    /// Programming invariant violated; the run must abort.
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a layout drift error.
    pub fn layout_drift(site: impl Into<String>, index: usize, width: usize) -> Self {
        Error::LayoutDrift {
            site: site.into(),
            index,
            width,
        }
    }

    /// Create an invariant violation.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::Invariant(msg.into())
    }
}
