//! Configuration structures for the surebet pipeline.

use crate::error::{Error, Result};
use crate::types::SiteName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration for a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Site whose team spellings are canonical.
    pub reference_site: SiteName,
    /// Known sites, in output column order.
    pub sites: Vec<SiteConfig>,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the site list: unique non-empty names and a known reference site.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for site in &self.sites {
            if site.name.trim().is_empty() {
                return Err(Error::config("site name must not be empty"));
            }
            if !seen.insert(site.name.as_str()) {
                return Err(Error::config(format!("site {} is listed twice", site.name)));
            }
        }
        if !seen.contains(self.reference_site.as_str()) {
            return Err(Error::config(format!(
                "reference site {} is not among the configured sites",
                self.reference_site
            )));
        }
        Ok(())
    }

    /// Configuration of a site, if known.
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Configured site names in order.
    pub fn site_names(&self) -> Vec<SiteName> {
        self.sites.iter().map(|s| s.name.clone()).collect()
    }
}

/// Per-site extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identifier.
    pub name: SiteName,
    /// Token positions of the five canonical fields.
    pub locator: ColumnLocator,
    /// Explicit preprocessing rules. `None` falls back to the built-in rules.
    #[serde(default)]
    pub preprocess: Option<Vec<PreprocessRule>>,
}

impl SiteConfig {
    pub fn new(name: impl Into<SiteName>, locator: ColumnLocator) -> Self {
        Self {
            name: name.into(),
            locator,
            preprocess: None,
        }
    }

    /// Rules to apply before column selection.
    pub fn rules(&self) -> Vec<PreprocessRule> {
        match &self.preprocess {
            Some(rules) => rules.clone(),
            None => PreprocessRule::builtin(&self.name),
        }
    }
}

/// Positions of home, away, "1", "X" and "2" in a scraped row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnLocator(pub [usize; 5]);

impl ColumnLocator {
    pub fn new(home: usize, away: usize, home_win: usize, draw: usize, away_win: usize) -> Self {
        Self([home, away, home_win, draw, away_win])
    }

    /// Indices in field order.
    pub fn indices(&self) -> &[usize; 5] {
        &self.0
    }

    /// Largest index referenced.
    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

/// Site-specific row rewrite applied before the locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum PreprocessRule {
    /// Remove every token equal to `token` (live-match markers).
    DropToken { token: String },
    /// Prepend `filler` to rows of exactly `len` tokens (missing date field).
    PadShortRow { len: usize, filler: String },
    /// Split the token at `index` on `delimiter` into two tokens.
    SplitTeams { index: usize, delimiter: String },
}

impl PreprocessRule {
    /// Rules for the sites whose quirks are known.
    pub fn builtin(site: &str) -> Vec<PreprocessRule> {
        match site {
            // "Home - Away" in one token; the date is left out for today's games
            "ladbrokes" => vec![
                PreprocessRule::PadShortRow {
                    len: 11,
                    filler: "today".to_string(),
                },
                PreprocessRule::SplitTeams {
                    index: 2,
                    delimiter: " - ".to_string(),
                },
            ],
            "starcasino" => vec![PreprocessRule::DropToken {
                token: "EN DIRECT".to_string(),
            }],
            _ => Vec::new(),
        }
    }
}

/// Output file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the output files.
    pub dir: PathBuf,
    /// Prefix of the per-run quotes file.
    pub quotes_prefix: String,
    /// File name of the appended failure report.
    pub failures_file: String,
    /// Format of the `date` column.
    pub date_format: String,
    /// Format of the timestamp in the quotes file name.
    pub file_date_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            quotes_prefix: "all_quotes".to_string(),
            failures_file: "failed_urls.csv".to_string(),
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
            file_date_format: "%Y%m%d_%H%M%S".to_string(),
        }
    }
}
