//! Quote standardization.
//!
//! Turns each site's raw scraped rows into a uniform table of complete
//! `SiteQuote` rows, using the site's preprocessing rules and column locator.
//! Problems with one site never abort the run: they are returned as
//! [`Anomaly`] records next to the tables.

use crate::preprocess::{apply_rules, Cell};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use surebet_core::{
    Config, Error, Odds, OddsTriple, RawQuoteRow, RawQuotes, Result, SiteConfig, SiteName,
    SiteQuote, StandardizedQuoteTable,
};
use tracing::{debug, error, info};

/// Number of rows echoed to the log when a site's layout drifted.
const DRIFT_SAMPLE_ROWS: usize = 5;

/// Soft, per-site failure recorded during standardization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anomaly {
    /// The site returned zero rows.
    NoData { site: SiteName },
    /// Locator indices did not fit the rows; the site got an empty table.
    LayoutDrift {
        site: SiteName,
        index: usize,
        width: usize,
    },
    /// The site has no configuration and was skipped.
    UnknownSite { site: SiteName },
}

impl Anomaly {
    /// Site the anomaly belongs to.
    pub fn site(&self) -> &str {
        match self {
            Anomaly::NoData { site }
            | Anomaly::LayoutDrift { site, .. }
            | Anomaly::UnknownSite { site } => site,
        }
    }
}

/// Row counts for one standardization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardizeStats {
    /// Raw rows received across all sites.
    pub rows_in: u64,
    /// Rows kept in the output tables.
    pub rows_kept: u64,
    /// Rows dropped because a field was missing.
    pub rows_incomplete: u64,
    /// Rows discarded with a drifted site.
    pub rows_drifted: u64,
}

/// Result of standardizing one competition.
#[derive(Debug, Clone, Default)]
pub struct Standardized {
    /// One table per site that delivered rows.
    pub tables: BTreeMap<SiteName, StandardizedQuoteTable>,
    /// Soft failures, in site order.
    pub anomalies: Vec<Anomaly>,
    /// Row counts.
    pub stats: StandardizeStats,
}

impl Standardized {
    /// Sites that returned zero rows.
    pub fn no_data_sites(&self) -> impl Iterator<Item = &str> {
        self.anomalies.iter().filter_map(|a| match a {
            Anomaly::NoData { site } => Some(site.as_str()),
            _ => None,
        })
    }
}

/// Parse a scraped decimal price ("2.10" or "2,10").
pub fn parse_odds(token: &str) -> Option<Odds> {
    let value: f64 = token.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Standardizes raw rows of every configured site.
pub struct QuoteStandardizer {
    sites: Vec<SiteConfig>,
}

impl QuoteStandardizer {
    /// Create a standardizer for the given sites.
    pub fn new(sites: Vec<SiteConfig>) -> Self {
        Self { sites }
    }

    /// Create a standardizer from the run configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sites.clone())
    }

    /// Standardize every site of one competition.
    pub fn standardize(&self, raw: &RawQuotes) -> Standardized {
        let mut out = Standardized::default();

        for (name, rows) in raw {
            info!(site = %name, rows = rows.len(), "standardizing quotes");
            out.stats.rows_in += rows.len() as u64;

            if rows.is_empty() {
                error!(site = %name, "no data");
                out.anomalies.push(Anomaly::NoData { site: name.clone() });
                continue;
            }

            let Some(site) = self.sites.iter().find(|s| &s.name == name) else {
                error!(site = %name, "site has no locator configured, skipping");
                out.anomalies.push(Anomaly::UnknownSite { site: name.clone() });
                continue;
            };

            let table = match standardize_site(site, rows) {
                Ok(table) => {
                    out.stats.rows_kept += table.len() as u64;
                    out.stats.rows_incomplete += (rows.len() - table.len()) as u64;
                    table
                }
                Err(Error::LayoutDrift { site, index, width }) => {
                    error!(site = %site, index, width, "data has not been parsed correctly");
                    for row in rows.iter().take(DRIFT_SAMPLE_ROWS) {
                        debug!(site = %site, ?row, "drifted row");
                    }
                    out.stats.rows_drifted += rows.len() as u64;
                    out.anomalies.push(Anomaly::LayoutDrift {
                        site: site.clone(),
                        index,
                        width,
                    });
                    StandardizedQuoteTable::empty(site)
                }
                Err(err) => {
                    // standardize_site only reports drift
                    error!(site = %name, %err, "unexpected standardization error");
                    StandardizedQuoteTable::empty(name.clone())
                }
            };

            out.tables.insert(name.clone(), table);
        }

        out
    }
}

/// Standardize the rows of a single site.
///
/// Returns `Error::LayoutDrift` when a locator index lies beyond the widest
/// preprocessed row.
pub fn standardize_site(site: &SiteConfig, rows: &[RawQuoteRow]) -> Result<StandardizedQuoteTable> {
    let rules = site.rules();
    let cells: Vec<Vec<Cell>> = rows.iter().map(|row| apply_rules(&rules, row)).collect();

    let width = cells.iter().map(Vec::len).max().unwrap_or(0);
    let max_index = site.locator.max_index();
    if max_index >= width {
        return Err(Error::layout_drift(&site.name, max_index, width));
    }

    let quotes = cells
        .iter()
        .filter_map(|row| select_quote(row, site.locator.indices()))
        .collect();

    Ok(StandardizedQuoteTable::new(site.name.clone(), quotes))
}

/// Pick the five located fields; `None` if any is missing.
fn select_quote(row: &[Cell], indices: &[usize; 5]) -> Option<SiteQuote> {
    let field = |i: usize| row.get(indices[i]).and_then(|c| c.as_deref());

    let home = field(0)?;
    let away = field(1)?;
    let odds = OddsTriple::new(
        parse_odds(field(2)?)?,
        parse_odds(field(3)?)?,
        parse_odds(field(4)?)?,
    );

    Some(SiteQuote {
        home: home.to_string(),
        away: away.to_string(),
        odds,
    })
}
