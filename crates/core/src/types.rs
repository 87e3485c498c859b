//! Core data types for the surebet pipeline.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable bookmaker identifier (e.g. "ladbrokes").
pub type SiteName = String;

/// Decimal odds.
pub type Odds = f64;

/// Ordered text tokens scraped from one page element for one match.
pub type RawQuoteRow = Vec<String>;

/// Raw rows per site for one competition.
pub type RawQuotes = BTreeMap<SiteName, Vec<RawQuoteRow>>;

/// Raw rows per competition, as written by the scraping collaborator.
pub type ScrapeSnapshot = BTreeMap<String, RawQuotes>;

/// Name of the derived margin column.
pub const MARGIN_COLUMN: &str = "margin";

/// Name of the run timestamp column.
pub const DATE_COLUMN: &str = "date";

/// Suffixes of the five canonical per-site columns, in locator order.
pub const FIELD_SUFFIXES: [&str; 5] = ["home", "away", "1", "X", "2"];

/// The five canonical column names for a site.
pub fn site_columns(site: &str) -> [String; 5] {
    FIELD_SUFFIXES.map(|suffix| format!("{site}_{suffix}"))
}

/// Match outcome a price is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Home team wins ("1").
    HomeWin,
    /// Draw ("X").
    Draw,
    /// Away team wins ("2").
    AwayWin,
}

impl Outcome {
    /// All outcomes in column order.
    pub const ALL: [Outcome; 3] = [Outcome::HomeWin, Outcome::Draw, Outcome::AwayWin];

    /// Column suffix used in output tables.
    pub fn suffix(self) -> &'static str {
        match self {
            Outcome::HomeWin => "1",
            Outcome::Draw => "X",
            Outcome::AwayWin => "2",
        }
    }
}

/// Odds for the three outcomes of a match at one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    /// Decimal odds on the home team winning ("1").
    pub home_win: Odds,
    /// Decimal odds on a draw ("X").
    pub draw: Odds,
    /// Decimal odds on the away team winning ("2").
    pub away_win: Odds,
}

impl OddsTriple {
    pub fn new(home_win: Odds, draw: Odds, away_win: Odds) -> Self {
        Self {
            home_win,
            draw,
            away_win,
        }
    }

    /// Odds for a given outcome.
    #[inline]
    pub fn get(&self, outcome: Outcome) -> Odds {
        match outcome {
            Outcome::HomeWin => self.home_win,
            Outcome::Draw => self.draw,
            Outcome::AwayWin => self.away_win,
        }
    }
}

/// One complete standardized row: team names as spelled by the site, plus odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteQuote {
    /// Home team, site spelling.
    pub home: String,
    /// Away team, site spelling.
    pub away: String,
    /// Three-way odds.
    pub odds: OddsTriple,
}

/// Uniform per-site table. Every row carries all five fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedQuoteTable {
    /// Site the rows were scraped from.
    pub site: SiteName,
    /// Complete rows, in scrape order.
    pub rows: Vec<SiteQuote>,
}

impl StandardizedQuoteTable {
    pub fn new(site: impl Into<SiteName>, rows: Vec<SiteQuote>) -> Self {
        Self {
            site: site.into(),
            rows,
        }
    }

    /// Table with the canonical columns and no rows.
    pub fn empty(site: impl Into<SiteName>) -> Self {
        Self::new(site, Vec::new())
    }

    /// Canonical column names of this table.
    pub fn columns(&self) -> [String; 5] {
        site_columns(&self.site)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical identity of a match, in the reference site's spelling.
///
/// A side that could not be resolved is `None`; such a key never joins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchKey {
    /// Canonical home team.
    pub home: Option<String>,
    /// Canonical away team.
    pub away: Option<String>,
}

impl MatchKey {
    /// Key with no canonical identity.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Key with both sides known.
    pub fn resolved(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            home: Some(home.into()),
            away: Some(away.into()),
        }
    }

    /// Whether both sides are known.
    pub fn is_resolved(&self) -> bool {
        self.home.is_some() && self.away.is_some()
    }

    /// Both sides, when resolved.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (&self.home, &self.away) {
            (Some(home), Some(away)) => Some((home, away)),
            _ => None,
        }
    }
}

/// One reconciled match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    /// Canonical identity.
    pub key: MatchKey,
    /// Quote per schema site, aligned with `ReconciledQuoteTable::sites`.
    pub quotes: Vec<Option<SiteQuote>>,
    /// Margin over the best odds of every site; `None` when undefined.
    pub margin: Option<f64>,
}

impl ReconciledRow {
    /// Odds for one outcome across all schema sites.
    pub fn odds(&self, outcome: Outcome) -> impl Iterator<Item = Option<Odds>> + '_ {
        self.quotes
            .iter()
            .map(move |quote| quote.as_ref().map(|q| q.odds.get(outcome)))
    }

    /// Number of sites quoting this match.
    pub fn site_count(&self) -> usize {
        self.quotes.iter().filter(|q| q.is_some()).count()
    }

    /// Is the margin defined and below one?
    pub fn is_arbitrage(&self) -> bool {
        self.margin.is_some_and(|m| m < 1.0)
    }
}

/// Wide table with one row per canonical match and every site's odds as columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledQuoteTable {
    /// Site whose spellings are canonical.
    pub reference_site: SiteName,
    /// Column groups, reference site first.
    pub sites: Vec<SiteName>,
    /// Reconciled matches.
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledQuoteTable {
    /// Every site's five columns followed by `margin`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.sites.iter().flat_map(|s| site_columns(s)).collect();
        columns.push(MARGIN_COLUMN.to_string());
        columns
    }

    /// Position of a site's column group.
    pub fn site_index(&self, site: &str) -> Option<usize> {
        self.sites.iter().position(|s| s == site)
    }

    /// Quote of a site for a given row.
    pub fn quote(&self, row: usize, site: &str) -> Option<&SiteQuote> {
        let idx = self.site_index(site)?;
        self.rows.get(row)?.quotes.get(idx)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A (competition, site) pair that yielded zero rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Competition being scraped.
    pub competition: String,
    /// Site that returned nothing.
    pub site: SiteName,
    /// Run timestamp.
    pub timestamp: NaiveDateTime,
}
