//! Cross-site reconciliation.
//!
//! Joins the standardized tables of one competition into a single wide table
//! keyed by the canonical (home, away) pair. The reference site's spellings
//! are canonical; every other site's spellings go through the team key table.
//! The join is an outer join: a match quoted by a single site still gets a row.

use crate::margin::apply_margins;
use crate::team_keys::{TeamKeyResolver, TeamKeyTable};
use std::collections::{BTreeMap, HashMap, HashSet};
use surebet_core::{
    Error, MatchKey, ReconciledQuoteTable, ReconciledRow, Result, SiteName, SiteQuote,
    StandardizedQuoteTable,
};
use tracing::{debug, info, warn};

/// Per-site join counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Rows joined onto an existing match.
    pub matched: usize,
    /// Rows appended as new matches.
    pub appended: usize,
    /// Rows whose home or away spelling did not resolve.
    pub unresolved: usize,
    /// Repeated listings of a match already quoted by the same site. The
    /// reference site keeps them as their own rows; other sites drop them.
    pub duplicates: usize,
}

impl JoinStats {
    /// Add another site's counts.
    pub fn merge(&mut self, other: &JoinStats) {
        self.matched += other.matched;
        self.appended += other.appended;
        self.unresolved += other.unresolved;
        self.duplicates += other.duplicates;
    }
}

/// Per-site join counts, keyed by site.
pub type JoinReport = BTreeMap<SiteName, JoinStats>;

/// Reconciles standardized tables against a fixed reference site.
pub struct QuoteReconciler {
    resolver: TeamKeyResolver,
}

impl QuoteReconciler {
    /// Create a reconciler whose canonical spellings are those of `reference_site`.
    pub fn new(keys: &TeamKeyTable, reference_site: &str) -> Self {
        Self {
            resolver: keys.resolver(reference_site),
        }
    }

    /// Site whose spellings are canonical.
    pub fn reference_site(&self) -> &str {
        self.resolver.reference()
    }

    /// Join the tables of every attempted site.
    ///
    /// `attempted` fixes the column groups: the reference site first, then the
    /// other sites in the given order. Attempted sites without a table (no data)
    /// or with an empty table keep their columns, with every cell missing.
    pub fn reconcile(
        &self,
        attempted: &[SiteName],
        tables: &BTreeMap<SiteName, StandardizedQuoteTable>,
    ) -> Result<ReconciledQuoteTable> {
        self.reconcile_with_stats(attempted, tables).map(|(table, _)| table)
    }

    /// Same as [`reconcile`](Self::reconcile), also returning the join counts
    /// of every site that had rows to join.
    pub fn reconcile_with_stats(
        &self,
        attempted: &[SiteName],
        tables: &BTreeMap<SiteName, StandardizedQuoteTable>,
    ) -> Result<(ReconciledQuoteTable, JoinReport)> {
        let sites = self.schema(attempted)?;
        for site in tables.keys() {
            if !sites.contains(site) {
                return Err(Error::invariant(format!(
                    "table for {site} is outside the attempted site list"
                )));
            }
        }

        let mut joiner = Joiner::new(sites.len());
        let mut report = JoinReport::new();

        for (idx, site) in sites.iter().enumerate() {
            let Some(table) = tables.get(site) else {
                debug!(site = %site, "no table, columns left empty");
                continue;
            };
            if table.is_empty() {
                warn!(site = %site, "no quotes");
                continue;
            }

            let stats = if idx == 0 {
                joiner.join(idx, site, table, |q| MatchKey::resolved(&q.home, &q.away))
            } else {
                joiner.join(idx, site, table, |q| {
                    let key = self.resolver.resolve_key(site, &q.home, &q.away);
                    if key.home.is_none() {
                        warn!(site = %site, team = %q.home, "no team key for home team");
                    }
                    if key.away.is_none() {
                        warn!(site = %site, team = %q.away, "no team key for away team");
                    }
                    key
                })
            };
            info!(
                site = %site,
                matched = stats.matched,
                appended = stats.appended,
                unresolved = stats.unresolved,
                duplicates = stats.duplicates,
                "joined quotes"
            );
            report.insert(site.clone(), stats);
        }

        let mut out = ReconciledQuoteTable {
            reference_site: self.reference_site().to_string(),
            sites,
            rows: joiner.rows,
        };
        check_columns(&out)?;
        apply_margins(&mut out);
        Ok((out, report))
    }

    /// Reference first, then the other attempted sites in order.
    fn schema(&self, attempted: &[SiteName]) -> Result<Vec<SiteName>> {
        let reference = self.reference_site();
        let mut seen = HashSet::new();
        let mut sites = vec![reference.to_string()];

        for site in attempted {
            if !seen.insert(site.as_str()) {
                return Err(Error::invariant(format!("site {site} attempted twice")));
            }
            if site != reference {
                sites.push(site.clone());
            }
        }
        Ok(sites)
    }
}

/// Accumulator for the outer join.
struct Joiner {
    width: usize,
    rows: Vec<ReconciledRow>,
    index: HashMap<(String, String), usize>,
}

impl Joiner {
    fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Outer-join one site's rows into the accumulator.
    ///
    /// Site `0` is the reference: its rows are all kept, and a repeated pair
    /// only joins later sites onto its first listing.
    fn join<F>(&mut self, idx: usize, site: &str, table: &StandardizedQuoteTable, key_of: F) -> JoinStats
    where
        F: Fn(&SiteQuote) -> MatchKey,
    {
        let mut stats = JoinStats::default();

        for quote in &table.rows {
            let key = key_of(quote);

            let Some((home, away)) = key.pair() else {
                stats.unresolved += 1;
                self.push(idx, MatchKey::unresolved(), quote);
                continue;
            };

            let pair = (home.to_string(), away.to_string());
            match self.index.get(&pair).copied() {
                Some(_) if idx == 0 => {
                    debug!(site = %site, home = %pair.0, away = %pair.1, "repeated listing on the reference site");
                    stats.duplicates += 1;
                    self.push(idx, key, quote);
                }
                Some(row) if self.rows[row].quotes[idx].is_some() => {
                    warn!(site = %site, home = %pair.0, away = %pair.1, "duplicate listing, keeping the first");
                    stats.duplicates += 1;
                }
                Some(row) => {
                    self.rows[row].quotes[idx] = Some(quote.clone());
                    stats.matched += 1;
                }
                None => {
                    self.index.insert(pair, self.rows.len());
                    self.push(idx, key, quote);
                    stats.appended += 1;
                }
            }
        }

        stats
    }

    fn push(&mut self, idx: usize, key: MatchKey, quote: &SiteQuote) {
        let mut quotes = vec![None; self.width];
        quotes[idx] = Some(quote.clone());
        self.rows.push(ReconciledRow {
            key,
            quotes,
            margin: None,
        });
    }
}

/// Column names must be unique; anything else is a programming error.
fn check_columns(table: &ReconciledQuoteTable) -> Result<()> {
    let mut seen = HashSet::new();
    for column in table.columns() {
        if !seen.insert(column.clone()) {
            return Err(Error::invariant(format!("duplicate column {column}")));
        }
    }
    Ok(())
}
