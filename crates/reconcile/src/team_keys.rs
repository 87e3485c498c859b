//! Team-name correspondence table.
//!
//! Each row lists how every site spells the same team. A blank cell means the
//! site has no known spelling for that team.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use surebet_core::{csv, Error, MatchKey, Result, SiteName};

/// Static cross-reference of team spellings, one column per site.
#[derive(Debug, Clone, Default)]
pub struct TeamKeyTable {
    sites: Vec<SiteName>,
    rows: Vec<Vec<Option<String>>>,
}

impl TeamKeyTable {
    /// Build a table from column names and rows. Short rows are padded with blanks.
    pub fn new(sites: Vec<SiteName>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for site in &sites {
            if !site.is_empty() && !seen.insert(site.as_str()) {
                return Err(Error::data(format!("team key column {site} appears twice")));
            }
        }

        let width = sites.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(Error::data(format!(
                    "team key row {} has {} cells, header has {}",
                    i + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, None);
            padded.push(row);
        }

        Ok(Self { sites, rows: padded })
    }

    /// Parse the correspondence CSV; the first row names the sites.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut rows = csv::parse_rows(text).into_iter();
        let header = rows
            .next()
            .ok_or_else(|| Error::data("team key table is empty"))?;

        let cells = rows
            .map(|row| {
                row.into_iter()
                    .map(|cell| (!cell.trim().is_empty()).then_some(cell))
                    .collect()
            })
            .collect();

        Self::new(header, cells)
    }

    /// Load the correspondence CSV from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_csv_str(&text)
    }

    /// Column names.
    pub fn sites(&self) -> &[SiteName] {
        &self.sites
    }

    /// Number of teams listed.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Spelling of a site in a given row.
    pub fn spelling(&self, row: usize, site: &str) -> Option<&str> {
        let col = self.sites.iter().position(|s| s == site)?;
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Build a lookup mapping every site's spelling to the reference spelling.
    pub fn resolver(&self, reference: &str) -> TeamKeyResolver {
        let mut lookup: HashMap<SiteName, HashMap<String, String>> = HashMap::new();

        if let Some(ref_col) = self.sites.iter().position(|s| s == reference) {
            for row in &self.rows {
                let Some(canonical) = &row[ref_col] else {
                    continue;
                };
                for (col, site) in self.sites.iter().enumerate() {
                    if col == ref_col || site.is_empty() {
                        continue;
                    }
                    if let Some(spelling) = &row[col] {
                        // first row wins
                        lookup
                            .entry(site.clone())
                            .or_default()
                            .entry(spelling.clone())
                            .or_insert_with(|| canonical.clone());
                    }
                }
            }
        }

        TeamKeyResolver {
            reference: reference.to_string(),
            lookup,
        }
    }
}

/// Lookup of `(site, spelling)` to the reference site's spelling.
#[derive(Debug, Clone)]
pub struct TeamKeyResolver {
    reference: SiteName,
    lookup: HashMap<SiteName, HashMap<String, String>>,
}

impl TeamKeyResolver {
    /// Site whose spellings are canonical.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Canonical spelling of a team as written by `site`.
    ///
    /// The reference site's own spellings are canonical as-is.
    pub fn resolve<'a>(&'a self, site: &str, spelling: &'a str) -> Option<&'a str> {
        if site == self.reference {
            return Some(spelling);
        }
        self.lookup
            .get(site)?
            .get(spelling)
            .map(String::as_str)
    }

    /// Canonical identity of a match; home and away are looked up independently.
    pub fn resolve_key(&self, site: &str, home: &str, away: &str) -> MatchKey {
        MatchKey {
            home: self.resolve(site, home).map(str::to_string),
            away: self.resolve(site, away).map(str::to_string),
        }
    }
}
