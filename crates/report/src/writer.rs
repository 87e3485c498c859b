//! Flat CSV output: the reconciled quotes of a run and the failure report.

use crate::pipeline::{CompetitionRun, RunReport};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use surebet_core::{
    csv, site_columns, FailureRecord, OutputConfig, ReconciledQuoteTable, ReconciledRow, Result,
    DATE_COLUMN, MARGIN_COLUMN,
};
use tracing::info;

/// Header of the failure report.
pub const FAILURE_HEADER: [&str; 3] = ["competition", "website", "date"];

/// Writes run outputs according to the output configuration.
pub struct QuoteTableWriter {
    config: OutputConfig,
}

impl QuoteTableWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Header and rows of every competition as one table.
    ///
    /// Columns are the union of all competitions' site columns in first-seen
    /// order, then `margin` and `date`.
    pub fn render(&self, report: &RunReport) -> (Vec<String>, Vec<Vec<String>>) {
        let mut header: Vec<String> = Vec::new();
        for run in &report.competitions {
            for site in &run.table.sites {
                for column in site_columns(site) {
                    if !header.contains(&column) {
                        header.push(column);
                    }
                }
            }
        }
        header.push(MARGIN_COLUMN.to_string());
        header.push(DATE_COLUMN.to_string());

        let position: HashMap<String, usize> = header
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let date = report.timestamp.format(&self.config.date_format).to_string();

        let mut rows = Vec::new();
        for CompetitionRun { table, .. } in &report.competitions {
            for row in &table.rows {
                let mut out = vec![String::new(); header.len()];
                for (column, cell) in row_cells(table, row) {
                    out[position[&column]] = cell.unwrap_or_default();
                }
                out[header.len() - 2] = row.margin.map(|m| m.to_string()).unwrap_or_default();
                out[header.len() - 1] = date.clone();
                rows.push(out);
            }
        }

        (header, rows)
    }

    /// Path of the quotes file for a run timestamp.
    pub fn quotes_path(&self, timestamp: NaiveDateTime) -> PathBuf {
        let stamp = timestamp.format(&self.config.file_date_format);
        self.config
            .dir
            .join(format!("{}_{}.csv", self.config.quotes_prefix, stamp))
    }

    /// Path of the appended failure report.
    pub fn failures_path(&self) -> PathBuf {
        self.config.dir.join(&self.config.failures_file)
    }

    /// Write the run's quotes to a fresh file and return its path.
    pub fn write_quotes(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.dir)?;
        let path = self.quotes_path(report.timestamp);
        let (header, rows) = self.render(report);

        let mut w = BufWriter::new(File::create(&path)?);
        csv::write_row(&mut w, &header)?;
        for row in &rows {
            csv::write_row(&mut w, row)?;
        }
        w.flush()?;

        info!(path = %path.display(), rows = rows.len(), "quotes written");
        Ok(path)
    }

    /// Append failure records; the header is written only for a new file.
    pub fn append_failures<'a, I>(&self, failures: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = &'a FailureRecord>,
    {
        fs::create_dir_all(&self.config.dir)?;
        let path = self.failures_path();
        append_failures_to(&path, failures, &self.config.date_format)?;
        Ok(path)
    }
}

fn append_failures_to<'a, I>(path: &Path, failures: I, date_format: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a FailureRecord>,
{
    let exists = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut w = BufWriter::new(file);

    if !exists {
        csv::write_row(&mut w, &FAILURE_HEADER)?;
    }
    let mut count = 0usize;
    for failure in failures {
        let date = failure.timestamp.format(date_format).to_string();
        csv::write_row(&mut w, &[failure.competition.as_str(), failure.site.as_str(), date.as_str()])?;
        count += 1;
    }
    w.flush()?;

    info!(path = %path.display(), count, "failures recorded");
    Ok(())
}

/// Column name and text of every site cell of a row.
///
/// The reference site's team columns carry the canonical identity, so
/// matches quoted only by other sites still show their canonical names. A
/// key with either side unresolved leaves both columns empty.
pub fn row_cells(table: &ReconciledQuoteTable, row: &ReconciledRow) -> Vec<(String, Option<String>)> {
    let mut cells = Vec::with_capacity(table.sites.len() * 5);

    for (idx, site) in table.sites.iter().enumerate() {
        let [home_col, away_col, win_col, draw_col, loss_col] = site_columns(site);
        let quote = row.quotes.get(idx).and_then(Option::as_ref);

        let (home, away) = if idx == 0 {
            match row.key.pair() {
                Some((home, away)) => (Some(home.to_string()), Some(away.to_string())),
                None => (None, None),
            }
        } else {
            (quote.map(|q| q.home.clone()), quote.map(|q| q.away.clone()))
        };

        cells.push((home_col, home));
        cells.push((away_col, away));
        cells.push((win_col, quote.map(|q| q.odds.home_win.to_string())));
        cells.push((draw_col, quote.map(|q| q.odds.draw.to_string())));
        cells.push((loss_col, quote.map(|q| q.odds.away_win.to_string())));
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use surebet_core::{MatchKey, OddsTriple, SiteQuote};
    use surebet_ingestion::StandardizeStats;
    use surebet_reconcile::JoinReport;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 30, 5)
            .unwrap()
    }

    fn quote(home: &str, away: &str, odds: (f64, f64, f64)) -> Option<SiteQuote> {
        Some(SiteQuote {
            home: home.to_string(),
            away: away.to_string(),
            odds: OddsTriple::new(odds.0, odds.1, odds.2),
        })
    }

    fn run(competition: &str, sites: &[&str], rows: Vec<ReconciledRow>) -> CompetitionRun {
        CompetitionRun {
            competition: competition.to_string(),
            table: ReconciledQuoteTable {
                reference_site: sites[0].to_string(),
                sites: sites.iter().map(|s| s.to_string()).collect(),
                rows,
            },
            anomalies: Vec::new(),
            failures: Vec::new(),
            stats: StandardizeStats::default(),
            joins: JoinReport::new(),
        }
    }

    fn report() -> RunReport {
        RunReport {
            timestamp: timestamp(),
            competitions: vec![
                run(
                    "ligue1",
                    &["a", "b"],
                    vec![
                        ReconciledRow {
                            key: MatchKey::resolved("Lens", "Lille"),
                            quotes: vec![quote("Lens", "Lille", (2.0, 3.0, 4.0)), quote("RC Lens", "LOSC", (2.5, 3.5, 4.5))],
                            margin: Some(0.9),
                        },
                        ReconciledRow {
                            key: MatchKey { home: None, away: None },
                            quotes: vec![None, quote("Monaco", "Lyon", (2.2, 3.3, 3.1))],
                            margin: Some(1.05),
                        },
                    ],
                ),
                run(
                    "ligue2",
                    &["a", "c"],
                    vec![ReconciledRow {
                        key: MatchKey::resolved("Metz", "Caen"),
                        quotes: vec![None, quote("FC Metz", "SM Caen", (1.9, 3.1, 4.0))],
                        margin: None,
                    }],
                ),
            ],
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("surebet-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_render_union_header() {
        let writer = QuoteTableWriter::new(OutputConfig::default());
        let (header, rows) = writer.render(&report());

        assert_eq!(header.len(), 17);
        assert_eq!(header[10], "c_home");
        assert_eq!(header[15], "margin");
        assert_eq!(header[16], "date");
        assert_eq!(rows.len(), 3);

        assert_eq!(&rows[0][0..3], &["Lens", "Lille", "2"]);
        assert_eq!(rows[0][5], "RC Lens");
        assert_eq!(rows[0][15], "0.9");
        assert_eq!(rows[0][16], "2024-03-09 18:30:05");

        // unresolved row: no canonical names, no reference odds
        assert!(rows[1][0..5].iter().all(String::is_empty));
        assert_eq!(rows[1][5], "Monaco");

        // ligue2 has no b columns and an undefined margin
        assert_eq!(rows[2][0], "Metz");
        assert!(rows[2][5..10].iter().all(String::is_empty));
        assert_eq!(rows[2][10], "FC Metz");
        assert_eq!(rows[2][15], "");
    }

    #[test]
    fn test_half_resolved_key_not_written() {
        let table = ReconciledQuoteTable {
            reference_site: "a".to_string(),
            sites: vec!["a".to_string(), "b".to_string()],
            rows: Vec::new(),
        };
        let row = ReconciledRow {
            key: MatchKey {
                home: Some("Lens".to_string()),
                away: None,
            },
            quotes: vec![None, quote("RC Lens", "Monaco", (2.0, 3.0, 4.0))],
            margin: None,
        };

        let cells = row_cells(&table, &row);
        assert_eq!(cells[0], ("a_home".to_string(), None));
        assert_eq!(cells[1], ("a_away".to_string(), None));
        assert_eq!(cells[5], ("b_home".to_string(), Some("RC Lens".to_string())));
        assert_eq!(cells[6], ("b_away".to_string(), Some("Monaco".to_string())));
    }

    #[test]
    fn test_write_quotes_file() {
        let dir = temp_dir("quotes");
        let writer = QuoteTableWriter::new(OutputConfig {
            dir: dir.clone(),
            ..OutputConfig::default()
        });

        let path = writer.write_quotes(&report()).unwrap();
        assert_eq!(path, dir.join("all_quotes_20240309_183005.csv"));

        let text = fs::read_to_string(&path).unwrap();
        let parsed = csv::parse_rows(&text);
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0][0], "a_home");
        assert_eq!(parsed[1][5], "RC Lens");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_failures_header_once() {
        let dir = temp_dir("failures");
        let writer = QuoteTableWriter::new(OutputConfig {
            dir: dir.clone(),
            ..OutputConfig::default()
        });
        let failure = FailureRecord {
            competition: "ligue1".to_string(),
            site: "unibet".to_string(),
            timestamp: timestamp(),
        };

        writer.append_failures([&failure]).unwrap();
        let path = writer.append_failures([&failure]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "competition,website,date\n\
             ligue1,unibet,2024-03-09 18:30:05\n\
             ligue1,unibet,2024-03-09 18:30:05\n"
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_nothing_creates_header_only() {
        let dir = temp_dir("no-failures");
        let writer = QuoteTableWriter::new(OutputConfig {
            dir: dir.clone(),
            ..OutputConfig::default()
        });

        let path = writer.append_failures(std::iter::empty()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "competition,website,date\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
