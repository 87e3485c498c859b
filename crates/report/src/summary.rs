//! Run summary.
//!
//! Aggregates a run report into headline numbers for the log.

use crate::pipeline::RunReport;
use std::collections::BTreeMap;
use surebet_core::SiteName;
use surebet_reconcile::{best_quotes, BestQuote, JoinStats};

/// Headline numbers of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Competitions processed.
    pub competitions: usize,
    /// Reconciled matches.
    pub matches: usize,
    /// Matches quoted by at least two sites.
    pub multi_site_matches: usize,
    /// Matches with a defined margin.
    pub priced_matches: usize,
    /// Matches with a margin below one.
    pub arbitrage_opportunities: usize,
    /// Lowest defined margin.
    pub best_margin: Option<f64>,
    /// Matches quoted per site.
    pub site_coverage: BTreeMap<SiteName, usize>,
    /// Sites that returned no data.
    pub failures: usize,
    /// Soft failures of any kind.
    pub anomalies: usize,
    /// Join counts summed over every site and competition.
    pub joins: JoinStats,
}

/// A match with a margin below one.
#[derive(Debug, Clone)]
pub struct Opportunity {
    /// Competition of the match.
    pub competition: String,
    /// Canonical home team, if resolved.
    pub home: Option<String>,
    /// Canonical away team, if resolved.
    pub away: Option<String>,
    /// Margin over the best odds.
    pub margin: f64,
    /// Site to back for each outcome.
    pub legs: Vec<BestQuote>,
}

impl RunSummary {
    /// Summarize a run report.
    pub fn calculate(report: &RunReport) -> Self {
        let mut summary = RunSummary {
            competitions: report.competitions.len(),
            failures: report.failures().count(),
            anomalies: report.anomalies().count(),
            ..Default::default()
        };

        for run in &report.competitions {
            for stats in run.joins.values() {
                summary.joins.merge(stats);
            }
            for site in &run.table.sites {
                summary.site_coverage.entry(site.clone()).or_insert(0);
            }

            for row in &run.table.rows {
                summary.matches += 1;
                if row.site_count() >= 2 {
                    summary.multi_site_matches += 1;
                }
                for (idx, quote) in row.quotes.iter().enumerate() {
                    if quote.is_some() {
                        *summary
                            .site_coverage
                            .entry(run.table.sites[idx].clone())
                            .or_insert(0) += 1;
                    }
                }

                let Some(margin) = row.margin else {
                    continue;
                };
                summary.priced_matches += 1;
                if row.is_arbitrage() {
                    summary.arbitrage_opportunities += 1;
                }
                summary.best_margin = Some(summary.best_margin.map_or(margin, |b| b.min(margin)));
            }
        }

        summary
    }

    /// Fraction of matches quoted by at least two sites.
    pub fn overlap_rate(&self) -> f64 {
        if self.matches > 0 {
            self.multi_site_matches as f64 / self.matches as f64
        } else {
            0.0
        }
    }
}

/// Every arbitrage opportunity of a run, lowest margin first.
pub fn opportunities(report: &RunReport) -> Vec<Opportunity> {
    let mut out: Vec<Opportunity> = report
        .competitions
        .iter()
        .flat_map(|run| {
            run.table.rows.iter().filter(|r| r.is_arbitrage()).filter_map(move |row| {
                Some(Opportunity {
                    competition: run.competition.clone(),
                    home: row.key.home.clone(),
                    away: row.key.away.clone(),
                    margin: row.margin?,
                    legs: best_quotes(&run.table, row),
                })
            })
        })
        .collect();

    out.sort_by(|a, b| a.margin.total_cmp(&b.margin));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CompetitionRun;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use surebet_core::{MatchKey, OddsTriple, ReconciledQuoteTable, ReconciledRow, SiteQuote};
    use surebet_ingestion::StandardizeStats;
    use surebet_reconcile::JoinReport;

    fn quote(odds: (f64, f64, f64)) -> Option<SiteQuote> {
        Some(SiteQuote {
            home: "h".to_string(),
            away: "a".to_string(),
            odds: OddsTriple::new(odds.0, odds.1, odds.2),
        })
    }

    fn row(home: &str, quotes: Vec<Option<SiteQuote>>, margin: Option<f64>) -> ReconciledRow {
        ReconciledRow {
            key: MatchKey::resolved(home, "x"),
            quotes,
            margin,
        }
    }

    fn report() -> RunReport {
        RunReport {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            competitions: vec![CompetitionRun {
                competition: "ligue1".to_string(),
                table: ReconciledQuoteTable {
                    reference_site: "a".to_string(),
                    sites: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    rows: vec![
                        row("Lens", vec![quote((2.0, 3.0, 4.0)), quote((2.1, 3.2, 3.9)), None], Some(1.0387)),
                        row("Nice", vec![quote((2.5, 3.0, 3.0)), quote((2.0, 4.0, 3.5)), None], Some(0.9357)),
                        row("Metz", vec![None, quote((2.5, 3.5, 2.9)), None], Some(0.9)),
                        row("Caen", vec![None, None, None], None),
                    ],
                },
                anomalies: Vec::new(),
                failures: Vec::new(),
                stats: StandardizeStats::default(),
            joins: JoinReport::new(),
            }],
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary::calculate(&report());
        assert_eq!(summary.competitions, 1);
        assert_eq!(summary.matches, 4);
        assert_eq!(summary.multi_site_matches, 2);
        assert_eq!(summary.priced_matches, 3);
        assert_eq!(summary.arbitrage_opportunities, 2);
        assert_abs_diff_eq!(summary.best_margin.unwrap(), 0.9);
        assert_eq!(summary.site_coverage["a"], 2);
        assert_eq!(summary.site_coverage["b"], 3);
        assert_eq!(summary.site_coverage["c"], 0);
        assert_abs_diff_eq!(summary.overlap_rate(), 0.5);
    }

    #[test]
    fn test_join_counts_summed() {
        let mut report = report();
        let mut second = report.competitions[0].clone();
        second.competition = "ligue2".to_string();
        report.competitions.push(second);
        for run in &mut report.competitions {
            run.joins.insert(
                "b".to_string(),
                JoinStats {
                    matched: 2,
                    appended: 1,
                    unresolved: 1,
                    duplicates: 1,
                },
            );
        }

        let summary = RunSummary::calculate(&report);
        assert_eq!(summary.competitions, 2);
        assert_eq!(summary.joins.matched, 4);
        assert_eq!(summary.joins.unresolved, 2);
        assert_eq!(summary.joins.duplicates, 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::default();
        assert_eq!(summary.overlap_rate(), 0.0);
        assert_eq!(summary.best_margin, None);
    }

    #[test]
    fn test_opportunities_sorted() {
        let found = opportunities(&report());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].home.as_deref(), Some("Metz"));
        assert_eq!(found[1].home.as_deref(), Some("Nice"));

        let legs = &found[1].legs;
        assert_eq!(legs[0].site, "a");
        assert_eq!(legs[1].site, "b");
        assert_eq!(legs[2].site, "b");
    }
}
