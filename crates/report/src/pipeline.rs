//! End-to-end run: standardize, record failures, reconcile.
//!
//! Competitions are processed one after the other. A site failing to deliver
//! data never aborts the run; only invariant violations do.

use chrono::NaiveDateTime;
use std::path::Path;
use surebet_core::{
    Config, FailureRecord, RawQuotes, ReconciledQuoteTable, Result, ScrapeSnapshot, SiteName,
};
use surebet_ingestion::{Anomaly, QuoteStandardizer, StandardizeStats};
use surebet_reconcile::{JoinReport, QuoteReconciler, TeamKeyTable};
use tracing::{info, warn};

/// Outcome of one competition.
#[derive(Debug, Clone)]
pub struct CompetitionRun {
    /// Competition name, as keyed in the snapshot.
    pub competition: String,
    /// Reconciled quotes with margins.
    pub table: ReconciledQuoteTable,
    /// Soft failures recorded while standardizing.
    pub anomalies: Vec<Anomaly>,
    /// Sites that returned zero rows.
    pub failures: Vec<FailureRecord>,
    /// Row counts from standardization.
    pub stats: StandardizeStats,
    /// Join counts per site.
    pub joins: JoinReport,
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Extraction time stamped on every output row.
    pub timestamp: NaiveDateTime,
    /// Competitions in snapshot order.
    pub competitions: Vec<CompetitionRun>,
}

impl RunReport {
    /// Failure records of every competition.
    pub fn failures(&self) -> impl Iterator<Item = &FailureRecord> {
        self.competitions.iter().flat_map(|c| c.failures.iter())
    }

    /// Anomalies of every competition, with the competition name.
    pub fn anomalies(&self) -> impl Iterator<Item = (&str, &Anomaly)> {
        self.competitions
            .iter()
            .flat_map(|c| c.anomalies.iter().map(move |a| (c.competition.as_str(), a)))
    }
}

/// Read the scrape snapshot written by the scraping collaborator.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<ScrapeSnapshot> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// The reconciliation pipeline for one configuration and key table.
pub struct Pipeline {
    config: Config,
    standardizer: QuoteStandardizer,
    reconciler: QuoteReconciler,
}

impl Pipeline {
    /// Create a pipeline. The configuration is validated first.
    pub fn new(config: Config, keys: &TeamKeyTable) -> Result<Self> {
        config.validate()?;
        for site in config.site_names() {
            if !keys.sites().contains(&site) {
                warn!(site = %site, "site has no column in the team key table");
            }
        }

        Ok(Self {
            standardizer: QuoteStandardizer::from_config(&config),
            reconciler: QuoteReconciler::new(keys, &config.reference_site),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one competition.
    pub fn run_competition(
        &self,
        competition: &str,
        raw: &RawQuotes,
        timestamp: NaiveDateTime,
    ) -> Result<CompetitionRun> {
        info!(competition, sites = raw.len(), "processing competition");

        let standardized = self.standardizer.standardize(raw);

        let failures = standardized
            .no_data_sites()
            .map(|site| FailureRecord {
                competition: competition.to_string(),
                site: site.to_string(),
                timestamp,
            })
            .collect();

        // configured sites present in the input, in configuration order
        let attempted: Vec<SiteName> = self
            .config
            .site_names()
            .into_iter()
            .filter(|site| raw.contains_key(site))
            .collect();

        let (table, joins) = self
            .reconciler
            .reconcile_with_stats(&attempted, &standardized.tables)?;
        info!(competition, matches = table.len(), "competition reconciled");

        Ok(CompetitionRun {
            competition: competition.to_string(),
            table,
            anomalies: standardized.anomalies,
            failures,
            stats: standardized.stats,
            joins,
        })
    }

    /// Run every competition of a snapshot, or only those listed in `only`.
    pub fn run(
        &self,
        snapshot: &ScrapeSnapshot,
        only: Option<&[String]>,
        timestamp: NaiveDateTime,
    ) -> Result<RunReport> {
        if let Some(only) = only {
            for name in only {
                if !snapshot.contains_key(name) {
                    warn!(competition = %name, "competition not present in the snapshot");
                }
            }
        }

        let mut competitions = Vec::new();
        for (competition, raw) in snapshot {
            if only.is_some_and(|names| !names.contains(competition)) {
                continue;
            }
            competitions.push(self.run_competition(competition, raw, timestamp)?);
        }

        Ok(RunReport {
            timestamp,
            competitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use surebet_core::{ColumnLocator, OutputConfig, SiteConfig};

    const KEYS: &str = "\
ladbrokes,betfirst
Lens,RC Lens
Lille,LOSC
";

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap()
    }

    fn config() -> Config {
        Config {
            reference_site: "ladbrokes".to_string(),
            sites: vec![
                SiteConfig::new("ladbrokes", ColumnLocator::new(2, 3, 4, 5, 6)),
                SiteConfig::new("betfirst", ColumnLocator::new(0, 1, 2, 3, 4)),
                SiteConfig::new("unibet", ColumnLocator::new(0, 1, 2, 3, 4)),
            ],
            output: OutputConfig::default(),
        }
    }

    fn row(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(config(), &TeamKeyTable::from_csv_str(KEYS).unwrap()).unwrap()
    }

    fn ligue1() -> RawQuotes {
        let mut raw = RawQuotes::new();
        raw.insert(
            "ladbrokes".to_string(),
            vec![row(&[
                "Sam 9", "20:45", "Lens - Lille", "2.00", "3.00", "4.00", "+5", "", "", "", "", "",
            ])],
        );
        raw.insert(
            "betfirst".to_string(),
            vec![row(&["RC Lens", "LOSC", "2,10", "3,20", "3,90"])],
        );
        raw.insert("unibet".to_string(), Vec::new());
        raw
    }

    #[test]
    fn test_run_competition() {
        let run = pipeline()
            .run_competition("ligue1", &ligue1(), timestamp())
            .unwrap();

        assert_eq!(run.table.len(), 1);
        assert_eq!(run.table.sites, vec!["ladbrokes", "betfirst", "unibet"]);
        assert_eq!(run.table.rows[0].site_count(), 2);
        assert!(run.table.rows[0].margin.unwrap() > 1.0);

        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].site, "unibet");
        assert_eq!(run.failures[0].competition, "ligue1");

        assert_eq!(run.joins["ladbrokes"].appended, 1);
        assert_eq!(run.joins["betfirst"].matched, 1);
        assert!(!run.joins.contains_key("unibet"));
    }

    #[test]
    fn test_absent_site_not_attempted() {
        let mut raw = ligue1();
        raw.remove("unibet");

        let run = pipeline().run_competition("ligue1", &raw, timestamp()).unwrap();
        assert_eq!(run.table.sites, vec!["ladbrokes", "betfirst"]);
        assert!(run.failures.is_empty());
    }

    #[test]
    fn test_run_filters_competitions() {
        let mut snapshot = ScrapeSnapshot::new();
        snapshot.insert("ligue1".to_string(), ligue1());
        snapshot.insert("ligue2".to_string(), RawQuotes::new());

        let only = vec!["ligue1".to_string()];
        let report = pipeline().run(&snapshot, Some(&only), timestamp()).unwrap();
        assert_eq!(report.competitions.len(), 1);
        assert_eq!(report.failures().count(), 1);

        let all = pipeline().run(&snapshot, None, timestamp()).unwrap();
        assert_eq!(all.competitions.len(), 2);
        assert!(all.competitions[1].table.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = config();
        cfg.reference_site = "bwin".to_string();
        assert!(Pipeline::new(cfg, &TeamKeyTable::default()).is_err());
    }
}
