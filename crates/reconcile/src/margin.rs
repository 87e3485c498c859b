//! Arbitrage margin.
//!
//! margin = 1/best(1) + 1/best(X) + 1/best(2), where best is the highest odds
//! offered by any site for that outcome. A margin below one means backing
//! every outcome at its best price returns more than the total stake.

use ordered_float::OrderedFloat;
use surebet_core::{Odds, Outcome, ReconciledQuoteTable, ReconciledRow, SiteName};

/// Highest present odds; `None` if no value is present.
pub fn best_odds<I>(odds: I) -> Option<Odds>
where
    I: IntoIterator<Item = Option<Odds>>,
{
    odds.into_iter()
        .flatten()
        .map(OrderedFloat)
        .max()
        .map(|o| o.into_inner())
}

/// Margin over three outcome groups. Undefined when a group has no value.
pub fn margin<A, B, C>(home_win: A, draw: B, away_win: C) -> Option<f64>
where
    A: IntoIterator<Item = Option<Odds>>,
    B: IntoIterator<Item = Option<Odds>>,
    C: IntoIterator<Item = Option<Odds>>,
{
    Some(1.0 / best_odds(home_win)? + 1.0 / best_odds(draw)? + 1.0 / best_odds(away_win)?)
}

/// Is the margin defined and below one?
#[inline]
pub fn is_arbitrage(margin: Option<f64>) -> bool {
    margin.is_some_and(|m| m < 1.0)
}

/// Margin of one reconciled row.
pub fn row_margin(row: &ReconciledRow) -> Option<f64> {
    margin(
        row.odds(Outcome::HomeWin),
        row.odds(Outcome::Draw),
        row.odds(Outcome::AwayWin),
    )
}

/// Fill the `margin` of every row.
pub fn apply_margins(table: &mut ReconciledQuoteTable) {
    for row in &mut table.rows {
        row.margin = row_margin(row);
    }
}

/// Best price for one outcome and the site offering it.
#[derive(Debug, Clone, PartialEq)]
pub struct BestQuote {
    /// Outcome priced.
    pub outcome: Outcome,
    /// Site offering the price.
    pub site: SiteName,
    /// Highest odds for the outcome.
    pub odds: Odds,
}

/// Best quote per outcome for a row; earlier sites win ties.
pub fn best_quotes(table: &ReconciledQuoteTable, row: &ReconciledRow) -> Vec<BestQuote> {
    Outcome::ALL
        .iter()
        .filter_map(|&outcome| {
            let mut best: Option<(usize, Odds)> = None;
            for (idx, odds) in row.odds(outcome).enumerate() {
                if let Some(odds) = odds {
                    if best.map_or(true, |(_, b)| odds > b) {
                        best = Some((idx, odds));
                    }
                }
            }
            best.map(|(idx, odds)| BestQuote {
                outcome,
                site: table.sites[idx].clone(),
                odds,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use surebet_core::{MatchKey, OddsTriple, SiteQuote};

    fn quote(odds: (f64, f64, f64)) -> Option<SiteQuote> {
        Some(SiteQuote {
            home: "Lens".to_string(),
            away: "Lille".to_string(),
            odds: OddsTriple::new(odds.0, odds.1, odds.2),
        })
    }

    fn table(quotes: Vec<Option<SiteQuote>>) -> ReconciledQuoteTable {
        ReconciledQuoteTable {
            reference_site: "a".to_string(),
            sites: vec!["a".to_string(), "b".to_string()],
            rows: vec![ReconciledRow {
                key: MatchKey::resolved("Lens", "Lille"),
                quotes,
                margin: None,
            }],
        }
    }

    #[test]
    fn test_best_odds_ignores_missing() {
        assert_eq!(best_odds([Some(2.0), None, Some(2.1)]), Some(2.1));
        assert_eq!(best_odds([None, None]), None);
        assert_eq!(best_odds(Vec::new()), None);
    }

    #[test]
    fn test_margin_no_arbitrage() {
        let m = margin(
            [Some(2.0), Some(2.1)],
            [Some(3.0), Some(3.2)],
            [Some(4.0), Some(3.9)],
        )
        .unwrap();
        assert_abs_diff_eq!(m, 1.0 / 2.1 + 1.0 / 3.2 + 1.0 / 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m, 1.0387, epsilon = 1e-4);
        assert!(!is_arbitrage(Some(m)));
    }

    #[test]
    fn test_margin_arbitrage() {
        let m = margin([Some(2.5), Some(2.2)], [Some(4.0)], [None, Some(3.5)]).unwrap();
        assert_abs_diff_eq!(m, 0.9357, epsilon = 1e-4);
        assert!(is_arbitrage(Some(m)));
    }

    #[test]
    fn test_missing_group_undefined() {
        assert_eq!(margin([Some(2.0)], [None, None], [Some(4.0)]), None);
        assert!(!is_arbitrage(None));
    }

    #[test]
    fn test_apply_margins() {
        let mut t = table(vec![quote((2.0, 3.0, 4.0)), quote((2.1, 3.2, 3.9))]);
        apply_margins(&mut t);
        assert_abs_diff_eq!(t.rows[0].margin.unwrap(), 1.0387, epsilon = 1e-4);

        let mut missing = table(vec![None, None]);
        apply_margins(&mut missing);
        assert_eq!(missing.rows[0].margin, None);
    }

    #[test]
    fn test_best_quotes() {
        let t = table(vec![quote((2.0, 3.2, 4.0)), quote((2.1, 3.2, 3.9))]);
        let best = best_quotes(&t, &t.rows[0]);
        assert_eq!(best.len(), 3);
        assert_eq!(best[0].site, "b");
        assert_eq!(best[1].site, "a");
        assert_eq!(best[2].site, "a");
        assert_abs_diff_eq!(best[2].odds, 4.0);
    }
}
