//! Cross-site reconciliation for the surebet pipeline.
//!
//! This crate handles:
//! - Team-name correspondence (site spelling to canonical spelling)
//! - Outer join of per-site tables on the canonical match identity
//! - Arbitrage margin over the best odds of every site

pub mod margin;
pub mod reconciler;
pub mod team_keys;

pub use margin::{best_odds, best_quotes, is_arbitrage, margin, BestQuote};
pub use reconciler::{JoinReport, JoinStats, QuoteReconciler};
pub use team_keys::{TeamKeyResolver, TeamKeyTable};
