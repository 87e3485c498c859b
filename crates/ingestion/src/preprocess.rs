//! Site-specific row rewrites applied before column selection.

use surebet_core::PreprocessRule;

/// A row cell; `None` marks a field the page did not provide.
pub type Cell = Option<String>;

/// Lift raw tokens into cells.
pub fn to_cells(row: &[String]) -> Vec<Cell> {
    row.iter().cloned().map(Some).collect()
}

/// Apply one rule to a row.
pub fn apply_rule(rule: &PreprocessRule, mut row: Vec<Cell>) -> Vec<Cell> {
    match rule {
        PreprocessRule::DropToken { token } => {
            row.retain(|cell| cell.as_deref() != Some(token.as_str()));
            row
        }
        PreprocessRule::PadShortRow { len, filler } => {
            if row.len() == *len {
                row.insert(0, Some(filler.clone()));
            }
            row
        }
        PreprocessRule::SplitTeams { index, delimiter } => {
            let Some(Some(token)) = row.get(*index).cloned() else {
                return row;
            };
            let (first, second) = match token.split_once(delimiter.as_str()) {
                Some((home, away)) => (Some(home.to_string()), Some(away.to_string())),
                None => (Some(token), None),
            };
            row[*index] = first;
            row.insert(*index + 1, second);
            row
        }
    }
}

/// Apply rules in order.
pub fn apply_rules(rules: &[PreprocessRule], row: &[String]) -> Vec<Cell> {
    rules
        .iter()
        .fold(to_cells(row), |cells, rule| apply_rule(rule, cells))
}
