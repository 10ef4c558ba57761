use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// The validated results of one election, one row per party as reported.
///
/// Rows keep the order in which they were given.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PartyResultTable {
    rows: Vec<PartyResult>,
}

impl PartyResultTable {
    /// Validates the rows and keeps the usable ones.
    ///
    /// A row is rejected when its party is empty, when its vote share is not a number
    /// between 0 and 100, when the party was already seen, or when following its links
    /// leads back to a party already visited. Rejected rows are returned as errors next
    /// to the table, the other rows are kept.
    pub fn from_rows(rows: Vec<PartyResult>) -> (PartyResultTable, Vec<QuizError>) {
        let mut errors: Vec<QuizError> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<PartyResult> = Vec::new();

        for mut row in rows {
            if row.party.trim().is_empty() {
                errors.push(QuizError::MalformedInput(
                    "result row without a party".to_string(),
                ));
                continue;
            }
            if !row.vote_pct.is_finite() || row.vote_pct < 0.0 || row.vote_pct > 100.0 {
                errors.push(QuizError::MalformedInput(format!(
                    "result for {} has an invalid vote share {}",
                    row.party, row.vote_pct
                )));
                continue;
            }
            if !seen.insert(row.party.clone()) {
                errors.push(QuizError::MalformedInput(format!(
                    "duplicate result for {}",
                    row.party
                )));
                continue;
            }
            if row.linked_party.as_deref() == Some(row.party.as_str()) {
                debug!("from_rows: dropping self link of {}", row.party);
                row.linked_party = None;
            }
            accepted.push(row);
        }

        let links: HashMap<String, String> = accepted
            .iter()
            .filter_map(|r| r.linked_party.clone().map(|l| (r.party.clone(), l)))
            .collect();

        let mut rows: Vec<PartyResult> = Vec::new();
        for row in accepted {
            if has_link_cycle(&row.party, &links) {
                errors.push(QuizError::MalformedInput(format!(
                    "linked parties of {} form a cycle",
                    row.party
                )));
            } else {
                rows.push(row);
            }
        }

        for e in errors.iter() {
            warn!("PartyResultTable: rejected row: {}", e);
        }
        (PartyResultTable { rows }, errors)
    }

    pub fn rows(&self) -> &[PartyResult] {
        &self.rows
    }

    pub fn get(&self, party: &str) -> Option<&PartyResult> {
        self.rows.iter().find(|r| r.party == party)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the vote shares of all rows.
    pub fn total_pct(&self) -> f64 {
        self.rows.iter().map(|r| r.vote_pct).sum()
    }
}

fn has_link_cycle(start: &str, links: &HashMap<String, String>) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut cur = start;
    visited.insert(cur);
    while let Some(next) = links.get(cur) {
        if !visited.insert(next.as_str()) {
            return true;
        }
        cur = next.as_str();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linked(party: &str, pct: f64, link: &str) -> PartyResult {
        PartyResult {
            linked_party: Some(link.to_string()),
            ..PartyResult::new(party, pct)
        }
    }

    #[test]
    fn keeps_valid_rows_in_order() {
        let (table, errors) = PartyResultTable::from_rows(vec![
            PartyResult::new("SPD", 25.5),
            linked("CDU/CSU", 33.0, "CDU"),
            PartyResult::new("GRÜNE", 8.9),
        ]);
        assert!(errors.is_empty());
        let parties: Vec<&str> = table.rows().iter().map(|r| r.party.as_str()).collect();
        assert_eq!(parties, vec!["SPD", "CDU/CSU", "GRÜNE"]);
        assert!((table.total_pct() - 67.4).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_rows_only() {
        let (table, errors) = PartyResultTable::from_rows(vec![
            PartyResult::new("A", 40.0),
            PartyResult::new("", 10.0),
            PartyResult::new("B", f64::NAN),
            PartyResult::new("C", 120.0),
            PartyResult::new("A", 5.0),
            PartyResult::new("D", 20.0),
        ]);
        assert_eq!(errors.len(), 4);
        assert!(errors
            .iter()
            .all(|e| matches!(e, QuizError::MalformedInput(_))));
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("A").map(|r| r.vote_pct), Some(40.0));
        assert!(table.get("D").is_some());
    }

    #[test]
    fn rejects_link_cycles() {
        let (table, errors) = PartyResultTable::from_rows(vec![
            linked("A", 10.0, "B"),
            linked("B", 10.0, "A"),
            linked("C", 10.0, "A"),
            linked("D", 10.0, "X"),
        ]);
        // C reaches the cycle but does not close it itself; it is rejected as well
        // because its chain never terminates.
        assert_eq!(errors.len(), 3);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].party, "D");
    }

    #[test]
    fn self_links_are_dropped() {
        let (table, errors) = PartyResultTable::from_rows(vec![linked("A", 10.0, "A")]);
        assert!(errors.is_empty());
        assert_eq!(table.rows()[0].linked_party, None);
    }

    #[test]
    fn several_rows_may_share_a_link() {
        let (table, errors) = PartyResultTable::from_rows(vec![
            linked("CDU", 27.0, "CDU/CSU"),
            linked("CSU", 6.0, "CDU/CSU"),
        ]);
        assert!(errors.is_empty());
        assert_eq!(table.len(), 2);
    }
}
