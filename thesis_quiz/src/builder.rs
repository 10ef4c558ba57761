pub use crate::config::*;
use crate::table::PartyResultTable;

/// A builder for the results of an election.
///
/// Rows are only checked when the table is built: the unusable ones are returned
/// next to the table instead of failing the whole election.
///
/// ```
/// use thesis_quiz::builder::Builder;
/// use thesis_quiz::{classify, merge, PositionRecord, Stance};
///
/// let mut builder = Builder::new().parties(&[("SPD", 20.5), ("GRÜNE", 14.8)]);
/// builder.add_result("CDU", 26.8, Some(12_447_656), Some("CDU/CSU"));
/// builder.add_result("CSU", 6.2, Some(2_869_688), Some("CDU/CSU"));
/// builder.add_result_simple("", 1.0);
///
/// let (table, rejected) = builder.build();
/// assert_eq!(table.len(), 4);
/// assert_eq!(rejected.len(), 1);
///
/// let positions = vec![PositionRecord {
///     party: "CDU/CSU".to_string(),
///     value: Stance::Pro,
///     text: None,
/// }];
/// let opinion = classify(&merge(&positions, table.rows()));
/// assert!((opinion.ratio_pro - 33.0).abs() < 1e-9);
/// assert_eq!(opinion.verdict, Stance::Neutral);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _rows: Vec<PartyResult>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { _rows: Vec::new() }
    }

    /// Adds one row per party with only a vote share.
    pub fn parties(self, shares: &[(&str, f64)]) -> Builder {
        let mut rows = self._rows;
        rows.extend(shares.iter().map(|(party, pct)| PartyResult::new(party, *pct)));
        Builder { _rows: rows }
    }

    pub fn add_result_simple(&mut self, party: &str, vote_pct: f64) {
        self.add_result(party, vote_pct, None, None)
    }

    /// Adds a row.
    ///
    /// linked_party: the party whose position applies when this one has none. Empty
    /// names are treated as no link.
    pub fn add_result(
        &mut self,
        party: &str,
        vote_pct: f64,
        vote_count: Option<u64>,
        linked_party: Option<&str>,
    ) {
        self.add_result_2(&PartyResult {
            party: party.to_string(),
            vote_pct,
            vote_count,
            linked_party: linked_party
                .filter(|l| !l.is_empty())
                .map(|l| l.to_string()),
        })
    }

    pub fn add_result_2(&mut self, result: &PartyResult) {
        self._rows.push(result.clone());
    }

    pub fn len(&self) -> usize {
        self._rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self._rows.is_empty()
    }

    pub fn build(self) -> (PartyResultTable, Vec<QuizError>) {
        PartyResultTable::from_rows(self._rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_link_is_no_link() {
        let mut b = Builder::new();
        b.add_result("A", 10.0, None, Some(""));
        let (table, errors) = b.build();
        assert!(errors.is_empty());
        assert_eq!(table.rows()[0].linked_party, None);
    }

    #[test]
    fn keeps_insertion_order() {
        let mut b = Builder::new().parties(&[("B", 10.0), ("A", 20.0)]);
        b.add_result_simple("C", 5.0);
        assert_eq!(b.len(), 3);
        let (table, _) = b.build();
        let parties: Vec<&str> = table.rows().iter().map(|r| r.party.as_str()).collect();
        assert_eq!(parties, vec!["B", "A", "C"]);
    }
}
