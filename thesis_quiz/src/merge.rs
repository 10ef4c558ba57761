use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::*;
use crate::table::PartyResultTable;

/// Attaches to every result row the position that applies to it.
///
/// The position of the party itself is used first, then the position of its linked
/// party. Rows without either get `ResolvedStance::Missing`. Several rows linked to the
/// same party all receive that party's position with their own vote share, so that the
/// bloc counts with its full combined share.
///
/// The output has exactly one entry per result row, in the same order.
pub fn merge(positions: &[PositionRecord], results: &[PartyResult]) -> Vec<MergedPartyEntry> {
    let mut by_party: HashMap<&str, &PositionRecord> = HashMap::new();
    for p in positions.iter() {
        by_party.entry(p.party.as_str()).or_insert(p);
    }

    results
        .iter()
        .map(|r| {
            let found = by_party.get(r.party.as_str()).or_else(|| {
                r.linked_party
                    .as_deref()
                    .and_then(|linked| by_party.get(linked))
            });
            match found {
                Some(p) => MergedPartyEntry {
                    result: r.clone(),
                    value: ResolvedStance::Stated(p.value),
                    text: p.text.clone().unwrap_or_default(),
                },
                None => {
                    debug!("merge: no position for {}", r.party);
                    MergedPartyEntry {
                        result: r.clone(),
                        value: ResolvedStance::Missing,
                        text: String::new(),
                    }
                }
            }
        })
        .collect()
}

/// Merges every thesis of an election against its results.
pub fn merge_theses(
    theses: &[Thesis],
    results: &PartyResultTable,
) -> Vec<(Thesis, Vec<MergedPartyEntry>)> {
    theses
        .iter()
        .map(|t| (t.clone(), merge(&t.positions, results.rows())))
        .collect()
}

/// Merged entries split by position, as listed under a thesis.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct PositionGroups {
    pub pro: Vec<MergedPartyEntry>,
    pub neutral: Vec<MergedPartyEntry>,
    pub contra: Vec<MergedPartyEntry>,
    pub missing: Vec<MergedPartyEntry>,
}

/// Groups entries by position. Inside a group, parties with more votes come first,
/// parties without a vote count come last, and equal counts are ordered by name.
pub fn group_positions(entries: &[MergedPartyEntry]) -> PositionGroups {
    let mut groups = PositionGroups::default();
    for e in entries.iter() {
        let group = match e.value {
            ResolvedStance::Stated(Stance::Pro) => &mut groups.pro,
            ResolvedStance::Stated(Stance::Neutral) => &mut groups.neutral,
            ResolvedStance::Stated(Stance::Contra) => &mut groups.contra,
            ResolvedStance::Missing => &mut groups.missing,
        };
        group.push(e.clone());
    }
    for group in [
        &mut groups.pro,
        &mut groups.neutral,
        &mut groups.contra,
        &mut groups.missing,
    ] {
        group.sort_by(compare_for_display);
    }
    groups
}

fn compare_for_display(a: &MergedPartyEntry, b: &MergedPartyEntry) -> Ordering {
    match (a.result.vote_count, b.result.vote_count) {
        (Some(x), Some(y)) if x != y => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => a.party().cmp(b.party()),
    }
}
