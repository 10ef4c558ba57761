use log::{debug, info};
use std::collections::HashSet;

use crate::config::*;
use crate::opinion::{classify, MAJORITY_PCT};

/// Picks the theses of one election that make good quiz questions, using the default
/// thresholds and the given maximum number of questions.
pub fn select(theses: &[(Thesis, Vec<MergedPartyEntry>)], limit: usize) -> Vec<QuizQuestion> {
    let rules = QuizRules {
        question_limit: limit,
        ..QuizRules::DEFAULT_RULES
    };
    select_with_rules(theses, &rules)
}

/// Picks the theses of one election that make good quiz questions.
///
/// A thesis qualifies when both sides got more than `contested_minimum_pct` of the votes
/// and one side holds the majority as defined by [`classify`]. Qualifying theses are
/// ordered by id, duplicates are dropped, and at most `question_limit` are returned.
pub fn select_with_rules(
    theses: &[(Thesis, Vec<MergedPartyEntry>)],
    rules: &QuizRules,
) -> Vec<QuizQuestion> {
    let mut ordered: Vec<&(Thesis, Vec<MergedPartyEntry>)> = theses.iter().collect();
    ordered.sort_by(|a, b| a.0.id.cmp(&b.0.id));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<QuizQuestion> = Vec::new();
    for (thesis, entries) in ordered {
        if res.len() >= rules.question_limit {
            break;
        }
        if !seen.insert(thesis.id.as_str()) {
            debug!("select: skipping duplicate thesis {}", thesis.id);
            continue;
        }
        let opinion = classify(entries);
        if is_quiz_worthy(&opinion, rules) {
            res.push(QuizQuestion {
                thesis: thesis.clone(),
                entries: entries.clone(),
                opinion,
            });
        } else {
            debug!(
                "select: {} not decisive or not contested: {:?}",
                thesis.id, opinion
            );
        }
    }
    info!(
        "Selected {} quiz questions out of {} theses",
        res.len(),
        theses.len()
    );
    res
}

/// Both sides have real support and one of them holds the majority.
pub fn is_quiz_worthy(opinion: &ThesisOpinion, rules: &QuizRules) -> bool {
    let contested = opinion.ratio_pro > rules.contested_minimum_pct
        && opinion.ratio_contra > rules.contested_minimum_pct;
    let decisive = opinion.ratio_pro > MAJORITY_PCT || opinion.ratio_contra >= MAJORITY_PCT;
    contested && decisive
}
