use crate::metawahl::*;

use serde_json::{json, Value as JSValue};
use text_diff::print_diff;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn entries_to_json(entries: &[MergedPartyEntry]) -> Vec<JSValue> {
    entries
        .iter()
        .map(|e| {
            let mut js = json!({
                "party": e.party(),
                "pct": round2(e.vote_pct()),
            });
            if let Some(votes) = e.result.vote_count {
                js["votes"] = json!(votes);
            }
            if let Some(linked) = &e.result.linked_party {
                js["linkedPosition"] = json!(linked);
            }
            if !e.text.is_empty() {
                js["text"] = json!(e.text);
            }
            js
        })
        .collect()
}

fn thesis_to_json(thesis: &Thesis, entries: &[MergedPartyEntry]) -> JSValue {
    let opinion = classify(entries);
    let groups = group_positions(entries);
    let mut js = json!({
        "id": thesis.id,
        "text": thesis.text,
        "ratioPro": round2(opinion.ratio_pro),
        "ratioContra": round2(opinion.ratio_contra),
        "verdict": opinion.verdict.label(),
        "positions": {
            "pro": entries_to_json(&groups.pro),
            "neutral": entries_to_json(&groups.neutral),
            "contra": entries_to_json(&groups.contra),
            "missing": entries_to_json(&groups.missing),
        },
    });
    if let Some(title) = &thesis.title {
        js["title"] = json!(title);
    }
    js
}

/// The JSON summary of an election: every thesis with its majority opinion, and the
/// theses a quiz would ask.
pub fn build_summary_js(snapshot: &ElectionSnapshot, rules: &QuizRules) -> JSValue {
    let merged = merge_theses(&snapshot.theses, &snapshot.results);
    let theses_js: Vec<JSValue> = merged
        .iter()
        .map(|(thesis, entries)| thesis_to_json(thesis, entries))
        .collect();
    let quiz_ids: Vec<String> = select_with_rules(&merged, rules)
        .into_iter()
        .map(|q| q.thesis.id)
        .collect();
    let info = &snapshot.info;
    json!({
        "election": {
            "id": info.id,
            "title": info.title,
            "territory": info.territory,
            "date": info.date,
            "preliminary": info.preliminary,
            "totalPct": round2(snapshot.results.total_pct()),
        },
        "theses": theses_js,
        "quiz": quiz_ids,
    })
}

pub fn read_summary(path: &str) -> AppResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: {} bytes from {}", contents.len(), path);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Fails when the reference summary stored at `path` differs from the computed one.
pub fn check_reference(path: &str, pretty_js_summary: &str) -> AppResult<()> {
    let summary_ref = read_summary(path)?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_summary, "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    info!("The summary matches {}", path);
    Ok(())
}
