// Payloads of the read API.

use crate::metawahl::*;

use serde::Deserialize;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;
use thesis_quiz::builder::Builder;

#[derive(Debug, Deserialize)]
struct ElectionResponse {
    error: Option<String>,
    data: Option<JSValue>,
    #[serde(default)]
    theses: Vec<JSValue>,
}

#[derive(Debug, Deserialize)]
struct ElectionData {
    id: u32,
    title: String,
    territory: String,
    date: Option<String>,
    #[serde(default)]
    preliminary: bool,
    #[serde(default)]
    results: BTreeMap<String, JSValue>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    pct: f64,
    votes: Option<u64>,
    linked_position: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThesis {
    id: String,
    text: Option<String>,
    title: Option<String>,
    #[serde(default)]
    positions: Vec<JSValue>,
}

#[derive(Debug, Deserialize)]
struct RawPosition {
    party: String,
    value: i64,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TallyResponse {
    error: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, JSValue>,
}

/// Parses the body of `GET /elections/{id}`.
///
/// Unusable rows are dropped and returned next to the snapshot. Only a missing
/// election or an error body fail the whole payload.
pub fn parse_election(contents: &str) -> AppResult<(ElectionSnapshot, Vec<QuizError>)> {
    let response: ElectionResponse =
        serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    if let Some(message) = response.error {
        return ApiSnafu { message }.fail();
    }
    let data_js = response.data.context(MissingFieldSnafu { field: "data" })?;
    let data: ElectionData = serde_json::from_value(data_js).context(ParsingJsonSnafu {})?;

    let mut rejected: Vec<QuizError> = Vec::new();

    let mut builder = Builder::new();
    for (party, result_js) in data.results.into_iter() {
        match serde_json::from_value::<RawResult>(result_js) {
            Ok(r) => builder.add_result(&party, r.pct, r.votes, r.linked_position.as_deref()),
            Err(e) => {
                warn!("parse_election: skipping result of {:?}: {}", party, e);
                rejected.push(QuizError::MalformedInput(format!(
                    "result of {:?}: {}",
                    party, e
                )));
            }
        }
    }
    let (results, table_errors) = builder.build();
    rejected.extend(table_errors);

    let mut theses: Vec<Thesis> = Vec::new();
    for thesis_js in response.theses.into_iter() {
        match parse_thesis(thesis_js) {
            Ok((thesis, errs)) => {
                theses.push(thesis);
                rejected.extend(errs);
            }
            Err(e) => {
                warn!("parse_election: skipping thesis: {}", e);
                rejected.push(e);
            }
        }
    }

    let snapshot = ElectionSnapshot {
        info: ElectionInfo {
            id: data.id,
            title: data.title,
            territory: data.territory,
            date: data.date,
            preliminary: data.preliminary,
        },
        results,
        theses,
    };
    debug!(
        "parse_election: election {} with {} results and {} theses, {} rows rejected",
        snapshot.info.id,
        snapshot.results.len(),
        snapshot.theses.len(),
        rejected.len()
    );
    Ok((snapshot, rejected))
}

fn parse_thesis(thesis_js: JSValue) -> Result<(Thesis, Vec<QuizError>), QuizError> {
    let raw: RawThesis = serde_json::from_value(thesis_js)
        .map_err(|e| QuizError::MalformedInput(format!("thesis: {}", e)))?;
    let mut rejected = Vec::new();
    let mut positions = Vec::new();
    for position_js in raw.positions.into_iter() {
        let parsed = serde_json::from_value::<RawPosition>(position_js)
            .map_err(|e| e.to_string())
            .and_then(|p| match Stance::from_code(p.value) {
                Some(value) => Ok(PositionRecord {
                    party: p.party,
                    value,
                    text: p.text,
                }),
                None => Err(format!("position value {} of {}", p.value, p.party)),
            });
        match parsed {
            Ok(p) => positions.push(p),
            Err(msg) => {
                warn!("parse_thesis: {}: skipping position: {}", raw.id, msg);
                rejected.push(QuizError::MalformedInput(format!("{}: {}", raw.id, msg)));
            }
        }
    }
    let thesis = Thesis {
        id: raw.id,
        text: raw.text.unwrap_or_default(),
        title: raw.title,
        positions,
    };
    Ok((thesis, rejected))
}

/// Parses the body of `GET /quiz/{electionId}`: `{ data: { thesisNum: [contra, pro] } }`.
pub fn parse_tally(contents: &str) -> AppResult<QuizTally> {
    let response: TallyResponse = serde_json::from_str(contents).context(ParsingJsonSnafu {})?;
    if let Some(message) = response.error {
        return ApiSnafu { message }.fail();
    }
    let mut tally = QuizTally::new();
    for (key, counts_js) in response.data.into_iter() {
        let num = key.parse::<u32>();
        let counts = serde_json::from_value::<[u64; 2]>(counts_js);
        match (num, counts) {
            (Ok(num), Ok(counts)) => tally.insert(num, counts),
            _ => warn!("parse_tally: skipping entry {:?}", key),
        }
    }
    Ok(tally)
}

pub fn read_election_file(path: &str) -> AppResult<ElectionSnapshot> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let (snapshot, rejected) = parse_election(&contents)?;
    if !rejected.is_empty() {
        info!("{}: {} rows could not be used", path, rejected.len());
    }
    Ok(snapshot)
}
