// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The stance of a party towards a thesis.
///
/// The same three values describe the majority opinion (verdict) of a thesis.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Stance {
    Pro,
    Neutral,
    Contra,
}

impl Stance {
    /// Decodes the integer representation used by the read API (`1`, `0`, `-1`).
    pub fn from_code(code: i64) -> Option<Stance> {
        match code {
            1 => Some(Stance::Pro),
            0 => Some(Stance::Neutral),
            -1 => Some(Stance::Contra),
            _ => None,
        }
    }

    pub fn code(self) -> i8 {
        match self {
            Stance::Pro => 1,
            Stance::Neutral => 0,
            Stance::Contra => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stance::Pro => "pro",
            Stance::Neutral => "neutral",
            Stance::Contra => "contra",
        }
    }
}

/// One party's stance on one thesis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PositionRecord {
    pub party: String,
    pub value: Stance,
    /// The rationale given by the party, if any.
    pub text: Option<String>,
}

/// One row of the outcome of an election.
#[derive(PartialEq, Debug, Clone)]
pub struct PartyResult {
    pub party: String,
    /// Share of the votes, between 0 and 100.
    pub vote_pct: f64,
    pub vote_count: Option<u64>,
    /// The party whose position is used when this party has none of its own.
    /// This models blocs such as two sister parties sharing one program.
    pub linked_party: Option<String>,
}

impl PartyResult {
    pub fn new(party: &str, vote_pct: f64) -> PartyResult {
        PartyResult {
            party: party.to_string(),
            vote_pct,
            vote_count: None,
            linked_party: None,
        }
    }
}

/// A policy statement on which the parties took a stance before an election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Thesis {
    /// Identifier of the form `WOM-<election>-<number>`, for example `WOM-043-12`.
    pub id: String,
    pub text: String,
    pub title: Option<String>,
    pub positions: Vec<PositionRecord>,
}

/// The components of a thesis identifier.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct ThesisId {
    pub wom_id: u32,
    pub num: u32,
}

impl ThesisId {
    pub fn parse(id: &str) -> Result<ThesisId, QuizError> {
        let parts: Vec<&str> = id.split('-').collect();
        match parts.as_slice() {
            [_, wom, num] => match (wom.parse::<u32>(), num.parse::<u32>()) {
                (Ok(wom_id), Ok(num)) => Ok(ThesisId { wom_id, num }),
                _ => Err(QuizError::MalformedInput(format!(
                    "thesis id {:?} does not contain numeric parts",
                    id
                ))),
            },
            _ => Err(QuizError::MalformedInput(format!(
                "thesis id {:?} is not of the form TYPE-ELECTION-NUMBER",
                id
            ))),
        }
    }
}

/// Descriptive data about an election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionInfo {
    pub id: u32,
    pub title: String,
    pub territory: String,
    pub date: Option<String>,
    /// The results are a forecast and not the official outcome.
    pub preliminary: bool,
}

/// Everything needed to render an election or to run a quiz on it.
#[derive(PartialEq, Debug, Clone)]
pub struct ElectionSnapshot {
    pub info: ElectionInfo,
    pub results: crate::table::PartyResultTable,
    pub theses: Vec<Thesis>,
}

/// The answers given by earlier visitors, per thesis number.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QuizTally {
    counts: HashMap<u32, TallyCount>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct TallyCount {
    pub contra: u64,
    pub pro: u64,
}

impl TallyCount {
    pub fn total(&self) -> u64 {
        self.contra.saturating_add(self.pro)
    }
}

impl QuizTally {
    pub fn new() -> QuizTally {
        QuizTally::default()
    }

    /// Records the counts for a thesis, in the `[contra, pro]` order of the API.
    pub fn insert(&mut self, thesis_num: u32, counts: [u64; 2]) {
        self.counts.insert(
            thesis_num,
            TallyCount {
                contra: counts[0],
                pro: counts[1],
            },
        );
    }

    pub fn get(&self, thesis_num: u32) -> Option<TallyCount> {
        self.counts.get(&thesis_num).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ******** Output data structures *********

/// The position attached to a result row after merging.
///
/// `Missing` is not the same as a neutral position: the party did not state anything.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ResolvedStance {
    Stated(Stance),
    Missing,
}

impl ResolvedStance {
    pub fn stance(self) -> Option<Stance> {
        match self {
            ResolvedStance::Stated(s) => Some(s),
            ResolvedStance::Missing => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResolvedStance::Stated(s) => s.label(),
            ResolvedStance::Missing => "missing",
        }
    }
}

/// A result row together with the position that applies to it.
#[derive(PartialEq, Debug, Clone)]
pub struct MergedPartyEntry {
    pub result: PartyResult,
    pub value: ResolvedStance,
    /// Empty when the party gave no rationale or has no position.
    pub text: String,
}

impl MergedPartyEntry {
    pub fn party(&self) -> &str {
        &self.result.party
    }

    pub fn vote_pct(&self) -> f64 {
        self.result.vote_pct
    }
}

/// The vote-weighted opinion of the electorate on one thesis.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ThesisOpinion {
    pub ratio_pro: f64,
    pub ratio_contra: f64,
    pub verdict: Stance,
}

impl ThesisOpinion {
    /// The share of the votes behind the verdict, or `None` without a majority.
    pub fn majority_share(&self) -> Option<f64> {
        match self.verdict {
            Stance::Pro => Some(self.ratio_pro),
            Stance::Contra => Some(self.ratio_contra),
            Stance::Neutral => None,
        }
    }
}

/// A thesis selected for a quiz.
#[derive(PartialEq, Debug, Clone)]
pub struct QuizQuestion {
    pub thesis: Thesis,
    pub entries: Vec<MergedPartyEntry>,
    pub opinion: ThesisOpinion,
}

/// What a visitor may answer in a quiz.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Choice {
    Pro,
    Contra,
}

impl Choice {
    pub fn stance(self) -> Stance {
        match self {
            Choice::Pro => Stance::Pro,
            Choice::Contra => Stance::Contra,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UserAnswer {
    pub thesis_id: String,
    pub choice: Choice,
    pub correct: bool,
}

/// Returned to the caller after each answer.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct AnswerResult {
    pub correct: bool,
    pub verdict: Stance,
    /// Fraction of earlier visitors that picked the verdict, if enough of them answered.
    pub community_ratio: Option<f64>,
}

/// The message sent to the answer tally service.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnswerReport {
    pub election_id: u32,
    pub thesis_id: String,
    pub answer: Choice,
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Score {
    /// No question has been answered yet.
    Indeterminate,
    Ratio(f64),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SessionState {
    /// The current question waits for an answer.
    Active,
    /// The question at this index is answered, the session has not moved on yet.
    Answered(usize),
    Complete,
}

/// Errors reported by the quiz engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum QuizError {
    /// A row of input data is unusable. Only that row is dropped.
    MalformedInput(String),
    /// The read API or the tally service could not be reached.
    NetworkFailure(String),
    /// A session operation was called in a state that does not allow it.
    InvalidTransition {
        state: SessionState,
        operation: &'static str,
    },
}

impl Error for QuizError {}

impl Display for QuizError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            QuizError::NetworkFailure(msg) => write!(f, "network failure: {}", msg),
            QuizError::InvalidTransition { state, operation } => {
                write!(f, "cannot {} while the quiz is in state {:?}", operation, state)
            }
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone)]
pub struct QuizRules {
    /// Maximum number of questions in one quiz.
    pub question_limit: usize,
    /// Both sides need strictly more than this share of the votes for a thesis to be asked.
    pub contested_minimum_pct: f64,
    /// The community ratio is only given when strictly more visitors answered.
    pub minimum_community_sample: u64,
}

impl QuizRules {
    pub const DEFAULT_RULES: QuizRules = QuizRules {
        question_limit: 20,
        contested_minimum_pct: 15.0,
        minimum_community_sample: 5,
    };
}

impl Default for QuizRules {
    fn default() -> Self {
        QuizRules::DEFAULT_RULES
    }
}
