use log::{debug, info, warn};

use crate::config::*;
use crate::merge::merge_theses;
use crate::selection::select_with_rules;

/// The services a quiz session talks to.
///
/// Implementations decide how the calls travel. `report_answer` must not block on the
/// network: the session calls it while the visitor waits for feedback.
pub trait QuizBackend {
    fn fetch_election(&self, election_id: u32) -> Result<ElectionSnapshot, QuizError>;

    /// The last snapshot of this election that was fetched successfully, if any.
    fn cached_election(&self, election_id: u32) -> Option<ElectionSnapshot>;

    fn fetch_tally(&self, election_id: u32) -> Result<QuizTally, QuizError>;

    fn report_answer(&self, report: &AnswerReport) -> Result<(), QuizError>;
}

/// One attempt at the quiz of one election.
///
/// `answers` only grows and `current_index` only increases. Every question is answered
/// at most once: the transition from `Active` to `Answered` is the only place where an
/// answer is recorded and reported.
pub struct QuizSession<B: QuizBackend> {
    backend: B,
    rules: QuizRules,
    election: Option<ElectionInfo>,
    questions: Vec<QuizQuestion>,
    answers: Vec<UserAnswer>,
    current_index: usize,
    state: SessionState,
    tally: Option<QuizTally>,
    error: Option<String>,
}

impl<B: QuizBackend> QuizSession<B> {
    /// Loads the election and selects the questions.
    ///
    /// When the election cannot be fetched, the last cached snapshot is used and
    /// `error()` reports the failure. Without a cached snapshot the session has no
    /// questions and is complete right away.
    pub fn start(election_id: u32, backend: B, rules: &QuizRules) -> QuizSession<B> {
        match backend.fetch_election(election_id) {
            Ok(snapshot) => {
                let mut session = QuizSession::from_snapshot(&snapshot, backend, rules);
                session.load_tally();
                session
            }
            Err(e) => {
                warn!("Could not load election {}: {}", election_id, e);
                let cached = backend.cached_election(election_id);
                let mut session = match cached {
                    Some(snapshot) => {
                        info!("Using cached snapshot of election {}", election_id);
                        QuizSession::from_snapshot(&snapshot, backend, rules)
                    }
                    None => QuizSession::from_questions(None, Vec::new(), backend, rules),
                };
                session.error = Some(e.to_string());
                session
            }
        }
    }

    /// Builds a session on an election that is already loaded. The tally is not loaded.
    pub fn from_snapshot(
        snapshot: &ElectionSnapshot,
        backend: B,
        rules: &QuizRules,
    ) -> QuizSession<B> {
        let merged = merge_theses(&snapshot.theses, &snapshot.results);
        let questions = select_with_rules(&merged, rules);
        QuizSession::from_questions(Some(snapshot.info.clone()), questions, backend, rules)
    }

    pub fn from_questions(
        election: Option<ElectionInfo>,
        questions: Vec<QuizQuestion>,
        backend: B,
        rules: &QuizRules,
    ) -> QuizSession<B> {
        let state = if questions.is_empty() {
            SessionState::Complete
        } else {
            SessionState::Active
        };
        QuizSession {
            backend,
            rules: rules.clone(),
            election,
            questions,
            answers: Vec::new(),
            current_index: 0,
            state,
            tally: None,
            error: None,
        }
    }

    /// Fetches the answers of earlier visitors. On failure the tally stays as it was.
    pub fn load_tally(&mut self) {
        let election_id = match &self.election {
            Some(info) => info.id,
            None => return,
        };
        match self.backend.fetch_tally(election_id) {
            Ok(tally) => {
                debug!("Loaded quiz tally for {} theses", tally.len());
                self.tally = Some(tally);
            }
            Err(e) => warn!("Could not load quiz tally of election {}: {}", election_id, e),
        }
    }

    /// Records the answer to the current question.
    ///
    /// Only valid while the current question is unanswered. The answer is reported to
    /// the tally service without waiting for the outcome; a failed report is logged and
    /// does not change the session.
    pub fn answer(&mut self, choice: Choice) -> Result<AnswerResult, QuizError> {
        if self.state != SessionState::Active {
            return Err(QuizError::InvalidTransition {
                state: self.state,
                operation: "answer",
            });
        }
        let question = self
            .questions
            .get(self.current_index)
            .ok_or(QuizError::InvalidTransition {
                state: self.state,
                operation: "answer",
            })?;

        let verdict = question.opinion.verdict;
        let correct = choice.stance() == verdict;
        let community_ratio = self
            .tally
            .as_ref()
            .and_then(|tally| self.community_agreement_ratio(tally, question));
        let thesis_id = question.thesis.id.clone();

        info!(
            "Question {}: answered {:?}, verdict {:?}, correct: {}",
            self.current_index, choice, verdict, correct
        );
        self.answers.push(UserAnswer {
            thesis_id: thesis_id.clone(),
            choice,
            correct,
        });
        self.state = SessionState::Answered(self.current_index);

        self.report(thesis_id, choice);

        Ok(AnswerResult {
            correct,
            verdict,
            community_ratio,
        })
    }

    fn report(&self, thesis_id: String, choice: Choice) {
        if let Some(e) = &self.error {
            debug!("Not reporting answer for {}: session has an error: {}", thesis_id, e);
            return;
        }
        let election_id = match &self.election {
            Some(info) => info.id,
            None => return,
        };
        let report = AnswerReport {
            election_id,
            thesis_id,
            answer: choice,
        };
        if let Err(e) = self.backend.report_answer(&report) {
            warn!("Failed to report answer for {}: {}", report.thesis_id, e);
        }
    }

    /// Moves on to the next question once the current one is answered.
    pub fn advance(&mut self) -> Result<(), QuizError> {
        match self.state {
            SessionState::Answered(idx) => {
                self.current_index = idx + 1;
                self.state = if self.current_index >= self.questions.len() {
                    info!("Quiz complete, score: {:?}", self.score());
                    SessionState::Complete
                } else {
                    SessionState::Active
                };
                Ok(())
            }
            state => Err(QuizError::InvalidTransition {
                state,
                operation: "advance",
            }),
        }
    }

    /// Fraction of the answers so far that were correct.
    pub fn score(&self) -> Score {
        if self.answers.is_empty() {
            return Score::Indeterminate;
        }
        let correct = self.answers.iter().filter(|a| a.correct).count();
        Score::Ratio(correct as f64 / self.answers.len() as f64)
    }

    /// Fraction of earlier visitors that picked the verdict of this question.
    ///
    /// Returns `None` when the question has no majority, when the tally has no entry
    /// for it, or when too few visitors answered for the ratio to mean anything.
    pub fn community_agreement_ratio(
        &self,
        tally: &QuizTally,
        question: &QuizQuestion,
    ) -> Option<f64> {
        community_agreement_ratio(tally, question, self.rules.minimum_community_sample)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// The question being asked or just answered, `None` once complete.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        match self.state {
            SessionState::Complete => None,
            _ => self.questions.get(self.current_index),
        }
    }

    /// Number of questions still to answer.
    pub fn remaining(&self) -> usize {
        self.questions.len() - self.answers.len()
    }

    pub fn election(&self) -> Option<&ElectionInfo> {
        self.election.as_ref()
    }

    pub fn tally(&self) -> Option<&QuizTally> {
        self.tally.as_ref()
    }

    /// The reason the election could not be loaded, if it could not.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// See [`QuizSession::community_agreement_ratio`]. The ratio is only given when strictly
/// more than `minimum_sample` visitors answered.
pub fn community_agreement_ratio(
    tally: &QuizTally,
    question: &QuizQuestion,
    minimum_sample: u64,
) -> Option<f64> {
    let thesis_num = match ThesisId::parse(&question.thesis.id) {
        Ok(id) => id.num,
        Err(e) => {
            debug!("community_agreement_ratio: {}", e);
            return None;
        }
    };
    let counts = tally.get(thesis_num)?;
    let total = counts.total();
    if total <= minimum_sample {
        return None;
    }
    let agreeing = match question.opinion.verdict {
        Stance::Pro => counts.pro,
        Stance::Contra => counts.contra,
        Stance::Neutral => return None,
    };
    Some(agreeing as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::PartyResultTable;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeBackend {
        snapshot: Option<ElectionSnapshot>,
        cached: Option<ElectionSnapshot>,
        tally: Option<QuizTally>,
        fail_reports: bool,
        reports: RefCell<Vec<AnswerReport>>,
        tally_calls: Cell<usize>,
    }

    impl QuizBackend for FakeBackend {
        fn fetch_election(&self, _election_id: u32) -> Result<ElectionSnapshot, QuizError> {
            self.snapshot
                .clone()
                .ok_or_else(|| QuizError::NetworkFailure("connection refused".to_string()))
        }

        fn cached_election(&self, _election_id: u32) -> Option<ElectionSnapshot> {
            self.cached.clone()
        }

        fn fetch_tally(&self, _election_id: u32) -> Result<QuizTally, QuizError> {
            self.tally_calls.set(self.tally_calls.get() + 1);
            self.tally
                .clone()
                .ok_or_else(|| QuizError::NetworkFailure("timeout".to_string()))
        }

        fn report_answer(&self, report: &AnswerReport) -> Result<(), QuizError> {
            self.reports.borrow_mut().push(report.clone());
            if self.fail_reports {
                Err(QuizError::NetworkFailure("500".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn position(party: &str, value: Stance) -> PositionRecord {
        PositionRecord {
            party: party.to_string(),
            value,
            text: None,
        }
    }

    /// Three quiz-worthy theses (pro, contra, pro) and one that is not.
    fn snapshot() -> ElectionSnapshot {
        let (results, errors) = PartyResultTable::from_rows(vec![
            PartyResult::new("A", 55.0),
            PartyResult::new("B", 25.0),
            PartyResult::new("C", 20.0),
        ]);
        assert!(errors.is_empty());
        let thesis = |num: u32, a: Stance, b: Stance, c: Stance| Thesis {
            id: format!("WOM-044-{:02}", num),
            text: format!("Thesis {}", num),
            title: None,
            positions: vec![position("A", a), position("B", b), position("C", c)],
        };
        ElectionSnapshot {
            info: ElectionInfo {
                id: 44,
                title: "Landtagswahl Hessen 2018".to_string(),
                territory: "hessen".to_string(),
                date: Some("2018-10-28".to_string()),
                preliminary: false,
            },
            results,
            theses: vec![
                thesis(1, Stance::Pro, Stance::Contra, Stance::Neutral),
                thesis(2, Stance::Contra, Stance::Pro, Stance::Neutral),
                thesis(3, Stance::Pro, Stance::Pro, Stance::Pro),
                thesis(4, Stance::Pro, Stance::Contra, Stance::Contra),
            ],
        }
    }

    fn online() -> FakeBackend {
        FakeBackend {
            snapshot: Some(snapshot()),
            ..FakeBackend::default()
        }
    }

    #[test]
    fn start_selects_questions() {
        init_logs();
        let session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        assert_eq!(session.error(), None);
        let ids: Vec<&str> = session
            .questions()
            .iter()
            .map(|q| q.thesis.id.as_str())
            .collect();
        assert_eq!(ids, vec!["WOM-044-01", "WOM-044-02", "WOM-044-04"]);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.remaining(), 3);
        assert_eq!(session.backend().tally_calls.get(), 1);
    }

    #[test]
    fn score_before_any_answer_is_indeterminate() {
        let session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        assert_eq!(session.score(), Score::Indeterminate);
    }

    #[test]
    fn full_run() {
        init_logs();
        let mut session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);

        let r = session.answer(Choice::Pro).unwrap();
        assert!(r.correct);
        assert_eq!(r.verdict, Stance::Pro);
        assert_eq!(session.state(), SessionState::Answered(0));
        session.advance().unwrap();

        let r = session.answer(Choice::Pro).unwrap();
        assert!(!r.correct);
        assert_eq!(r.verdict, Stance::Contra);
        session.advance().unwrap();

        session.answer(Choice::Pro).unwrap();
        assert_eq!(session.remaining(), 0);
        session.advance().unwrap();

        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.current_question(), None);
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.answers().len(), 3);
        assert_eq!(session.score(), Score::Ratio(2.0 / 3.0));

        let reports = session.backend().reports.borrow();
        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports[1],
            AnswerReport {
                election_id: 44,
                thesis_id: "WOM-044-02".to_string(),
                answer: Choice::Pro,
            }
        );
    }

    #[test]
    fn double_answer_is_rejected_and_not_reported() {
        let mut session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        session.answer(Choice::Contra).unwrap();
        let err = session.answer(Choice::Pro).unwrap_err();
        assert_eq!(
            err,
            QuizError::InvalidTransition {
                state: SessionState::Answered(0),
                operation: "answer",
            }
        );
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.backend().reports.borrow().len(), 1);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        assert!(matches!(
            session.advance(),
            Err(QuizError::InvalidTransition {
                state: SessionState::Active,
                ..
            })
        ));
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn nothing_works_after_completion() {
        let mut session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        for _ in 0..3 {
            session.answer(Choice::Contra).unwrap();
            session.advance().unwrap();
        }
        assert!(session.advance().is_err());
        assert!(session.answer(Choice::Pro).is_err());
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.answers().len(), 3);
    }

    #[test]
    fn failed_report_keeps_the_answer() {
        let backend = FakeBackend {
            fail_reports: true,
            ..online()
        };
        let mut session = QuizSession::start(44, backend, &QuizRules::DEFAULT_RULES);
        let r = session.answer(Choice::Pro).unwrap();
        assert!(r.correct);
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.state(), SessionState::Answered(0));
    }

    #[test]
    fn load_failure_falls_back_to_cache() {
        init_logs();
        let backend = FakeBackend {
            cached: Some(snapshot()),
            ..FakeBackend::default()
        };
        let mut session = QuizSession::start(44, backend, &QuizRules::DEFAULT_RULES);
        assert_eq!(session.error(), Some("network failure: connection refused"));
        assert_eq!(session.questions().len(), 3);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.backend().tally_calls.get(), 0);

        // The quiz still works, but answers are not reported.
        session.answer(Choice::Pro).unwrap();
        session.advance().unwrap();
        assert_eq!(session.current_index(), 1);
        assert!(session.backend().reports.borrow().is_empty());
    }

    #[test]
    fn load_failure_without_cache_is_empty() {
        let mut session =
            QuizSession::start(44, FakeBackend::default(), &QuizRules::DEFAULT_RULES);
        assert!(session.error().is_some());
        assert!(session.questions().is_empty());
        assert_eq!(session.state(), SessionState::Complete);
        assert_eq!(session.score(), Score::Indeterminate);
        assert!(session.answer(Choice::Pro).is_err());
    }

    #[test]
    fn tally_failure_is_not_an_error() {
        let session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        assert_eq!(session.tally(), None);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn community_ratio_needs_more_than_five_answers() {
        let session = QuizSession::start(44, online(), &QuizRules::DEFAULT_RULES);
        let pro_question = &session.questions()[0];
        assert_eq!(pro_question.opinion.verdict, Stance::Pro);

        let mut small = QuizTally::new();
        small.insert(1, [3, 2]);
        assert_eq!(session.community_agreement_ratio(&small, pro_question), None);

        let mut large = QuizTally::new();
        large.insert(1, [30, 20]);
        assert_eq!(
            session.community_agreement_ratio(&large, pro_question),
            Some(0.4)
        );

        let contra_question = &session.questions()[1];
        large.insert(2, [30, 20]);
        assert_eq!(
            session.community_agreement_ratio(&large, contra_question),
            Some(0.6)
        );

        assert_eq!(
            session.community_agreement_ratio(&QuizTally::new(), pro_question),
            None
        );
    }

    #[test]
    fn neutral_verdict_has_no_community_ratio() {
        let question = QuizQuestion {
            thesis: snapshot().theses[0].clone(),
            entries: Vec::new(),
            opinion: ThesisOpinion {
                ratio_pro: 40.0,
                ratio_contra: 40.0,
                verdict: Stance::Neutral,
            },
        };
        let mut tally = QuizTally::new();
        tally.insert(1, [300, 200]);
        assert_eq!(community_agreement_ratio(&tally, &question, 5), None);
    }

    #[test]
    fn answer_carries_the_community_ratio() {
        let mut tally = QuizTally::new();
        tally.insert(1, [10, 30]);
        tally.insert(2, [1, 1]);
        let backend = FakeBackend {
            tally: Some(tally),
            ..online()
        };
        let mut session = QuizSession::start(44, backend, &QuizRules::DEFAULT_RULES);
        assert!(session.tally().is_some());
        let r = session.answer(Choice::Contra).unwrap();
        assert_eq!(r.community_ratio, Some(0.75));
        session.advance().unwrap();
        let r = session.answer(Choice::Contra).unwrap();
        assert_eq!(r.community_ratio, None);
    }
}
