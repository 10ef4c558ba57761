use crate::metawahl::cache::SnapshotCache;
use crate::metawahl::io_api::{parse_election, parse_tally};
use crate::metawahl::*;

use reqwest::blocking::{Client, Response};
use serde_json::{json, Value as JSValue};
use std::thread;

/// Talks to the read API and the tally service, and keeps the local cache up to date.
pub struct ApiBackend {
    client: Client,
    api_root: String,
    cache: SnapshotCache,
    uuid: String,
}

impl ApiBackend {
    pub fn new(settings: &Settings) -> AppResult<ApiBackend> {
        let client = Client::builder()
            .timeout(settings.report_timeout)
            .build()
            .context(HttpSnafu {
                url: settings.api_root.clone(),
            })?;
        let cache = SnapshotCache::open(&settings.cache_directory)?;
        let uuid = cache.client_uuid()?;
        Ok(ApiBackend {
            client,
            api_root: settings.api_root.clone(),
            cache,
            uuid,
        })
    }

    fn get_text(&self, url: String) -> AppResult<String> {
        debug!("GET {}", url);
        self.client
            .get(&url)
            .send()
            .and_then(Response::error_for_status)
            .and_then(Response::text)
            .context(HttpSnafu { url })
    }

    /// The url and body of the submission, or `None` when the thesis was already reported.
    fn prepare_report(
        &self,
        report: &AnswerReport,
    ) -> Result<Option<(String, JSValue)>, QuizError> {
        if self.cache.is_answered(&report.thesis_id) {
            debug!("report_answer: {} was already reported", report.thesis_id);
            return Ok(None);
        }
        let thesis_num = ThesisId::parse(&report.thesis_id)?.num;
        let url = format!(
            "{}/quiz/{}/{}",
            self.api_root, report.election_id, thesis_num
        );
        let body = json!({
            "uuid": self.uuid,
            "thesis_id": report.thesis_id,
            "answer": report.answer.stance().code(),
        });
        Ok(Some((url, body)))
    }
}

impl QuizBackend for ApiBackend {
    fn fetch_election(&self, election_id: u32) -> Result<ElectionSnapshot, QuizError> {
        let url = format!("{}/elections/{}", self.api_root, election_id);
        let payload = self
            .get_text(url)
            .map_err(|e| QuizError::NetworkFailure(e.to_string()))?;
        let (snapshot, rejected) =
            parse_election(&payload).map_err(|e| QuizError::MalformedInput(e.to_string()))?;
        if !rejected.is_empty() {
            info!(
                "fetch_election: election {}: {} rows could not be used",
                election_id,
                rejected.len()
            );
        }
        if let Err(e) = self.cache.store_election(election_id, &payload) {
            warn!("fetch_election: could not cache election {}: {}", election_id, e);
        }
        Ok(snapshot)
    }

    fn cached_election(&self, election_id: u32) -> Option<ElectionSnapshot> {
        let payload = self.cache.load_election(election_id)?;
        match parse_election(&payload) {
            Ok((snapshot, _)) => Some(snapshot),
            Err(e) => {
                warn!("cached_election: unusable copy of election {}: {}", election_id, e);
                None
            }
        }
    }

    fn fetch_tally(&self, election_id: u32) -> Result<QuizTally, QuizError> {
        let url = format!("{}/quiz/{}", self.api_root, election_id);
        let payload = self
            .get_text(url)
            .map_err(|e| QuizError::NetworkFailure(e.to_string()))?;
        parse_tally(&payload).map_err(|e| QuizError::MalformedInput(e.to_string()))
    }

    /// Sends the answer from a detached thread. The request is not awaited: a failed or
    /// timed out submission only shows up in the log. The thesis is marked as answered
    /// once the tally service accepted it, so failed submissions are retried later.
    fn report_answer(&self, report: &AnswerReport) -> Result<(), QuizError> {
        let (url, body) = match self.prepare_report(report)? {
            Some(request) => request,
            None => return Ok(()),
        };
        let client = self.client.clone();
        let cache = self.cache.clone();
        let thesis_id = report.thesis_id.clone();
        thread::Builder::new()
            .name("answer-report".to_string())
            .spawn(move || {
                send_report(&client, &cache, &url, &body, &thesis_id);
            })
            .map_err(|e| QuizError::NetworkFailure(e.to_string()))?;
        Ok(())
    }
}

/// Posts one answer and marks the thesis as answered if the service accepted it.
fn send_report(
    client: &Client,
    cache: &SnapshotCache,
    url: &str,
    body: &JSValue,
    thesis_id: &str,
) -> bool {
    match client
        .post(url)
        .json(body)
        .send()
        .and_then(Response::error_for_status)
    {
        Ok(_) => {
            debug!("POST {}: done", url);
            if let Err(e) = cache.mark_answered(thesis_id) {
                warn!("report_answer: {}", e);
            }
            true
        }
        Err(e) => {
            warn!("POST {}: answer was not recorded: {}", url, e);
            false
        }
    }
}

/// Serves one election loaded from a file. Nothing leaves the machine.
pub struct OfflineBackend {
    snapshot: ElectionSnapshot,
}

impl OfflineBackend {
    pub fn new(snapshot: ElectionSnapshot) -> OfflineBackend {
        OfflineBackend { snapshot }
    }
}

impl QuizBackend for OfflineBackend {
    fn fetch_election(&self, election_id: u32) -> Result<ElectionSnapshot, QuizError> {
        if election_id == self.snapshot.info.id {
            Ok(self.snapshot.clone())
        } else {
            Err(QuizError::NetworkFailure(format!(
                "election {} is not available offline",
                election_id
            )))
        }
    }

    fn cached_election(&self, _election_id: u32) -> Option<ElectionSnapshot> {
        None
    }

    fn fetch_tally(&self, _election_id: u32) -> Result<QuizTally, QuizError> {
        Ok(QuizTally::new())
    }

    fn report_answer(&self, report: &AnswerReport) -> Result<(), QuizError> {
        debug!(
            "report_answer: offline, not sending {:?} for {}",
            report.answer, report.thesis_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metawahl::io_api::tests::ELECTION_44;

    #[test]
    fn offline_backend() {
        let (snapshot, _) = parse_election(ELECTION_44).unwrap();
        let backend = OfflineBackend::new(snapshot.clone());
        assert_eq!(backend.fetch_election(44), Ok(snapshot));
        assert!(matches!(
            backend.fetch_election(45),
            Err(QuizError::NetworkFailure(_))
        ));
        assert_eq!(backend.fetch_tally(44), Ok(QuizTally::new()));
    }

    #[test]
    fn offline_session() {
        let (snapshot, _) = parse_election(ELECTION_44).unwrap();
        let mut session =
            QuizSession::start(44, OfflineBackend::new(snapshot), &QuizRules::DEFAULT_RULES);
        assert_eq!(session.error(), None);
        assert_eq!(session.state(), SessionState::Active);
        // Thesis 01: A (55) pro, B and C (linked to B) contra.
        let res = session.answer(Choice::Pro).unwrap();
        assert!(res.correct);
        assert_eq!(res.community_ratio, None);
    }

    fn unreachable_settings(name: &str) -> Settings {
        let dir = std::env::temp_dir().join(format!("metawahl-{}-{}", name, uuid::Uuid::new_v4()));
        Settings {
            // Nothing listens on the discard port.
            api_root: "http://127.0.0.1:9/api/v1".to_string(),
            cache_directory: dir,
            report_timeout: std::time::Duration::from_secs(1),
            rules: QuizRules::DEFAULT_RULES,
        }
    }

    fn report(thesis_id: &str) -> AnswerReport {
        AnswerReport {
            election_id: 44,
            thesis_id: thesis_id.to_string(),
            answer: Choice::Contra,
        }
    }

    #[test]
    fn report_request() {
        let backend = ApiBackend::new(&unreachable_settings("request")).unwrap();
        let (url, body) = backend.prepare_report(&report("WOM-044-07")).unwrap().unwrap();
        assert_eq!(url, "http://127.0.0.1:9/api/v1/quiz/44/7");
        assert_eq!(body["thesis_id"], json!("WOM-044-07"));
        assert_eq!(body["answer"], json!(-1));
        assert_eq!(body["uuid"], json!(backend.uuid));
    }

    #[test]
    fn answered_thesis_is_not_reported_again() {
        let backend = ApiBackend::new(&unreachable_settings("repeat")).unwrap();
        backend.cache.mark_answered("WOM-044-01").unwrap();
        assert_eq!(backend.prepare_report(&report("WOM-044-01")), Ok(None));
        assert_eq!(backend.report_answer(&report("WOM-044-01")), Ok(()));
        assert!(backend.prepare_report(&report("WOM-044-02")).unwrap().is_some());
    }

    #[test]
    fn failed_submission_stays_unmarked() {
        let backend = ApiBackend::new(&unreachable_settings("failed")).unwrap();
        let (url, body) = backend.prepare_report(&report("WOM-044-01")).unwrap().unwrap();
        assert!(!send_report(&backend.client, &backend.cache, &url, &body, "WOM-044-01"));
        assert!(!backend.cache.is_answered("WOM-044-01"));
        // Still reported on the next attempt.
        assert!(backend.prepare_report(&report("WOM-044-01")).unwrap().is_some());
    }

    #[test]
    fn malformed_thesis_id_is_not_marked() {
        let backend = ApiBackend::new(&unreachable_settings("malformed")).unwrap();
        let res = backend.report_answer(&report("WOM-44"));
        assert!(matches!(res, Err(QuizError::MalformedInput(_))));
        assert!(!backend.cache.is_answered("WOM-44"));
    }

    #[test]
    fn unreachable_api_uses_cache() {
        let settings = unreachable_settings("client");
        let backend = ApiBackend::new(&settings).unwrap();
        assert_eq!(backend.cached_election(44), None);
        backend.cache.store_election(44, ELECTION_44).unwrap();

        let session = QuizSession::start(44, backend, &settings.rules);
        assert!(session.error().is_some());
        assert_eq!(session.election().map(|e| e.id), Some(44));
        assert!(!session.questions().is_empty());
    }
}
