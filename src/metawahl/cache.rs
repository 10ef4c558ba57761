use crate::metawahl::*;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const UUID_FILE: &str = "uuid";
const ANSWERED_FILE: &str = "answered.json";

/// The local state of the client, kept in one directory.
///
/// Holds the raw election payloads of the last successful fetches, the id under which
/// this client reports quiz answers, and the theses it already answered.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn open(dir: &Path) -> AppResult<SnapshotCache> {
        fs::create_dir_all(dir).context(CacheSnafu {
            path: dir.display().to_string(),
        })?;
        Ok(SnapshotCache {
            dir: dir.to_path_buf(),
        })
    }

    fn election_path(&self, election_id: u32) -> PathBuf {
        self.dir.join(format!("election-{}.json", election_id))
    }

    pub fn store_election(&self, election_id: u32, payload: &str) -> AppResult<()> {
        let path = self.election_path(election_id);
        fs::write(&path, payload).context(CacheSnafu {
            path: path.display().to_string(),
        })?;
        debug!("store_election: {} bytes in {:?}", payload.len(), path);
        Ok(())
    }

    pub fn load_election(&self, election_id: u32) -> Option<String> {
        let path = self.election_path(election_id);
        match fs::read_to_string(&path) {
            Ok(s) => Some(s),
            Err(e) => {
                debug!("load_election: no cached copy in {:?}: {}", path, e);
                None
            }
        }
    }

    /// The id of this client. Created on first use.
    pub fn client_uuid(&self) -> AppResult<String> {
        let path = self.dir.join(UUID_FILE);
        if let Ok(existing) = fs::read_to_string(&path) {
            let existing = existing.trim();
            if Uuid::parse_str(existing).is_ok() {
                return Ok(existing.to_string());
            }
            warn!("client_uuid: replacing invalid id in {:?}", path);
        }
        let fresh = Uuid::new_v4().to_string();
        fs::write(&path, &fresh).context(CacheSnafu {
            path: path.display().to_string(),
        })?;
        info!("client_uuid: new client id {}", fresh);
        Ok(fresh)
    }

    fn answered(&self) -> BTreeSet<String> {
        let path = self.dir.join(ANSWERED_FILE);
        fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<BTreeSet<String>>(&s).ok())
            .unwrap_or_default()
    }

    pub fn is_answered(&self, thesis_id: &str) -> bool {
        self.answered().contains(thesis_id)
    }

    pub fn mark_answered(&self, thesis_id: &str) -> AppResult<()> {
        let mut answered = self.answered();
        if !answered.insert(thesis_id.to_string()) {
            return Ok(());
        }
        let path = self.dir.join(ANSWERED_FILE);
        let js = serde_json::to_string(&answered).context(ParsingJsonSnafu {})?;
        fs::write(&path, js).context(CacheSnafu {
            path: path.display().to_string(),
        })
    }
}
