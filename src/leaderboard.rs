//! Global top-N high score table and its JSON file.
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::AppResult;

pub const CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub score: i64,
}

/// In-memory ranking: sorted by score descending, unique by name, at most
/// `CAPACITY` long.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    records: Vec<Record>,
}

impl Leaderboard {
    /// Builds a ranking out of arbitrary records (e.g. a hand-edited file):
    /// duplicates keep their best score, then sort + truncate.
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut board = Self::default();
        for r in records {
            board.submit(&r.name, r.score);
        }
        board
    }

    /// Merges one score. Returns `true` only if the stored ranking changed.
    pub fn submit(&mut self, name: &str, score: i64) -> bool {
        match self.records.iter_mut().find(|r| r.name == name) {
            Some(r) if score > r.score => r.score = score,
            Some(_) => return false,
            None => self.records.push(Record { name: name.to_owned(), score }),
        }

        // stable: ties keep their current order, newcomers sort last
        self.records.sort_by(|a, b| b.score.cmp(&a.score));
        self.records.truncate(CAPACITY);

        // an update always moves a score; an insert may have fallen off the end
        self.records.iter().any(|r| r.name == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/* ------------ persisted store ------------ */
pub struct LeaderboardStore {
    path: PathBuf,
    board: Leaderboard,
}

impl LeaderboardStore {
    /// Loads the file at `path`. Missing or unreadable data is logged and
    /// the store starts empty; this never fails.
    pub async fn initialize(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let board = match load(&path).await {
            Ok(Some(records)) => {
                let board = Leaderboard::from_records(records);
                tracing::info!(path = %path.display(), entries = board.len(), "leaderboard loaded");
                board
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "no leaderboard file, starting empty");
                Leaderboard::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "leaderboard unreadable, starting empty");
                Leaderboard::default()
            }
        };
        Self { path, board }
    }

    pub fn submit_score(&mut self, name: &str, score: i64) -> bool {
        self.board.submit(name, score)
    }

    pub fn snapshot(&self) -> Vec<Record> {
        self.board.records().to_vec()
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the whole table to `<path>.tmp` and renames it over `path`,
    /// so readers never see a half-written file. No temp file survives an
    /// error.
    pub async fn persist(&self) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(self.board.records())?;
        let tmp = tmp_path(&self.path);
        let written = match fs::write(&tmp, &bytes).await {
            Ok(()) => fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

async fn load(path: &Path) -> AppResult<Option<Vec<Record>>> {
    let bytes = match fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}
