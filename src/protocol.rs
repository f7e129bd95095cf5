//! JSON wire messages. Every payload carries a `type` discriminator.
use serde::{Deserialize, Serialize};

use crate::leaderboard::Record;

/* ------------ client → server ------------ */
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    Register { name: String },
    UpdateScore { score: i64 },
}

/* ------------ server → client ------------ */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    Welcome { name: String },
    PlayerCount { count: usize },
    GlobalRecords { records: Vec<Record> },
    /// Browsers replace their feed with `log`; the relay keeps no history,
    /// so each notice goes out as a one-line log.
    ActivityLog { log: Vec<String> },
}

impl ServerMsg {
    pub fn joined(name: &str) -> Self {
        ServerMsg::ActivityLog { log: vec![format!("{name} joined the game")] }
    }

    pub fn left(name: &str) -> Self {
        ServerMsg::ActivityLog { log: vec![format!("{name} left the game")] }
    }
}

/// Non-JSON text, a missing or unknown `type`, or wrong field types all
/// come back as `None`; callers drop those silently.
pub fn parse_client(raw: &str) -> Option<ClientMsg> {
    serde_json::from_str(raw).ok()
}
