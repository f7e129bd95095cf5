//! Table of live connections and the display names bound to them.
use std::{collections::HashMap, fmt};

use axum::extract::ws::Message;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Sender half of a connection's outgoing queue; the session's writer task
/// owns the receiver and drains it into the socket.
pub type Outbox = mpsc::Sender<Message>;

/// Messages queued for one connection before further ones are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

pub fn outbox_channel() -> (Outbox, mpsc::Receiver<Message>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

pub const MAX_NAME_CHARS: usize = 24;

/// Handed out to clients that register with a blank name.
const NAME_POOL: &[&str] = &[
    "EC2Explorer", "S3Surfer", "LambdaLeaper", "DynamoDBDiver", "RDSRacer",
    "CloudFrontCruiser", "ElasticBeanstalkBouncer", "KinesisKnight", "SageMakerSprinter", "GlacierGlider",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        ConnId(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Peer {
    outbox: Outbox,
    name: Option<String>,
}

/// Display names are trusted as sent and need not be unique; two
/// connections may share one.
#[derive(Default)]
pub struct Registry {
    peers: HashMap<ConnId, Peer>,
}

impl Registry {
    /// Adds a nameless entry. A connection id already present is left alone.
    pub fn connect(&mut self, id: ConnId, outbox: Outbox) -> bool {
        if self.peers.contains_key(&id) {
            return false;
        }
        self.peers.insert(id, Peer { outbox, name: None });
        true
    }

    /// Binds (or rebinds) `name`. Returns `false` for an unknown connection.
    pub fn register(&mut self, id: ConnId, name: String) -> bool {
        match self.peers.get_mut(&id) {
            Some(p) => {
                p.name = Some(name);
                true
            }
            None => false,
        }
    }

    /// Drops the entry and hands back the name it carried, if any.
    pub fn disconnect(&mut self, id: ConnId) -> Option<String> {
        self.peers.remove(&id).and_then(|p| p.name)
    }

    /// Player count: every open connection, named or not.
    pub fn count(&self) -> usize {
        self.peers.len()
    }

    pub fn name_of(&self, id: ConnId) -> Option<&str> {
        self.peers.get(&id).and_then(|p| p.name.as_deref())
    }

    pub fn outbox(&self, id: ConnId) -> Option<&Outbox> {
        self.peers.get(&id).map(|p| &p.outbox)
    }

    pub fn outboxes(&self) -> impl Iterator<Item = &Outbox> {
        self.peers.values().map(|p| &p.outbox)
    }
}

/// Trims and caps the requested name; a blank request gets one from the pool.
pub fn accept_name(requested: &str) -> String {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        let pick = NAME_POOL.choose(&mut rand::thread_rng()).copied().unwrap_or("Player");
        return pick.to_owned();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}
