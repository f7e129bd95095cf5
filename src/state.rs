use std::{path::PathBuf, sync::Arc};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    broadcast::{broadcast, send_to},
    leaderboard::LeaderboardStore,
    protocol::{ClientMsg, ServerMsg},
    registry::{accept_name, ConnId, Outbox, Registry},
};

/* ------------ server context ------------ */
/// Registry and leaderboard sit behind one lock: every connect, message and
/// disconnect runs to completion before the next one starts.
pub struct Relay {
    pub registry: Registry,
    pub store: LeaderboardStore,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<Relay>>,
    pub static_dir: PathBuf,
    pub max_message_bytes: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub players: usize,
    pub records: usize,
}

impl AppState {
    pub fn new(store: LeaderboardStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Relay { registry: Registry::default(), store })),
            static_dir: "static".into(),
            max_message_bytes: 4096,
        }
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_max_message_bytes(mut self, n: usize) -> Self {
        self.max_message_bytes = n;
        self
    }

    /// New transport, no name yet. Nothing is broadcast until it registers.
    pub async fn connect(&self, id: ConnId, outbox: Outbox) {
        let mut relay = self.inner.lock().await;
        relay.registry.connect(id, outbox);
        tracing::info!(conn = %id, open = relay.registry.count(), "connected");
    }

    pub async fn dispatch(&self, id: ConnId, raw: &str) {
        match crate::protocol::parse_client(raw) {
            Some(ClientMsg::Register { name }) => self.register(id, &name).await,
            Some(ClientMsg::UpdateScore { score }) => self.update_score(id, score).await,
            None => {
                let preview: String = raw.chars().take(100).collect();
                tracing::debug!(conn = %id, raw = %preview, "ignoring malformed message");
            }
        }
    }

    pub async fn register(&self, id: ConnId, requested: &str) {
        let name = accept_name(requested);
        let mut relay = self.inner.lock().await;
        if !relay.registry.register(id, name.clone()) {
            return;
        }
        tracing::info!(conn = %id, name = %name, "registered");

        let Relay { registry, store } = &*relay;
        send_to(registry, id, &ServerMsg::Welcome { name: name.clone() });
        broadcast(registry, &ServerMsg::PlayerCount { count: registry.count() });
        send_to(registry, id, &ServerMsg::GlobalRecords { records: store.snapshot() });
        broadcast(registry, &ServerMsg::joined(&name));
    }

    /// Scores are taken as reported; there is no server-side validation.
    pub async fn update_score(&self, id: ConnId, score: i64) {
        let mut relay = self.inner.lock().await;
        let Some(name) = relay.registry.name_of(id).map(str::to_owned) else {
            tracing::debug!(conn = %id, score, "score from unregistered connection ignored");
            return;
        };
        if !relay.store.submit_score(&name, score) {
            return;
        }
        tracing::info!(name = %name, score, "leaderboard changed");

        if let Err(e) = relay.store.persist().await {
            tracing::error!(path = %relay.store.path().display(), error = %e, "failed to persist leaderboard");
        }
        let records = relay.store.snapshot();
        broadcast(&relay.registry, &ServerMsg::GlobalRecords { records });
    }

    pub async fn disconnect(&self, id: ConnId) {
        let mut relay = self.inner.lock().await;
        let name = relay.registry.disconnect(id);
        tracing::info!(conn = %id, name = ?name, open = relay.registry.count(), "disconnected");

        if let Some(name) = name {
            broadcast(&relay.registry, &ServerMsg::left(&name));
        }
        broadcast(&relay.registry, &ServerMsg::PlayerCount { count: relay.registry.count() });
    }

    pub async fn stats(&self) -> Stats {
        let relay = self.inner.lock().await;
        Stats { players: relay.registry.count(), records: relay.store.len() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::Record;
    use axum::extract::ws::Message;
    use serde_json::{json, Value};
    use tokio::sync::mpsc::Receiver;
    use crate::registry::outbox_channel;

    async fn state_in(dir: &tempfile::TempDir) -> AppState {
        AppState::new(LeaderboardStore::initialize(dir.path().join("board.json")).await)
    }

    async fn join(state: &AppState) -> (ConnId, Receiver<Message>) {
        let id = ConnId::new();
        let (tx, rx) = outbox_channel();
        state.connect(id, tx).await;
        (id, rx)
    }

    fn drain(rx: &mut Receiver<Message>) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(Message::Text(t)) = rx.try_recv() {
            out.push(serde_json::from_str(&t).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn register_handshake_order() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        assert!(drain(&mut ra).is_empty(), "bare connect must not broadcast");

        state.dispatch(a, r#"{"type":"register","name":"Alice"}"#).await;
        assert_eq!(
            drain(&mut ra),
            vec![
                json!({"type": "welcome", "name": "Alice"}),
                json!({"type": "playerCount", "count": 1}),
                json!({"type": "globalRecords", "records": []}),
                json!({"type": "activityLog", "log": ["Alice joined the game"]}),
            ]
        );
    }

    #[tokio::test]
    async fn others_see_count_and_join_but_not_private_replies() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        state.register(a, "Alice").await;
        drain(&mut ra);

        let (b, mut rb) = join(&state).await;
        state.register(b, "Bob").await;
        assert_eq!(
            drain(&mut ra),
            vec![
                json!({"type": "playerCount", "count": 2}),
                json!({"type": "activityLog", "log": ["Bob joined the game"]}),
            ]
        );
        assert_eq!(drain(&mut rb).len(), 4);
    }

    #[tokio::test]
    async fn score_updates_broadcast_only_on_change_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        let (b, mut rb) = join(&state).await;
        state.register(a, "Alice").await;
        state.register(b, "Bob").await;
        drain(&mut ra);
        drain(&mut rb);

        state.dispatch(a, r#"{"type":"updateScore","score":100}"#).await;
        state.update_score(b, 200).await;
        state.update_score(a, 150).await;
        state.update_score(a, 120).await; // no-op

        let seen = drain(&mut rb);
        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen.last().unwrap(),
            &json!({"type": "globalRecords", "records": [
                {"name": "Bob", "score": 200},
                {"name": "Alice", "score": 150},
            ]})
        );

        let on_disk: Vec<Record> =
            serde_json::from_slice(&std::fs::read(dir.path().join("board.json")).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk[0], Record { name: "Bob".into(), score: 200 });
    }

    #[tokio::test]
    async fn unregistered_scores_and_garbage_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;

        state.update_score(a, 999).await;
        state.dispatch(a, "{{{").await;
        state.dispatch(a, r#"{"type":"teleport"}"#).await;

        assert!(drain(&mut ra).is_empty());
        assert_eq!(state.stats().await, Stats { players: 1, records: 0 });
    }

    #[tokio::test]
    async fn disconnect_announces_named_players_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        let (b, _rb) = join(&state).await;
        let (c, _rc) = join(&state).await;
        state.register(a, "Alice").await;
        state.register(b, "Bob").await;
        drain(&mut ra);

        state.disconnect(b).await;
        assert_eq!(
            drain(&mut ra),
            vec![
                json!({"type": "activityLog", "log": ["Bob left the game"]}),
                json!({"type": "playerCount", "count": 2}),
            ]
        );

        state.disconnect(c).await;
        assert_eq!(drain(&mut ra), vec![json!({"type": "playerCount", "count": 1})]);
    }

    #[tokio::test]
    async fn closed_peer_does_not_block_broadcast() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        let (b, rb) = join(&state).await;
        state.register(a, "Alice").await;
        state.register(b, "Bob").await;
        drain(&mut ra);
        drop(rb); // mid-close: transport gone, registry not yet told

        state.update_score(a, 10).await;
        assert_eq!(drain(&mut ra).len(), 1);
    }

    #[tokio::test]
    async fn re_register_rebinds_without_a_second_seat() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir).await;
        let (a, mut ra) = join(&state).await;
        state.register(a, "Alice").await;
        state.update_score(a, 10).await;
        drain(&mut ra);

        state.dispatch(a, r#"{"type":"register","name":"Alicia"}"#).await;
        let seen = drain(&mut ra);
        assert_eq!(seen[0], json!({"type": "welcome", "name": "Alicia"}));
        assert_eq!(seen[1], json!({"type": "playerCount", "count": 1}));
        assert_eq!(seen[3], json!({"type": "activityLog", "log": ["Alicia joined the game"]}));

        // scores now land under the new name
        state.update_score(a, 20).await;
        assert_eq!(
            drain(&mut ra),
            vec![json!({"type": "globalRecords", "records": [
                {"name": "Alicia", "score": 20},
                {"name": "Alice", "score": 10},
            ]})]
        );
        assert_eq!(state.stats().await, Stats { players: 1, records: 2 });

        state.disconnect(a).await;
        assert_eq!(state.stats().await.players, 0);
    }
}
