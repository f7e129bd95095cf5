//! Best-effort fan-out. No acks, no retries; a closed or full outbox is
//! skipped.
use axum::extract::ws::Message;
use tokio::sync::mpsc::error::TrySendError;

use crate::{
    protocol::ServerMsg,
    registry::{ConnId, Outbox, Registry},
};

fn encode(msg: &ServerMsg) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode server message");
            None
        }
    }
}

fn deliver(outbox: &Outbox, text: &str) -> bool {
    // a closed receiver means the session is going away; not our problem
    if outbox.is_closed() {
        return false;
    }
    match outbox.try_send(Message::Text(text.to_owned())) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!("outbox full, dropping message for slow client");
            false
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Serializes once and queues to every open connection. Returns how many
/// connections accepted the message.
pub fn broadcast(registry: &Registry, msg: &ServerMsg) -> usize {
    let Some(text) = encode(msg) else { return 0 };
    registry.outboxes().filter(|o| deliver(o, &text)).count()
}

/// Single-recipient variant. `false` if the connection is unknown or closed.
pub fn send_to(registry: &Registry, id: ConnId, msg: &ServerMsg) -> bool {
    let Some(outbox) = registry.outbox(id) else { return false };
    encode(msg).is_some_and(|text| deliver(outbox, &text))
}
