use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, Extension},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::{
    registry::{outbox_channel, ConnId},
    state::AppState,
};

pub fn router() -> Router {
    Router::new().route("/ws", get(ws_handler))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    let limit = state.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |s| session(s, state))
}

/* ---------------- per connection ---------------- */
async fn session(sock: WebSocket, state: AppState) {
    let id = ConnId::new();
    let (sink, mut stream) = sock.split();
    let (tx, rx) = outbox_channel();

    let writer = tokio::spawn(writer_task(sink, rx));
    state.connect(id, tx).await;

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(raw)) => state.dispatch(id, &raw).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // binary is not part of the protocol; ping/pong handled by axum
            Err(e) => {
                tracing::debug!(conn = %id, error = %e, "websocket receive error");
                break;
            }
        }
    }

    /* leave */
    // dropping the registry entry drops the only sender, which ends the writer
    state.disconnect(id).await;
    if let Err(e) = writer.await {
        tracing::debug!(conn = %id, error = %e, "writer task failed");
    }
}

/// Owns the socket sink. Runs until the outbox closes or a send fails, then
/// closes the sink so the close handshake completes.
async fn writer_task(mut sink: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if sink.send(msg).await.is_err() {
            return;
        }
    }
    let _ = sink.close().await;
}
