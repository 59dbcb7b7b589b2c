//! WebSocket endpoint for live reload.
//!
//! Each connected browser gets its own broadcast receiver. Build events are
//! pushed as JSON text frames; anything the browser sends is ignored until it
//! closes the socket.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;

use super::events::LiveEvent;
use crate::state::AppState;

/// Upgrade `/ws/live-reload` requests.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Some(live_reload) = &state.live_reload {
            forward_events(socket, live_reload.subscribe()).await;
        }
    })
}

async fn forward_events(mut socket: WebSocket, mut events: Receiver<LiveEvent>) {
    tracing::debug!("Live reload client connected");
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let Some(frame) = encode(&event) else { continue };
                    if socket.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Live reload client fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!("Live reload client disconnected");
}

fn encode(event: &LiveEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode live event");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_reload_event() {
        let frame = encode(&LiveEvent::reload("/guide")).unwrap();

        let Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value["type"], "reload");
        assert_eq!(value["path"], "/guide");
    }
}
