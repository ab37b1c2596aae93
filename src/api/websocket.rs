//! WebSocket layer forwarding store change notices to subscribers.
//!
//! Clients open `GET /ws/updates` and receive one JSON `TableChange`
//! message per documents/events mutation. The socket is one-way; clients
//! re-query the REST endpoints when a notice arrives.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::api::types::AppContext;
use crate::db::ChangeNotifier;

/// WebSocket upgrade handler.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> impl IntoResponse {
    tracing::debug!("WebSocket subscriber connecting");
    let notifier = ctx.notifier.clone();
    ws.on_upgrade(move |socket| handle_ws(socket, notifier))
}

async fn handle_ws(socket: WebSocket, notifier: ChangeNotifier) {
    let (mut sink, mut stream) = socket.split();
    let mut rx = notifier.subscribe();

    loop {
        tokio::select! {
            notice = rx.recv() => {
                match notice {
                    Ok(change) => {
                        let json = match serde_json::to_string(&change) {
                            Ok(j) => j,
                            Err(_) => continue,
                        };
                        if sink.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Client fell behind; it will catch up on the next notice
                        tracing::debug!(skipped, "WebSocket subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound payloads are ignored; the socket is notify-only
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = sink.close().await;
    tracing::debug!("WebSocket subscriber disconnected");
}
