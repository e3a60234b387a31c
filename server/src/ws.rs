use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::game_loop::{GameBroadcast, GameCommand};
use pong_shared::protocol::ClientMsg;

/// Largest accepted client frame. Every valid command is far smaller.
pub const MAX_MESSAGE_BYTES: usize = 1024;
/// Unparsable frames tolerated before the connection is dropped.
pub const MAX_PARSE_ERRORS: u32 = 5;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub game_tx: mpsc::Sender<GameCommand>,
    pub broadcast_tx: broadcast::Sender<GameBroadcast>,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe first so nothing sent after our id is allocated is missed.
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .game_tx
        .send(GameCommand::Connect { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Connect command");
        return;
    }

    let my_id = match resp_rx.await {
        Ok(id) => id,
        Err(_) => {
            tracing::error!("Failed to receive connection id");
            return;
        }
    };

    let mut parse_errors: u32 = 0;

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if text.len() > MAX_MESSAGE_BYTES {
                            tracing::warn!(
                                "Connection {} sent oversized message ({} bytes)",
                                my_id,
                                text.len()
                            );
                            break;
                        }
                        match serde_json::from_str::<ClientMsg>(text.as_str()) {
                            Ok(client_msg) => {
                                if app_state
                                    .game_tx
                                    .send(GameCommand::Client { id: my_id, msg: client_msg })
                                    .await
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            Err(e) => {
                                parse_errors += 1;
                                tracing::warn!(
                                    "Connection {} sent invalid message: {}",
                                    my_id,
                                    e
                                );
                                if parse_errors >= MAX_PARSE_ERRORS {
                                    tracing::warn!(
                                        "Connection {} dropped after {} parse errors",
                                        my_id,
                                        parse_errors
                                    );
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(out) => {
                        if !out.target.includes(my_id) {
                            continue;
                        }
                        let json = match serde_json::to_string(&out.msg) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to encode {:?}: {}", out.msg, e);
                                continue;
                            }
                        };
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Skipped snapshots are superseded by the next tick, but a
                        // skipped playerJoined or error reply is lost for good.
                        tracing::warn!(
                            "Connection {} lagged by {} messages, replies may be lost",
                            my_id,
                            n
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = sink.close().await;
    let _ = app_state
        .game_tx
        .send(GameCommand::Disconnect { id: my_id })
        .await;
}
