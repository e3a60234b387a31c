//! Integration tests for the pong server.
//!
//! These tests start a real server instance and connect via WebSocket
//! to verify end-to-end behavior.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type Ws =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

// Re-create minimal protocol types for testing (decoupled from server types)
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[allow(dead_code)]
enum ServerMsg {
    GameStateUpdate {
        players: serde_json::Value,
        ball: serde_json::Value,
        #[serde(rename = "gameStatus")]
        game_status: String,
        #[serde(default)]
        winner: Option<u32>,
    },
    PlayerJoined {
        id: u32,
        #[serde(rename = "paddleY")]
        paddle_y: f64,
        score: u32,
        side: String,
    },
    PlayerLeft {
        id: u32,
    },
    GameStart,
    GameEnd {
        winner: u32,
    },
    Error {
        message: String,
    },
}

/// Start a test server on a random available port and return the WebSocket URL.
async fn start_test_server() -> String {
    use pong_server::config::ServerConfig;
    use pong_server::game_loop::{run_game_loop, GameBroadcast, GameCommand};
    use pong_server::ws::AppState;
    use pong_shared::config::GameConfig;

    // Find an available port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        listen_addr: addr.to_string(),
        rng_seed: Some(12345),
        ..Default::default()
    };

    let (game_tx, game_rx) = mpsc::channel::<GameCommand>(config.command_capacity);
    let (broadcast_tx, _) = broadcast::channel::<GameBroadcast>(256);

    let app_state = AppState {
        game_tx,
        broadcast_tx: broadcast_tx.clone(),
    };

    // Start game loop
    tokio::spawn(async move {
        run_game_loop(game_rx, broadcast_tx, GameConfig::default(), config).await;
    });

    // Start HTTP/WebSocket server
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(pong_server::ws::ws_handler))
        .with_state(app_state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("ws://{}/ws", addr)
}

/// Connect to the server and return the WebSocket stream.
async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

async fn send_json(ws: &mut Ws, json: &str) {
    ws.send(Message::Text(json.to_string().into())).await.unwrap();
}

async fn join(ws: &mut Ws) {
    send_json(ws, r#"{"type":"joinGame"}"#).await;
}

/// Read the next text message and parse as ServerMsg.
async fn recv_msg(ws: &mut Ws) -> ServerMsg {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("Failed to parse server message");
            }
            Some(Ok(_)) => continue, // Skip ping/pong
            Some(Err(e)) => panic!("WebSocket error: {}", e),
            None => panic!("WebSocket closed unexpectedly"),
        }
    }
}

/// Read messages until `pick` accepts one, or give up after `timeout`.
async fn recv_until<T>(
    ws: &mut Ws,
    timeout: Duration,
    mut pick: impl FnMut(ServerMsg) -> Option<T>,
) -> Option<T> {
    tokio::time::timeout(timeout, async {
        loop {
            if let Some(found) = pick(recv_msg(ws).await) {
                return found;
            }
        }
    })
    .await
    .ok()
}

const WAIT: Duration = Duration::from_secs(2);

/// Join and return (id, side) from the playerJoined reply.
async fn join_and_get_seat(ws: &mut Ws) -> (u32, String) {
    join(ws).await;
    recv_until(ws, WAIT, |msg| match msg {
        ServerMsg::PlayerJoined { id, side, .. } => Some((id, side)),
        _ => None,
    })
    .await
    .expect("Expected PlayerJoined")
}

/// Wait until the connection is closed by the server.
async fn wait_for_close(ws: &mut Ws) -> bool {
    for _ in 0..10 {
        match tokio::time::timeout(Duration::from_millis(100), ws.next()).await {
            Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) => return true,
            Err(_) => {
                // Timeout - try sending to check if connection is dead
                if ws.send(Message::Ping(vec![].into())).await.is_err() {
                    return true;
                }
            }
            _ => continue,
        }
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_first_join_is_left_and_waiting() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    join(&mut ws).await;

    match recv_msg(&mut ws).await {
        ServerMsg::PlayerJoined {
            paddle_y,
            score,
            side,
            ..
        } => {
            assert_eq!(side, "left");
            assert_eq!(score, 0);
            assert_eq!(paddle_y, 160.0);
        }
        other => panic!("Expected PlayerJoined, got {:?}", other),
    }
    match recv_msg(&mut ws).await {
        ServerMsg::GameStateUpdate { game_status, .. } => assert_eq!(game_status, "waiting"),
        other => panic!("Expected GameStateUpdate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_second_join_is_right_and_starts_game() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;

    let (id1, side1) = join_and_get_seat(&mut ws1).await;
    let (id2, side2) = join_and_get_seat(&mut ws2).await;

    assert_ne!(id1, id2, "Each connection should get a unique id");
    assert_eq!(side1, "left");
    assert_eq!(side2, "right");

    for ws in [&mut ws1, &mut ws2] {
        let started = recv_until(ws, WAIT, |msg| match msg {
            ServerMsg::GameStart => Some(()),
            _ => None,
        })
        .await;
        assert!(started.is_some(), "Both players should receive gameStart");
    }

    // Snapshots keep streaming while playing.
    let playing = recv_until(&mut ws1, WAIT, |msg| match msg {
        ServerMsg::GameStateUpdate {
            players,
            game_status,
            ..
        } if game_status == "playing" => Some(players),
        _ => None,
    })
    .await
    .expect("Expected a playing snapshot");
    assert_eq!(playing.as_object().map(|p| p.len()), Some(2));
}

#[tokio::test]
async fn test_third_join_gets_game_full_error() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;
    let mut ws3 = connect(&url).await;

    join_and_get_seat(&mut ws1).await;
    join_and_get_seat(&mut ws2).await;

    join(&mut ws3).await;
    let error = recv_until(&mut ws3, WAIT, |msg| match msg {
        ServerMsg::Error { message } => Some(message),
        ServerMsg::PlayerJoined { .. } => panic!("Third player must not be seated"),
        _ => None,
    })
    .await;
    assert_eq!(error.as_deref(), Some("Game is full"));
}

#[tokio::test]
async fn test_paddle_move_changes_snapshot() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;

    let (id1, _) = join_and_get_seat(&mut ws1).await;
    join_and_get_seat(&mut ws2).await;

    send_json(&mut ws1, r#"{"type":"paddleMove","direction":"up"}"#).await;

    let moved = recv_until(&mut ws2, WAIT, |msg| match msg {
        ServerMsg::GameStateUpdate { players, .. } => {
            let y = players[id1.to_string()]["paddleY"].as_f64()?;
            (y < 160.0).then_some(y)
        }
        _ => None,
    })
    .await;
    assert!(moved.is_some(), "Left paddle should move up");

    send_json(&mut ws1, r#"{"type":"paddleStop"}"#).await;
}

#[tokio::test]
async fn test_player_disconnect_returns_room_to_waiting() {
    let url = start_test_server().await;
    let mut ws1 = connect(&url).await;
    let mut ws2 = connect(&url).await;

    let (id1, _) = join_and_get_seat(&mut ws1).await;
    let (id2, _) = join_and_get_seat(&mut ws2).await;

    ws1.close(None).await.unwrap();

    let left = recv_until(&mut ws2, WAIT, |msg| match msg {
        ServerMsg::PlayerLeft { id } => Some(id),
        _ => None,
    })
    .await;
    assert_eq!(left, Some(id1));

    let (status, players) = recv_until(&mut ws2, WAIT, |msg| match msg {
        ServerMsg::GameStateUpdate {
            game_status,
            players,
            ..
        } => Some((game_status, players)),
        _ => None,
    })
    .await
    .expect("Expected GameStateUpdate after leave");
    assert_eq!(status, "waiting");
    assert!(players.get(id1.to_string()).is_none());
    assert_eq!(players[id2.to_string()]["side"], "right");
}

#[tokio::test]
async fn test_unjoined_commands_are_ignored() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    send_json(&mut ws, r#"{"type":"paddleMove","direction":"down"}"#).await;
    send_json(&mut ws, r#"{"type":"paddleStop"}"#).await;

    // Connection stays usable and can still join.
    let (_, side) = join_and_get_seat(&mut ws).await;
    assert_eq!(side, "left");
}

#[tokio::test]
async fn test_oversized_message_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    let huge_payload = "x".repeat(2000);
    let msg = format!(r#"{{"type":"joinGame","extra":"{}"}}"#, huge_payload);
    let _ = ws.send(Message::Text(msg.into())).await;

    assert!(
        wait_for_close(&mut ws).await,
        "Client should be disconnected after oversized message"
    );
}

#[tokio::test]
async fn test_parse_spam_disconnects_client() {
    let url = start_test_server().await;
    let mut ws = connect(&url).await;

    for _ in 0..10 {
        if ws
            .send(Message::Text("not valid json".into()))
            .await
            .is_err()
        {
            break;
        }
    }

    assert!(
        wait_for_close(&mut ws).await,
        "Client should be disconnected after too many parse errors"
    );
}
