use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

/// Server-allocated identifier of one WebSocket connection.
pub type ConnectionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct BallState {
    pub position: Position,
    pub velocity: Velocity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

// === Server -> Client ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    GameStateUpdate(GameStateWire),
    /// Sent only to the connection that joined.
    PlayerJoined(PlayerWire),
    PlayerLeft { id: ConnectionId },
    GameStart,
    GameEnd { winner: ConnectionId },
    /// Sent only to the offending connection.
    Error { message: String },
}

/// Public view of a player. Movement intent is server-private and never sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: ConnectionId,
    pub paddle_y: f64,
    pub score: u32,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameStateWire {
    /// JSON object keys are strings, so ids are parsed back on read.
    #[serde(deserialize_with = "players_by_id")]
    pub players: BTreeMap<ConnectionId, PlayerWire>,
    pub ball: BallState,
    pub game_status: GameStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub winner: Option<ConnectionId>,
}

// Tagged messages are buffered before decoding, which leaves numeric map
// keys as strings. Read them as strings and parse.
fn players_by_id<'de, D>(deserializer: D) -> Result<BTreeMap<ConnectionId, PlayerWire>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, PlayerWire>::deserialize(deserializer)?
        .into_iter()
        .map(|(key, player)| {
            key.parse::<ConnectionId>()
                .map(|id| (id, player))
                .map_err(|_| D::Error::custom(format!("invalid player id {:?}", key)))
        })
        .collect()
}

// === Client -> Server ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    JoinGame,
    PaddleMove { direction: Direction },
    PaddleStop,
    /// Start a fresh match after one has finished.
    ResetGame,
}
