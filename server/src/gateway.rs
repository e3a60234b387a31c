use crate::game::Game;
use pong_shared::protocol::{ClientMsg, ConnectionId, ServerMsg};
use std::collections::HashSet;

/// Who an outbound message is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Only(ConnectionId),
}

impl Target {
    pub fn includes(&self, id: ConnectionId) -> bool {
        match self {
            Target::All => true,
            Target::Only(target) => *target == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub target: Target,
    pub msg: ServerMsg,
}

impl Outbound {
    pub fn all(msg: ServerMsg) -> Self {
        Self {
            target: Target::All,
            msg,
        }
    }

    pub fn only(id: ConnectionId, msg: ServerMsg) -> Self {
        Self {
            target: Target::Only(id),
            msg,
        }
    }
}

/// Maps connection events onto the room and decides what each connection is told.
///
/// Holds no I/O; every call returns the messages to deliver, in order.
pub struct SessionGateway {
    game: Game,
    connections: HashSet<ConnectionId>,
    next_connection_id: ConnectionId,
}

impl SessionGateway {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            connections: HashSet::new(),
            next_connection_id: 1,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn is_playing(&self) -> bool {
        self.game.is_playing()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Register a new connection and return its id.
    pub fn connect(&mut self) -> ConnectionId {
        let id = self.next_connection_id;
        self.next_connection_id += 1;
        self.connections.insert(id);
        id
    }

    pub fn handle(&mut self, id: ConnectionId, msg: ClientMsg) -> Vec<Outbound> {
        match msg {
            ClientMsg::JoinGame => self.join(id),
            ClientMsg::PaddleMove { direction } => {
                if let Some(player) = self.game.player_mut(id) {
                    player.set_intent(direction);
                }
                Vec::new()
            }
            ClientMsg::PaddleStop => {
                if let Some(player) = self.game.player_mut(id) {
                    player.clear_intent();
                }
                Vec::new()
            }
            ClientMsg::ResetGame => self.reset(id),
        }
    }

    /// Drop a connection. Spectators leave silently.
    pub fn disconnect(&mut self, id: ConnectionId) -> Vec<Outbound> {
        self.connections.remove(&id);
        if self.game.remove_player(id).is_none() {
            return Vec::new();
        }

        vec![
            Outbound::all(ServerMsg::PlayerLeft { id }),
            Outbound::all(ServerMsg::GameStateUpdate(self.game.snapshot())),
        ]
    }

    /// Advance the room one step and report the resulting state.
    pub fn tick(&mut self) -> Vec<Outbound> {
        if !self.game.is_playing() {
            return Vec::new();
        }

        let outcome = self.game.tick();
        let mut out = vec![Outbound::all(ServerMsg::GameStateUpdate(
            self.game.snapshot(),
        ))];
        if let Some(winner) = outcome.finished {
            out.push(Outbound::all(ServerMsg::GameEnd { winner }));
        }
        out
    }

    fn join(&mut self, id: ConnectionId) -> Vec<Outbound> {
        let was_playing = self.game.is_playing();
        let joined = match self.game.add_player(id) {
            Ok(player) => player.snapshot(),
            Err(e) => {
                tracing::info!("Connection {} join rejected: {}", id, e);
                return vec![Outbound::only(
                    id,
                    ServerMsg::Error {
                        message: e.to_string(),
                    },
                )];
            }
        };

        let mut out = vec![
            Outbound::only(id, ServerMsg::PlayerJoined(joined)),
            Outbound::all(ServerMsg::GameStateUpdate(self.game.snapshot())),
        ];
        if !was_playing && self.game.is_playing() {
            out.push(Outbound::all(ServerMsg::GameStart));
        }
        out
    }

    fn reset(&mut self, id: ConnectionId) -> Vec<Outbound> {
        if self.game.player(id).is_none() {
            return Vec::new();
        }

        if let Err(e) = self.game.reset_match() {
            return vec![Outbound::only(
                id,
                ServerMsg::Error {
                    message: e.to_string(),
                },
            )];
        }

        tracing::info!("Connection {} reset the match", id);
        let mut out = vec![Outbound::all(ServerMsg::GameStateUpdate(
            self.game.snapshot(),
        ))];
        if self.game.is_playing() {
            out.push(Outbound::all(ServerMsg::GameStart));
        }
        out
    }
}
