use crate::ball::Ball;
use crate::player::Player;
use pong_shared::config::GameConfig;
use pong_shared::protocol::{ConnectionId, GameStateWire, GameStatus, Side};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Game is full")]
    RoomFull,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetError {
    #[error("Game is not finished")]
    NotFinished,
}

/// What a single simulation step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// Side whose opponent let the ball past. `Some` even if nobody was there to score.
    pub scored: Option<Side>,
    /// Set on the tick that ended the match.
    pub finished: Option<ConnectionId>,
}

/// A two-player room.
///
/// `Playing` holds exactly when two players are present and the match has not
/// been won. The game itself does not run a timer; the owner calls [`Game::tick`]
/// at `tick_rate_hz` while [`Game::is_playing`] is true.
pub struct Game {
    config: GameConfig,
    players: BTreeMap<ConnectionId, Player>,
    ball: Ball,
    status: GameStatus,
    winner: Option<ConnectionId>,
    rng: ChaCha8Rng,
}

impl Game {
    pub fn new(config: GameConfig, mut rng: ChaCha8Rng) -> Self {
        let ball = Ball::new(config, &mut rng);
        Self {
            config,
            players: BTreeMap::new(),
            ball,
            status: GameStatus::Waiting,
            winner: None,
            rng,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub fn winner(&self) -> Option<ConnectionId> {
        self.winner
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: ConnectionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: ConnectionId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn ball_mut(&mut self) -> &mut Ball {
        &mut self.ball
    }

    /// Seat a connection. The first seat taken is the left one.
    ///
    /// Joining again from an already seated connection returns the existing
    /// player unchanged. The second seat being filled starts the match.
    pub fn add_player(&mut self, id: ConnectionId) -> Result<&Player, JoinError> {
        if !self.players.contains_key(&id) {
            if self.players.len() >= 2 {
                return Err(JoinError::RoomFull);
            }

            let side = if self.side_taken(Side::Left) {
                Side::Right
            } else {
                Side::Left
            };
            self.players.insert(id, Player::new(id, side, self.config));
            tracing::info!("Player {} joined on the {:?} side", id, side);

            if self.players.len() == 2 {
                self.start_match();
            }
        }

        self.players.get(&id).ok_or(JoinError::RoomFull)
    }

    /// Remove a connection's player, if any. Leaving mid-match pauses the room
    /// back to `Waiting` without touching the remaining score. A finished result
    /// is kept while someone from that match is still seated, and cleared once
    /// the room is empty.
    pub fn remove_player(&mut self, id: ConnectionId) -> Option<Player> {
        let removed = self.players.remove(&id)?;
        tracing::info!("Player {} left the {:?} side", id, removed.side());

        if self.players.len() < 2 && self.status == GameStatus::Playing {
            self.status = GameStatus::Waiting;
            tracing::info!("Match paused, waiting for opponent");
        } else if self.players.is_empty() && self.status == GameStatus::Finished {
            self.status = GameStatus::Waiting;
            self.winner = None;
            self.ball.reset(&mut self.rng);
            tracing::info!("Room emptied, finished match cleared");
        }
        Some(removed)
    }

    /// Clear a finished match. Play resumes right away if both seats are taken.
    pub fn reset_match(&mut self) -> Result<(), ResetError> {
        if self.status != GameStatus::Finished {
            return Err(ResetError::NotFinished);
        }

        self.clear_scores();
        if self.players.len() == 2 {
            self.start_match();
        } else {
            self.status = GameStatus::Waiting;
            self.ball.reset(&mut self.rng);
        }
        Ok(())
    }

    /// Run one simulation step. Does nothing unless playing.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if self.status != GameStatus::Playing {
            return outcome;
        }

        for player in self.players.values_mut() {
            player.advance_paddle();
        }

        self.ball.advance();

        for player in self.players.values() {
            if self.ball.collides_with_paddle(
                player.paddle_x(),
                player.paddle_y(),
                self.config.paddle_width,
                self.config.paddle_height,
            ) {
                self.ball.reflect_horizontal();
            }
        }

        let x = self.ball.state.position.x;
        let scorer_side = if x < 0.0 {
            Some(Side::Right)
        } else if x > self.config.canvas_width {
            Some(Side::Left)
        } else {
            None
        };

        if let Some(side) = scorer_side {
            outcome.scored = Some(side);
            outcome.finished = self.award_point(side);
            self.ball.reset(&mut self.rng);
        }

        outcome
    }

    /// Deep copy of the public state.
    pub fn snapshot(&self) -> GameStateWire {
        GameStateWire {
            players: self
                .players
                .iter()
                .map(|(id, player)| (*id, player.snapshot()))
                .collect(),
            ball: self.ball.state,
            game_status: self.status,
            winner: self.winner,
        }
    }

    fn side_taken(&self, side: Side) -> bool {
        self.players.values().any(|p| p.side() == side)
    }

    fn start_match(&mut self) {
        if self.status == GameStatus::Finished {
            self.clear_scores();
        }
        self.status = GameStatus::Playing;
        self.ball.reset(&mut self.rng);
        tracing::info!("Match started");
    }

    fn clear_scores(&mut self) {
        for player in self.players.values_mut() {
            player.score = 0;
        }
        self.winner = None;
    }

    /// Give `side` a point. Returns the winner if that point ended the match.
    fn award_point(&mut self, side: Side) -> Option<ConnectionId> {
        let winning_score = self.config.winning_score;
        let scorer = self.players.values_mut().find(|p| p.side() == side)?;
        scorer.score += 1;
        tracing::debug!("Player {} ({:?}) scored, now {}", scorer.id, side, scorer.score);

        if scorer.score >= winning_score {
            let winner = scorer.id;
            self.status = GameStatus::Finished;
            self.winner = Some(winner);
            tracing::info!("Match finished, player {} wins", winner);
            return Some(winner);
        }
        None
    }
}
