use pong_shared::config::GameConfig;
use pong_shared::protocol::{ConnectionId, Direction, PlayerWire, Side};

/// Latched paddle direction. Stays set across ticks until cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    Idle,
    Up,
    Down,
}

impl From<Direction> for Intent {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Intent::Up,
            Direction::Down => Intent::Down,
        }
    }
}

/// One participant: a paddle pinned to its side of the canvas plus a score.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    side: Side,
    pub(crate) paddle_y: f64,
    pub(crate) score: u32,
    intent: Intent,
    config: GameConfig,
}

impl Player {
    pub fn new(id: ConnectionId, side: Side, config: GameConfig) -> Self {
        Self {
            id,
            side,
            paddle_y: config.canvas_height / 2.0 - config.paddle_height / 2.0,
            score: 0,
            intent: Intent::Idle,
            config,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn paddle_y(&self) -> f64 {
        self.paddle_y
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn set_intent(&mut self, direction: Direction) {
        self.intent = direction.into();
    }

    pub fn clear_intent(&mut self) {
        self.intent = Intent::Idle;
    }

    /// Move the paddle one tick along the current intent, kept inside the canvas.
    pub fn advance_paddle(&mut self) {
        let step = match self.intent {
            Intent::Idle => return,
            Intent::Up => -self.config.paddle_speed,
            Intent::Down => self.config.paddle_speed,
        };
        self.paddle_y = (self.paddle_y + step).clamp(0.0, self.config.paddle_max_y());
    }

    /// Left edge of the paddle. Derived from the side, never transmitted.
    pub fn paddle_x(&self) -> f64 {
        match self.side {
            Side::Left => 0.0,
            Side::Right => self.config.canvas_width - self.config.paddle_width,
        }
    }

    pub fn snapshot(&self) -> PlayerWire {
        PlayerWire {
            id: self.id,
            paddle_y: self.paddle_y,
            score: self.score,
            side: self.side,
        }
    }
}
