use pong_shared::config::GameConfig;
use pong_shared::protocol::{BallState, Position, Velocity};
use rand::Rng;

/// The ball: a `ball_size` square whose top-left corner is `state.position`.
#[derive(Debug, Clone)]
pub struct Ball {
    pub state: BallState,
    config: GameConfig,
}

impl Ball {
    /// Create a ball already served from the center.
    pub fn new(config: GameConfig, rng: &mut impl Rng) -> Self {
        let mut ball = Self {
            state: BallState::default(),
            config,
        };
        ball.reset(rng);
        ball
    }

    /// Center the ball and pick a new random serve.
    ///
    /// Horizontal speed is always exactly `ball_speed` toward a random side,
    /// vertical speed is uniform in `[-ball_speed, ball_speed]`.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        let speed = self.config.ball_speed;
        self.state = BallState {
            position: Position {
                x: self.config.canvas_width / 2.0,
                y: self.config.canvas_height / 2.0,
            },
            velocity: Velocity {
                x: if rng.gen_bool(0.5) { speed } else { -speed },
                y: rng.gen_range(-speed..=speed),
            },
        };
    }

    /// Move one tick and bounce off the top/bottom walls.
    ///
    /// The position is not clamped, so the ball may sit past a wall for a tick.
    pub fn advance(&mut self) {
        let pos = &mut self.state.position;
        let vel = &mut self.state.velocity;
        pos.x += vel.x;
        pos.y += vel.y;

        if pos.y <= 0.0 || pos.y >= self.config.canvas_height {
            vel.y = -vel.y;
        }
    }

    /// Strict AABB overlap with a paddle rectangle. Touching edges do not count.
    pub fn collides_with_paddle(
        &self,
        paddle_x: f64,
        paddle_y: f64,
        paddle_width: f64,
        paddle_height: f64,
    ) -> bool {
        let size = self.config.ball_size;
        let left = self.state.position.x;
        let top = self.state.position.y;

        left < paddle_x + paddle_width
            && left + size > paddle_x
            && top < paddle_y + paddle_height
            && top + size > paddle_y
    }

    pub fn reflect_horizontal(&mut self) {
        self.state.velocity.x = -self.state.velocity.x;
    }
}
