use std::time::Duration;

/// Playfield and tuning constants. The client renders with the same values,
/// so the defaults must not drift.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Side length of the square ball
    pub ball_size: f64,
    /// Paddle travel per tick (px)
    pub paddle_speed: f64,
    /// Per-axis ball speed bound (px per tick)
    pub ball_speed: f64,
    pub winning_score: u32,
    pub tick_rate_hz: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 400.0,
            paddle_width: 10.0,
            paddle_height: 80.0,
            ball_size: 10.0,
            paddle_speed: 5.0,
            ball_speed: 3.0,
            winning_score: 5,
            tick_rate_hz: 60,
        }
    }
}

impl GameConfig {
    /// Time between two simulation steps.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }

    /// Largest allowed paddle y (top edge).
    pub fn paddle_max_y(&self) -> f64 {
        self.canvas_height - self.paddle_height
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.canvas_width.is_finite() || self.canvas_width <= 0.0 {
            return Err("canvas_width must be finite and > 0".to_string());
        }
        if !self.canvas_height.is_finite() || self.canvas_height <= 0.0 {
            return Err("canvas_height must be finite and > 0".to_string());
        }
        if !self.paddle_height.is_finite()
            || self.paddle_height <= 0.0
            || self.paddle_height > self.canvas_height
        {
            return Err("paddle_height must be in (0, canvas_height]".to_string());
        }
        if !self.paddle_width.is_finite()
            || self.paddle_width <= 0.0
            || self.paddle_width * 2.0 >= self.canvas_width
        {
            return Err("paddle_width must be > 0 and leave room between paddles".to_string());
        }
        if !self.ball_size.is_finite() || self.ball_size <= 0.0 {
            return Err("ball_size must be finite and > 0".to_string());
        }
        if !self.paddle_speed.is_finite() || self.paddle_speed <= 0.0 {
            return Err("paddle_speed must be finite and > 0".to_string());
        }
        if !self.ball_speed.is_finite() || self.ball_speed <= 0.0 {
            return Err("ball_speed must be finite and > 0".to_string());
        }
        if self.winning_score == 0 {
            return Err("winning_score must be >= 1".to_string());
        }
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be >= 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_game_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_match_client_constants() {
        let config = GameConfig::default();
        assert_eq!(config.canvas_width, 800.0);
        assert_eq!(config.canvas_height, 400.0);
        assert_eq!(config.paddle_width, 10.0);
        assert_eq!(config.paddle_height, 80.0);
        assert_eq!(config.ball_size, 10.0);
        assert_eq!(config.paddle_speed, 5.0);
        assert_eq!(config.ball_speed, 3.0);
        assert_eq!(config.winning_score, 5);
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.paddle_max_y(), 320.0);
    }

    #[test]
    fn tick_period_is_sixtieth_of_a_second() {
        let period = GameConfig::default().tick_period();
        assert!((period.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn paddle_taller_than_canvas_invalid() {
        let mut config = GameConfig::default();
        config.paddle_height = 500.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_winning_score_invalid() {
        let mut config = GameConfig::default();
        config.winning_score = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_tick_rate_invalid() {
        let mut config = GameConfig::default();
        config.tick_rate_hz = 0;
        assert!(config.validate().is_err());
    }
}
