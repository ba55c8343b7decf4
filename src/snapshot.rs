use ndarray::{array, Array1};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Immutable snapshot of the game state the environment exports once per tick.
///
/// The engine is free to keep whatever internal representation it likes; this
/// is the only shape the learning core ever sees. Positions are in field
/// coordinates, velocities in units per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_vx: f32,
    pub ball_vy: f32,
    pub paddle_y: f32,
    pub paddle_vy: f32,
}

impl GameSnapshot {
    /// The 6-dimensional observation vector fed to the deep agent, in the
    /// fixed order the network was trained with.
    pub fn observation(&self) -> Array1<f32> {
        array![
            self.ball_x,
            self.ball_y,
            self.ball_vx,
            self.ball_vy,
            self.paddle_y,
            self.paddle_vy,
        ]
    }
}

/// Reward magnitudes the environment adapter hands to the agent.
///
/// The signs and relative ordering are the contract (a hit is worth less than
/// a won point, a lost point is negative); the magnitudes are a tuning knob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardShaping {
    /// Paddle touched the ball
    pub hit: f32,
    /// Agent won the point
    pub win: f32,
    /// Agent let the ball past
    pub loss: f32,
}

impl Default for RewardShaping {
    fn default() -> Self {
        RewardShaping {
            hit: 1.0,
            win: 2.0,
            loss: -2.0,
        }
    }
}

impl RewardShaping {
    pub fn validate(&self) -> Result<()> {
        if !(self.loss < 0.0) {
            return Err(AgentError::invalid_parameter("loss", "must be negative"));
        }
        if !(self.hit > 0.0 && self.win > self.hit) {
            return Err(AgentError::invalid_parameter(
                "hit/win",
                "must satisfy 0 < hit < win",
            ));
        }
        Ok(())
    }
}
