use ndarray::ArrayView1;

use crate::agent::{DqnAgent, TabularAgent};
use crate::error::Result;
use crate::snapshot::GameSnapshot;

/// The tick-time contract every paddle controller shares: given the current
/// observation, pick an action index. The game loop drives any of the agent
/// types through this one interface.
pub trait Controller {
    /// Returns an action in `[0, action_dim)`.
    fn select_action(&mut self, observation: ArrayView1<f32>) -> Result<usize>;

    /// Current exploration rate.
    fn exploration_rate(&self) -> f32;
}

impl Controller for crate::agent::DqnAgent {
    fn select_action(&mut self, observation: ArrayView1<f32>) -> Result<usize> {
        DqnAgent::select_action(self, observation)
    }

    fn exploration_rate(&self) -> f32 {
        self.epsilon
    }
}

impl Controller for TabularAgent {
    /// Discretizes the continuous observation (the deep agent's 6-dim layout)
    /// and reads the table.
    fn select_action(&mut self, observation: ArrayView1<f32>) -> Result<usize> {
        let snapshot = GameSnapshot {
            ball_x: observation[0],
            ball_y: observation[1],
            ball_vx: observation[2],
            ball_vy: observation[3],
            paddle_y: observation[4],
            paddle_vy: observation[5],
        };
        let bins = self.discretize(&snapshot);
        Ok(TabularAgent::select_action(self, bins))
    }

    fn exploration_rate(&self) -> f32 {
        self.epsilon
    }
}
