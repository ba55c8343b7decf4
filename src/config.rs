use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Hyperparameters for the deep Q-learning agent.
///
/// The set is immutable once the agent is constructed and travels inside the
/// checkpoint bundle, so a loaded agent is fully reproducible. Defaults match
/// the values the paddle controller was tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Observation dimensionality: ball x/y, ball vx/vy, paddle y, paddle vy
    pub state_dim: usize,
    /// Number of discrete paddle actions: up, stay, down
    pub action_dim: usize,
    /// Width of both hidden layers
    pub hidden_dim: usize,
    pub learning_rate: f32,
    /// Discount factor, in [0, 1)
    pub gamma: f32,
    /// Replay buffer capacity
    pub buffer_size: usize,
    pub batch_size: usize,
    /// Hard target-network sync period, in optimization steps
    pub target_update: usize,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    /// Multiplicative epsilon decay applied once per optimization step
    pub epsilon_decay: f32,
    /// Priority exponent for replay sampling
    pub priority_alpha: f32,
    /// Importance-sampling exponent
    pub priority_beta: f32,
    /// Floor added to TD-errors so no transition gets zero sampling probability
    pub priority_epsilon: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            state_dim: 6,
            action_dim: 3,
            hidden_dim: 128,
            learning_rate: 0.001,
            gamma: 0.99,
            buffer_size: 100_000,
            batch_size: 64,
            target_update: 1000,
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay: 0.995,
            priority_alpha: 0.6,
            priority_beta: 0.4,
            priority_epsilon: 1e-6,
        }
    }
}

impl AgentConfig {
    /// Check every hyperparameter. Construction is the only place agents can
    /// fail; once a config passes here, no operation may reject it later.
    pub fn validate(&self) -> Result<()> {
        if self.state_dim == 0 {
            return Err(AgentError::invalid_parameter("state_dim", "must be positive"));
        }
        if self.action_dim == 0 {
            return Err(AgentError::invalid_parameter("action_dim", "must be positive"));
        }
        if self.hidden_dim == 0 {
            return Err(AgentError::invalid_parameter("hidden_dim", "must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(AgentError::invalid_parameter(
                "learning_rate",
                "must be positive and finite",
            ));
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(AgentError::invalid_parameter("gamma", "must be in [0, 1)"));
        }
        if self.buffer_size == 0 {
            return Err(AgentError::invalid_parameter("buffer_size", "must be positive"));
        }
        if self.batch_size == 0 || self.batch_size > self.buffer_size {
            return Err(AgentError::invalid_parameter(
                "batch_size",
                "must be positive and no larger than buffer_size",
            ));
        }
        if self.target_update == 0 {
            return Err(AgentError::invalid_parameter("target_update", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_end) {
            return Err(AgentError::invalid_parameter(
                "epsilon_start/epsilon_end",
                "must be in [0, 1]",
            ));
        }
        if self.epsilon_end > self.epsilon_start {
            return Err(AgentError::invalid_parameter(
                "epsilon_end",
                "must not exceed epsilon_start",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(AgentError::invalid_parameter(
                "epsilon_decay",
                "must be in (0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.priority_alpha) {
            return Err(AgentError::invalid_parameter("priority_alpha", "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.priority_beta) {
            return Err(AgentError::invalid_parameter("priority_beta", "must be in [0, 1]"));
        }
        if !(self.priority_epsilon > 0.0) {
            return Err(AgentError::invalid_parameter(
                "priority_epsilon",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Layer sizes of the value network this config describes
    pub fn layer_sizes(&self) -> [usize; 4] {
        [self.state_dim, self.hidden_dim, self.hidden_dim, self.action_dim]
    }
}

/// Hyperparameters for the tabular Q-learning variant.
///
/// The tabular agent discretizes the continuous observation into bins, so the
/// config also carries the field geometry and speed bound the discretizer
/// scales against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularConfig {
    /// Bins for ball x, ball y, ball vx, ball vy, paddle y
    pub bins: [usize; 5],
    pub action_dim: usize,
    /// Learning rate of the tabular update rule
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    /// Playfield extent the ball/paddle positions are scaled against
    pub field_width: f32,
    pub field_height: f32,
    /// Velocities are shifted by this bound before binning, so
    /// [-max_ball_speed, max_ball_speed] maps onto a contiguous bin range
    pub max_ball_speed: f32,
}

impl Default for TabularConfig {
    fn default() -> Self {
        TabularConfig {
            bins: [12, 12, 6, 6, 12],
            action_dim: 3,
            alpha: 0.1,
            gamma: 0.95,
            epsilon_start: 1.0,
            epsilon_min: 0.02,
            epsilon_decay: 0.998,
            field_width: 800.0,
            field_height: 500.0,
            max_ball_speed: 7.0,
        }
    }
}

impl TabularConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bins.iter().any(|&b| b == 0) {
            return Err(AgentError::invalid_parameter("bins", "every bin count must be positive"));
        }
        if self.action_dim == 0 {
            return Err(AgentError::invalid_parameter("action_dim", "must be positive"));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(AgentError::invalid_parameter("alpha", "must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(AgentError::invalid_parameter("gamma", "must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err(AgentError::invalid_parameter(
                "epsilon_start/epsilon_min",
                "must be in [0, 1]",
            ));
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(AgentError::invalid_parameter(
                "epsilon_min",
                "must not exceed epsilon_start",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(AgentError::invalid_parameter("epsilon_decay", "must be in (0, 1]"));
        }
        if !(self.field_width > 0.0) || !(self.field_height > 0.0) {
            return Err(AgentError::invalid_parameter(
                "field_width/field_height",
                "must be positive",
            ));
        }
        if !(self.max_ball_speed > 0.0) {
            return Err(AgentError::invalid_parameter("max_ball_speed", "must be positive"));
        }
        Ok(())
    }

    /// Total number of Q-table entries
    pub fn table_len(&self) -> usize {
        self.bins.iter().product::<usize>() * self.action_dim
    }
}
