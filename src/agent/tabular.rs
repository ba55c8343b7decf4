use rand::{rngs::ThreadRng, Rng};
use serde::{Deserialize, Serialize};

use crate::config::TabularConfig;
use crate::error::Result;
use crate::snapshot::GameSnapshot;

/// Tabular Q-learning paddle controller.
///
/// The lightweight alternative to [`DqnAgent`](crate::agent::DqnAgent): the
/// continuous observation is discretized into bins and values live in a dense
/// zero-initialized table, updated in place every tick. Trades generalization
/// for simplicity and zero training instability; good enough when the state
/// space discretizes without much aliasing.
#[derive(Serialize, Deserialize)]
pub struct TabularAgent {
    pub config: TabularConfig,

    /// Dense table indexed by (5 bin indices, action), never resized
    q_table: Vec<f32>,

    pub epsilon: f32,

    #[serde(skip)]
    rng: ThreadRng,
}

/// Discretized observation: bin indices for ball x, ball y, ball vx, ball vy,
/// paddle y.
pub type StateBins = [usize; 5];

impl TabularAgent {
    pub fn new(config: TabularConfig) -> Result<Self> {
        config.validate()?;
        let q_table = vec![0.0; config.table_len()];
        let epsilon = config.epsilon_start;
        Ok(TabularAgent {
            config,
            q_table,
            epsilon,
            rng: rand::thread_rng(),
        })
    }

    /// Map a continuous snapshot to bin indices. Positions scale linearly over
    /// the field; velocities are shifted by the speed bound first so the range
    /// [-max_speed, max_speed] lands in contiguous non-negative bins. Indices
    /// clamp to their bin range so out-of-field values cannot index out of
    /// bounds.
    pub fn discretize(&self, snapshot: &GameSnapshot) -> StateBins {
        let c = &self.config;
        let max_v = c.max_ball_speed;
        [
            bin(snapshot.ball_x / c.field_width, c.bins[0]),
            bin(snapshot.ball_y / c.field_height, c.bins[1]),
            bin((snapshot.ball_vx + max_v) / (2.0 * max_v), c.bins[2]),
            bin((snapshot.ball_vy + max_v) / (2.0 * max_v), c.bins[3]),
            bin(snapshot.paddle_y / c.field_height, c.bins[4]),
        ]
    }

    /// ε-greedy over the table row for this state.
    pub fn select_action(&mut self, state: StateBins) -> usize {
        if self.rng.gen::<f32>() < self.epsilon {
            return self.rng.gen_range(0..self.config.action_dim);
        }
        self.greedy_action(state)
    }

    /// Argmax of the table row, lowest action winning ties.
    pub fn greedy_action(&self, state: StateBins) -> usize {
        let base = self.row_index(state);
        let row = &self.q_table[base..base + self.config.action_dim];
        let mut best = 0;
        for (a, &q) in row.iter().enumerate() {
            if q > row[best] {
                best = a;
            }
        }
        best
    }

    /// One-step tabular Q-learning update:
    /// `Q[s,a] += alpha * (r + gamma * max_a' Q[s',a'] - Q[s,a])`.
    pub fn update(&mut self, state: StateBins, action: usize, reward: f32, next_state: StateBins) {
        let future = self.max_q(next_state);
        let idx = self.row_index(state) + action;
        let old = self.q_table[idx];
        self.q_table[idx] = old + self.config.alpha * (reward + self.config.gamma * future - old);
    }

    /// Multiplicative ε decay toward the floor. Called by the adapter at its
    /// own cadence (once per reward event in the reference game loop).
    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
    }

    pub fn q_value(&self, state: StateBins, action: usize) -> f32 {
        self.q_table[self.row_index(state) + action]
    }

    fn max_q(&self, state: StateBins) -> f32 {
        let base = self.row_index(state);
        self.q_table[base..base + self.config.action_dim]
            .iter()
            .fold(f32::NEG_INFINITY, |max, &q| max.max(q))
    }

    /// Flat index of a state's first action slot.
    fn row_index(&self, state: StateBins) -> usize {
        let bins = &self.config.bins;
        let mut idx = 0;
        for (dim, &b) in state.iter().enumerate() {
            debug_assert!(b < bins[dim]);
            idx = idx * bins[dim] + b;
        }
        idx * self.config.action_dim
    }
}

/// Scale a fraction of the value range into a bin index, truncating and
/// clamping to [0, bins).
fn bin(fraction: f32, bins: usize) -> usize {
    let idx = (fraction * bins as f32) as isize;
    idx.clamp(0, bins as isize - 1) as usize
}
