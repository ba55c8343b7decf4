use ndarray::Array1;
use rand::distributions::Distribution;
use rand::thread_rng;
use rand_distr::weighted_alias::WeightedAliasIndex;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// One agent-environment transition. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Fixed-capacity replay buffer with proportional prioritization.
///
/// Transitions live in a ring: once the buffer is full the write cursor wraps
/// and the oldest entry is overwritten together with its priority. Sampling
/// draws with replacement from a distribution proportional to
/// `priority^alpha` over the transitions currently held, and returns the
/// importance-sampling weights that de-bias a gradient estimate computed from
/// the skewed sample.
#[derive(Clone, Serialize, Deserialize)]
pub struct PrioritizedReplayBuffer {
    buffer: Vec<Experience>,
    /// Parallel to `buffer`: one non-negative priority per held transition
    priorities: Vec<f32>,
    capacity: usize,
    /// Priority exponent; 0 recovers uniform sampling
    alpha: f32,
    /// Write cursor, advances modulo capacity
    position: usize,
}

impl PrioritizedReplayBuffer {
    pub fn new(capacity: usize, alpha: f32) -> Self {
        PrioritizedReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            priorities: Vec::with_capacity(capacity),
            capacity,
            alpha,
            position: 0,
        }
    }

    /// Insert a transition at the write cursor, evicting the oldest entry once
    /// the buffer is full. New entries get the current maximum priority (1.0
    /// for an empty buffer) so fresh experience is sampled at least once
    /// before its priority is recalibrated.
    pub fn push(&mut self, experience: Experience) {
        let max_priority = self
            .priorities
            .iter()
            .fold(f32::NEG_INFINITY, |max, &p| max.max(p));
        let priority = if self.buffer.is_empty() { 1.0 } else { max_priority };

        if self.buffer.len() < self.capacity {
            self.buffer.push(experience);
            self.priorities.push(priority);
        } else {
            self.buffer[self.position] = experience;
            self.priorities[self.position] = priority;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw `batch_size` transitions with replacement, biased by priority.
    ///
    /// Returns the sampled transitions, their buffer indices, and the
    /// importance-sampling weights `(n * P(i))^-beta`, normalized so the
    /// largest weight in the batch is exactly 1.0. The three vectors are
    /// index-aligned.
    pub fn sample(
        &self,
        batch_size: usize,
        beta: f32,
    ) -> Result<(Vec<&Experience>, Vec<usize>, Vec<f32>)> {
        if self.buffer.is_empty() {
            return Err(AgentError::EmptyBuffer(
                "cannot sample from an empty replay buffer".to_string(),
            ));
        }

        let powered: Vec<f32> = self.priorities.iter().map(|&p| p.powf(self.alpha)).collect();
        let total: f32 = powered.iter().sum();
        // O(1) per draw after O(n) table construction; matters at 100k entries.
        let dist = WeightedAliasIndex::new(powered.clone()).map_err(|e| {
            AgentError::Numerical(format!("degenerate priority distribution: {}", e))
        })?;

        let n = self.buffer.len() as f32;
        let mut rng = thread_rng();
        let mut indices = Vec::with_capacity(batch_size);
        let mut weights = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let idx = dist.sample(&mut rng);
            let prob = powered[idx] / total;
            indices.push(idx);
            weights.push((n * prob).powf(-beta));
        }

        let max_weight = weights.iter().fold(0.0_f32, |max, &w| max.max(w));
        if max_weight > 0.0 {
            for w in weights.iter_mut() {
                *w /= max_weight;
            }
        }

        let batch = indices.iter().map(|&i| &self.buffer[i]).collect();
        Ok((batch, indices, weights))
    }

    /// Overwrite the stored priority at each index. Priorities passed in must
    /// already include the configured floor so every entry keeps a strictly
    /// positive sampling probability.
    pub fn update_priorities(&mut self, indices: &[usize], priorities: &[f32]) {
        for (&idx, &priority) in indices.iter().zip(priorities.iter()) {
            if idx < self.priorities.len() {
                self.priorities[idx] = priority;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn priority(&self, index: usize) -> Option<f32> {
        self.priorities.get(index).copied()
    }

    /// Transitions currently held, oldest slot first (slot order, not
    /// insertion order once the ring has wrapped).
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }
}
