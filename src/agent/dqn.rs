use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{rngs::ThreadRng, Rng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::network::{Activation, Layer, QNetwork};
use crate::optimizer::{Adam, OptimizerWrapper};
use crate::replay_buffer::{Experience, PrioritizedReplayBuffer};

/// Double DQN agent with prioritized experience replay.
///
/// Controls the paddle from continuous observations: an online network is
/// trained against bootstrap targets from a periodically-synced frozen copy,
/// with minibatches drawn from the replay buffer in proportion to how badly
/// each transition is currently predicted.
///
/// # Example
///
/// ```rust
/// use pong_rl::agent::DqnAgent;
/// use pong_rl::config::AgentConfig;
/// use ndarray::array;
///
/// let config = AgentConfig { batch_size: 4, ..AgentConfig::default() };
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// let state = array![400.0, 250.0, 5.0, -2.0, 200.0, 0.0];
/// let action = agent.select_action(state.view()).unwrap();
///
/// // After the environment applies the action and advances one tick:
/// let next_state = array![405.0, 248.0, 5.0, -2.0, 200.0, 0.0];
/// agent.remember(state, action, 0.0, next_state, false);
/// let loss = agent.optimize().unwrap();
/// ```
pub struct DqnAgent {
    pub config: AgentConfig,

    /// Online network, trained every optimization step
    pub q_network: QNetwork,

    /// Frozen bootstrap copy, overwritten in hard syncs
    pub target_network: QNetwork,

    memory: PrioritizedReplayBuffer,

    /// Current exploration rate
    pub epsilon: f32,

    /// Completed optimization steps
    pub steps: usize,

    rng: ThreadRng,
}

/// Everything needed to resume training, persisted as one bincode bundle.
/// Optimizer state rides inside each network. The replay buffer is
/// deliberately not part of it; a resumed agent refills from live play.
#[derive(Serialize, Deserialize)]
struct Checkpoint {
    config: AgentConfig,
    q_network: QNetwork,
    target_network: QNetwork,
    epsilon: f32,
    steps: usize,
}

impl DqnAgent {
    /// Build an agent from a validated config. The target network starts as
    /// an exact copy of the online network.
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        let sizes = config.layer_sizes();
        let activations = [Activation::Relu, Activation::Relu, Activation::Linear];
        let layers: Vec<Layer> = sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| Layer::new(window[0], window[1], activation))
            .collect();
        let optimizer = OptimizerWrapper::Adam(Adam::default_for(&layers));
        let q_network = QNetwork::from_layers(layers, optimizer);
        let target_network = q_network.clone();

        let memory = PrioritizedReplayBuffer::new(config.buffer_size, config.priority_alpha);
        let epsilon = config.epsilon_start;

        Ok(DqnAgent {
            config,
            q_network,
            target_network,
            memory,
            epsilon,
            steps: 0,
            rng: rand::thread_rng(),
        })
    }

    /// ε-greedy action selection: a uniformly random action with probability
    /// ε, otherwise the argmax of the online network's value estimates.
    /// Single forward pass, never blocks.
    pub fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        if self.rng.gen::<f32>() < self.epsilon {
            return Ok(self.rng.gen_range(0..self.config.action_dim));
        }
        let q_values = self.q_network.forward(state);
        argmax(q_values.view())
            .ok_or_else(|| AgentError::Numerical("network produced no Q-values".to_string()))
    }

    /// Store one tick's transition in the replay buffer.
    pub fn remember(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) {
        self.memory.push(Experience {
            state,
            action,
            reward,
            next_state,
            done,
        });
    }

    /// Number of transitions currently held in the replay buffer.
    pub fn replay_len(&self) -> usize {
        self.memory.len()
    }

    /// One optimization step. A no-op returning 0.0 while the buffer holds
    /// fewer than `batch_size` transitions; otherwise returns the
    /// importance-weighted Huber loss of the minibatch.
    pub fn optimize(&mut self) -> Result<f32> {
        let batch_size = self.config.batch_size;
        if self.memory.len() < batch_size {
            return Ok(0.0);
        }

        let state_dim = self.config.state_dim;
        let mut states = Array2::zeros((batch_size, state_dim));
        let mut next_states = Array2::zeros((batch_size, state_dim));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Vec::with_capacity(batch_size);
        let mut dones = Vec::with_capacity(batch_size);
        let (indices, weights) = {
            let (batch, indices, weights) =
                self.memory.sample(batch_size, self.config.priority_beta)?;
            for (i, exp) in batch.iter().enumerate() {
                states.row_mut(i).assign(&exp.state);
                next_states.row_mut(i).assign(&exp.next_state);
                actions.push(exp.action);
                rewards.push(exp.reward);
                dones.push(exp.done);
            }
            (indices, weights)
        };

        // Double-Q: the online net picks the next action, the frozen copy
        // prices it.
        let next_q_online = self.q_network.forward_batch(next_states.view());
        let next_q_target = self.target_network.forward_batch(next_states.view());
        let targets = double_q_targets(
            next_q_online.view(),
            next_q_target.view(),
            &rewards,
            &dones,
            self.config.gamma,
        );

        let current_q = self.q_network.forward_batch(states.view());
        let mut output_grads = Array2::zeros((batch_size, self.config.action_dim));
        let mut new_priorities = Vec::with_capacity(batch_size);
        let mut loss = 0.0;
        for i in 0..batch_size {
            let diff = current_q[[i, actions[i]]] - targets[i];
            new_priorities.push(diff.abs() + self.config.priority_epsilon);
            loss += weights[i] * huber(diff);
            output_grads[[i, actions[i]]] = weights[i] * huber_grad(diff) / batch_size as f32;
        }
        loss /= batch_size as f32;

        self.q_network.fit_batch(
            states.view(),
            output_grads.view(),
            self.config.learning_rate,
            1.0,
        );

        self.memory.update_priorities(&indices, &new_priorities);

        // Hard sync on the pre-increment counter, so step 0 syncs too.
        if self.steps % self.config.target_update == 0 {
            self.target_network = self.q_network.clone();
        }

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_end);
        self.steps += 1;

        Ok(loss)
    }

    /// Persist the full training state to `path` as one bundle.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let checkpoint = Checkpoint {
            config: self.config.clone(),
            q_network: self.q_network.clone(),
            target_network: self.target_network.clone(),
            epsilon: self.epsilon,
            steps: self.steps,
        };
        let bytes = bincode::serialize(&checkpoint)
            .map_err(|e| AgentError::Checkpoint(format!("failed to encode checkpoint: {}", e)))?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            AgentError::Checkpoint(format!(
                "failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(())
    }

    /// Restore an agent from a checkpoint written by [`DqnAgent::save`].
    ///
    /// Failures surface as [`AgentError::Checkpoint`] and never touch any
    /// existing agent; the replay buffer starts empty.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            AgentError::Checkpoint(format!("failed to read {}: {}", path.as_ref().display(), e))
        })?;
        let checkpoint: Checkpoint = bincode::deserialize(&bytes)
            .map_err(|e| AgentError::Checkpoint(format!("failed to decode checkpoint: {}", e)))?;
        checkpoint
            .config
            .validate()
            .map_err(|e| AgentError::Checkpoint(format!("checkpoint config rejected: {}", e)))?;

        let memory = PrioritizedReplayBuffer::new(
            checkpoint.config.buffer_size,
            checkpoint.config.priority_alpha,
        );
        Ok(DqnAgent {
            config: checkpoint.config,
            q_network: checkpoint.q_network,
            target_network: checkpoint.target_network,
            memory,
            epsilon: checkpoint.epsilon,
            steps: checkpoint.steps,
            rng: rand::thread_rng(),
        })
    }
}

/// Per-sample Double-Q targets: `r + (1 - done) * gamma * Q_target(s', a*)`
/// where `a*` is chosen by the online network. Terminal transitions keep the
/// bare reward.
pub fn double_q_targets(
    next_q_online: ArrayView2<f32>,
    next_q_target: ArrayView2<f32>,
    rewards: &[f32],
    dones: &[bool],
    gamma: f32,
) -> Vec<f32> {
    rewards
        .iter()
        .zip(dones.iter())
        .enumerate()
        .map(|(i, (&reward, &done))| {
            if done {
                reward
            } else {
                let best = argmax(next_q_online.row(i)).unwrap_or(0);
                reward + gamma * next_q_target[[i, best]]
            }
        })
        .collect()
}

/// Index of the greatest value, lowest index winning ties.
pub(crate) fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            None => best = Some((i, v)),
            Some((_, b)) if v > b => best = Some((i, v)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}

/// Huber loss with unit transition point; bounds the gradient contribution of
/// any single high-error sample.
fn huber(diff: f32) -> f32 {
    let abs = diff.abs();
    if abs <= 1.0 {
        0.5 * diff * diff
    } else {
        abs - 0.5
    }
}

fn huber_grad(diff: f32) -> f32 {
    diff.clamp(-1.0, 1.0)
}
