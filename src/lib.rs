//! # pong-rl — reinforcement-learning core for a Pong paddle
//!
//! The learning side of an AI-vs-human Pong game, with the game engine,
//! rendering, and input handling treated as an external collaborator. Once
//! per simulation tick the environment hands the agent an observation, the
//! agent answers with a paddle action, and the resulting transition is stored
//! and periodically trained on.
//!
//! ## What's in the box
//!
//! - **Double DQN agent** ([`agent::DqnAgent`]): a small feed-forward value
//!   network plus a hard-synced target copy, trained on prioritized replay
//!   minibatches with importance-sampling correction, Huber loss, and
//!   gradient-norm clipping.
//! - **Prioritized replay** ([`replay_buffer::PrioritizedReplayBuffer`]):
//!   ring buffer sampling transitions proportionally to their last-known
//!   TD-error.
//! - **Tabular variant** ([`agent::TabularAgent`]): a discretized Q-table
//!   with the same ε-greedy contract, for the lightweight build of the game.
//! - **Checkpoints**: the full training state (networks, optimizer, ε, step
//!   counter, config) as one bincode bundle.
//! - **Observability port** ([`metrics::MetricSink`]): injected, never
//!   global; [`agent::InstrumentedAgent`] records loss/ε/buffer-fill per
//!   step.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use pong_rl::agent::DqnAgent;
//! use pong_rl::config::AgentConfig;
//! use pong_rl::snapshot::GameSnapshot;
//!
//! let mut agent = DqnAgent::new(AgentConfig::default()).unwrap();
//!
//! // Each tick the environment exports a snapshot...
//! let snap = GameSnapshot {
//!     ball_x: 400.0, ball_y: 250.0,
//!     ball_vx: 5.0, ball_vy: -2.0,
//!     paddle_y: 200.0, paddle_vy: 0.0,
//! };
//! let state = snap.observation();
//! let action = agent.select_action(state.view()).unwrap();
//!
//! // ...applies the action, advances physics, and reports back:
//! # let (next_state, reward, done) = (state.clone(), 0.0, false);
//! agent.remember(state, action, reward, next_state, done);
//! let loss = agent.optimize().unwrap();
//! ```
//!
//! Everything is single-threaded and synchronous: one logical owner drives
//! the agent, and no call blocks on I/O except checkpoint save/load.

pub mod agent;
pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod snapshot;

#[cfg(test)]
mod tests;
