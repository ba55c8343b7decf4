//! # Paddle-controlling agents
//!
//! Two learners share the [`Controller`] interface:
//!
//! - [`DqnAgent`]: Double DQN over continuous observations, with prioritized
//!   experience replay, a hard-synced target network, and bincode
//!   checkpoints.
//! - [`TabularAgent`]: discretized-state Q-table for when a function
//!   approximator is more machinery than the problem needs.
//!
//! [`InstrumentedAgent`] wraps the deep agent with an injected metric sink;
//! the base agent itself emits nothing.

pub mod traits;

mod dqn;
mod instrumented;
mod tabular;

pub use dqn::{double_q_targets, DqnAgent};
pub use instrumented::InstrumentedAgent;
pub use tabular::{StateBins, TabularAgent};
pub use traits::Controller;
