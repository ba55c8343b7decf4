use ndarray::{Array1, ArrayView1};

use crate::agent::{Controller, DqnAgent};
use crate::error::Result;
use crate::metrics::MetricSink;

/// A [`DqnAgent`] with an observability port attached.
///
/// Composition instead of a mutated agent type: the wrapper forwards the
/// training interface unchanged and pushes per-step scalars into whatever
/// sink was injected at construction. The core agent never touches global
/// state.
pub struct InstrumentedAgent<S: MetricSink> {
    agent: DqnAgent,
    sink: S,
}

impl<S: MetricSink> InstrumentedAgent<S> {
    pub fn new(agent: DqnAgent, sink: S) -> Self {
        InstrumentedAgent { agent, sink }
    }

    pub fn select_action(&mut self, state: ArrayView1<f32>) -> Result<usize> {
        self.agent.select_action(state)
    }

    pub fn remember(
        &mut self,
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) {
        self.agent.remember(state, action, reward, next_state, done);
    }

    /// Runs one optimization step and records its loss, the post-decay
    /// exploration rate, and the buffer fill level.
    pub fn optimize(&mut self) -> Result<f32> {
        let loss = self.agent.optimize()?;
        let step = self.agent.steps;
        self.sink.record("loss", loss, step);
        self.sink.record("epsilon", self.agent.epsilon, step);
        self.sink.record("buffer_size", self.agent.replay_len() as f32, step);
        Ok(loss)
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Hand back the wrapped agent and sink.
    pub fn into_parts(self) -> (DqnAgent, S) {
        (self.agent, self.sink)
    }
}

impl<S: MetricSink> Controller for InstrumentedAgent<S> {
    fn select_action(&mut self, observation: ArrayView1<f32>) -> Result<usize> {
        self.agent.select_action(observation)
    }

    fn exploration_rate(&self) -> f32 {
        self.agent.epsilon
    }
}
