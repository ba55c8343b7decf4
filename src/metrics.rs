use std::collections::HashMap;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Observability port: anything that accepts named scalar metrics per step.
/// Injected into the instrumented agent at construction; the training core
/// has no ambient logging of its own.
pub trait MetricSink {
    fn record(&mut self, name: &str, value: f32, step: usize);
}

/// Sink that drops everything.
pub struct NullSink;

impl MetricSink for NullSink {
    fn record(&mut self, _name: &str, _value: f32, _step: usize) {}
}

/// In-memory sink keeping a bounded history per metric name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsTracker {
    series: HashMap<String, VecDeque<(usize, f32)>>,
    history_size: usize,
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            series: HashMap::new(),
            history_size,
        }
    }

    pub fn series(&self, name: &str) -> Option<&VecDeque<(usize, f32)>> {
        self.series.get(name)
    }

    pub fn latest(&self, name: &str) -> Option<f32> {
        self.series.get(name).and_then(|s| s.back()).map(|&(_, v)| v)
    }

    /// Mean of the most recent `window` values of a series.
    pub fn average(&self, name: &str, window: usize) -> Option<f32> {
        let series = self.series.get(name)?;
        if series.is_empty() {
            return None;
        }
        let n = window.min(series.len());
        let sum: f32 = series.iter().rev().take(n).map(|&(_, v)| v).sum();
        Some(sum / n as f32)
    }

    /// Write every series to `path` as pretty JSON.
    pub fn save(&self, path: &str) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl MetricSink for MetricsTracker {
    fn record(&mut self, name: &str, value: f32, step: usize) {
        let series = self
            .series
            .entry(name.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.history_size));
        if series.len() >= self.history_size {
            series.pop_front();
        }
        series.push_back((step, value));
    }
}
