use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::network::Layer;

/// Parameter update rule for one network layer.
///
/// `layer_idx` addresses per-layer optimizer state. Callers update layers in
/// ascending index order, once each per optimization step.
pub trait Optimizer {
    fn update(
        &mut self,
        layer_idx: usize,
        weights: &mut Array2<f32>,
        weight_grads: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_grads: &Array1<f32>,
        learning_rate: f32,
    );
}

/// Serializable dispatch over the supported optimizers, so optimizer state
/// can ride inside a network checkpoint.
#[derive(Serialize, Deserialize, Clone)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update(
        &mut self,
        layer_idx: usize,
        weights: &mut Array2<f32>,
        weight_grads: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_grads: &Array1<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => {
                optimizer.update(layer_idx, weights, weight_grads, biases, bias_grads, learning_rate)
            }
            OptimizerWrapper::Adam(optimizer) => {
                optimizer.update(layer_idx, weights, weight_grads, biases, bias_grads, learning_rate)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update(
        &mut self,
        _layer_idx: usize,
        weights: &mut Array2<f32>,
        weight_grads: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_grads: &Array1<f32>,
        learning_rate: f32,
    ) {
        weights.zip_mut_with(weight_grads, |w, &g| *w -= learning_rate * g);
        biases.zip_mut_with(bias_grads, |b, &g| *b -= learning_rate * g);
    }
}

/// Adam with per-layer first/second moment estimates and bias correction.
#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Array2<f32>>,
    v_weights: Vec<Array2<f32>>,
    m_biases: Vec<Array1<f32>>,
    v_biases: Vec<Array1<f32>>,
    /// Shared timestep, advanced when layer 0 is updated
    t: i32,
}

impl Adam {
    pub fn new(layers: &[Layer], beta1: f32, beta2: f32, epsilon: f32) -> Self {
        let m_weights = layers
            .iter()
            .map(|layer| Array2::<f32>::zeros(layer.weights.dim()))
            .collect();
        let v_weights = layers
            .iter()
            .map(|layer| Array2::<f32>::zeros(layer.weights.dim()))
            .collect();
        let m_biases = layers
            .iter()
            .map(|layer| Array1::<f32>::zeros(layer.biases.dim()))
            .collect();
        let v_biases = layers
            .iter()
            .map(|layer| Array1::<f32>::zeros(layer.biases.dim()))
            .collect();

        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights,
            v_weights,
            m_biases,
            v_biases,
            t: 0,
        }
    }

    pub fn default_for(layers: &[Layer]) -> Self {
        Self::new(layers, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn update(
        &mut self,
        layer_idx: usize,
        weights: &mut Array2<f32>,
        weight_grads: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_grads: &Array1<f32>,
        learning_rate: f32,
    ) {
        if layer_idx == 0 {
            self.t += 1;
        }
        let bias1 = 1.0 - self.beta1.powi(self.t);
        let bias2 = 1.0 - self.beta2.powi(self.t);

        let m = &mut self.m_weights[layer_idx];
        let v = &mut self.v_weights[layer_idx];
        m.zip_mut_with(weight_grads, |m, &g| *m = self.beta1 * *m + (1.0 - self.beta1) * g);
        v.zip_mut_with(weight_grads, |v, &g| *v = self.beta2 * *v + (1.0 - self.beta2) * g * g);
        let m_hat = m.mapv(|x| x / bias1);
        let v_hat = v.mapv(|x| x / bias2);
        *weights -= &((&m_hat / (v_hat.mapv(f32::sqrt) + self.epsilon)) * learning_rate);

        let m = &mut self.m_biases[layer_idx];
        let v = &mut self.v_biases[layer_idx];
        m.zip_mut_with(bias_grads, |m, &g| *m = self.beta1 * *m + (1.0 - self.beta1) * g);
        v.zip_mut_with(bias_grads, |v, &g| *v = self.beta2 * *v + (1.0 - self.beta2) * g * g);
        let m_hat = m.mapv(|x| x / bias1);
        let v_hat = v.mapv(|x| x / bias2);
        *biases -= &((&m_hat / (v_hat.mapv(f32::sqrt) + self.epsilon)) * learning_rate);
    }
}

/// L2 norm over every gradient array of a network update.
pub fn global_grad_norm(weight_grads: &[Array2<f32>], bias_grads: &[Array1<f32>]) -> f32 {
    let weight_norm_sq: f32 = weight_grads
        .iter()
        .map(|g| g.iter().map(|&x| x * x).sum::<f32>())
        .sum();
    let bias_norm_sq: f32 = bias_grads
        .iter()
        .map(|g| g.iter().map(|&x| x * x).sum::<f32>())
        .sum();
    (weight_norm_sq + bias_norm_sq).sqrt()
}

/// Rescale all gradients in place so their global norm does not exceed
/// `max_norm`. Bounds the update a single outlier TD-error can cause.
pub fn clip_global_norm(
    weight_grads: &mut [Array2<f32>],
    bias_grads: &mut [Array1<f32>],
    max_norm: f32,
) {
    let norm = global_grad_norm(weight_grads, bias_grads);
    if norm > max_norm {
        let scale = max_norm / norm;
        for grad in weight_grads.iter_mut() {
            grad.mapv_inplace(|g| g * scale);
        }
        for grad in bias_grads.iter_mut() {
            grad.mapv_inplace(|g| g * scale);
        }
    }
}
