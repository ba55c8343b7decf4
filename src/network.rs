use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

use crate::optimizer::{clip_global_norm, Optimizer, OptimizerWrapper};

/// Activation applied by a layer. Hidden layers use ReLU, the value output
/// stays linear.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => inputs.mapv_inplace(|v| v.max(0.0)),
            Activation::Linear => {}
        }
    }

    fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(inputs.dim()),
        }
    }
}

/// A fully connected layer: weights, biases, activation, and the cached
/// forward-pass intermediates backpropagation needs.
#[derive(Clone, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl Layer {
    /// Weights drawn from Uniform(-0.1, 0.1), biases zeroed.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        Layer {
            weights: Array2::random((input_size, output_size), Uniform::new(-0.1, 0.1)),
            biases: Array1::zeros(output_size),
            activation,
            pre_activation: None,
            inputs: None,
        }
    }

    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.clone().insert_axis(Axis(0));
        self.pre_activation = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Chain rule through the activation, returning the error to propagate to
    /// the previous layer plus this layer's gradients. Requires a prior
    /// `forward_batch` over the same inputs.
    fn backward_batch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, Array2<f32>, Array1<f32>) {
        let pre_activation = self
            .pre_activation
            .as_ref()
            .expect("forward_batch must run before backward_batch");
        let inputs = self
            .inputs
            .as_ref()
            .expect("forward_batch must run before backward_batch");
        let adjusted_error =
            output_errors.to_owned() * &self.activation.derivative_batch(pre_activation.view());
        let weight_grads = inputs.t().dot(&adjusted_error);
        let bias_grads = adjusted_error.sum_axis(Axis(0));
        (adjusted_error, weight_grads, bias_grads)
    }
}

/// The value network: maps a state vector to one scalar estimate per action.
///
/// Holds its own optimizer so a cloned network (the frozen target copy, or a
/// checkpoint) carries the full training state with it.
#[derive(Clone, Serialize, Deserialize)]
pub struct QNetwork {
    pub layers: Vec<Layer>,
    pub optimizer: OptimizerWrapper,
}

impl QNetwork {
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Self {
        assert_eq!(layer_sizes.len() - 1, activations.len());
        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| Layer::new(window[0], window[1], activation))
            .collect();
        QNetwork { layers, optimizer }
    }

    pub fn from_layers(layers: Vec<Layer>, optimizer: OptimizerWrapper) -> Self {
        QNetwork { layers, optimizer }
    }

    /// Forward pass for a single state
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Array1<f32> {
        let input = input.insert_axis(Axis(0));
        let output = self.forward_batch(input);
        let width = output.shape()[1];
        output.into_shape((width,)).expect("batch of one flattens")
    }

    /// Forward pass for a batch of states, one row per state
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    fn backward_batch(&mut self, output_errors: ArrayView2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();
        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];
            let (adjusted_error, weight_grads, bias_grads) =
                layer.backward_batch(current_error.view());
            gradients.push((weight_grads, bias_grads));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }
        gradients.reverse();
        gradients
    }

    /// One training step from caller-supplied per-output gradients.
    ///
    /// `output_grads` has one row per input and one column per action; it is
    /// the derivative of the training loss with respect to each network
    /// output (zero for outputs the loss does not touch). Gradients are
    /// clipped to `max_grad_norm` globally before the optimizer step.
    pub fn fit_batch(
        &mut self,
        inputs: ArrayView2<f32>,
        output_grads: ArrayView2<f32>,
        learning_rate: f32,
        max_grad_norm: f32,
    ) {
        self.forward_batch(inputs);
        let gradients = self.backward_batch(output_grads);

        let (mut weight_grads, mut bias_grads): (Vec<_>, Vec<_>) = gradients.into_iter().unzip();
        clip_global_norm(&mut weight_grads, &mut bias_grads, max_grad_norm);

        for (idx, layer) in self.layers.iter_mut().enumerate() {
            self.optimizer.update(
                idx,
                &mut layer.weights,
                &weight_grads[idx],
                &mut layer.biases,
                &bias_grads[idx],
                learning_rate,
            );
        }
    }
}
