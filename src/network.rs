use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;

use crate::activations::Activation;
use crate::error::{GridDqnError, Result};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A fully connected layer: weights, biases and an activation function.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
}

/// Values a layer saw during a training forward pass, kept for backprop.
struct LayerCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
}

impl DenseLayer {
    /// Create a new layer with the given input size, output size, and activation function.
    /// The weights are drawn uniformly from `[-0.1, 0.1]` using `rng`. The biases start at zero.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        let weights = Array2::random_using((input_size, output_size), Uniform::new(-0.1, 0.1), rng);
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    fn pre_activation(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.pre_activation(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn forward_cached(&self, inputs: ArrayView2<f32>) -> (Array2<f32>, LayerCache) {
        let pre_activation = self.pre_activation(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);
        let cache = LayerCache {
            inputs: inputs.to_owned(),
            pre_activation,
        };
        (outputs, cache)
    }

    /// Returns the error adjusted by the activation derivative, and the
    /// weight and bias gradients.
    fn backward_batch(&self, cache: &LayerCache, output_errors: ArrayView2<f32>) -> (Array2<f32>, Array2<f32>, Array1<f32>) {
        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let weight_gradients = cache.inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        (adjusted_error, weight_gradients, bias_gradients)
    }
}

/// A feed-forward network of dense layers with its optimizer.
#[derive(Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// `layer_sizes` includes the input and output sizes, so it is one longer
    /// than `activations`.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(GridDqnError::invalid_parameter(
                "layer_sizes",
                "Must have at least 2 layers",
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(GridDqnError::invalid_parameter(
                "layer_sizes",
                "Every layer needs at least one neuron",
            ));
        }
        if activations.len() != layer_sizes.len() - 1 {
            return Err(GridDqnError::invalid_parameter(
                "activations",
                "Number of activations must match number of layers - 1",
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect();

        Ok(NeuralNetwork { layers, optimizer })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    /// Forward pass for a batch of input rows. Leaves the network untouched.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    /// One gradient step.
    ///
    /// `output_error` maps the network outputs to the loss gradient with
    /// respect to those outputs; it runs between the forward and backward
    /// passes so the caller can compute the loss on fresh outputs.
    pub fn train_batch<F>(&mut self, inputs: ArrayView2<f32>, learning_rate: f32, output_error: F) -> Result<f32>
    where
        F: FnOnce(&Array2<f32>) -> Result<(Array2<f32>, f32)>,
    {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            let (outputs, cache) = layer.forward_cached(current_output.view());
            caches.push(cache);
            current_output = outputs;
        }

        let (output_errors, loss) = output_error(&current_output)?;
        if output_errors.dim() != current_output.dim() {
            return Err(GridDqnError::dimension_mismatch(
                format!("{:?}", current_output.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let gradients = self.backward_batch(&caches, output_errors);
        for (index, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    fn backward_batch(&self, caches: &[LayerCache], output_errors: Array2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors;

        for (i, (layer, cache)) in self.layers.iter().zip(caches).enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer.backward_batch(cache, current_error.view());
            gradients.push((weight_gradients, bias_gradients));
            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        gradients
    }

    /// Overwrites every weight and bias with the values from `source`.
    /// Optimizer state is left alone.
    pub fn copy_parameters_from(&mut self, source: &NeuralNetwork) {
        self.layers.clone_from(&source.layers);
    }
}
