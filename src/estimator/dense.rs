use ndarray::{Array2, ArrayView1, ArrayView4, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{check_update_batch, ValueEstimator};
use crate::activations::Activation;
use crate::error::{GridDqnError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper};
use crate::types::Action;

/// Multi-layer perceptron Q-function.
///
/// Each `(rows, cols, depth)` encoding is flattened into one input row.
/// Hidden layers use ReLU and the output layer is linear with one unit per
/// action. The loss is the mean squared error on the chosen action only.
#[derive(Clone, Debug)]
pub struct DenseQNetwork {
    pub network: NeuralNetwork,
    pub learning_rate: f32,
    input_shape: (usize, usize, usize),
}

impl DenseQNetwork {
    pub fn input_shape(&self) -> (usize, usize, usize) {
        self.input_shape
    }

    fn flatten(&self, states: &ArrayView4<f32>) -> Result<Array2<f32>> {
        let (_, rows, cols, depth) = states.dim();
        if (rows, cols, depth) != self.input_shape {
            return Err(GridDqnError::dimension_mismatch(
                format!("{:?}", self.input_shape),
                format!("{:?}", (rows, cols, depth)),
            ));
        }

        let batch_size = states.len_of(Axis(0));
        let features = rows * cols * depth;
        Array2::from_shape_vec((batch_size, features), states.iter().copied().collect())
            .map_err(|err| GridDqnError::dimension_mismatch(format!("{} features", features), err.to_string()))
    }
}

impl ValueEstimator for DenseQNetwork {
    fn num_actions(&self) -> usize {
        self.network.output_size()
    }

    fn evaluate(&self, states: ArrayView4<f32>) -> Result<Array2<f32>> {
        let inputs = self.flatten(&states)?;
        Ok(self.network.forward_batch(inputs.view()))
    }

    fn update(&mut self, states: ArrayView4<f32>, actions: &[Action], targets: ArrayView1<f32>) -> Result<f32> {
        check_update_batch(&states, actions, &targets)?;
        let inputs = self.flatten(&states)?;
        let batch_size = actions.len().max(1) as f32;

        self.network.train_batch(inputs.view(), self.learning_rate, |outputs| {
            let mut errors = Array2::<f32>::zeros(outputs.dim());
            let mut squared_error = 0.0;
            for (row, (action, &target)) in actions.iter().zip(targets.iter()).enumerate() {
                let diff = outputs[[row, action.index()]] - target;
                squared_error += diff * diff;
                errors[[row, action.index()]] = diff / batch_size;
            }

            let loss = squared_error / batch_size;
            if !loss.is_finite() {
                return Err(GridDqnError::NumericalError(format!("Loss diverged to {}", loss)));
            }
            Ok((errors, loss))
        })
    }

    fn sync_from(&mut self, source: &Self) {
        self.network.copy_parameters_from(&source.network);
    }
}

/// Builder for [`DenseQNetwork`]
pub struct DenseQNetworkBuilder {
    input_shape: Option<(usize, usize, usize)>,
    hidden_sizes: Vec<usize>,
    learning_rate: f32,
    optimizer: Option<OptimizerWrapper>,
    seed: Option<u64>,
}

impl DenseQNetworkBuilder {
    pub fn new() -> Self {
        DenseQNetworkBuilder {
            input_shape: None,
            hidden_sizes: vec![128],
            learning_rate: 0.001,
            optimizer: None,
            seed: None,
        }
    }

    /// Shape of one state encoding, usually `GridWorld::encoding_shape()`
    pub fn input_shape(mut self, shape: (usize, usize, usize)) -> Self {
        self.input_shape = Some(shape);
        self
    }

    pub fn hidden_sizes(mut self, sizes: &[usize]) -> Self {
        self.hidden_sizes = sizes.to_vec();
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Defaults to Adam
    pub fn optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Seeds weight initialization so two builds produce identical networks
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DenseQNetwork> {
        let input_shape = self.input_shape.ok_or_else(|| GridDqnError::InvalidParameter {
            name: "input_shape".to_string(),
            reason: "Input shape must be specified".to_string(),
        })?;
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(GridDqnError::invalid_parameter(
                "learning_rate",
                "Learning rate must be positive",
            ));
        }

        let (rows, cols, depth) = input_shape;
        let mut layer_sizes = vec![rows * cols * depth];
        layer_sizes.extend_from_slice(&self.hidden_sizes);
        layer_sizes.push(Action::COUNT);

        let mut activations = vec![Activation::Relu; self.hidden_sizes.len()];
        activations.push(Activation::Linear);

        let optimizer = self.optimizer.unwrap_or_else(|| OptimizerWrapper::Adam(Adam::default()));
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = NeuralNetwork::new(&layer_sizes, &activations, optimizer, &mut rng)?;

        Ok(DenseQNetwork {
            network,
            learning_rate: self.learning_rate,
            input_shape,
        })
    }
}

impl Default for DenseQNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
