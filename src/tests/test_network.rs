use crate::activations::Activation;
use crate::error::GridDqnError;
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper, SGD};
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn network(optimizer: OptimizerWrapper) -> NeuralNetwork {
    let mut rng = StdRng::seed_from_u64(42);
    NeuralNetwork::new(&[3, 8, 2], &[Activation::Relu, Activation::Linear], optimizer, &mut rng).unwrap()
}

// Mean squared error against a fixed target matrix
fn mse_toward(target: Array2<f32>) -> impl FnOnce(&Array2<f32>) -> crate::error::Result<(Array2<f32>, f32)> {
    move |outputs: &Array2<f32>| {
        let diff = outputs - &target;
        let n = diff.len() as f32;
        let loss = diff.mapv(|d| d * d).sum() / n;
        Ok((diff / n, loss))
    }
}

#[test]
fn test_forward_batch_shape() {
    let network = network(OptimizerWrapper::SGD(SGD::new()));
    let inputs = Array2::<f32>::ones((5, 3));
    let outputs = network.forward_batch(inputs.view());
    assert_eq!(outputs.dim(), (5, 2));
    assert_eq!(network.input_size(), 3);
    assert_eq!(network.output_size(), 2);
}

#[test]
fn test_invalid_architecture() {
    let mut rng = StdRng::seed_from_u64(0);
    let optimizer = OptimizerWrapper::SGD(SGD::new());
    assert!(NeuralNetwork::new(&[3], &[], optimizer.clone(), &mut rng).is_err());
    assert!(NeuralNetwork::new(&[3, 0, 2], &[Activation::Relu, Activation::Linear], optimizer.clone(), &mut rng).is_err());
    assert!(NeuralNetwork::new(&[3, 4, 2], &[Activation::Relu], optimizer, &mut rng).is_err());
}

#[test]
fn test_seeded_networks_match() {
    let a = network(OptimizerWrapper::SGD(SGD::new()));
    let b = network(OptimizerWrapper::SGD(SGD::new()));
    assert_eq!(a.layers, b.layers);
}

#[test]
fn test_sgd_training_reduces_loss() {
    let mut network = network(OptimizerWrapper::SGD(SGD::new()));
    let inputs = array![[1.0, 0.5, -0.5], [0.0, 1.0, 1.0]];
    let target = array![[1.0, -1.0], [0.5, 0.0]];

    let first = network
        .train_batch(inputs.view(), 0.1, mse_toward(target.clone()))
        .unwrap();
    let mut last = first;
    for _ in 0..300 {
        last = network
            .train_batch(inputs.view(), 0.1, mse_toward(target.clone()))
            .unwrap();
    }
    assert!(last < first * 0.5, "loss went from {} to {}", first, last);
}

#[test]
fn test_adam_training_reduces_loss() {
    let mut network = network(OptimizerWrapper::Adam(Adam::default()));
    let inputs = array![[1.0, 0.5, -0.5]];
    let target = array![[0.8, -0.3]];

    let first = network
        .train_batch(inputs.view(), 0.01, mse_toward(target.clone()))
        .unwrap();
    let mut last = first;
    for _ in 0..300 {
        last = network
            .train_batch(inputs.view(), 0.01, mse_toward(target.clone()))
            .unwrap();
    }
    assert!(last < first * 0.1, "loss went from {} to {}", first, last);
}

#[test]
fn test_output_error_shape_checked() {
    let mut network = network(OptimizerWrapper::SGD(SGD::new()));
    let inputs = Array2::<f32>::ones((2, 3));
    let result = network.train_batch(inputs.view(), 0.1, |_| Ok((Array2::zeros((2, 3)), 0.0)));
    assert!(matches!(result, Err(GridDqnError::DimensionMismatch { .. })));
}

#[test]
fn test_copy_parameters_from() {
    let mut rng = StdRng::seed_from_u64(7);
    let source = network(OptimizerWrapper::SGD(SGD::new()));
    let mut copy = NeuralNetwork::new(
        &[3, 8, 2],
        &[Activation::Relu, Activation::Linear],
        OptimizerWrapper::SGD(SGD::new()),
        &mut rng,
    )
    .unwrap();
    assert_ne!(copy.layers, source.layers);

    copy.copy_parameters_from(&source);
    assert_eq!(copy.layers, source.layers);

    let inputs = array![[0.3, -0.2, 0.9]];
    assert_eq!(copy.forward_batch(inputs.view()), source.forward_batch(inputs.view()));
}

#[test]
fn test_activations() {
    let mut values = array![[-1.0, 0.0, 2.0]];
    Activation::Relu.apply_batch(&mut values);
    assert_eq!(values, array![[0.0, 0.0, 2.0]]);
    assert_eq!(
        Activation::Relu.derivative_batch(array![[-1.0, 0.0, 2.0]].view()),
        array![[0.0, 0.0, 1.0]]
    );

    let mut linear = array![[-1.0, 3.0]];
    Activation::Linear.apply_batch(&mut linear);
    assert_eq!(linear, array![[-1.0, 3.0]]);
}
