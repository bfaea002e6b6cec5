//! # Activation Functions Module
//!
//! Activation functions for the dense value network.
//!
//! - **ReLU** (Rectified Linear Unit): `max(0, x)`, used on hidden layers
//! - **Linear**: Identity function, used on the output layer so action values
//!   are unbounded

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// An enumeration of the activation functions available to a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    Linear,
}

impl Activation {
    /// Apply the activation function to a batch in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                inputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Linear => {}
        }
    }

    /// Derivative with respect to the pre-activation values of a batch.
    pub fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(inputs.dim()),
        }
    }
}
