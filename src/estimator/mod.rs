//! # Value Estimator Module
//!
//! The Q-function seen by the trainer. A [`ValueEstimator`] maps a batch of
//! state encodings to one row of action values per state, can be nudged
//! toward target values, and can copy another instance's parameters
//! wholesale.
//!
//! The trainer keeps two instances of the same estimator type:
//!
//! - **training**: evaluated for action selection and updated from replayed
//!   batches
//! - **target**: evaluated to compute learning targets, changed only by
//!   [`ValueEstimator::sync_from`]
//!
//! ## Available Estimators
//!
//! - [`DenseQNetwork`]: flattened input, ReLU hidden layers, linear output
//! - [`TabularEstimator`]: a lookup table keyed by the exact encoding
//!
//! ## Example Usage
//!
//! ```rust
//! use gridworld_dqn::estimator::{greedy_action, DenseQNetworkBuilder, ValueEstimator};
//! use gridworld_dqn::types::StateBatch;
//! use ndarray::Array3;
//!
//! let network = DenseQNetworkBuilder::new()
//!     .input_shape((5, 5, 4))
//!     .hidden_sizes(&[32])
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let state = Array3::<f32>::zeros((5, 5, 4));
//! let values = network.evaluate(StateBatch::single(&state).view()).unwrap();
//! let action = greedy_action(values.row(0)).unwrap();
//! ```

mod dense;
mod tabular;

pub use dense::{DenseQNetwork, DenseQNetworkBuilder};
pub use tabular::TabularEstimator;

use ndarray::{Array2, ArrayView1, ArrayView4, Axis};

use crate::error::{GridDqnError, Result};
use crate::types::Action;

/// Capability contract for a Q-function.
pub trait ValueEstimator: Clone {
    /// Length of every action-value row
    fn num_actions(&self) -> usize;

    /// Action values for a batch of states, one row per state.
    ///
    /// Pure: depends only on the current parameters and the input.
    fn evaluate(&self, states: ArrayView4<f32>) -> Result<Array2<f32>>;

    /// One optimization step moving the value of each chosen action toward
    /// its target. Returns the mean squared error measured before the step.
    fn update(&mut self, states: ArrayView4<f32>, actions: &[Action], targets: ArrayView1<f32>) -> Result<f32>;

    /// Overwrites every parameter with the values held by `source`.
    fn sync_from(&mut self, source: &Self);
}

/// Greedy action for one action-value row; ties go to the lowest index.
pub fn greedy_action(values: ArrayView1<f32>) -> Result<Action> {
    if values.len() != Action::COUNT {
        return Err(GridDqnError::dimension_mismatch(
            format!("{} action values", Action::COUNT),
            format!("{}", values.len()),
        ));
    }

    let mut best = 0;
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = index;
        }
    }
    Action::from_index(best).ok_or_else(|| GridDqnError::NumericalError(format!("No action for index {}", best)))
}

/// Largest entry of an action-value row.
pub fn max_value(values: ArrayView1<f32>) -> f32 {
    values.iter().fold(f32::NEG_INFINITY, |max, &val| max.max(val))
}

// Shared argument checks for `update` implementations.
fn check_update_batch(states: &ArrayView4<f32>, actions: &[Action], targets: &ArrayView1<f32>) -> Result<()> {
    let batch_size = states.len_of(Axis(0));
    if actions.len() != batch_size || targets.len() != batch_size {
        return Err(GridDqnError::dimension_mismatch(
            format!("{} actions and targets", batch_size),
            format!("{} actions and {} targets", actions.len(), targets.len()),
        ));
    }
    if let Some(target) = targets.iter().find(|t| !t.is_finite()) {
        return Err(GridDqnError::NumericalError(format!("Non-finite target value {}", target)));
    }
    Ok(())
}
