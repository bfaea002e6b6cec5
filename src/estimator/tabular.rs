use ndarray::{Array1, Array2, ArrayView1, ArrayView3, ArrayView4, Axis};
use std::collections::HashMap;

use super::{check_update_batch, ValueEstimator};
use crate::error::{GridDqnError, Result};
use crate::types::Action;

/// Lookup-table Q-function keyed by the exact bit pattern of an encoding.
///
/// Unseen states evaluate to all zeros. An update moves the stored value
/// toward the target by `learning_rate` of the difference.
#[derive(Clone, Debug, PartialEq)]
pub struct TabularEstimator {
    table: HashMap<Vec<u32>, Array1<f32>>,
    learning_rate: f32,
}

impl TabularEstimator {
    pub fn new(learning_rate: f32) -> Result<Self> {
        if !(learning_rate > 0.0 && learning_rate <= 1.0) {
            return Err(GridDqnError::invalid_parameter(
                "learning_rate",
                "Tabular learning rate must lie in (0, 1]",
            ));
        }
        Ok(TabularEstimator {
            table: HashMap::new(),
            learning_rate,
        })
    }

    /// Number of distinct states with stored values
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn key(state: ArrayView3<f32>) -> Vec<u32> {
        state.iter().map(|v| v.to_bits()).collect()
    }
}

impl ValueEstimator for TabularEstimator {
    fn num_actions(&self) -> usize {
        Action::COUNT
    }

    fn evaluate(&self, states: ArrayView4<f32>) -> Result<Array2<f32>> {
        let mut values = Array2::<f32>::zeros((states.len_of(Axis(0)), Action::COUNT));
        for (mut row, state) in values.axis_iter_mut(Axis(0)).zip(states.axis_iter(Axis(0))) {
            if let Some(stored) = self.table.get(&Self::key(state)) {
                row.assign(stored);
            }
        }
        Ok(values)
    }

    fn update(&mut self, states: ArrayView4<f32>, actions: &[Action], targets: ArrayView1<f32>) -> Result<f32> {
        check_update_batch(&states, actions, &targets)?;

        let mut squared_error = 0.0;
        for ((state, action), &target) in states.axis_iter(Axis(0)).zip(actions).zip(targets.iter()) {
            let row = self
                .table
                .entry(Self::key(state))
                .or_insert_with(|| Array1::zeros(Action::COUNT));
            let diff = target - row[action.index()];
            squared_error += diff * diff;
            row[action.index()] += self.learning_rate * diff;
        }
        Ok(squared_error / actions.len().max(1) as f32)
    }

    fn sync_from(&mut self, source: &Self) {
        self.table.clone_from(&source.table);
        self.learning_rate = source.learning_rate;
    }
}
