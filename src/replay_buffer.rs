use rand::seq::index;
use rand::Rng;
use std::collections::VecDeque;

use crate::error::{GridDqnError, Result};
use crate::types::{Action, StateEncoding};

/// One recorded step: the state before, the action taken, the reward paid,
/// the state after and whether the episode ended there.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: StateEncoding,
    pub action: Action,
    pub reward: f32,
    pub next_state: StateEncoding,
    pub terminal: bool,
}

/// Bounded FIFO store of transitions.
///
/// Once full, every push evicts the oldest transition. Sampling never
/// changes the contents or their order.
///
/// ```rust
/// use gridworld_dqn::replay_buffer::ReplayBuffer;
///
/// let buffer = ReplayBuffer::new(10_000).unwrap();
/// assert!(buffer.is_empty());
/// assert_eq!(buffer.capacity(), 10_000);
/// ```
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GridDqnError::invalid_parameter(
                "capacity",
                "Capacity must be greater than 0",
            ));
        }

        Ok(ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draws `batch_size` distinct positions uniformly at random.
    pub fn sample_indices<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<usize>> {
        if self.buffer.len() < batch_size {
            return Err(GridDqnError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }
        Ok(index::sample(rng, self.buffer.len(), batch_size).into_vec())
    }

    /// Draws `batch_size` transitions without replacement.
    ///
    /// Fails with `InsufficientData` when fewer transitions are stored.
    pub fn sample_batch<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        let indices = self.sample_indices(batch_size, rng)?;
        Ok(indices.into_iter().map(|i| &self.buffer[i]).collect())
    }

    pub fn get(&self, index: usize) -> Option<&Transition> {
        self.buffer.get(index)
    }

    /// Stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
