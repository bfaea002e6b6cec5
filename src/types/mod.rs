use ndarray::{Array3, Array4, ArrayView4, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GridDqnError, Result};

/// Stacked-frame encoding of a grid world state, indexed `[row, col, frame]`.
pub type StateEncoding = Array3<f32>;

/// A cell on the grid, addressed by column then row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub col: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(col: usize, row: usize) -> Self {
        Position { col, row }
    }

    /// True when both coordinates lie in `[0, size)`
    pub fn in_bounds(&self, size: usize) -> bool {
        self.col < size && self.row < size
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// The four moves available to the agent.
///
/// The discriminant order is the column order of every action-value row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
        };
        f.write_str(name)
    }
}

/// Batch of state encodings stacked along a leading batch axis
pub struct StateBatch {
    pub data: Array4<f32>,
}

impl StateBatch {
    /// Stack encodings of identical shape. An empty slice is rejected.
    pub fn new(states: &[&StateEncoding]) -> Result<Self> {
        let views: Vec<_> = states.iter().map(|state| state.view()).collect();
        let data = ndarray::stack(Axis(0), &views).map_err(|err| {
            GridDqnError::dimension_mismatch(
                "a non-empty batch of equally shaped encodings".to_string(),
                err.to_string(),
            )
        })?;
        Ok(StateBatch { data })
    }

    /// A batch holding a single encoding
    pub fn single(state: &StateEncoding) -> Self {
        StateBatch {
            data: state.clone().insert_axis(Axis(0)),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }
}
