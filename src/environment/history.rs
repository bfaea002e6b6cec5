use ndarray::{Array2, Axis};
use std::collections::VecDeque;

use crate::types::StateEncoding;

/// Fixed-depth window over the most recent single-frame encodings.
#[derive(Clone, Debug)]
pub struct FrameHistory {
    frames: VecDeque<Array2<f32>>,
    depth: usize,
}

impl FrameHistory {
    /// Creates a history holding `depth` copies of `initial`.
    pub fn new(initial: Array2<f32>, depth: usize) -> Self {
        let mut history = FrameHistory {
            frames: VecDeque::with_capacity(depth),
            depth,
        };
        history.fill(initial);
        history
    }

    /// Replaces every slot with `frame`, as at the start of an episode.
    pub fn fill(&mut self, frame: Array2<f32>) {
        self.frames.clear();
        for _ in 1..self.depth {
            self.frames.push_back(frame.clone());
        }
        self.frames.push_back(frame);
    }

    /// Appends the newest frame and drops the oldest one.
    pub fn push(&mut self, frame: Array2<f32>) {
        if self.frames.len() == self.depth {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Stacks the frames along the last axis, oldest first.
    pub fn stacked(&self) -> StateEncoding {
        let (rows, cols) = self.frames.front().map(|f| f.dim()).unwrap_or((0, 0));
        let mut encoded = StateEncoding::zeros((rows, cols, self.depth));
        for (i, frame) in self.frames.iter().enumerate() {
            encoded.index_axis_mut(Axis(2), i).assign(frame);
        }
        encoded
    }
}
