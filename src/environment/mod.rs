//! # Environment Module
//!
//! The grid world the agent learns in. The agent starts in the top-left
//! corner of a square grid and must reach the goal cell while avoiding
//! obstacle cells.
//!
//! ## Rewards and Termination
//!
//! - Landing on the goal pays `goal_reward` and ends the episode
//! - Landing on an obstacle pays `block_reward` and ends the episode
//! - Every other step pays nothing
//!
//! ## State Encoding
//!
//! Each state is a `(size, size, history_depth)` array. The last axis stacks
//! the most recent single-frame encodings, oldest first, so the estimator can
//! see where the agent came from.
//!
//! ## Rendering
//!
//! `GridWorld` implements `Display`, printing one row per line with `A` for
//! the agent, `B` for obstacles, `G` for the goal and `-` for empty cells.

mod grid_world;
mod history;

pub use grid_world::{
    GridWorld, Outcome, StepResult, AGENT_CELL, BACKGROUND_CELL, GOAL_CELL, OBSTACLE_CELL,
    START_POSITION,
};
pub use history::FrameHistory;
pub use crate::types::{Action, Position};
