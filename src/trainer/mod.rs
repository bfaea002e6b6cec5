//! # Trainer Module
//!
//! The deep Q-learning loop: epsilon-greedy acting, experience replay,
//! batched temporal-difference updates and periodic target syncs.
//!
//! ## Components
//!
//! - [`Trainer`] - Drives a [`GridWorld`](crate::environment::GridWorld) with any
//!   [`ValueEstimator`](crate::estimator::ValueEstimator)
//! - [`EpsilonSchedule`] - Multiplicative exploration decay
//! - [`td_targets`] - Bootstrapped learning targets for a sampled batch

mod dqn;
mod epsilon;

pub use dqn::{td_targets, EpisodeSummary, Rollout, StepReport, Trainer};
pub use epsilon::EpsilonSchedule;
