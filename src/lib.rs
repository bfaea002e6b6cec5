//! # gridworld-dqn - Deep Q-Learning on a Small Grid World
//!
//! A compact reinforcement learning crate: a square grid with obstacles and a
//! goal, a stacked-frame state encoding, experience replay and a DQN trainer
//! with a separate target estimator.
//!
//! ## Key Features
//!
//! - **Environment**: Deterministic grid world with clamped moves and terminal cells
//! - **Estimators**: Dense Q-network (ReLU MLP) or an exact lookup table
//! - **Optimizers**: SGD and Adam with per-layer moment state
//! - **Replay**: Bounded FIFO buffer with uniform sampling without replacement
//! - **Config**: Serde-backed JSON configuration with validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gridworld_dqn::config::{EnvConfig, TrainerConfig};
//! use gridworld_dqn::environment::GridWorld;
//! use gridworld_dqn::estimator::DenseQNetworkBuilder;
//! use gridworld_dqn::trainer::Trainer;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let env = GridWorld::new(&EnvConfig::default()).unwrap();
//! let network = DenseQNetworkBuilder::new()
//!     .input_shape(env.encoding_shape())
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let mut trainer = Trainer::new(TrainerConfig::default(), env, network, StdRng::seed_from_u64(7)).unwrap();
//! trainer.train(500).unwrap();
//! let rollout = trainer.greedy_rollout(25).unwrap();
//! println!("{:?}", rollout.outcome);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - ReLU and linear activations
//! - [`config`] - Environment and trainer configuration
//! - [`environment`] - The grid world and its frame history
//! - [`error`] - Error types and result handling
//! - [`estimator`] - Action-value estimators
//! - [`metrics`] - Training metrics and tracking
//! - [`network`] - Dense feed-forward network
//! - [`optimizer`] - Optimization algorithms
//! - [`replay_buffer`] - Experience replay
//! - [`trainer`] - The DQN training loop
//! - [`types`] - Positions, actions and state batches

pub mod activations;
pub mod config;
pub mod environment;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;
pub mod types;

#[cfg(test)]
mod tests;
