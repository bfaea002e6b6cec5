//! # Configuration Module
//!
//! Environment geometry and learning hyper-parameters. Both structs are
//! serde-serializable so a run can be described in a JSON file, and every
//! field has a default matching the classic 5x5 setup.
//!
//! ```rust
//! use gridworld_dqn::config::{EnvConfig, SyncCadence, TrainerConfig};
//!
//! let env = EnvConfig::default();
//! assert_eq!(env.size, 5);
//!
//! let trainer = TrainerConfig::default()
//!     .with_batch_size(64)
//!     .with_target_sync(SyncCadence::Episodes(10));
//! assert!(trainer.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::environment::{Position, START_POSITION};
use crate::error::{GridDqnError, Result};

/// Geometry and rewards of the grid world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Side length of the square grid
    pub size: usize,
    pub obstacles: Vec<Position>,
    pub goal: Position,
    /// Reward for stepping onto the goal
    pub goal_reward: f32,
    /// Reward for stepping onto an obstacle (a penalty)
    pub block_reward: f32,
    /// Number of stacked frames in an encoded state
    pub history_depth: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            size: 5,
            obstacles: vec![Position::new(1, 3), Position::new(3, 1)],
            goal: Position::new(4, 4),
            goal_reward: 10.0,
            block_reward: -1.0,
            history_depth: 4,
        }
    }
}

impl EnvConfig {
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(GridDqnError::invalid_parameter("size", "Grid size must be greater than 0"));
        }
        if self.history_depth == 0 {
            return Err(GridDqnError::invalid_parameter(
                "history_depth",
                "History depth must be greater than 0",
            ));
        }
        if !self.goal.in_bounds(self.size) {
            return Err(GridDqnError::InvalidParameter {
                name: "goal".to_string(),
                reason: format!("{} lies outside a {}x{} grid", self.goal, self.size, self.size),
            });
        }
        if self.goal == START_POSITION {
            return Err(GridDqnError::InvalidParameter {
                name: "goal".to_string(),
                reason: format!("{} is the start cell", self.goal),
            });
        }
        if let Some(obstacle) = self.obstacles.iter().find(|p| !p.in_bounds(self.size)) {
            return Err(GridDqnError::InvalidParameter {
                name: "obstacles".to_string(),
                reason: format!("{} lies outside a {}x{} grid", obstacle, self.size, self.size),
            });
        }
        if self.obstacles.contains(&START_POSITION) {
            return Err(GridDqnError::InvalidParameter {
                name: "obstacles".to_string(),
                reason: format!("{} is the start cell", START_POSITION),
            });
        }
        if !self.goal_reward.is_finite() || !self.block_reward.is_finite() {
            return Err(GridDqnError::invalid_parameter("rewards", "Rewards must be finite"));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_validated(json, Self::validate)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// How often the target estimator is refreshed from the training estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCadence {
    /// Every n completed episodes
    Episodes(usize),
    /// Every n environment steps
    Steps(usize),
}

impl SyncCadence {
    pub fn interval(&self) -> usize {
        match self {
            SyncCadence::Episodes(n) | SyncCadence::Steps(n) => *n,
        }
    }
}

/// Learning hyper-parameters for the [`Trainer`](crate::trainer::Trainer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub replay_capacity: usize,
    pub batch_size: usize,
    /// Discount factor applied to the next-state value
    pub gamma: f32,
    /// Steps collected before the first update
    pub observe_steps: usize,
    /// Steps between two updates once observing is over
    pub train_interval: usize,
    pub target_sync: SyncCadence,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    /// Multiplicative decay applied once per completed episode
    pub epsilon_decay: f32,
    /// Episodes between two progress log lines
    pub log_interval: usize,
    /// Steps after which an episode is closed without an outcome
    pub max_episode_steps: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            replay_capacity: 10_000,
            batch_size: 32,
            gamma: 0.99,
            observe_steps: 100,
            train_interval: 4,
            target_sync: SyncCadence::Steps(1_000),
            epsilon_start: 1.0,
            epsilon_end: 0.01,
            epsilon_decay: 0.995,
            log_interval: 50,
            max_episode_steps: 500,
        }
    }
}

impl TrainerConfig {
    pub fn with_replay_capacity(mut self, capacity: usize) -> Self {
        self.replay_capacity = capacity;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_observe_steps(mut self, steps: usize) -> Self {
        self.observe_steps = steps;
        self
    }

    pub fn with_train_interval(mut self, interval: usize) -> Self {
        self.train_interval = interval;
        self
    }

    pub fn with_target_sync(mut self, cadence: SyncCadence) -> Self {
        self.target_sync = cadence;
        self
    }

    pub fn with_epsilon(mut self, start: f32, end: f32, decay: f32) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self.epsilon_decay = decay;
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn with_max_episode_steps(mut self, steps: usize) -> Self {
        self.max_episode_steps = steps;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.replay_capacity == 0 {
            return Err(GridDqnError::invalid_parameter(
                "replay_capacity",
                "Capacity must be greater than 0",
            ));
        }
        if self.batch_size == 0 {
            return Err(GridDqnError::invalid_parameter("batch_size", "Batch size must be greater than 0"));
        }
        if self.batch_size > self.replay_capacity {
            return Err(GridDqnError::InvalidParameter {
                name: "batch_size".to_string(),
                reason: format!(
                    "Batch size {} exceeds replay capacity {}",
                    self.batch_size, self.replay_capacity
                ),
            });
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(GridDqnError::invalid_parameter("gamma", "Gamma must lie in (0, 1)"));
        }
        if self.train_interval == 0 {
            return Err(GridDqnError::invalid_parameter(
                "train_interval",
                "Train interval must be greater than 0",
            ));
        }
        if self.target_sync.interval() == 0 {
            return Err(GridDqnError::invalid_parameter(
                "target_sync",
                "Sync interval must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start)
            || !(0.0..=1.0).contains(&self.epsilon_end)
            || self.epsilon_end > self.epsilon_start
        {
            return Err(GridDqnError::invalid_parameter(
                "epsilon",
                "Expected 0 <= epsilon_end <= epsilon_start <= 1",
            ));
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            return Err(GridDqnError::invalid_parameter(
                "epsilon_decay",
                "Decay must lie in (0, 1]",
            ));
        }
        if self.log_interval == 0 {
            return Err(GridDqnError::invalid_parameter(
                "log_interval",
                "Log interval must be greater than 0",
            ));
        }
        if self.max_episode_steps == 0 {
            return Err(GridDqnError::invalid_parameter(
                "max_episode_steps",
                "Episode step limit must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        parse_validated(json, Self::validate)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_validated<T, F>(json: &str, validate: F) -> Result<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> Result<()>,
{
    let config: T = serde_json::from_str(json)?;
    validate(&config)?;
    Ok(config)
}
