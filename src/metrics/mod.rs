//! # Training Metrics Module
//!
//! Bounded histories of what happened during training: per-episode rewards
//! and lengths, update losses and the exploration rate, plus lifetime
//! counters for outcomes, updates and target syncs.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use crate::environment::Outcome;
use crate::error::Result;

/// Stores training metrics over time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Loss values over time
    pub losses: VecDeque<f32>,

    /// Rewards per episode
    pub episode_rewards: VecDeque<f32>,

    /// Episode lengths
    pub episode_lengths: VecDeque<usize>,

    /// Epsilon at the end of each episode
    pub epsilons: VecDeque<f32>,

    /// Outcome of each episode
    pub outcomes: VecDeque<Outcome>,

    pub episodes: usize,
    pub goals_reached: usize,
    pub obstacles_hit: usize,
    pub updates: usize,
    pub target_syncs: usize,

    history_size: usize,
}

fn push_bounded<T>(history: &mut VecDeque<T>, value: T, limit: usize) {
    if history.len() >= limit {
        history.pop_front();
    }
    history.push_back(value);
}

fn recent_mean<T: Copy + Into<f64>>(history: &VecDeque<T>, window: usize) -> Option<f32> {
    if history.is_empty() || window == 0 {
        return None;
    }
    let n = window.min(history.len());
    let sum: f64 = history.iter().rev().take(n).map(|&v| v.into()).sum();
    Some((sum / n as f64) as f32)
}

impl TrainingMetrics {
    pub fn new(history_size: usize) -> Self {
        let history_size = history_size.max(1);
        TrainingMetrics {
            losses: VecDeque::with_capacity(history_size),
            episode_rewards: VecDeque::with_capacity(history_size),
            episode_lengths: VecDeque::with_capacity(history_size),
            epsilons: VecDeque::with_capacity(history_size),
            outcomes: VecDeque::with_capacity(history_size),
            episodes: 0,
            goals_reached: 0,
            obstacles_hit: 0,
            updates: 0,
            target_syncs: 0,
            history_size,
        }
    }

    /// Record the loss of one batched update
    pub fn record_loss(&mut self, loss: f32) {
        push_bounded(&mut self.losses, loss, self.history_size);
        self.updates += 1;
    }

    pub fn record_target_sync(&mut self) {
        self.target_syncs += 1;
    }

    /// Record a finished episode
    pub fn record_episode(&mut self, reward: f32, length: usize, outcome: Option<Outcome>, epsilon: f32) {
        push_bounded(&mut self.episode_rewards, reward, self.history_size);
        push_bounded(&mut self.episode_lengths, length, self.history_size);
        push_bounded(&mut self.epsilons, epsilon, self.history_size);
        if let Some(outcome) = outcome {
            match outcome {
                Outcome::ReachedGoal => self.goals_reached += 1,
                Outcome::HitObstacle => self.obstacles_hit += 1,
            }
            push_bounded(&mut self.outcomes, outcome, self.history_size);
        }
        self.episodes += 1;
    }

    /// Get recent average loss
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        recent_mean(&self.losses, window)
    }

    /// Get recent average episode reward
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        recent_mean(&self.episode_rewards, window)
    }

    pub fn avg_episode_length(&self, window: usize) -> Option<f32> {
        let lengths: VecDeque<u32> = self
            .episode_lengths
            .iter()
            .map(|&len| u32::try_from(len).unwrap_or(u32::MAX))
            .collect();
        recent_mean(&lengths, window)
    }

    /// Fraction of the last `window` episodes that reached the goal
    pub fn success_rate(&self, window: usize) -> Option<f32> {
        if self.outcomes.is_empty() || window == 0 {
            return None;
        }
        let n = window.min(self.outcomes.len());
        let goals = self
            .outcomes
            .iter()
            .rev()
            .take(n)
            .filter(|&&outcome| outcome == Outcome::ReachedGoal)
            .count();
        Some(goals as f32 / n as f32)
    }

    /// Save metrics to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load metrics from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new(1000)
    }
}
