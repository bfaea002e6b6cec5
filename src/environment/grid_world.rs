use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::history::FrameHistory;
use crate::config::EnvConfig;
use crate::error::Result;
use crate::types::{Action, Position, StateEncoding};

/// Cell value for empty cells in a single-frame encoding
pub const BACKGROUND_CELL: f32 = 0.0;
/// Cell value for the agent
pub const AGENT_CELL: f32 = 1.0;
/// Cell value for an obstacle
pub const OBSTACLE_CELL: f32 = -1.0;
/// Cell value for the goal
pub const GOAL_CELL: f32 = 0.5;

/// Every episode starts in the top-left corner.
pub const START_POSITION: Position = Position::new(0, 0);

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    ReachedGoal,
    HitObstacle,
}

/// What a single step hands back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub state: StateEncoding,
    pub reward: f32,
    pub terminal: bool,
}

/// Deterministic, fully observable grid world.
///
/// The agent moves one cell per step and is clamped at the edges. Landing on
/// the goal or on any obstacle ends the episode; the goal wins when both
/// occupy the same cell.
///
/// ```rust
/// use gridworld_dqn::config::EnvConfig;
/// use gridworld_dqn::environment::GridWorld;
/// use gridworld_dqn::types::{Action, Position};
///
/// let mut env = GridWorld::new(&EnvConfig::default()).unwrap();
/// let result = env.step(Action::Right);
/// assert_eq!(env.agent_position(), Position::new(1, 0));
/// assert_eq!(result.reward, 0.0);
/// assert!(!result.terminal);
/// ```
#[derive(Clone, Debug)]
pub struct GridWorld {
    size: usize,
    agent: Position,
    obstacles: Vec<Position>,
    goal: Position,
    goal_reward: f32,
    block_reward: f32,
    episode_reward: f32,
    last_reward: f32,
    completed_episodes: usize,
    history: FrameHistory,
}

impl GridWorld {
    pub fn new(config: &EnvConfig) -> Result<Self> {
        config.validate()?;

        let mut world = GridWorld {
            size: config.size,
            agent: START_POSITION,
            obstacles: config.obstacles.clone(),
            goal: config.goal,
            goal_reward: config.goal_reward,
            block_reward: config.block_reward,
            episode_reward: 0.0,
            last_reward: 0.0,
            completed_episodes: 0,
            history: FrameHistory::new(Array2::zeros((config.size, config.size)), config.history_depth),
        };
        let frame = world.encode_frame();
        world.history.fill(frame);
        Ok(world)
    }

    /// Starts a new episode: the agent returns to the start cell, per-episode
    /// rewards are cleared and the completed-episode counter advances.
    pub fn reset(&mut self) -> StateEncoding {
        self.agent = START_POSITION;
        self.episode_reward = 0.0;
        self.last_reward = 0.0;
        self.completed_episodes += 1;
        let frame = self.encode_frame();
        self.history.fill(frame);
        self.encoded_state()
    }

    pub fn step(&mut self, action: Action) -> StepResult {
        self.agent = self.moved(action);
        self.settle()
    }

    /// Integer-indexed step. Unknown indices leave the agent where it is.
    pub fn step_index(&mut self, index: usize) -> StepResult {
        match Action::from_index(index) {
            Some(action) => self.step(action),
            None => self.settle(),
        }
    }

    fn moved(&self, action: Action) -> Position {
        let last = self.size - 1;
        let Position { col, row } = self.agent;
        match action {
            Action::Up => Position::new(col, row.saturating_sub(1)),
            Action::Down => Position::new(col, (row + 1).min(last)),
            Action::Left => Position::new(col.saturating_sub(1), row),
            Action::Right => Position::new((col + 1).min(last), row),
        }
    }

    // Rewards the cell the agent now occupies and records the new frame.
    fn settle(&mut self) -> StepResult {
        let reward = match self.outcome() {
            Some(Outcome::ReachedGoal) => self.goal_reward,
            Some(Outcome::HitObstacle) => self.block_reward,
            None => 0.0,
        };
        self.last_reward = reward;
        self.episode_reward += reward;
        let frame = self.encode_frame();
        self.history.push(frame);

        StepResult {
            state: self.encoded_state(),
            reward,
            terminal: self.is_terminal(),
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.agent == self.goal {
            Some(Outcome::ReachedGoal)
        } else if self.obstacles.contains(&self.agent) {
            Some(Outcome::HitObstacle)
        } else {
            None
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }

    /// Single-frame encoding of the current positions.
    pub fn encode_frame(&self) -> Array2<f32> {
        let mut frame = Array2::from_elem((self.size, self.size), BACKGROUND_CELL);
        for obstacle in &self.obstacles {
            frame[[obstacle.row, obstacle.col]] = OBSTACLE_CELL;
        }
        frame[[self.goal.row, self.goal.col]] = GOAL_CELL;
        frame[[self.agent.row, self.agent.col]] = AGENT_CELL;
        frame
    }

    /// Stacked encoding of shape `(size, size, history_depth)`.
    pub fn encoded_state(&self) -> StateEncoding {
        self.history.stacked()
    }

    pub fn encoding_shape(&self) -> (usize, usize, usize) {
        (self.size, self.size, self.history.depth())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn agent_position(&self) -> Position {
        self.agent
    }

    pub fn goal_position(&self) -> Position {
        self.goal
    }

    pub fn obstacles(&self) -> &[Position] {
        &self.obstacles
    }

    pub fn goal_reward(&self) -> f32 {
        self.goal_reward
    }

    pub fn block_reward(&self) -> f32 {
        self.block_reward
    }

    /// Sum of rewards collected since the last reset
    pub fn episode_reward(&self) -> f32 {
        self.episode_reward
    }

    /// Reward of the most recent step
    pub fn last_reward(&self) -> f32 {
        self.last_reward
    }

    pub fn completed_episodes(&self) -> usize {
        self.completed_episodes
    }
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut grid = vec![vec!['-'; self.size]; self.size];
        grid[self.agent.row][self.agent.col] = 'A';
        for obstacle in &self.obstacles {
            grid[obstacle.row][obstacle.col] = 'B';
        }
        grid[self.goal.row][self.goal.col] = 'G';

        for row in grid {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
