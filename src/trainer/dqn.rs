use ndarray::{Array1, ArrayView2};
use rand::Rng;
use tracing::{debug, info, trace};

use super::epsilon::EpsilonSchedule;
use crate::config::{SyncCadence, TrainerConfig};
use crate::environment::{GridWorld, Outcome};
use crate::error::{GridDqnError, Result};
use crate::estimator::{greedy_action, max_value, ValueEstimator};
use crate::metrics::TrainingMetrics;
use crate::replay_buffer::{ReplayBuffer, Transition};
use crate::types::{Action, Position, StateBatch, StateEncoding};

/// What happened during one environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub action: Action,
    pub reward: f32,
    pub terminal: bool,
    /// Loss of the batched update run after this step, if one was due
    pub loss: Option<f32>,
    /// Whether the target estimator was refreshed after this step
    pub synced: bool,
}

/// Bookkeeping for one completed episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based index of the episode within this trainer's lifetime
    pub episode: usize,
    pub steps: usize,
    pub reward: f32,
    pub outcome: Option<Outcome>,
    /// Exploration rate after this episode's decay
    pub epsilon: f32,
    pub mean_loss: Option<f32>,
    pub synced: bool,
}

/// A greedy evaluation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Rollout {
    /// Agent positions, starting with the start cell
    pub path: Vec<Position>,
    pub reward: f32,
    /// `None` when the step limit ran out first
    pub outcome: Option<Outcome>,
}

/// Learning targets for a sampled batch.
///
/// `reward` for terminal transitions, otherwise
/// `reward + gamma * max(next_values row)`.
pub fn td_targets(batch: &[&Transition], next_values: ArrayView2<f32>, gamma: f32) -> Array1<f32> {
    batch
        .iter()
        .zip(next_values.rows())
        .map(|(transition, row)| {
            if transition.terminal {
                transition.reward
            } else {
                transition.reward + gamma * max_value(row)
            }
        })
        .collect()
}

/// Deep Q-learning loop over a [`GridWorld`].
///
/// Owns the environment, the replay buffer, the training and target
/// estimators and the random source. Everything runs on the caller's thread.
///
/// ```rust
/// use gridworld_dqn::config::{EnvConfig, TrainerConfig};
/// use gridworld_dqn::environment::GridWorld;
/// use gridworld_dqn::estimator::TabularEstimator;
/// use gridworld_dqn::trainer::Trainer;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let env = GridWorld::new(&EnvConfig::default()).unwrap();
/// let config = TrainerConfig::default().with_observe_steps(10).with_batch_size(8);
/// let estimator = TabularEstimator::new(0.5).unwrap();
/// let mut trainer = Trainer::new(config, env, estimator, StdRng::seed_from_u64(0)).unwrap();
///
/// let summaries = trainer.train(5).unwrap();
/// assert_eq!(summaries.len(), 5);
/// ```
pub struct Trainer<E: ValueEstimator, R: Rng> {
    env: GridWorld,
    buffer: ReplayBuffer,
    training: E,
    target: E,
    config: TrainerConfig,
    epsilon: EpsilonSchedule,
    rng: R,
    total_steps: usize,
    episode_steps: usize,
    metrics: TrainingMetrics,
}

impl<E: ValueEstimator, R: Rng> Trainer<E, R> {
    /// The target estimator starts as a copy of `training`.
    pub fn new(config: TrainerConfig, env: GridWorld, training: E, rng: R) -> Result<Self> {
        config.validate()?;
        if training.num_actions() != Action::COUNT {
            return Err(GridDqnError::dimension_mismatch(
                format!("{} action values", Action::COUNT),
                format!("{}", training.num_actions()),
            ));
        }

        let buffer = ReplayBuffer::new(config.replay_capacity)?;
        let target = training.clone();
        let epsilon = EpsilonSchedule::new(config.epsilon_start, config.epsilon_end, config.epsilon_decay);

        Ok(Trainer {
            env,
            buffer,
            training,
            target,
            config,
            epsilon,
            rng,
            total_steps: 0,
            episode_steps: 0,
            metrics: TrainingMetrics::default(),
        })
    }

    /// Epsilon-greedy choice over the training estimator.
    pub fn select_action(&mut self, state: &StateEncoding) -> Result<Action> {
        if self.rng.gen::<f32>() < self.epsilon.value() {
            Ok(Action::ALL[self.rng.gen_range(0..Action::COUNT)])
        } else {
            self.greedy_action(state)
        }
    }

    /// Best action according to the training estimator.
    pub fn greedy_action(&self, state: &StateEncoding) -> Result<Action> {
        let values = self.training.evaluate(StateBatch::single(state).view())?;
        greedy_action(values.row(0))
    }

    /// Runs one environment step, stores the transition and performs any
    /// update or target sync that falls due.
    pub fn step(&mut self) -> Result<StepReport> {
        let state = self.env.encoded_state();
        let action = self.select_action(&state)?;
        let result = self.env.step(action);
        let (reward, terminal) = (result.reward, result.terminal);

        self.buffer.push(Transition {
            state,
            action,
            reward,
            next_state: result.state,
            terminal,
        });
        self.total_steps += 1;
        self.episode_steps += 1;
        trace!(step = self.total_steps, %action, reward, terminal, "environment step");

        let loss = if self.learning_due() {
            Some(self.learn()?)
        } else {
            None
        };

        let synced = match self.config.target_sync {
            SyncCadence::Steps(interval) if self.total_steps % interval == 0 => {
                self.sync_target();
                true
            }
            _ => false,
        };

        Ok(StepReport {
            action,
            reward,
            terminal,
            loss,
            synced,
        })
    }

    /// True once observing is over, on a train-interval boundary, with at
    /// least one batch worth of transitions buffered.
    pub fn learning_due(&self) -> bool {
        self.total_steps > self.config.observe_steps
            && self.total_steps % self.config.train_interval == 0
            && self.buffer.len() >= self.config.batch_size
    }

    /// Samples a batch and performs one update of the training estimator.
    ///
    /// Fails with `InsufficientData` when fewer than `batch_size`
    /// transitions are buffered.
    pub fn learn(&mut self) -> Result<f32> {
        let batch = self.buffer.sample_batch(self.config.batch_size, &mut self.rng)?;

        let states: Vec<&StateEncoding> = batch.iter().map(|t| &t.state).collect();
        let next_states: Vec<&StateEncoding> = batch.iter().map(|t| &t.next_state).collect();
        let actions: Vec<Action> = batch.iter().map(|t| t.action).collect();

        let next_values = self.target.evaluate(StateBatch::new(&next_states)?.view())?;
        let targets = td_targets(&batch, next_values.view(), self.config.gamma);
        let loss = self
            .training
            .update(StateBatch::new(&states)?.view(), &actions, targets.view())?;

        if self.metrics.updates == 0 {
            debug!(step = self.total_steps, buffered = self.buffer.len(), "first update");
        }
        self.metrics.record_loss(loss);
        Ok(loss)
    }

    /// Copies the training estimator's parameters into the target estimator.
    pub fn sync_target(&mut self) {
        self.target.sync_from(&self.training);
        self.metrics.record_target_sync();
        debug!(
            step = self.total_steps,
            episode = self.metrics.episodes,
            syncs = self.metrics.target_syncs,
            "target estimator synced"
        );
    }

    /// Plays until the environment reaches a terminal cell or
    /// `max_episode_steps` run out, then closes the episode and resets the
    /// environment. A truncated episode has no outcome.
    pub fn run_episode(&mut self) -> Result<EpisodeSummary> {
        if self.env.is_terminal() {
            self.env.reset();
        }
        self.episode_steps = 0;

        let mut losses = Vec::new();
        let mut synced = false;
        while !self.env.is_terminal() && self.episode_steps < self.config.max_episode_steps {
            let report = self.step()?;
            losses.extend(report.loss);
            synced |= report.synced;
        }

        let reward = self.env.episode_reward();
        let outcome = self.env.outcome();
        if outcome.is_none() {
            debug!(episode = self.metrics.episodes + 1, steps = self.episode_steps, "episode truncated");
        }
        let epsilon = self.epsilon.decay();
        self.metrics.record_episode(reward, self.episode_steps, outcome, epsilon);
        let episode = self.metrics.episodes;

        if let SyncCadence::Episodes(interval) = self.config.target_sync {
            if episode % interval == 0 {
                self.sync_target();
                synced = true;
            }
        }
        self.env.reset();

        let mean_loss = if losses.is_empty() {
            None
        } else {
            Some(losses.iter().sum::<f32>() / losses.len() as f32)
        };

        Ok(EpisodeSummary {
            episode,
            steps: self.episode_steps,
            reward,
            outcome,
            epsilon,
            mean_loss,
            synced,
        })
    }

    /// Runs `episodes` episodes, logging progress every `log_interval`.
    pub fn train(&mut self, episodes: usize) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::with_capacity(episodes);
        let window = self.config.log_interval;

        for _ in 0..episodes {
            let summary = self.run_episode()?;
            if summary.episode % window == 0 {
                info!(
                    episode = summary.episode,
                    avg_reward = self.metrics.avg_episode_reward(window).unwrap_or(0.0),
                    success_rate = self.metrics.success_rate(window).unwrap_or(0.0),
                    avg_loss = self.metrics.avg_loss(window).unwrap_or(0.0),
                    epsilon = summary.epsilon,
                    steps = self.total_steps,
                    "training progress"
                );
            }
            summaries.push(summary);
        }

        Ok(summaries)
    }

    /// Greedy evaluation on a fresh copy of the environment.
    ///
    /// Neither the live environment, the buffer nor the estimators change.
    pub fn greedy_rollout(&self, max_steps: usize) -> Result<Rollout> {
        let mut env = self.env.clone();
        let mut state = env.reset();
        let mut path = vec![env.agent_position()];

        for _ in 0..max_steps {
            if env.is_terminal() {
                break;
            }
            let action = self.greedy_action(&state)?;
            state = env.step(action).state;
            path.push(env.agent_position());
        }

        Ok(Rollout {
            path,
            reward: env.episode_reward(),
            outcome: env.outcome(),
        })
    }

    pub fn env(&self) -> &GridWorld {
        &self.env
    }

    pub fn buffer(&self) -> &ReplayBuffer {
        &self.buffer
    }

    pub fn training(&self) -> &E {
        &self.training
    }

    pub fn target(&self) -> &E {
        &self.target
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon.value()
    }

    /// Overrides the current exploration rate, e.g. to 0 for evaluation
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon.set(epsilon);
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Consumes the trainer and hands back the trained estimator
    pub fn into_training(self) -> E {
        self.training
    }
}
