use crate::activations::Activation;
use crate::config::{EnvConfig, SyncCadence, TrainerConfig};
use crate::environment::{GridWorld, Outcome};
use crate::error::GridDqnError;
use crate::estimator::{DenseQNetworkBuilder, TabularEstimator, ValueEstimator};
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerWrapper, SGD};
use crate::replay_buffer::Transition;
use crate::trainer::{td_targets, EpsilonSchedule, Trainer};
use crate::types::{Action, Position, StateBatch};
use ndarray::{array, Array3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn tabular_trainer(config: TrainerConfig) -> Trainer<TabularEstimator, StdRng> {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let estimator = TabularEstimator::new(0.5).unwrap();
    Trainer::new(config, env, estimator, StdRng::seed_from_u64(17)).unwrap()
}

fn transition(reward: f32, terminal: bool) -> Transition {
    Transition {
        state: Array3::zeros((1, 1, 1)),
        action: Action::Up,
        reward,
        next_state: Array3::zeros((1, 1, 1)),
        terminal,
    }
}

#[test]
fn test_td_targets() {
    let a = transition(1.0, false);
    let b = transition(-1.0, true);
    let c = transition(0.0, false);
    let next_values = array![[0.5, 2.0, 1.0, 0.0], [100.0, 100.0, 100.0, 100.0], [-1.0, -2.0, -0.5, -3.0]];

    let targets = td_targets(&[&a, &b, &c], next_values.view(), 0.5);
    assert_eq!(targets.to_vec(), vec![2.0, -1.0, -0.25]);
}

#[test]
fn test_epsilon_schedule_decays_to_floor() {
    let mut schedule = EpsilonSchedule::new(1.0, 0.1, 0.5);
    assert_eq!(schedule.decay(), 0.5);
    assert_eq!(schedule.decay(), 0.25);
    assert_eq!(schedule.decay(), 0.125);
    assert_eq!(schedule.decay(), 0.1);
    assert_eq!(schedule.decay(), 0.1);

    schedule.reset();
    assert_eq!(schedule.value(), 1.0);
    schedule.set(2.0);
    assert_eq!(schedule.value(), 1.0);
}

#[test]
fn test_new_rejects_invalid_config() {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let estimator = TabularEstimator::new(0.5).unwrap();
    let result = Trainer::new(
        TrainerConfig::default().with_gamma(1.5),
        env,
        estimator,
        StdRng::seed_from_u64(0),
    );
    assert!(matches!(result, Err(GridDqnError::InvalidParameter { .. })));
}

#[test]
fn test_new_rejects_wrong_action_count() {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let mut estimator = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .seed(1)
        .build()
        .unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    estimator.network = NeuralNetwork::new(
        &[100, 8, 3],
        &[Activation::Relu, Activation::Linear],
        OptimizerWrapper::SGD(SGD::new()),
        &mut rng,
    )
    .unwrap();

    let result = Trainer::new(TrainerConfig::default(), env, estimator, StdRng::seed_from_u64(0));
    assert!(matches!(result, Err(GridDqnError::DimensionMismatch { .. })));
}

#[test]
fn test_target_starts_as_copy() {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let state = env.encoded_state();
    let estimator = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .hidden_sizes(&[8])
        .seed(4)
        .build()
        .unwrap();
    let trainer = Trainer::new(TrainerConfig::default(), env, estimator, StdRng::seed_from_u64(0)).unwrap();

    let batch = StateBatch::single(&state);
    assert_eq!(
        trainer.training().evaluate(batch.view()).unwrap(),
        trainer.target().evaluate(batch.view()).unwrap()
    );
}

#[test]
fn test_learning_waits_for_observation_and_interval() {
    let config = TrainerConfig::default()
        .with_observe_steps(10)
        .with_train_interval(4)
        .with_batch_size(8)
        .with_target_sync(SyncCadence::Steps(1_000));
    let mut trainer = tabular_trainer(config);

    let mut updated_at = Vec::new();
    for _ in 0..20 {
        let report = trainer.step().unwrap();
        if report.loss.is_some() {
            updated_at.push(trainer.total_steps());
        }
    }

    assert_eq!(updated_at, vec![12, 16, 20]);
    assert_eq!(trainer.metrics().updates, 3);
    assert_eq!(trainer.buffer().len(), 20);
}

#[test]
fn test_learn_needs_a_full_batch() {
    let config = TrainerConfig::default().with_batch_size(8);
    let mut trainer = tabular_trainer(config);
    trainer.step().unwrap();

    assert_eq!(
        trainer.learn().unwrap_err(),
        GridDqnError::InsufficientData {
            requested: 8,
            available: 1
        }
    );
}

#[test]
fn test_step_cadence_sync() {
    let config = TrainerConfig::default().with_target_sync(SyncCadence::Steps(5));
    let mut trainer = tabular_trainer(config);

    let synced: Vec<bool> = (0..10).map(|_| trainer.step().unwrap().synced).collect();
    let expected: Vec<bool> = (1..=10).map(|step| step % 5 == 0).collect();
    assert_eq!(synced, expected);
    assert_eq!(trainer.metrics().target_syncs, 2);
}

#[test]
fn test_episode_cadence_sync() {
    let config = TrainerConfig::default().with_target_sync(SyncCadence::Episodes(2));
    let mut trainer = tabular_trainer(config);

    let summaries = trainer.train(4).unwrap();
    let synced: Vec<bool> = summaries.iter().map(|s| s.synced).collect();
    assert_eq!(synced, vec![false, true, false, true]);
    assert_eq!(trainer.metrics().target_syncs, 2);
}

#[test]
fn test_target_matches_training_after_sync() {
    let config = TrainerConfig::default()
        .with_observe_steps(0)
        .with_train_interval(1)
        .with_batch_size(4)
        .with_target_sync(SyncCadence::Episodes(1));
    let mut trainer = tabular_trainer(config);

    trainer.run_episode().unwrap();
    assert_eq!(trainer.target(), trainer.training());
}

#[test]
fn test_episode_bookkeeping() {
    let config = TrainerConfig::default()
        .with_epsilon(1.0, 0.1, 0.5)
        .with_max_episode_steps(1_000_000);
    let mut trainer = tabular_trainer(config);

    let summaries = trainer.train(3).unwrap();
    let total: usize = summaries.iter().map(|s| s.steps).sum();
    assert_eq!(total, trainer.total_steps());
    assert_eq!(summaries.iter().map(|s| s.episode).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(summaries.iter().map(|s| s.epsilon).collect::<Vec<_>>(), vec![0.5, 0.25, 0.125]);
    assert_eq!(trainer.epsilon(), 0.125);

    for summary in &summaries {
        assert!(summary.steps > 0);
        assert!(summary.outcome.is_some());
        let expected = match summary.outcome {
            Some(Outcome::ReachedGoal) => 10.0,
            _ => -1.0,
        };
        assert_eq!(summary.reward, expected);
    }

    let metrics = trainer.metrics();
    assert_eq!(metrics.episodes, 3);
    assert_eq!(metrics.goals_reached + metrics.obstacles_hit, 3);
    // The environment is ready for the next episode
    assert_eq!(trainer.env().agent_position(), Position::new(0, 0));
    assert!(!trainer.env().is_terminal());
}

#[test]
fn test_greedy_rollout_leaves_trainer_untouched() {
    let mut trainer = tabular_trainer(TrainerConfig::default());
    trainer.train(2).unwrap();
    let steps = trainer.total_steps();
    let buffered = trainer.buffer().len();
    let table = trainer.training().clone();

    let rollout = trainer.greedy_rollout(6).unwrap();
    assert_eq!(rollout.path[0], Position::new(0, 0));
    assert!(rollout.path.len() <= 7);
    assert_eq!(trainer.total_steps(), steps);
    assert_eq!(trainer.buffer().len(), buffered);
    assert_eq!(trainer.training(), &table);
}

#[test]
fn test_untrained_greedy_rollout_stays_in_corner() {
    // All-zero values pick UP, which is clamped at the top edge
    let trainer = tabular_trainer(TrainerConfig::default());
    let rollout = trainer.greedy_rollout(5).unwrap();
    assert_eq!(rollout.path, vec![Position::new(0, 0); 6]);
    assert_eq!(rollout.outcome, None);
    assert_eq!(rollout.reward, 0.0);
}

#[test]
fn test_tabular_trainer_learns_to_reach_goal() {
    let env_config = EnvConfig {
        size: 4,
        obstacles: vec![Position::new(1, 1)],
        goal: Position::new(3, 3),
        history_depth: 1,
        ..EnvConfig::default()
    };
    let config = TrainerConfig::default()
        .with_replay_capacity(5_000)
        .with_batch_size(16)
        .with_gamma(0.9)
        .with_observe_steps(16)
        .with_train_interval(1)
        .with_target_sync(SyncCadence::Steps(10))
        .with_epsilon(1.0, 0.05, 0.98);
    let env = GridWorld::new(&env_config).unwrap();
    let estimator = TabularEstimator::new(1.0).unwrap();
    let mut trainer = Trainer::new(config, env, estimator, StdRng::seed_from_u64(2024)).unwrap();

    trainer.train(400).unwrap();
    let rollout = trainer.greedy_rollout(20).unwrap();
    assert_eq!(rollout.outcome, Some(Outcome::ReachedGoal));
    assert_eq!(rollout.path.last(), Some(&Position::new(3, 3)));
    assert_eq!(rollout.reward, 10.0);
}

#[test]
fn test_dense_trainer_records_finite_losses() {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let estimator = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .hidden_sizes(&[32])
        .seed(8)
        .build()
        .unwrap();
    let config = TrainerConfig::default()
        .with_observe_steps(16)
        .with_batch_size(16)
        .with_train_interval(2)
        .with_target_sync(SyncCadence::Steps(50));
    let mut trainer = Trainer::new(config, env, estimator, StdRng::seed_from_u64(5)).unwrap();

    while trainer.metrics().updates < 5 {
        trainer.run_episode().unwrap();
    }
    assert!(trainer.metrics().losses.iter().all(|loss| loss.is_finite()));
}

#[test]
fn test_updates_leave_target_alone() {
    let config = TrainerConfig::default()
        .with_observe_steps(0)
        .with_train_interval(1)
        .with_batch_size(4)
        .with_target_sync(SyncCadence::Steps(1_000));
    let mut trainer = tabular_trainer(config);

    for _ in 0..30 {
        trainer.step().unwrap();
    }
    assert_eq!(trainer.metrics().updates, 27);
    assert!(!trainer.training().is_empty());
    assert!(trainer.target().is_empty());
}

#[test]
fn test_greedy_loop_is_truncated() {
    // Zero exploration and an untrained table keep choosing UP at (0, 0)
    let config = TrainerConfig::default()
        .with_epsilon(0.0, 0.0, 1.0)
        .with_max_episode_steps(50);
    let mut trainer = tabular_trainer(config);

    let summary = trainer.run_episode().unwrap();
    assert_eq!(summary.steps, 50);
    assert_eq!(summary.outcome, None);
    assert_eq!(summary.reward, 0.0);
    assert_eq!(trainer.total_steps(), 50);

    let metrics = trainer.metrics();
    assert_eq!(metrics.episodes, 1);
    assert_eq!(metrics.goals_reached + metrics.obstacles_hit, 0);
    assert_eq!(trainer.env().agent_position(), Position::new(0, 0));

    // The next episode starts fresh and is capped again
    assert_eq!(trainer.run_episode().unwrap().steps, 50);
}

#[test]
fn test_zero_epsilon_evaluation_episode_returns() {
    let mut trainer = tabular_trainer(TrainerConfig::default().with_max_episode_steps(20));
    trainer.set_epsilon(0.0);
    let summary = trainer.run_episode().unwrap();
    assert!(summary.steps <= 20);
}
