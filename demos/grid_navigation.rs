/***
# Grid Navigation

* The agent learns to walk from the top-left corner to the goal of a 5x5 grid
* State: the last 4 frames of the grid stacked into a (5, 5, 4) tensor
* Actions: 4 possible moves (up, down, left, right), clamped at the edges
* Rewards: +10 for reaching the goal, -1 for stepping onto an obstacle, 0 otherwise
* Episode ends on the goal or on an obstacle

Pass a trainer config JSON path as the first argument to override the defaults.
Set RUST_LOG=debug to see target syncs.
***/

use gridworld_dqn::{
    config::{EnvConfig, TrainerConfig},
    environment::GridWorld,
    error::Result,
    estimator::DenseQNetworkBuilder,
    trainer::Trainer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const EPISODES: usize = 500;
const MAX_TEST_STEPS: usize = 25;
const SEED: u64 = 7;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainerConfig::from_json_file(path)?,
        None => TrainerConfig::default(),
    };

    let env = GridWorld::new(&EnvConfig::default())?;
    println!("Training Grid Navigation Agent...");
    println!("{}", env);

    let network = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .hidden_sizes(&[128])
        .learning_rate(0.001)
        .seed(SEED)
        .build()?;
    let mut trainer = Trainer::new(config, env, network, StdRng::seed_from_u64(SEED))?;

    let start_time = std::time::Instant::now();
    trainer.train(EPISODES)?;
    println!("\nTraining completed in {:?}", start_time.elapsed());

    let metrics = trainer.metrics();
    println!(
        "Goals: {}, obstacles: {}, updates: {}, target syncs: {}",
        metrics.goals_reached, metrics.obstacles_hit, metrics.updates, metrics.target_syncs
    );

    println!("\nTesting trained agent (epsilon = 0)...");
    let rollout = trainer.greedy_rollout(MAX_TEST_STEPS)?;
    let path: Vec<String> = rollout.path.iter().map(|p| p.to_string()).collect();
    match rollout.outcome {
        Some(outcome) => println!("  {:?} in {} steps, reward {}", outcome, rollout.path.len() - 1, rollout.reward),
        None => println!("  No terminal cell within {} steps", MAX_TEST_STEPS),
    }
    println!("  Path: {}", path.join(" -> "));

    Ok(())
}
