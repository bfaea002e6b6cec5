//! Criterion benchmarks for the DQN hot path

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gridworld_dqn::config::{EnvConfig, TrainerConfig};
use gridworld_dqn::environment::GridWorld;
use gridworld_dqn::estimator::{DenseQNetworkBuilder, ValueEstimator};
use gridworld_dqn::trainer::Trainer;
use gridworld_dqn::types::{Action, StateBatch};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_env_step(c: &mut Criterion) {
    let mut env = GridWorld::new(&EnvConfig::default()).unwrap();
    c.bench_function("env_step", |b| {
        b.iter(|| {
            let result = env.step(black_box(Action::Right));
            if result.terminal {
                env.reset();
            }
            result
        });
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dense Evaluate");
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let network = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .seed(1)
        .build()
        .unwrap();
    let state = env.encoded_state();

    for batch_size in [1usize, 32, 128].iter() {
        let states = vec![&state; *batch_size];
        let batch = StateBatch::new(&states).unwrap();
        group.bench_with_input(BenchmarkId::new("batch", batch_size), &batch, |b, batch| {
            b.iter(|| network.evaluate(black_box(batch.view())).unwrap());
        });
    }

    group.finish();
}

fn bench_learn(c: &mut Criterion) {
    let env = GridWorld::new(&EnvConfig::default()).unwrap();
    let network = DenseQNetworkBuilder::new()
        .input_shape(env.encoding_shape())
        .seed(2)
        .build()
        .unwrap();
    let config = TrainerConfig::default().with_observe_steps(1_000_000);
    let mut trainer = Trainer::new(config, env, network, StdRng::seed_from_u64(2)).unwrap();
    while trainer.buffer().len() < 256 {
        trainer.step().unwrap();
    }

    c.bench_function("learn_batch_32", |b| {
        b.iter(|| trainer.learn().unwrap());
    });
}

criterion_group!(benches, bench_env_step, bench_evaluate, bench_learn);
criterion_main!(benches);
