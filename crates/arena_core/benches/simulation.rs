//! Simulation benchmarks for arena_core.
//!
//! Run with: `cargo bench -p arena_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use arena_core::config::{GameMode, MatchConfig};
use arena_core::difficulty::Difficulty;
use arena_core::input::{FrameInput, PlayerInput};
use arena_core::simulation::Simulation;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn busy_input(tick: u64) -> FrameInput {
    let player = PlayerInput {
        left: tick % 120 < 60,
        right: tick % 120 >= 60,
        ..PlayerInput::firing_at((tick % 628) as f32 / 100.0)
    };
    FrameInput::pair(player, player)
}

/// One tick of a crowded match and a full second of play.
pub fn simulation_benchmark(c: &mut Criterion) {
    let mut warm = Simulation::new(
        MatchConfig::solo(Difficulty::Impossible, 7).with_mode(GameMode::Coop),
    );
    for tick in 0..120 {
        warm.tick(&busy_input(tick));
    }

    c.bench_function("tick_impossible_coop", |b| {
        b.iter_batched(
            || warm.clone(),
            |mut sim| black_box(sim.tick(&busy_input(sim.current_tick()))),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("one_second_hard_solo", |b| {
        b.iter_batched(
            || Simulation::new(MatchConfig::solo(Difficulty::Hard, 7)),
            |mut sim| {
                for tick in 0..60 {
                    sim.tick(&busy_input(tick));
                }
                black_box(sim.state_hash())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("state_hash", |b| b.iter(|| black_box(warm.state_hash())));
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
