//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical config, seed and inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism this harness is meant to catch:
//!
//! - **Unseeded randomness**: every random draw must come from the match's
//!   stored `Pcg32`.
//! - **Iteration order**: entities are walked in arena slot order, never
//!   through a hash map.
//! - **Float evaluation order**: systems must run in the same order and
//!   perform the same operations every frame.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: single systems (movement, projectiles, AI)
//! 2. **Property tests**: random input scripts still replay identically
//! 3. **Integration tests**: full matches are reproducible
//! 4. **Parallel tests**: N simulations on N threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::input::FrameInput;
use arena_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// All distinct hashes (one for a deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine several times and compare final hashes.
///
/// `step` receives the tick number so scripted inputs can vary per frame.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for tick in 0..ticks {
            step(&mut state, tick);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a [`Simulation`] twice under the same input script and compare.
pub fn verify_simulation_determinism<F, I>(setup_fn: F, script: I, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
    I: Fn(u64) -> FrameInput,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim, tick| {
            sim.tick(&script(tick));
        },
        Simulation::state_hash,
    )
    .is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Whether every simulation finished with the same hash.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 All hashes: {:?}",
                self.num_sims, self.ticks, self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations_scoped<F, I>(
    setup_fn: F,
    script: I,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
    I: Fn(u64) -> FrameInput + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for tick in 0..num_ticks {
                        sim.tick(&script(tick));
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Step two simulations side by side and report the first tick whose
/// hashes differ, or `None` if they never do.
pub fn find_first_divergence<F, I>(setup_fn: F, script: I, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
    I: Fn(u64) -> FrameInput,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 0..num_ticks {
        let input = script(tick);
        sim1.tick(&input);
        sim2.tick(&input);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick + 1);
        }
    }

    None
}

/// Check that a serialize/deserialize round trip mid-match changes nothing,
/// including what happens on later ticks.
pub fn verify_serialization_determinism<F, I>(setup_fn: F, script: I, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
    I: Fn(u64) -> FrameInput,
{
    let mut sim = setup_fn();
    for tick in 0..num_ticks {
        sim.tick(&script(tick));
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };
    if restored.state_hash() != sim.state_hash() {
        return false;
    }

    for tick in num_ticks..num_ticks * 2 {
        let input = script(tick);
        sim.tick(&input);
        restored.tick(&input);
    }
    restored.state_hash() == sim.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These generate random but reproducible inputs for property-based tests.
pub mod strategies {
    use arena_core::difficulty::Difficulty;
    use arena_core::input::{FrameInput, PlayerInput};
    use arena_core::weapon::WeaponKind;
    use proptest::prelude::*;

    /// Aim angle in radians.
    pub fn arb_angle() -> impl Strategy<Value = f32> {
        -std::f32::consts::PI..std::f32::consts::PI
    }

    /// Match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Any difficulty preset.
    pub fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
        prop::sample::select(Difficulty::ALL.to_vec())
    }

    /// Any weapon kind.
    pub fn arb_weapon() -> impl Strategy<Value = WeaponKind> {
        prop::sample::select(WeaponKind::ALL.to_vec())
    }

    /// One player's input for one frame.
    pub fn arb_player_input() -> impl Strategy<Value = PlayerInput> {
        (
            any::<[bool; 4]>(),
            proptest::option::of(arb_angle()),
            any::<[bool; 5]>(),
        )
            .prop_map(|([up, down, left, right], aim, [fire, reload, switch, melee, medkit])| {
                PlayerInput {
                    up,
                    down,
                    left,
                    right,
                    aim,
                    fire,
                    reload,
                    switch_weapon: switch,
                    melee,
                    use_medkit: medkit,
                }
            })
    }

    /// Input for both slots.
    pub fn arb_frame_input() -> impl Strategy<Value = FrameInput> {
        (arb_player_input(), arb_player_input()).prop_map(|(a, b)| FrameInput::pair(a, b))
    }

    /// A sequence of frames.
    pub fn arb_input_script(max_len: usize) -> impl Strategy<Value = Vec<FrameInput>> {
        proptest::collection::vec(arb_frame_input(), 1..max_len)
    }

    /// Distance in world units.
    pub fn arb_distance(max: f32) -> impl Strategy<Value = f32> {
        0.0..max
    }

    /// Base damage values.
    pub fn arb_damage() -> impl Strategy<Value = i32> {
        1i32..500i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scripted_input;
    use arena_core::config::{GameMode, MatchConfig};
    use arena_core::difficulty::Difficulty;
    use proptest::prelude::*;

    fn idle(_: u64) -> FrameInput {
        FrameInput::default()
    }

    #[test]
    fn test_idle_match_is_deterministic() {
        assert!(verify_simulation_determinism(
            || Simulation::new(MatchConfig::solo(Difficulty::Hard, 5)),
            idle,
            300,
        ));
    }

    #[test]
    fn test_scripted_coop_has_no_divergence() {
        let setup =
            || Simulation::new(MatchConfig::solo(Difficulty::Medium, 11).with_mode(GameMode::Coop));
        assert_eq!(find_first_divergence(setup, scripted_input, 400), None);
    }

    #[test]
    fn test_parallel_runs_agree() {
        run_parallel_simulations_scoped(
            || Simulation::new(MatchConfig::solo(Difficulty::Impossible, 3)),
            scripted_input,
            4,
            200,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_serialization_mid_match() {
        assert!(verify_serialization_determinism(
            || Simulation::new(MatchConfig::solo(Difficulty::Easy, 21)),
            scripted_input,
            150,
        ));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = Simulation::new(MatchConfig::solo(Difficulty::Easy, 1)).state_hash();
        let b = Simulation::new(MatchConfig::solo(Difficulty::Easy, 2)).state_hash();
        assert_ne!(a, b);
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&42u64), compute_hash(&42u64));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_random_scripts_replay_identically(
            seed in strategies::arb_seed(),
            difficulty in strategies::arb_difficulty(),
            script in strategies::arb_input_script(60),
        ) {
            let setup = || Simulation::new(MatchConfig::solo(difficulty, seed).with_mode(GameMode::Coop));
            let play = |tick: u64| script[(tick as usize) % script.len()];
            prop_assert_eq!(find_first_divergence(setup, play, 120), None);
        }
    }
}
