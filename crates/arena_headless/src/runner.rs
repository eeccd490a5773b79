//! Headless match execution.
//!
//! Runs a [`Scenario`] to completion or to its tick limit, piloting the
//! local players with the scenario's [`Strategy`] and collecting metrics.
//!
//! All loops are bounded by the tick limit and the event log is capped, so a
//! stalled match ends as a timeout instead of hanging a batch.

use std::time::Instant;

use arena_core::combatant::PlayerSlot;
use arena_core::error::ArenaError;
use arena_core::replay::Replay;
use arena_core::simulation::Simulation;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::scenario::{Scenario, ScenarioError};
use crate::strategies::Strategy;

/// Progress logging interval (ticks).
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Ticks slower than this are logged; a normal tick is well under 1ms.
const SLOW_TICK_THRESHOLD_MS: u128 = 100;

/// Error type for a single game run.
#[derive(Error, Debug)]
pub enum RunError {
    /// Scenario could not be resolved.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// The simulation refused an operation.
    #[error(transparent)]
    Simulation(#[from] ArenaError),
}

/// Configuration for a single game run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Game ID for tracking.
    pub game_id: String,
    /// Scenario to play. Its config seed is replaced by [`Self::seed`].
    pub scenario: Scenario,
    /// Random seed for the match.
    pub seed: u64,
    /// Tick limit; `None` uses the scenario's own.
    pub max_ticks: Option<u64>,
    /// Pilot override; `None` uses the scenario's own.
    pub strategy: Option<Strategy>,
    /// Record a replay of the run.
    pub record_replay: bool,
}

impl GameConfig {
    /// Run `scenario` once with `seed`.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            game_id: format!("{}_{seed}", scenario.name),
            scenario,
            seed,
            max_ticks: None,
            strategy: None,
            record_replay: false,
        }
    }

    /// Also record a replay.
    #[must_use]
    pub fn recording(mut self) -> Self {
        self.record_replay = true;
        self
    }
}

/// Result of running a game.
#[derive(Debug)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// Final simulation state hash.
    pub final_state_hash: u64,
    /// Replay of the run, when requested.
    pub replay: Option<Replay>,
}

/// Build the starting simulation for a scenario: seed it, then apply the
/// primary player's starting coins and purchases.
pub fn prepare(scenario: &Scenario, seed: u64) -> Simulation {
    let mut config = scenario.config.clone();
    config.seed = seed;
    let mut sim = Simulation::new(config);

    if let Some(primary) = sim.player_mut(PlayerSlot::One) {
        primary.add_coins(scenario.starting_coins);
    }
    for &item in &scenario.purchases {
        if !sim.buy(PlayerSlot::One, item) {
            warn!(?item, scenario = %scenario.name, "Starting purchase refused");
        }
    }
    sim
}

/// Run one game to completion.
pub fn run_game(config: GameConfig) -> Result<GameResult, RunError> {
    let started = Instant::now();
    let strategy = config.strategy.unwrap_or(config.scenario.strategy);
    let max_ticks = config.max_ticks.unwrap_or(config.scenario.max_ticks);
    info!(
        game_id = %config.game_id,
        seed = config.seed,
        max_ticks,
        scenario = %config.scenario.name,
        strategy = strategy.name(),
        "Starting game simulation"
    );

    let mut sim = prepare(&config.scenario, config.seed);
    let mut replay = if config.record_replay {
        Some(Replay::new(config.scenario.name.clone(), &sim)?)
    } else {
        None
    };
    let mut collector = MetricsCollector::new(&config.game_id, &config.scenario.name, &sim);

    while sim.current_tick() < max_ticks && !sim.is_over() {
        let tick = sim.current_tick();
        let frame = strategy.frame_input(&sim, tick);
        if let Some(replay) = replay.as_mut() {
            replay.record_input(tick, frame);
        }

        let tick_start = Instant::now();
        let events = sim.tick(&frame);
        let elapsed = tick_start.elapsed().as_millis();
        if elapsed > SLOW_TICK_THRESHOLD_MS {
            warn!(
                tick,
                duration_ms = elapsed,
                robots = sim.robots().len(),
                "Slow tick detected"
            );
        }
        collector.on_tick(tick, &events);

        // Shop purchases happen between ticks, before the frame that closes it.
        if let Some(item) = events.shop_prompt.and_then(|p| strategy.purchase_for(p)) {
            let at = sim.current_tick();
            if sim.buy(PlayerSlot::One, item) {
                collector.on_purchase(at, &item);
                if let Some(replay) = replay.as_mut() {
                    replay.record_purchase(at, PlayerSlot::One, item);
                }
            }
        }

        if sim.current_tick() % PROGRESS_LOG_INTERVAL == 0 {
            debug!(
                tick = sim.current_tick(),
                max_ticks,
                progress_pct = (sim.current_tick() as f64 / max_ticks as f64 * 100.0) as u32,
                wave = sim.director().current_wave(),
                robots = sim.robots().len(),
                score = sim.score(),
                elapsed_ms = started.elapsed().as_millis(),
                "Game progress"
            );
        }
    }

    if let Some(replay) = replay.as_mut() {
        replay.finalize(&sim);
    }
    let metrics = collector.finalize(&sim);
    info!(
        game_id = %config.game_id,
        duration_ticks = metrics.duration_ticks,
        duration_ms = started.elapsed().as_millis(),
        outcome = %metrics.outcome,
        waves = metrics.waves_reached,
        kills = metrics.enemy_kills,
        "Game simulation complete"
    );

    Ok(GameResult {
        final_state_hash: metrics.final_state_hash,
        metrics,
        replay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::TIMEOUT;
    use arena_core::replay::ReplayPlayer;
    use arena_core::weapon::WeaponKind;

    fn scenario(name: &str) -> Scenario {
        Scenario::builtin(name).unwrap()
    }

    #[test]
    fn test_idle_run_times_out() {
        let config = GameConfig {
            max_ticks: Some(200),
            strategy: Some(Strategy::Idle),
            ..GameConfig::new(scenario("pvp_duel"), 1)
        };
        let result = run_game(config).unwrap();
        assert_eq!(result.metrics.duration_ticks, 200);
        assert_eq!(result.metrics.outcome, TIMEOUT);
        assert_eq!(result.metrics.shots_fired, 0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = || {
            let config = GameConfig {
                max_ticks: Some(1500),
                ..GameConfig::new(scenario("coop_medium"), 7)
            };
            run_game(config).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.final_state_hash, b.final_state_hash);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_starting_purchases_applied() {
        let sim = prepare(&scenario("impossible_waves"), 3);
        let primary = sim.player(PlayerSlot::One).unwrap();
        assert!(primary.loadout.has(WeaponKind::Shotgun));
        assert!(primary.loadout.has(WeaponKind::Electric));
        assert_eq!(primary.medkits, 3);
        let spent: u32 = scenario("impossible_waves")
            .purchases
            .iter()
            .filter_map(|item| item.price())
            .sum();
        assert_eq!(primary.coins, 400 - spent);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let config = GameConfig {
            max_ticks: Some(900),
            ..GameConfig::new(scenario("solo_easy"), 11).recording()
        };
        let result = run_game(config).unwrap();
        let replay = result.replay.unwrap();
        assert_eq!(replay.final_hash, result.final_state_hash);
        assert_eq!(replay.duration(), result.metrics.duration_ticks);

        let mut player = ReplayPlayer::new(replay).unwrap();
        player.verify().unwrap();
    }
}
