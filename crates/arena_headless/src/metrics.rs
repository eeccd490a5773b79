//! Match metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] folds each tick's [`TickEvents`] into a
//! [`GameMetrics`]; [`BatchSummary`] aggregates many of those.

use std::collections::BTreeMap;

use arena_core::combatant::PlayerSlot;
use arena_core::events::{CombatEvent, MatchOutcome, TickEvents, Target};
use arena_core::player::Player;
use arena_core::simulation::Simulation;
use arena_core::wave::WaveProgress;
use serde::{Deserialize, Serialize};

/// Maximum events kept per game.
const MAX_EVENTS: usize = 10_000;

/// Outcome label for a match stopped by the tick limit.
pub const TIMEOUT: &str = "timeout";

/// Complete metrics for a single game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Game mode name.
    pub mode: String,
    /// Difficulty name.
    pub difficulty: String,
    /// Ticks simulated.
    pub duration_ticks: u64,
    /// How the game ended: `victory`, `defeat`, `player_one`, `player_two`
    /// or [`TIMEOUT`].
    pub outcome: String,
    /// Highest wave reached.
    pub waves_reached: u32,
    /// Whether the boss appeared.
    pub boss_seen: bool,
    /// Rounds fired by everyone.
    pub shots_fired: u64,
    /// Grenades and smoke that went off.
    pub detonations: u64,
    /// Enemies destroyed.
    pub enemy_kills: u32,
    /// Damage dealt to robots and the boss.
    pub enemy_damage: i64,
    /// Shop purchases made by the pilot.
    pub purchases: u32,
    /// Per-player metrics, in slot order.
    pub players: Vec<PlayerMetrics>,
    /// Timed events log.
    pub events: Vec<TimedEvent>,
    /// Final simulation state hash.
    pub final_state_hash: u64,
}

impl GameMetrics {
    /// Metrics for `slot`, if that player took part.
    #[must_use]
    pub fn player(&self, slot: PlayerSlot) -> Option<&PlayerMetrics> {
        self.players.get(slot.index())
    }

    /// Combined score of every player.
    #[must_use]
    pub fn total_score(&self) -> u64 {
        self.players.iter().map(|p| u64::from(p.score)).sum()
    }

    /// Whether the game ended in a win for the players or either duelist.
    #[must_use]
    pub fn decided(&self) -> bool {
        self.outcome != TIMEOUT
    }
}

/// Metrics for a single player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    /// Credited kills.
    pub kills: u32,
    /// Final score.
    pub score: u32,
    /// Final coin balance.
    pub coins: u32,
    /// Total damage taken.
    pub damage_taken: i64,
    /// Health when the game ended.
    pub final_health: i32,
    /// Whether the player survived.
    pub survived: bool,
    /// Tick of the first credited kill.
    pub first_kill_tick: Option<u64>,
}

impl PlayerMetrics {
    fn finish(&mut self, player: &Player) {
        self.kills = player.kills;
        self.score = player.score;
        self.coins = player.coins;
        self.final_health = player.body.health;
        self.survived = player.is_alive();
    }
}

/// A notable moment in a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Tick the event happened on.
    pub tick: u64,
    /// What happened.
    pub event_type: EventType,
    /// Free-form details.
    pub details: String,
}

/// Kinds of [`TimedEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A new wave spawned.
    WaveStarted,
    /// The boss joined the fight.
    BossSpawned,
    /// The shop opened on a coin threshold.
    ShopPrompt,
    /// A purchase went through.
    Purchase,
    /// A player died.
    PlayerDown,
    /// The match ended.
    MatchEnded,
}

/// Label used in reports for an outcome.
#[must_use]
pub const fn outcome_label(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Victory => "victory",
        MatchOutcome::Defeat => "defeat",
        MatchOutcome::PvpWinner(PlayerSlot::One) => "player_one",
        MatchOutcome::PvpWinner(PlayerSlot::Two) => "player_two",
    }
}

/// Aggregate statistics across a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Games summarised.
    pub total_games: u32,
    /// Fraction of games per outcome label.
    pub outcome_rates: BTreeMap<String, f64>,
    /// Mean game length.
    pub avg_duration_ticks: f64,
    /// Mean highest wave.
    pub avg_waves_reached: f64,
    /// Mean enemies destroyed.
    pub avg_enemy_kills: f64,
    /// Mean combined score.
    pub avg_score: f64,
    /// Mean rounds fired.
    pub avg_shots_fired: f64,
    /// Games where every player survived.
    pub flawless_games: u32,
}

impl BatchSummary {
    /// Summarise `games`.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        let total = games.len();
        if total == 0 {
            return Self::default();
        }
        let n = total as f64;

        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for game in games {
            *counts.entry(game.outcome.clone()).or_default() += 1;
        }
        let outcome_rates = counts
            .into_iter()
            .map(|(label, count)| (label, f64::from(count) / n))
            .collect();

        let mean = |f: fn(&GameMetrics) -> f64| games.iter().map(f).sum::<f64>() / n;

        Self {
            total_games: total as u32,
            outcome_rates,
            avg_duration_ticks: mean(|g| g.duration_ticks as f64),
            avg_waves_reached: mean(|g| f64::from(g.waves_reached)),
            avg_enemy_kills: mean(|g| f64::from(g.enemy_kills)),
            avg_score: mean(|g| g.total_score() as f64),
            avg_shots_fired: mean(|g| g.shots_fired as f64),
            flawless_games: games
                .iter()
                .filter(|g| g.players.iter().all(|p| p.survived))
                .count() as u32,
        }
    }

    /// Fraction of games with the given outcome label.
    #[must_use]
    pub fn rate(&self, outcome: &str) -> f64 {
        self.outcome_rates.get(outcome).copied().unwrap_or(0.0)
    }
}

/// Accumulates metrics while a game runs.
#[derive(Debug)]
pub struct MetricsCollector {
    metrics: GameMetrics,
}

impl MetricsCollector {
    /// Start collecting for a freshly built simulation.
    #[must_use]
    pub fn new(game_id: &str, scenario: &str, sim: &Simulation) -> Self {
        let config = sim.config();
        Self {
            metrics: GameMetrics {
                game_id: game_id.to_string(),
                scenario: scenario.to_string(),
                seed: config.seed,
                mode: format!("{:?}", config.mode).to_lowercase(),
                difficulty: config.difficulty.name().to_string(),
                waves_reached: sim.director().current_wave(),
                boss_seen: sim.boss().is_some(),
                players: vec![PlayerMetrics::default(); sim.players().len()],
                outcome: TIMEOUT.to_string(),
                ..GameMetrics::default()
            },
        }
    }

    fn log(&mut self, tick: u64, event_type: EventType, details: String) {
        if self.metrics.events.len() < MAX_EVENTS {
            self.metrics.events.push(TimedEvent {
                tick,
                event_type,
                details,
            });
        }
    }

    /// Fold one tick's events in.
    pub fn on_tick(&mut self, tick: u64, events: &TickEvents) {
        self.metrics.shots_fired += u64::from(events.shots_fired);
        self.metrics.detonations += u64::from(events.detonations);

        for event in &events.combat {
            match *event {
                CombatEvent::Damage { target, amount, .. } => match target {
                    Target::Player(slot) => {
                        if let Some(p) = self.metrics.players.get_mut(slot.index()) {
                            p.damage_taken += i64::from(amount);
                        }
                    }
                    Target::Robot(_) | Target::Boss => {
                        self.metrics.enemy_damage += i64::from(amount);
                    }
                },
                CombatEvent::Killed { target, credited } => {
                    if let Target::Player(slot) = target {
                        self.log(tick, EventType::PlayerDown, format!("{slot:?}"));
                    } else {
                        self.metrics.enemy_kills += 1;
                    }
                    if let Some(p) = credited.and_then(|s| self.metrics.players.get_mut(s.index())) {
                        p.first_kill_tick.get_or_insert(tick);
                    }
                }
                CombatEvent::Frozen { .. } => {}
            }
        }

        if let Some(WaveProgress::Advanced { wave, boss }) = events.wave {
            self.metrics.waves_reached = wave;
            self.log(tick, EventType::WaveStarted, format!("wave {wave}"));
            if boss {
                self.metrics.boss_seen = true;
                self.log(tick, EventType::BossSpawned, format!("wave {wave}"));
            }
        }
        if let Some(prompt) = events.shop_prompt {
            self.log(tick, EventType::ShopPrompt, format!("{prompt:?}"));
        }
        if let Some(outcome) = events.outcome {
            self.metrics.outcome = outcome_label(outcome).to_string();
            self.log(tick, EventType::MatchEnded, self.metrics.outcome.clone());
        }
    }

    /// Record a purchase made by the pilot.
    pub fn on_purchase(&mut self, tick: u64, item: &impl std::fmt::Debug) {
        self.metrics.purchases += 1;
        self.log(tick, EventType::Purchase, format!("{item:?}"));
    }

    /// Current metrics snapshot.
    #[must_use]
    pub fn current(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Finalize with the end state of the simulation.
    #[must_use]
    pub fn finalize(mut self, sim: &Simulation) -> GameMetrics {
        self.metrics.duration_ticks = sim.current_tick();
        self.metrics.final_state_hash = sim.state_hash();
        for (metrics, player) in self.metrics.players.iter_mut().zip(sim.players()) {
            metrics.finish(player);
        }
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::config::{GameMode, MatchConfig};
    use arena_core::difficulty::Difficulty;
    use arena_core::events::DamageSource;
    use arena_core::robot::RobotKind;
    use arena_test_utils::fixtures::{place_robot, quiet_pair};
    use glam::Vec2;

    fn game(outcome: &str, duration: u64, kills: u32) -> GameMetrics {
        GameMetrics {
            outcome: outcome.to_string(),
            duration_ticks: duration,
            enemy_kills: kills,
            players: vec![PlayerMetrics {
                score: kills * 100,
                survived: outcome == "victory",
                ..PlayerMetrics::default()
            }],
            ..GameMetrics::default()
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(outcome_label(MatchOutcome::Victory), "victory");
        assert_eq!(
            outcome_label(MatchOutcome::PvpWinner(PlayerSlot::Two)),
            "player_two"
        );
    }

    #[test]
    fn test_batch_summary() {
        let games = vec![
            game("victory", 1000, 8),
            game("victory", 2000, 8),
            game("defeat", 600, 3),
            game(TIMEOUT, 36_000, 5),
        ];
        let summary = BatchSummary::from_games(&games);
        assert_eq!(summary.total_games, 4);
        assert!((summary.rate("victory") - 0.5).abs() < 1e-9);
        assert!((summary.rate("defeat") - 0.25).abs() < 1e-9);
        assert_eq!(summary.rate("player_one"), 0.0);
        assert!((summary.avg_enemy_kills - 6.0).abs() < 1e-9);
        assert!((summary.avg_score - 600.0).abs() < 1e-9);
        assert_eq!(summary.flawless_games, 2);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }

    #[test]
    fn test_collector_folds_events() {
        let mut sim = quiet_pair(GameMode::Coop, 3);
        let robot = Target::Robot(place_robot(&mut sim, RobotKind::Gun, Vec2::new(300.0, 0.0)));
        let mut collector = MetricsCollector::new("g0", "coop", &sim);
        assert_eq!(collector.current().players.len(), 2);
        assert_eq!(collector.current().mode, "coop");

        let events = TickEvents {
            combat: vec![
                CombatEvent::Damage {
                    target: robot,
                    amount: 28,
                    source: DamageSource::Projectile,
                },
                CombatEvent::Killed {
                    target: robot,
                    credited: Some(PlayerSlot::Two),
                },
                CombatEvent::Damage {
                    target: Target::Player(PlayerSlot::One),
                    amount: 5,
                    source: DamageSource::Projectile,
                },
            ],
            shots_fired: 3,
            wave: Some(WaveProgress::Advanced { wave: 2, boss: true }),
            ..TickEvents::default()
        };
        collector.on_tick(40, &events);

        let metrics = collector.current();
        assert_eq!(metrics.enemy_kills, 1);
        assert_eq!(metrics.enemy_damage, 28);
        assert_eq!(metrics.shots_fired, 3);
        assert_eq!(metrics.waves_reached, 2);
        assert!(metrics.boss_seen);
        assert_eq!(metrics.players[0].damage_taken, 5);
        assert_eq!(metrics.players[1].first_kill_tick, Some(40));
        assert_eq!(metrics.events.len(), 2);
    }

    #[test]
    fn test_finalize_reads_players() {
        let mut sim = Simulation::new(MatchConfig::solo(Difficulty::Easy, 4));
        sim.player_mut(PlayerSlot::One).unwrap().score = 700;
        let collector = MetricsCollector::new("g1", "solo", &sim);
        let metrics = collector.finalize(&sim);
        assert_eq!(metrics.outcome, TIMEOUT);
        assert!(!metrics.decided());
        assert_eq!(metrics.player(PlayerSlot::One).unwrap().score, 700);
        assert!(metrics.players[0].survived);
        assert_eq!(metrics.final_state_hash, sim.state_hash());
    }
}
