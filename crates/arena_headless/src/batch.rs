//! Many-seed balance runs.
//!
//! A batch plays one scenario across a contiguous seed range on the rayon
//! pool and folds the per-match metrics into a [`BatchSummary`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, GameMetrics};
use crate::runner::{run_game, GameConfig, RunError};
use crate::scenario::{Scenario, ScenarioError};
use crate::strategies::Strategy;

/// How often, in finished matches, the live tally is printed.
const TALLY_INTERVAL: u32 = 100;

/// What to run and where to put the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Built-in scenario name or path to a RON scenario
    pub scenario: String,
    /// Matches to play
    pub game_count: u32,
    /// Worker threads; 0 leaves sizing to rayon
    pub parallel_games: u32,
    /// Directory the JSON report is written to
    pub output_dir: PathBuf,
    /// Seed of match 0; match `i` plays `seed_start + i`
    pub seed_start: u64,
    /// Replaces the scenario's tick limit
    pub max_ticks: Option<u64>,
    /// Replaces the scenario's pilot
    pub strategy: Option<Strategy>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self::new("solo_easy", 100)
    }
}

impl BatchConfig {
    /// `game_count` matches of `scenario` from seed 0.
    #[must_use]
    pub fn new(scenario: &str, game_count: u32) -> Self {
        Self {
            scenario: scenario.into(),
            game_count,
            parallel_games: 0,
            output_dir: "results".into(),
            seed_start: 0,
            max_ticks: None,
            strategy: None,
        }
    }

    /// Write the report under `dir`.
    #[must_use]
    pub fn with_output(self, dir: PathBuf) -> Self {
        Self {
            output_dir: dir,
            ..self
        }
    }

    /// Start the seed range at `seed`.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed_start: seed,
            ..self
        }
    }

    /// Stop every match after `ticks`.
    #[must_use]
    pub fn with_max_ticks(self, ticks: u64) -> Self {
        Self {
            max_ticks: Some(ticks),
            ..self
        }
    }

    /// Fly every match with `strategy`.
    #[must_use]
    pub fn with_strategy(self, strategy: Strategy) -> Self {
        Self {
            strategy: Some(strategy),
            ..self
        }
    }

    /// Seed played by match `index`.
    #[must_use]
    pub const fn seed_for(&self, index: u32) -> u64 {
        self.seed_start.wrapping_add(index as u64)
    }

    fn game(&self, scenario: &Scenario, index: u32) -> GameConfig {
        let seed = self.seed_for(index);
        GameConfig {
            game_id: format!("game_{seed}"),
            max_ticks: self.max_ticks,
            strategy: self.strategy,
            ..GameConfig::new(scenario.clone(), seed)
        }
    }
}

/// Everything a batch produced, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// The batch that was run
    pub config: BatchConfig,
    /// Metrics of each finished match, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregates over `games`
    pub summary: BatchSummary,
    /// Wall-clock time of the whole batch
    pub duration_seconds: f64,
    /// Matches that could not be played
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Write as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Read a report written by [`Self::save`].
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(std::io::Error::other)
    }

    /// `<output_dir>/<scenario>_<seed_start>.json`
    #[must_use]
    pub fn default_path(&self) -> PathBuf {
        let file = format!("{}_{}.json", self.config.scenario, self.config.seed_start);
        self.config.output_dir.join(file)
    }
}

/// A match that failed to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchError {
    /// Position in the batch
    pub game_index: u32,
    /// Seed it was played with
    pub seed: u64,
    /// Rendered error
    pub message: String,
}

/// Live tally shared by the worker threads.
#[derive(Debug)]
pub struct BatchProgress {
    /// Matches in the batch
    pub total: u32,
    finished: AtomicU32,
    started_at: Instant,
    outcomes: Mutex<BTreeMap<String, u32>>,
}

impl BatchProgress {
    /// Empty tally for `total` matches.
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            finished: AtomicU32::new(0),
            started_at: Instant::now(),
            outcomes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Count a finished match; returns the new finished count.
    pub fn finish(&self, outcome: &str) -> u32 {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            *outcomes.entry(outcome.to_owned()).or_default() += 1;
        }
        self.finished.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Matches finished so far.
    pub fn finished(&self) -> u32 {
        self.finished.load(Ordering::Relaxed)
    }

    /// Finished share of the batch, 0..=100.
    pub fn percent_done(&self) -> f64 {
        100.0 * f64::from(self.finished()) / f64::from(self.total.max(1))
    }

    /// Remaining time at the average pace so far.
    pub fn time_left(&self) -> Duration {
        let done = self.finished();
        if done == 0 {
            return Duration::ZERO;
        }
        let pace = self.started_at.elapsed().as_secs_f64() / f64::from(done);
        Duration::from_secs_f64(pace * f64::from(self.total.saturating_sub(done)))
    }

    /// Share of finished matches per outcome label.
    pub fn outcome_shares(&self) -> BTreeMap<String, f64> {
        let done = self.finished();
        let Ok(outcomes) = self.outcomes.lock() else {
            return BTreeMap::new();
        };
        if done == 0 {
            return BTreeMap::new();
        }
        outcomes
            .iter()
            .map(|(label, count)| (label.clone(), f64::from(*count) / f64::from(done)))
            .collect()
    }

    /// Print the tally to stderr.
    pub fn print(&self) {
        let left = self.time_left().as_secs();
        eprintln!(
            "[{}/{} {:.1}%] about {}m {:02}s left",
            self.finished(),
            self.total,
            self.percent_done(),
            left / 60,
            left % 60
        );
        for (label, share) in self.outcome_shares() {
            eprintln!("    {label:<12}{:>6.1}%", share * 100.0);
        }
    }
}

/// Play every match of the batch.
///
/// The scenario is resolved once up front. A match that fails is recorded in
/// [`BatchResults::errors`] and the rest of the batch carries on.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let clock = Instant::now();
    let scenario = Scenario::resolve(&config.scenario)?;
    let progress = BatchProgress::new(config.game_count);
    info!(
        scenario = %scenario.name,
        games = config.game_count,
        seed_start = config.seed_start,
        "Batch started"
    );

    let play = |index: u32| -> Result<GameMetrics, BatchError> {
        let game = config.game(&scenario, index);
        let seed = game.seed;
        let result = run_game(game).map_err(|e| {
            warn!(index, seed, error = %e, "Match failed");
            BatchError {
                game_index: index,
                seed,
                message: e.to_string(),
            }
        })?;
        let done = progress.finish(&result.metrics.outcome);
        debug!(done, total = config.game_count, "Match finished");
        if done % TALLY_INTERVAL == 0 {
            progress.print();
        }
        Ok(result.metrics)
    };
    let play_all = || -> Vec<_> { (0..config.game_count).into_par_iter().map(play).collect() };

    let sized_pool = (config.parallel_games > 0)
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_games as usize)
                .build()
        })
        .and_then(|built| {
            built
                .map_err(|e| warn!(error = %e, "Using the global rayon pool"))
                .ok()
        });
    let outcomes = match &sized_pool {
        Some(pool) => pool.install(play_all),
        None => play_all(),
    };

    let mut games = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(metrics) => games.push(metrics),
            Err(error) => errors.push(error),
        }
    }

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = clock.elapsed().as_secs_f64();
    info!(
        played = games.len(),
        failed = errors.len(),
        seconds = format!("{duration_seconds:.1}"),
        "Batch finished"
    );

    Ok(BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    })
}

/// Play `seed` `runs` times; true when every run ends with the same hash,
/// length and outcome as the first.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> Result<bool, RunError> {
    let mut first: Option<GameMetrics> = None;
    for run in 0..runs {
        let metrics = run_game(GameConfig::new(scenario.clone(), seed))?.metrics;
        let Some(reference) = &first else {
            first = Some(metrics);
            continue;
        };
        let agrees = reference.final_state_hash == metrics.final_state_hash
            && reference.duration_ticks == metrics.duration_ticks
            && reference.outcome == metrics.outcome;
        if !agrees {
            warn!(
                run,
                seed,
                expected = reference.final_state_hash,
                actual = metrics.final_state_hash,
                "Run diverged"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(scenario: &str, games: u32) -> BatchConfig {
        BatchConfig::new(scenario, games).with_max_ticks(600)
    }

    #[test]
    fn test_default_batch_is_easy_solo() {
        let config = BatchConfig::default();
        assert_eq!(config.scenario, "solo_easy");
        assert_eq!(config.game_count, 100);
        assert_eq!(config.parallel_games, 0);
    }

    #[test]
    fn test_builders_and_seed_range() {
        let config = BatchConfig::new("pvp_duel", 500)
            .with_output(PathBuf::from("/tmp/arena"))
            .with_seed(12345)
            .with_strategy(Strategy::Scripted);

        assert_eq!(config.output_dir, PathBuf::from("/tmp/arena"));
        assert_eq!(config.strategy, Some(Strategy::Scripted));
        assert_eq!(config.seed_for(0), 12345);
        assert_eq!(config.seed_for(7), 12352);
        assert_eq!(BatchConfig::new("x", 1).with_seed(u64::MAX).seed_for(1), 0);
    }

    #[test]
    fn test_tally_counts_outcomes() {
        let progress = BatchProgress::new(4);
        assert_eq!(progress.finished(), 0);
        assert_eq!(progress.time_left(), Duration::ZERO);

        assert_eq!(progress.finish("victory"), 1);
        assert_eq!(progress.finish("defeat"), 2);
        assert_eq!(progress.finish("victory"), 3);

        assert!((progress.percent_done() - 75.0).abs() < 1e-9);
        let shares = progress.outcome_shares();
        assert!((shares["victory"] - 2.0 / 3.0).abs() < 1e-9);
        assert!((shares["defeat"] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_batch_plays_seed_range_in_order() {
        let results = run_batch(short("solo_easy", 6).with_seed(40)).unwrap();

        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_games, 6);
        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (40..46).collect::<Vec<_>>());
    }

    #[test]
    fn test_sized_pool_matches_global_pool() {
        let global = run_batch(short("coop_medium", 4).with_seed(3)).unwrap();
        let sized = run_batch(BatchConfig {
            parallel_games: 2,
            ..short("coop_medium", 4).with_seed(3)
        })
        .unwrap();
        assert_eq!(global.games, sized.games);
    }

    #[test]
    fn test_unknown_scenario_rejected_before_playing() {
        let err = run_batch(short("no_such_scenario", 2)).unwrap_err();
        assert!(matches!(err, ScenarioError::NotFound(_)));
    }

    #[test]
    fn test_repeated_runs_agree() {
        let scenario = Scenario {
            max_ticks: 900,
            ..Scenario::builtin("coop_medium").unwrap()
        };
        assert!(verify_determinism(&scenario, 12345, 3).unwrap());
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let results = run_batch(short("pvp_duel", 3)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("duel.json");

        results.save(&path).unwrap();
        let reloaded = BatchResults::load(&path).unwrap();
        assert_eq!(reloaded.config, results.config);
        assert_eq!(reloaded.games, results.games);
        assert_eq!(
            results.default_path(),
            PathBuf::from("results").join("pvp_duel_0.json")
        );
    }
}
