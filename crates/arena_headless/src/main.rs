//! Headless arena match runner.
//!
//! Runs matches without graphics for balance testing, CI determinism checks
//! and replay verification. Logs go to stderr; `run --json` prints metrics
//! on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Single match with the default scenario
//! cargo run -p arena_headless
//!
//! # Single match, recording a replay
//! cargo run -p arena_headless -- run --scenario pvp_duel --seed 7 --record duel.replay
//!
//! # Batch balance test
//! cargo run -p arena_headless -- batch --scenario solo_hard --count 1000 --output results/
//!
//! # Determinism check
//! cargo run -p arena_headless -- verify --scenario coop_medium --runs 5
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::error::ArenaError;
use arena_core::replay::{Replay, ReplayPlayer};
use arena_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{prepare, run_game, GameConfig},
    scenario::{Scenario, BUILTIN_SCENARIOS},
    strategies::Strategy,
};

#[derive(Parser)]
#[command(name = "arena_headless")]
#[command(about = "Headless arena match runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single match
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "solo_easy")]
        scenario: String,

        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Tick limit override
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Pilot override (idle, scripted, autopilot, duelist)
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<Strategy>,

        /// Write a replay of the match to this file
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print the match metrics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Run a batch of matches for balance testing
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "solo_easy")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Pilot override
        #[arg(long, value_parser = parse_strategy)]
        strategy: Option<Strategy>,

        /// Tick limit override
        #[arg(long)]
        max_ticks: Option<u64>,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Scenario to test
        #[arg(short, long, default_value = "coop_medium")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Replay a recorded match
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Verify the replay reproduces the recorded hash
        #[arg(long)]
        verify: bool,
    },

    /// Run N idle ticks of a scenario for timing
    Benchmark {
        /// Number of ticks to run
        #[arg(short, long, default_value = "36000")]
        ticks: u64,

        /// Scenario to benchmark
        #[arg(short, long, default_value = "impossible_waves")]
        scenario: String,
    },

    /// List the built-in scenarios
    Scenarios,
}

fn parse_strategy(name: &str) -> Result<Strategy, String> {
    Strategy::parse(name).ok_or_else(|| {
        let known: Vec<&str> = Strategy::ALL.iter().map(|s| s.name()).collect();
        format!("unknown strategy '{name}' (expected one of: {})", known.join(", "))
    })
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON output
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run {
            scenario,
            seed,
            max_ticks,
            strategy,
            record,
            json,
        }) => cmd_run(&scenario, seed, max_ticks, strategy, record, json),
        Some(Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            strategy,
            max_ticks,
        }) => cmd_batch(BatchConfig {
            scenario,
            game_count: count,
            parallel_games: parallel,
            output_dir: output,
            seed_start: seed,
            max_ticks,
            strategy,
        }),
        Some(Commands::Verify {
            scenario,
            seed,
            runs,
        }) => cmd_verify(&scenario, seed, runs),
        Some(Commands::Replay { file, verify }) => cmd_replay(file, verify),
        Some(Commands::Benchmark { ticks, scenario }) => cmd_benchmark(ticks, &scenario),
        Some(Commands::Scenarios) => cmd_scenarios(),
        None => cmd_run("solo_easy", 0, None, None, None, false),
    }
}

fn resolve_or_exit(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load scenario '{}': {}", name, e);
            std::process::exit(1);
        }
    }
}

/// Run a single match
fn cmd_run(
    scenario: &str,
    seed: u64,
    max_ticks: Option<u64>,
    strategy: Option<Strategy>,
    record: Option<PathBuf>,
    json: bool,
) {
    let config = GameConfig {
        max_ticks,
        strategy,
        record_replay: record.is_some(),
        ..GameConfig::new(resolve_or_exit(scenario), seed)
    };

    let result = match run_game(config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Match failed: {}", e);
            std::process::exit(1);
        }
    };

    if let (Some(path), Some(replay)) = (&record, &result.replay) {
        if let Err(e) = replay.save(path) {
            eprintln!("Failed to save replay: {}", e);
            std::process::exit(1);
        }
        eprintln!("Replay saved to: {}", path.display());
    }

    let metrics = &result.metrics;
    if json {
        match serde_json::to_string_pretty(metrics) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Failed to encode metrics: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    eprintln!("Match complete:");
    eprintln!("  Scenario: {} ({} / {})", metrics.scenario, metrics.mode, metrics.difficulty);
    eprintln!("  Outcome: {}", metrics.outcome);
    eprintln!("  Duration: {} ticks", metrics.duration_ticks);
    eprintln!("  Waves reached: {}", metrics.waves_reached);
    eprintln!("  Enemies destroyed: {}", metrics.enemy_kills);
    for (index, player) in metrics.players.iter().enumerate() {
        eprintln!(
            "  Player {}: score {}, kills {}, coins {}, health {}",
            index + 1,
            player.score,
            player.kills,
            player.coins,
            player.final_health
        );
    }
    eprintln!("  Final hash: {:016x}", result.final_state_hash);
}

/// Play a seed range and write the JSON report
fn cmd_batch(config: BatchConfig) {
    tracing::info!(
        scenario = %config.scenario,
        games = config.game_count,
        threads = config.parallel_games,
        seed_start = config.seed_start,
        output = %config.output_dir.display(),
        "Batch requested"
    );

    if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
        eprintln!("Cannot create {}: {}", config.output_dir.display(), e);
        std::process::exit(1);
    }

    let results = run_batch(config).unwrap_or_else(|e| {
        eprintln!("Batch not started: {}", e);
        std::process::exit(1);
    });
    let report = results.default_path();
    if let Err(e) = results.save(&report) {
        tracing::error!(error = %e, path = %report.display(), "Report not written");
        std::process::exit(1);
    }

    let summary = &results.summary;
    let rule = "-".repeat(50);
    eprintln!("{rule}");
    eprintln!(
        "{} matches of '{}' in {:.1}s ({:.1}/s)",
        results.games.len(),
        results.config.scenario,
        results.duration_seconds,
        results.games.len() as f64 / results.duration_seconds.max(0.001)
    );
    eprintln!("{rule}");
    for (outcome, share) in &summary.outcome_rates {
        eprintln!("{:<12}{:>6.1}%", outcome, share * 100.0);
    }
    eprintln!("mean ticks        {:.0}", summary.avg_duration_ticks);
    eprintln!("mean wave         {:.2}", summary.avg_waves_reached);
    eprintln!("mean kills        {:.1}", summary.avg_enemy_kills);
    eprintln!("mean score        {:.0}", summary.avg_score);
    eprintln!("no player lost    {}", summary.flawless_games);

    if !results.errors.is_empty() {
        eprintln!("{} matches failed:", results.errors.len());
        const SHOWN: usize = 10;
        for failure in results.errors.iter().take(SHOWN) {
            eprintln!("  #{} seed {}: {}", failure.game_index, failure.seed, failure.message);
        }
        if let Some(hidden) = results.errors.len().checked_sub(SHOWN).filter(|n| *n > 0) {
            eprintln!("  ({hidden} more)");
        }
    }
    eprintln!("report: {}", report.display());
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    tracing::info!(scenario, seed, runs, "Checking determinism");

    match verify_determinism(&resolve_or_exit(scenario), seed, runs) {
        Ok(true) => eprintln!("OK: {runs} runs of seed {seed} agree"),
        Ok(false) => {
            eprintln!("DIVERGED: seed {seed} is not reproducible");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Verification run failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Re-simulate a replay file, optionally checking its final hash
fn cmd_replay(file: PathBuf, verify: bool) {
    tracing::info!(path = %file.display(), verify, "Opening replay");

    let player = Replay::load(&file).and_then(|replay| {
        eprintln!(
            "{}: scenario '{}', seed {}, {} commands over {} ticks",
            file.display(),
            replay.scenario_id,
            replay.seed,
            replay.command_count(),
            replay.duration()
        );
        ReplayPlayer::new(replay)
    });
    let mut player = player.unwrap_or_else(|e| {
        eprintln!("Unreadable replay: {}", e);
        std::process::exit(1);
    });

    if !verify {
        while player.advance() {}
        let sim = player.simulation();
        eprintln!(
            "tick {}: outcome {:?}, score {}, hash {:016x}",
            player.current_tick(),
            sim.outcome(),
            sim.score(),
            sim.state_hash()
        );
        return;
    }

    match player.verify() {
        Ok(()) => eprintln!("OK: hash {:016x} reproduced", player.replay().final_hash),
        Err(ArenaError::DesyncDetected {
            tick,
            expected,
            actual,
        }) => {
            eprintln!("DESYNC at tick {tick}: recorded {expected:016x}, replayed {actual:016x}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Replay failed: {}", e);
            std::process::exit(1);
        }
    }
}

/// Tick a scenario with idle input and report throughput
fn cmd_benchmark(ticks: u64, scenario: &str) {
    let scenario = resolve_or_exit(scenario);
    tracing::info!("Running {} tick benchmark of '{}'", ticks, scenario.name);

    let mut sim = prepare(&scenario, scenario.config.seed);
    let start = Instant::now();
    let mut ran = 0;
    while ran < ticks && !sim.is_over() {
        sim.tick(&Default::default());
        ran += 1;
    }
    let elapsed = start.elapsed();

    eprintln!("Benchmark complete:");
    eprintln!("  Ticks: {}", ran);
    eprintln!("  Time: {:.3}s", elapsed.as_secs_f64());
    eprintln!(
        "  Ticks/sec: {:.0}",
        ran as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    eprintln!("  Final hash: {:016x}", sim.state_hash());
}

fn cmd_scenarios() {
    for name in BUILTIN_SCENARIOS {
        if let Some(scenario) = Scenario::builtin(name) {
            eprintln!("  {:<18} {}", name, scenario.description);
        }
    }
}
