//! Headless match runner for autopilot testing and CI verification.
//!
//! Plays arena matches without rendering or a window:
//!
//! - **Balance testing**: run thousands of seeds of a scenario in parallel
//!   and aggregate outcome rates, waves reached and scores
//! - **CI verification**: check that the same seed always produces the same
//!   final state hash
//! - **Replay verification**: re-simulate a recorded match and compare hashes
//!
//! Locally controlled players are driven by a [`Strategy`]; partner AI and
//! networked players are left to the simulation.
//!
//! # Example
//!
//! ```bash
//! # One match, printing metrics as JSON
//! cargo run -p arena_headless -- run --scenario impossible_waves --json
//!
//! # Batch balance test
//! cargo run -p arena_headless -- batch --scenario coop_medium --count 500
//!
//! # Verify a recorded replay
//! cargo run -p arena_headless -- replay --file match.replay --verify
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;
pub mod strategies;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use runner::{run_game, GameConfig, GameResult, RunError};
pub use scenario::{Scenario, ScenarioError};
pub use strategies::Strategy;
