//! Scenario loading and configuration.
//!
//! Scenarios describe a headless match: the match config, how the local
//! players are piloted, how long to run and any progress the primary player
//! starts with.

use std::path::Path;

use arena_core::config::{GameMode, MatchConfig, ObstacleSetup};
use arena_core::difficulty::Difficulty;
use arena_core::obstacle::MapLayout;
use arena_core::shop::ShopItem;
use arena_core::weapon::WeaponKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategies::Strategy;

/// Ten minutes of play at 60 ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 36_000;

/// Names accepted by [`Scenario::builtin`].
pub const BUILTIN_SCENARIOS: [&str; 5] = [
    "solo_easy",
    "solo_hard",
    "coop_medium",
    "impossible_waves",
    "pvp_duel",
];

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Neither a built-in name nor an existing file.
    #[error("Scenario not found: {0}")]
    NotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The embedded match config is unusable.
    #[error("Invalid match config: {0}")]
    InvalidConfig(#[from] arena_core::error::ArenaError),
}

/// A complete headless match setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Match to run. Its seed is replaced per game in batch runs.
    pub config: MatchConfig,
    /// Pilot for every locally controlled player.
    pub strategy: Strategy,
    /// Tick limit; the match is recorded as a timeout when reached.
    pub max_ticks: u64,
    /// Coins the primary player starts with.
    pub starting_coins: u32,
    /// Purchases made before the first tick.
    pub purchases: Vec<ShopItem>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "solo_easy".to_string(),
            description: "One autopiloted player against the easy cohort".to_string(),
            config: MatchConfig::solo(Difficulty::Easy, 0),
            strategy: Strategy::Autopilot,
            max_ticks: DEFAULT_MAX_TICKS,
            starting_coins: 0,
            purchases: Vec::new(),
        }
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::NotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    /// A built-in scenario by name, or a RON file path.
    pub fn resolve(name: &str) -> Result<Self, ScenarioError> {
        match Self::builtin(name) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name),
        }
    }

    /// One of the [`BUILTIN_SCENARIOS`].
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        let scenario = match name {
            "solo_easy" => Self::default(),
            "solo_hard" => Self {
                name: name.to_string(),
                description: "Solo against the hard cohort in the corridor layout".to_string(),
                config: MatchConfig::solo(Difficulty::Hard, 0)
                    .with_obstacles(ObstacleSetup::Layout(MapLayout::Corridors)),
                ..Self::default()
            },
            "coop_medium" => Self {
                name: name.to_string(),
                description: "Two autopiloted players share the medium cohort".to_string(),
                config: MatchConfig::solo(Difficulty::Medium, 0).with_mode(GameMode::Coop),
                ..Self::default()
            },
            "impossible_waves" => Self {
                name: name.to_string(),
                description: "Five impossible waves and the boss, with a stocked armoury"
                    .to_string(),
                config: MatchConfig::solo(Difficulty::Impossible, 0)
                    .with_obstacles(ObstacleSetup::Layout(MapLayout::Arena)),
                starting_coins: 400,
                purchases: vec![
                    ShopItem::Weapon(WeaponKind::Shotgun),
                    ShopItem::Weapon(WeaponKind::Electric),
                    ShopItem::MedkitBundle,
                ],
                ..Self::default()
            },
            "pvp_duel" => Self {
                name: name.to_string(),
                description: "Two pilots duel across an open map".to_string(),
                config: MatchConfig::solo(Difficulty::Easy, 0).with_mode(GameMode::Pvp),
                strategy: Strategy::Duelist,
                ..Self::default()
            },
            _ => return None,
        };
        Some(scenario)
    }

    /// This scenario with the match seed replaced.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_resolves() {
        for name in BUILTIN_SCENARIOS {
            let scenario = Scenario::resolve(name).unwrap();
            assert_eq!(scenario.name, name);
            scenario.config.validate().unwrap();
        }
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let err = Scenario::resolve("no_such_scenario").unwrap_err();
        assert!(matches!(err, ScenarioError::NotFound(_)));
    }

    #[test]
    fn test_ron_round_trip() {
        let scenario = Scenario::builtin("impossible_waves").unwrap().with_seed(99);
        let text = scenario.to_ron_string().unwrap();
        let parsed = Scenario::from_ron_str(&text).unwrap();
        assert_eq!(parsed, scenario);
        assert_eq!(parsed.config.seed, 99);
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let parsed = Scenario::from_ron_str("(name: \"quick\", max_ticks: 600)").unwrap();
        assert_eq!(parsed.name, "quick");
        assert_eq!(parsed.max_ticks, 600);
        assert_eq!(parsed.strategy, Strategy::Autopilot);
        assert_eq!(parsed.config.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.ron");
        let scenario = Scenario::builtin("pvp_duel").unwrap();
        std::fs::write(&path, scenario.to_ron_string().unwrap()).unwrap();

        let loaded = Scenario::resolve(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_tiny_map_rejected() {
        let err = Scenario::from_ron_str("(config: (bounds: (width: 100.0, height: 100.0)))")
            .unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidConfig(_)));
    }
}
