//! Match configuration.
//!
//! A [`MatchConfig`] fully determines a match together with the per-frame
//! inputs: same config, same inputs, same result. Configs are plain data and
//! load from RON.
//!
//! ```
//! use arena_core::config::{GameMode, MatchConfig};
//! use arena_core::difficulty::Difficulty;
//!
//! let config = MatchConfig::from_ron_str("(mode: Coop, difficulty: Hard, seed: 9)").unwrap();
//! assert_eq!(config.mode, GameMode::Coop);
//! assert_eq!(config.difficulty, Difficulty::Hard);
//! ```

use std::path::Path;

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::error::{ArenaError, Result};
use crate::math::{MapBounds, WALL_MARGIN};
use crate::obstacle::{MapLayout, Obstacle, ObstacleSource, StaticLayout};

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u32 = 1000 / TICK_RATE;

/// Smallest map side that still leaves room to play inside the walls.
pub const MIN_MAP_SIZE: f32 = 1000.0;

/// Who plays and against what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// One player against robots.
    #[default]
    Solo,
    /// Two local players against robots.
    Coop,
    /// Two local players against each other.
    Pvp,
    /// Local player plus a networked teammate against robots.
    OnlineCoop,
    /// Local player against a networked opponent.
    OnlinePvp,
}

impl GameMode {
    /// Whether players fight each other instead of robots.
    #[must_use]
    pub const fn is_pvp(self) -> bool {
        matches!(self, GameMode::Pvp | GameMode::OnlinePvp)
    }

    /// Whether a second player takes part.
    #[must_use]
    pub const fn has_second_player(self) -> bool {
        !matches!(self, GameMode::Solo)
    }

    /// Whether the second player is on the network.
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, GameMode::OnlineCoop | GameMode::OnlinePvp)
    }

    /// Whether robots and coins are in play.
    #[must_use]
    pub const fn has_robots(self) -> bool {
        !self.is_pvp()
    }
}

/// Where the obstacles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObstacleSetup {
    /// A built-in layout.
    Layout(MapLayout),
    /// An explicit list.
    Static(Vec<Obstacle>),
}

impl Default for ObstacleSetup {
    fn default() -> Self {
        ObstacleSetup::Layout(MapLayout::Empty)
    }
}

impl ObstacleSource for ObstacleSetup {
    fn obstacles(&self, bounds: MapBounds, rng: &mut Pcg32) -> Vec<Obstacle> {
        match self {
            ObstacleSetup::Layout(layout) => layout.obstacles(bounds, rng),
            ObstacleSetup::Static(list) => StaticLayout(list.clone()).obstacles(bounds, rng),
        }
    }
}

/// Everything needed to start a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Player arrangement.
    pub mode: GameMode,
    /// Robot preset.
    pub difficulty: Difficulty,
    /// Seed for every random decision in the match.
    pub seed: u64,
    /// Map size.
    pub bounds: MapBounds,
    /// Interior obstacles.
    pub obstacles: ObstacleSetup,
    /// Whether this instance hosts an online match. Decides the PvP side.
    pub host: bool,
    /// Whether the second player is driven by the built-in autopilot.
    pub ai_teammate: bool,
    /// Name shown to a networked peer.
    pub player_name: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Solo,
            difficulty: Difficulty::Easy,
            seed: 0,
            bounds: MapBounds::default(),
            obstacles: ObstacleSetup::default(),
            host: true,
            ai_teammate: false,
            player_name: "Player".to_string(),
        }
    }
}

impl MatchConfig {
    /// A solo match with no interior obstacles.
    #[must_use]
    pub fn solo(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            seed,
            ..Self::default()
        }
    }

    /// Builder: set the mode.
    #[must_use]
    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder: set the obstacle source.
    #[must_use]
    pub fn with_obstacles(mut self, obstacles: ObstacleSetup) -> Self {
        self.obstacles = obstacles;
        self
    }

    /// Builder: set the map bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: MapBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a config from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: MatchConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Check that the config describes a playable match.
    pub fn validate(&self) -> Result<()> {
        if self.bounds.width < MIN_MAP_SIZE || self.bounds.height < MIN_MAP_SIZE {
            return Err(ArenaError::InvalidConfig(format!(
                "map {}x{} is smaller than {MIN_MAP_SIZE}",
                self.bounds.width, self.bounds.height
            )));
        }
        if let ObstacleSetup::Static(list) = &self.obstacles {
            if let Some(bad) = list
                .iter()
                .find(|o| o.rect.width <= 0.0 || o.rect.height <= 0.0)
            {
                return Err(ArenaError::InvalidConfig(format!(
                    "obstacle at ({}, {}) has no area",
                    bad.rect.x, bad.rect.y
                )));
            }
        }
        if self.ai_teammate && self.mode != GameMode::Coop {
            return Err(ArenaError::InvalidConfig(
                "an AI teammate needs local co-op".to_string(),
            ));
        }
        Ok(())
    }

    /// Playable interior, inside the border walls.
    #[must_use]
    pub fn inner_size(&self) -> (f32, f32) {
        (
            self.bounds.width - 2.0 * WALL_MARGIN,
            self.bounds.height - 2.0 * WALL_MARGIN,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_predicates() {
        assert!(GameMode::OnlinePvp.is_pvp());
        assert!(GameMode::OnlinePvp.is_online());
        assert!(!GameMode::Coop.is_pvp());
        assert!(GameMode::Coop.has_robots());
        assert!(!GameMode::Solo.has_second_player());
    }

    #[test]
    fn test_ron_roundtrip_keeps_fields() {
        let config = MatchConfig::solo(Difficulty::Impossible, 77)
            .with_mode(GameMode::Pvp)
            .with_obstacles(ObstacleSetup::Static(vec![Obstacle::new(
                300.0, 300.0, 80.0, 80.0,
            )]));
        let text = config.to_ron_string().unwrap();
        let parsed = MatchConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_tiny_map() {
        let config = MatchConfig::default().with_bounds(MapBounds::new(500.0, 500.0));
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_degenerate_obstacle() {
        let config = MatchConfig::default()
            .with_obstacles(ObstacleSetup::Static(vec![Obstacle::new(10.0, 10.0, 0.0, 5.0)]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.ron");
        std::fs::write(&path, "(difficulty: Medium, obstacles: Layout(Arena))").unwrap();
        let config = MatchConfig::load(&path).unwrap();
        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.obstacles, ObstacleSetup::Layout(MapLayout::Arena));
        assert_eq!(config.seed, 0);
    }
}
