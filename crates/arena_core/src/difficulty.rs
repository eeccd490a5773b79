//! Difficulty presets.
//!
//! Each difficulty fixes the size of a robot cohort, robot stats, the kill
//! rewards and, for the wave-based preset, the number of waves and whether a
//! boss closes the match.

use serde::{Deserialize, Serialize};

/// Player health on difficulties that do not override it.
pub const DEFAULT_PLAYER_HEALTH: i32 = 100;

/// Selectable difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// Few, slow, inaccurate robots.
    #[default]
    Easy,
    /// The standard game.
    Medium,
    /// Large, accurate cohorts.
    Hard,
    /// Five waves capped by a boss.
    Impossible,
}

/// Numbers that define a difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    /// Robots per cohort.
    pub count: u32,
    /// Robot health.
    pub health: i32,
    /// Robot base speed.
    pub speed: f32,
    /// Damage of a plain robot bullet.
    pub damage: i32,
    /// Frames between robot shots.
    pub fire_interval: u32,
    /// Score per robot kill.
    pub points: u32,
    /// Coins per robot kill.
    pub coins: u32,
    /// Wave count for wave-based play; `None` means a single cohort.
    pub waves: Option<u32>,
    /// Whether the final wave brings the boss.
    pub boss: bool,
    /// Half-width of the uniform aim jitter, in radians.
    pub aim_jitter: f32,
    /// Starting player health.
    pub player_health: i32,
}

impl Difficulty {
    /// All presets in menu order.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Impossible,
    ];

    /// Settings for this preset.
    #[must_use]
    pub const fn settings(self) -> DifficultySettings {
        match self {
            Difficulty::Easy => DifficultySettings {
                count: 8,
                health: 40,
                speed: 2.0,
                damage: 5,
                fire_interval: 90,
                points: 100,
                coins: 1,
                waves: None,
                boss: false,
                aim_jitter: 0.3,
                player_health: DEFAULT_PLAYER_HEALTH,
            },
            Difficulty::Medium => DifficultySettings {
                count: 15,
                health: 60,
                speed: 3.0,
                damage: 10,
                fire_interval: 60,
                points: 200,
                coins: 3,
                waves: None,
                boss: false,
                aim_jitter: 0.15,
                player_health: DEFAULT_PLAYER_HEALTH,
            },
            Difficulty::Hard => DifficultySettings {
                count: 25,
                health: 100,
                speed: 4.0,
                damage: 15,
                fire_interval: 40,
                points: 300,
                coins: 8,
                waves: None,
                boss: false,
                aim_jitter: 0.08,
                player_health: DEFAULT_PLAYER_HEALTH,
            },
            Difficulty::Impossible => DifficultySettings {
                count: 10,
                health: 120,
                speed: 5.0,
                damage: 20,
                fire_interval: 30,
                points: 500,
                coins: 15,
                waves: Some(5),
                boss: true,
                aim_jitter: 0.08,
                player_health: 10_000,
            },
        }
    }

    /// Lowercase identifier, as used in configs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown difficulty '{s}'"))
    }
}
