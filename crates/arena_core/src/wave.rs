//! Wave director.
//!
//! Owns the robot cohort and the boss, spawns them, and decides when a wave
//! is over. Single-cohort difficulties are cleared when the last robot dies.
//! Wave difficulties wait out a settle delay, spawn the next cohort, and add
//! the boss on the final wave.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::arena::{EntityArena, Handle};
use crate::boss::Boss;
use crate::difficulty::{Difficulty, DifficultySettings};
use crate::math::MapBounds;
use crate::obstacle::{any_collides_circle, Obstacle};
use crate::robot::{Robot, RobotKind};

/// Empty frames a cleared wave must outlast before the next cohort spawns.
pub const SETTLE_DELAY: u32 = 120;

/// Robots never spawn closer than this to the primary player.
pub const SPAWN_CLEARANCE: f32 = 400.0;

/// Spawn points keep this far from the map edge.
pub const SPAWN_MARGIN: i32 = 100;

/// Clearance radius checked against obstacles at a spawn point.
pub const SPAWN_OBSTACLE_RADIUS: f32 = 25.0;

/// Random points tried per robot before giving up on it.
pub const SPAWN_ATTEMPTS: u32 = 50;

/// What the director did this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveProgress {
    /// Enemies remain.
    InProgress,
    /// The field is empty and the settle delay is running.
    Settling,
    /// A new wave spawned.
    Advanced {
        /// The wave that just started.
        wave: u32,
        /// Whether the boss spawned with it.
        boss: bool,
    },
    /// Every wave is done; the players won.
    Cleared,
}

/// Robot counts per kind for one cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortMix {
    /// Knife robots.
    pub knife: u32,
    /// Gun robots.
    pub gun: u32,
    /// Throwing-knife robots.
    pub throwing_knife: u32,
    /// Dual-pistol robots; takes the remainder.
    pub dual_pistol: u32,
}

impl CohortMix {
    /// Split `count` robots 30/30/20 with the remainder on dual pistols.
    #[must_use]
    pub const fn for_count(count: u32) -> Self {
        let knife = count * 3 / 10;
        let gun = count * 3 / 10;
        let throwing_knife = count * 2 / 10;
        Self {
            knife,
            gun,
            throwing_knife,
            dual_pistol: count - knife - gun - throwing_knife,
        }
    }

    /// Kind of the `n`th robot spawned in the cohort.
    #[must_use]
    pub const fn kind_for(&self, n: u32) -> RobotKind {
        if n < self.knife {
            RobotKind::Knife
        } else if n < self.knife + self.gun {
            RobotKind::Gun
        } else if n < self.knife + self.gun + self.throwing_knife {
            RobotKind::ThrowingKnife
        } else {
            RobotKind::DualPistol
        }
    }
}

/// Spawns cohorts and tracks wave progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDirector {
    difficulty: Difficulty,
    current_wave: u32,
    max_waves: u32,
    settle: u32,
    robots: EntityArena<Robot>,
    boss: Option<Boss>,
}

impl WaveDirector {
    /// Create a director with no enemies spawned yet.
    #[must_use]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            current_wave: 1,
            max_waves: difficulty.settings().waves.unwrap_or(1),
            settle: 0,
            robots: EntityArena::new(),
            boss: None,
        }
    }

    /// Difficulty preset.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Settings for the preset.
    #[must_use]
    pub const fn settings(&self) -> DifficultySettings {
        self.difficulty.settings()
    }

    /// Current wave, starting at 1.
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Final wave number.
    #[must_use]
    pub const fn max_waves(&self) -> u32 {
        self.max_waves
    }

    /// Frames spent settling since the field emptied.
    #[must_use]
    pub const fn settle_frames(&self) -> u32 {
        self.settle
    }

    /// Whether this difficulty plays in waves.
    #[must_use]
    pub const fn is_wave_based(&self) -> bool {
        self.difficulty.settings().waves.is_some()
    }

    /// The robot cohort.
    #[must_use]
    pub const fn robots(&self) -> &EntityArena<Robot> {
        &self.robots
    }

    /// Mutable access to the robot cohort.
    pub fn robots_mut(&mut self) -> &mut EntityArena<Robot> {
        &mut self.robots
    }

    /// The boss, if present.
    #[must_use]
    pub const fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    /// Mutable access to the boss.
    pub fn boss_mut(&mut self) -> Option<&mut Boss> {
        self.boss.as_mut()
    }

    /// Number of robots still alive.
    #[must_use]
    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    /// Whether neither robots nor the boss remain.
    #[must_use]
    pub fn field_clear(&self) -> bool {
        self.robots.is_empty() && self.boss.is_none()
    }

    /// Drop dead robots and a defeated boss.
    ///
    /// Returns whether the boss was removed.
    pub fn compact(&mut self) -> bool {
        self.robots.compact();
        if self.boss.as_ref().is_some_and(|boss| !boss.is_alive()) {
            self.boss = None;
            return true;
        }
        false
    }

    /// Insert a robot directly, bypassing spawn rules.
    pub fn insert_robot(&mut self, robot: Robot) -> Handle {
        self.robots.insert(robot)
    }

    /// Place a boss directly, bypassing spawn rules.
    pub fn set_boss(&mut self, boss: Option<Boss>) {
        self.boss = boss;
    }

    /// Remove every enemy.
    pub fn clear(&mut self) {
        self.robots.clear();
        self.robots.compact();
        self.boss = None;
    }

    /// Spawn a full cohort for the current difficulty.
    ///
    /// Robots that find no valid point in [`SPAWN_ATTEMPTS`] tries are
    /// skipped. Returns the number spawned.
    pub fn spawn_cohort(
        &mut self,
        player: Vec2,
        bounds: MapBounds,
        obstacles: &[Obstacle],
        rng: &mut Pcg32,
    ) -> u32 {
        let settings = self.settings();
        let mix = CohortMix::for_count(settings.count);
        let max_x = (bounds.width as i32 - SPAWN_MARGIN).max(SPAWN_MARGIN);
        let max_y = (bounds.height as i32 - SPAWN_MARGIN).max(SPAWN_MARGIN);
        let mut spawned = 0;

        for _ in 0..settings.count {
            for _ in 0..SPAWN_ATTEMPTS {
                let point = Vec2::new(
                    rng.random_range(SPAWN_MARGIN..=max_x) as f32,
                    rng.random_range(SPAWN_MARGIN..=max_y) as f32,
                );
                if point.distance(player) <= SPAWN_CLEARANCE
                    || any_collides_circle(obstacles, point, SPAWN_OBSTACLE_RADIUS)
                {
                    continue;
                }
                let robot = Robot::new(mix.kind_for(spawned), point, &settings, bounds, rng);
                self.robots.insert(robot);
                spawned += 1;
                break;
            }
        }

        tracing::info!(
            wave = self.current_wave,
            spawned,
            requested = settings.count,
            "Spawned robot cohort"
        );
        spawned
    }

    /// Spawn the boss far from the player.
    pub fn spawn_boss(&mut self, player: Vec2, bounds: MapBounds, rng: &mut Pcg32) {
        let position = Boss::spawn_point(bounds, player, rng);
        tracing::info!(x = position.x, y = position.y, "Boss spawned");
        self.boss = Some(Boss::new(position));
    }

    /// Advance wave bookkeeping for one frame.
    ///
    /// Must run after dead enemies have been compacted away.
    pub fn update(
        &mut self,
        player: Vec2,
        bounds: MapBounds,
        obstacles: &[Obstacle],
        rng: &mut Pcg32,
    ) -> WaveProgress {
        if !self.field_clear() {
            return WaveProgress::InProgress;
        }
        if !self.is_wave_based() || self.current_wave >= self.max_waves {
            return WaveProgress::Cleared;
        }

        self.settle += 1;
        if self.settle <= SETTLE_DELAY {
            return WaveProgress::Settling;
        }

        self.settle = 0;
        self.current_wave += 1;
        self.spawn_cohort(player, bounds, obstacles, rng);
        let boss = self.current_wave == self.max_waves && self.settings().boss;
        if boss {
            self.spawn_boss(player, bounds, rng);
        }
        tracing::info!(wave = self.current_wave, max = self.max_waves, boss, "Wave started");
        WaveProgress::Advanced {
            wave: self.current_wave,
            boss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn center() -> Vec2 {
        MapBounds::default().center()
    }

    #[test]
    fn test_cohort_mix() {
        let mix = CohortMix::for_count(10);
        assert_eq!((mix.knife, mix.gun, mix.throwing_knife, mix.dual_pistol), (3, 3, 2, 2));
        let mix = CohortMix::for_count(8);
        assert_eq!((mix.knife, mix.gun, mix.throwing_knife, mix.dual_pistol), (2, 2, 1, 3));
        assert_eq!(mix.kind_for(0), RobotKind::Knife);
        assert_eq!(mix.kind_for(2), RobotKind::Gun);
        assert_eq!(mix.kind_for(4), RobotKind::ThrowingKnife);
        assert_eq!(mix.kind_for(7), RobotKind::DualPistol);
    }

    #[test]
    fn test_spawn_respects_clearance() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut director = WaveDirector::new(Difficulty::Medium);
        let spawned = director.spawn_cohort(center(), MapBounds::default(), &[], &mut rng);
        assert_eq!(spawned, 15);
        for robot in director.robots().values() {
            assert!(robot.body.position.distance(center()) > SPAWN_CLEARANCE);
        }
    }

    #[test]
    fn test_single_cohort_clears_when_empty() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut director = WaveDirector::new(Difficulty::Easy);
        let bounds = MapBounds::default();
        director.spawn_cohort(center(), bounds, &[], &mut rng);
        assert_eq!(
            director.update(center(), bounds, &[], &mut rng),
            WaveProgress::InProgress
        );
        director.clear();
        assert_eq!(director.update(center(), bounds, &[], &mut rng), WaveProgress::Cleared);
    }

    #[test]
    fn test_wave_advances_after_settle_delay() {
        let mut rng = Pcg32::seed_from_u64(3);
        let bounds = MapBounds::default();
        let mut director = WaveDirector::new(Difficulty::Impossible);
        assert_eq!(director.max_waves(), 5);

        for _ in 0..SETTLE_DELAY {
            assert_eq!(
                director.update(center(), bounds, &[], &mut rng),
                WaveProgress::Settling
            );
        }
        assert_eq!(
            director.update(center(), bounds, &[], &mut rng),
            WaveProgress::Advanced { wave: 2, boss: false }
        );
        assert_eq!(director.current_wave(), 2);
        assert_eq!(director.robot_count(), 10);
        assert!(director.boss().is_none());
    }

    #[test]
    fn test_boss_spawns_on_final_wave() {
        let mut rng = Pcg32::seed_from_u64(4);
        let bounds = MapBounds::default();
        let mut director = WaveDirector::new(Difficulty::Impossible);
        director.current_wave = 4;
        let mut progress = WaveProgress::Settling;
        for _ in 0..=SETTLE_DELAY {
            progress = director.update(center(), bounds, &[], &mut rng);
        }
        assert_eq!(progress, WaveProgress::Advanced { wave: 5, boss: true });
        assert!(director.boss().is_some());

        director.clear();
        assert_eq!(director.update(center(), bounds, &[], &mut rng), WaveProgress::Cleared);
    }
}
