//! Boss AI.
//!
//! The boss cycles through three movement patterns on a fixed timer and
//! fires a five-round fan far more often than any robot.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::math::{angle_to, direction, MapBounds};
use crate::projectile::{Projectile, ProjectileOwner, ProjectileTag, PROJECTILE_RADIUS};

/// Boss health.
pub const BOSS_HEALTH: i32 = 1000;
/// Chase speed.
pub const BOSS_SPEED: f32 = 2.0;
/// Collision radius.
pub const BOSS_RADIUS: f32 = 50.0;
/// Frames between spread shots.
pub const BOSS_FIRE_INTERVAL: u32 = 20;
/// A pattern lasts until the timer exceeds this.
pub const PATTERN_FRAMES: u32 = 180;
/// Speed while charging.
pub const CHARGE_SPEED: f32 = 8.0;
/// The chase pattern stops this close to the target.
pub const CHASE_STOP_DISTANCE: f32 = 100.0;
/// A charge ends this close to its locked point.
pub const CHARGE_ARRIVAL: f32 = 20.0;
/// Strafe speed multiplier.
pub const STRAFE_FACTOR: f32 = 1.5;
/// Rounds per spread shot.
pub const SPREAD_COUNT: usize = 5;
/// Angle between adjacent spread rounds.
pub const SPREAD_STEP: f32 = 0.15;
/// Damage per spread round.
pub const BOSS_BULLET_DAMAGE: i32 = 15;
/// Speed of a spread round.
pub const BOSS_BULLET_SPEED: f32 = 10.0;
/// Damage per frame to an overlapping player.
pub const CONTACT_DAMAGE: i32 = 20;
/// Headshot marker radius.
pub const BOSS_HEADSHOT_RADIUS: f32 = 12.0;
/// Headshot marker offset above the body center.
pub const BOSS_HEADSHOT_OFFSET: f32 = 70.0;
/// Score for killing the boss.
pub const BOSS_SCORE: u32 = 5000;
/// Coins for killing the boss.
pub const BOSS_COINS: u32 = 100;
/// Spawn points keep this far from the map edge.
pub const BOSS_SPAWN_MARGIN: f32 = 200.0;
/// Minimum spawn distance from the primary player.
pub const BOSS_SPAWN_CLEARANCE: f32 = 600.0;

const SPAWN_ATTEMPTS: u32 = 100;

/// Movement pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BossPattern {
    /// Slow approach.
    #[default]
    Chase,
    /// Dash at a locked point.
    Charge,
    /// Circle the target.
    Strafe,
}

impl BossPattern {
    /// The pattern that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            BossPattern::Chase => BossPattern::Charge,
            BossPattern::Charge => BossPattern::Strafe,
            BossPattern::Strafe => BossPattern::Chase,
        }
    }
}

/// The final-wave boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    /// Position, facing and health.
    pub body: Combatant,
    /// Current pattern.
    pub pattern: BossPattern,
    /// Frames spent in the current pattern.
    pub pattern_timer: u32,
    /// Locked charge destination, while charging.
    pub charge_target: Option<Vec2>,
    /// Frames until the next spread shot.
    pub fire_cooldown: u32,
    /// Whether the headshot marker is shown.
    pub headshot_marked: bool,
}

impl Boss {
    /// Create a boss at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            body: Combatant::new(position, BOSS_HEALTH, BOSS_RADIUS, BOSS_SPEED),
            pattern: BossPattern::Chase,
            pattern_timer: 0,
            charge_target: None,
            fire_cooldown: 0,
            headshot_marked: false,
        }
    }

    /// Pick a spawn point far from the primary player.
    ///
    /// Falls back to the map corner farthest from the player when no random
    /// point qualifies.
    pub fn spawn_point(bounds: MapBounds, player: Vec2, rng: &mut Pcg32) -> Vec2 {
        let lo = BOSS_SPAWN_MARGIN;
        let hi_x = (bounds.width - BOSS_SPAWN_MARGIN).max(lo);
        let hi_y = (bounds.height - BOSS_SPAWN_MARGIN).max(lo);
        for _ in 0..SPAWN_ATTEMPTS {
            let candidate = Vec2::new(rng.random_range(lo..=hi_x), rng.random_range(lo..=hi_y));
            if candidate.distance(player) > BOSS_SPAWN_CLEARANCE {
                return candidate;
            }
        }
        [
            Vec2::new(lo, lo),
            Vec2::new(hi_x, lo),
            Vec2::new(lo, hi_y),
            Vec2::new(hi_x, hi_y),
        ]
        .into_iter()
        .fold(Vec2::new(lo, lo), |best, corner| {
            if corner.distance(player) > best.distance(player) {
                corner
            } else {
                best
            }
        })
    }

    /// Whether the boss is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    /// Run one frame of AI against the target player's position.
    pub fn update(&mut self, target: Vec2, bounds: MapBounds) {
        let offset = target - self.body.position;
        let dist = offset.length();
        self.body.angle = angle_to(self.body.position, target);

        self.pattern_timer += 1;
        if self.pattern_timer > PATTERN_FRAMES {
            self.pattern_timer = 0;
            self.pattern = self.pattern.next();
            self.charge_target = None;
        }

        match self.pattern {
            BossPattern::Chase => {
                if dist > CHASE_STOP_DISTANCE {
                    self.body.position += offset / dist * self.body.speed;
                }
            }
            BossPattern::Charge => {
                if self.charge_target.is_none() && self.pattern_timer == 1 {
                    self.charge_target = Some(target);
                }
                if let Some(point) = self.charge_target {
                    let to_point = point - self.body.position;
                    let d = to_point.length();
                    if d > CHARGE_ARRIVAL {
                        self.body.position += to_point / d * CHARGE_SPEED;
                    } else {
                        self.charge_target = None;
                    }
                }
            }
            BossPattern::Strafe => {
                let strafe = direction(self.body.angle + std::f32::consts::FRAC_PI_2);
                self.body.position += strafe * self.body.speed * STRAFE_FACTOR;
            }
        }

        self.body.position = bounds.clamp_entity(self.body.position, self.body.radius);
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        self.body.tick_flash();
    }

    /// Whether a spread shot is ready.
    #[must_use]
    pub const fn can_shoot(&self) -> bool {
        self.fire_cooldown == 0
    }

    /// Fire the spread along the current facing.
    pub fn shoot(&mut self) -> Vec<Projectile> {
        self.fire_cooldown = BOSS_FIRE_INTERVAL;
        let half = (SPREAD_COUNT / 2) as f32;
        (0..SPREAD_COUNT)
            .map(|i| {
                let angle = self.body.angle + (i as f32 - half) * SPREAD_STEP;
                Projectile::new(
                    self.body.position,
                    angle,
                    BOSS_BULLET_SPEED,
                    BOSS_BULLET_DAMAGE,
                    ProjectileTag::Boss,
                    ProjectileOwner::Boss,
                )
            })
            .collect()
    }

    /// Whether a player circle overlaps the boss.
    #[must_use]
    pub fn touches(&self, position: Vec2, radius: f32) -> bool {
        self.body.distance_to(position) < self.body.radius + radius
    }

    /// Center of the headshot marker.
    #[must_use]
    pub fn headshot_center(&self) -> Vec2 {
        self.body.position - Vec2::new(0.0, BOSS_HEADSHOT_OFFSET)
    }

    /// Whether a projectile at `point` hits the headshot marker.
    #[must_use]
    pub fn check_headshot(&self, point: Vec2) -> bool {
        self.headshot_center().distance(point) < BOSS_HEADSHOT_RADIUS + PROJECTILE_RADIUS
    }
}
