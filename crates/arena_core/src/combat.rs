//! Hit tests and damage rules shared by the combat systems.
//!
//! Everything here is a pure function of entity state. The systems in
//! [`crate::systems`] decide *when* to call these and apply the results.

use glam::Vec2;

use crate::arena::{EntityArena, Handle};
use crate::boss::Boss;
use crate::grenade::explosion_damage;
use crate::math::{angle_difference, angle_to, round_to_i32};
use crate::projectile::{Projectile, PROJECTILE_RADIUS};
use crate::robot::Robot;

/// Knife reach for player swings.
pub const MELEE_RANGE: f32 = 50.0;

/// Half-angle of the knife cone.
pub const MELEE_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_2;

/// Radius around the primary target that an electric hit jumps to.
pub const CHAIN_RADIUS: f32 = 150.0;

/// Share of blast damage taken by players.
pub const PLAYER_BLAST_FACTOR: f32 = 0.5;

/// Score multiplier for a sniper headshot kill.
pub const HEADSHOT_SCORE_MULTIPLIER: u32 = 2;

// ============================================================================
// Hit tests
// ============================================================================

/// How a projectile connected with a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// Struck the body circle.
    Body,
    /// Struck the headshot marker.
    Headshot,
}

impl Hit {
    /// Whether this was a headshot.
    #[must_use]
    pub const fn is_headshot(self) -> bool {
        matches!(self, Hit::Headshot)
    }
}

/// Whether a projectile overlaps a circle.
#[must_use]
pub fn projectile_hits_circle(projectile: &Projectile, center: Vec2, radius: f32) -> bool {
    projectile.position.distance(center) < radius + PROJECTILE_RADIUS
}

/// Test a projectile against a robot. Sniper rounds check the headshot
/// marker before the body.
#[must_use]
pub fn projectile_hits_robot(projectile: &Projectile, robot: &Robot) -> Option<Hit> {
    if projectile.tag.is_sniper() && robot.check_headshot(projectile.position) {
        return Some(Hit::Headshot);
    }
    projectile_hits_circle(projectile, robot.body.position, robot.body.radius).then_some(Hit::Body)
}

/// Test a projectile against the boss.
#[must_use]
pub fn projectile_hits_boss(projectile: &Projectile, boss: &Boss) -> Option<Hit> {
    if projectile.tag.is_sniper() && boss.check_headshot(projectile.position) {
        return Some(Hit::Headshot);
    }
    projectile_hits_circle(projectile, boss.body.position, boss.body.radius).then_some(Hit::Body)
}

/// Whether a knife swing from `origin` along `angle` reaches `target`.
///
/// The target must be within [`MELEE_RANGE`] and less than 90 degrees off
/// the swing direction.
#[must_use]
pub fn in_melee_cone(origin: Vec2, angle: f32, target: Vec2) -> bool {
    origin.distance(target) < MELEE_RANGE
        && angle_difference(angle, angle_to(origin, target)) < MELEE_HALF_ANGLE
}

// ============================================================================
// Damage rules
// ============================================================================

/// Damage of one electric chain hop.
#[must_use]
pub const fn chain_damage(damage: i32) -> i32 {
    damage.div_euclid(2)
}

/// Living robots within [`CHAIN_RADIUS`] of `primary`, excluding it.
#[must_use]
pub fn chain_targets(robots: &EntityArena<Robot>, primary: Handle) -> Vec<Handle> {
    let Some(center) = robots.get(primary).map(|r| r.body.position) else {
        return Vec::new();
    };
    robots
        .iter()
        .filter(|(handle, robot)| {
            *handle != primary
                && robot.is_alive()
                && robot.body.position.distance(center) < CHAIN_RADIUS
        })
        .map(|(handle, _)| handle)
        .collect()
}

/// Blast damage to a player at `distance`.
#[must_use]
pub fn player_blast_damage(damage: i32, distance: f32, radius: f32) -> i32 {
    round_to_i32(explosion_damage(damage, distance, radius) as f32 * PLAYER_BLAST_FACTOR)
}

/// Score for a kill worth `points`.
#[must_use]
pub const fn kill_score(points: u32, headshot: bool) -> u32 {
    if headshot {
        points * HEADSHOT_SCORE_MULTIPLIER
    } else {
        points
    }
}
