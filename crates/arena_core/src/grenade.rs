//! Thrown grenades and their terminal effects.
//!
//! A [`Grenade`] rolls with friction, bounces off the map edge and obstacles,
//! and when its fuse runs out it detonates exactly once into either an
//! [`Explosion`] (frag) or a [`SmokeCloud`] (smoke).

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combatant::PlayerSlot;
use crate::math::{direction, round_to_i32, MapBounds};
use crate::obstacle::{any_collides_circle, Obstacle};

/// Initial roll speed.
pub const GRENADE_SPEED: f32 = 10.0;

/// Per-frame speed multiplier while rolling.
pub const GRENADE_FRICTION: f32 = 0.98;

/// Below this speed a grenade stops dead.
pub const GRENADE_STOP_SPEED: f32 = 0.5;

/// Speed multiplier on each bounce.
pub const GRENADE_RESTITUTION: f32 = 0.7;

/// Grenade collision radius.
pub const GRENADE_RADIUS: f32 = 8.0;

/// Frames from throw to detonation.
pub const GRENADE_FUSE: u32 = 90;

/// Frag grenade damage at the blast center.
pub const GRENADE_DAMAGE: i32 = 100;

/// Frag blast radius.
pub const EXPLOSION_RADIUS: f32 = 120.0;

/// Starting radius of the explosion animation.
pub const EXPLOSION_START_RADIUS: f32 = 10.0;

/// Explosion animation growth per frame.
pub const EXPLOSION_GROWTH: f32 = 15.0;

/// Frames an explosion stays visible.
pub const EXPLOSION_LIFETIME: u32 = 20;

/// Starting radius of a smoke cloud.
pub const SMOKE_START_RADIUS: f32 = 20.0;

/// Smoke cloud growth per frame.
pub const SMOKE_GROWTH: f32 = 5.0;

/// Fully grown smoke cloud radius.
pub const SMOKE_RADIUS: f32 = 150.0;

/// Frames a smoke cloud lingers.
pub const SMOKE_LIFETIME: u32 = 300;

/// What a thrown grenade turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThrowKind {
    /// Fragmentation: explodes and deals area damage.
    Frag,
    /// Smoke: spawns a cloud that blocks robot fire.
    Smoke,
}

/// A grenade in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grenade {
    /// Frag or smoke.
    pub kind: ThrowKind,
    /// Center.
    pub position: Vec2,
    /// Travel direction.
    pub angle: f32,
    /// Current speed.
    pub speed: f32,
    /// Frames until detonation.
    pub fuse: u32,
    /// Set once the grenade has detonated.
    pub exploded: bool,
    /// Who threw it, for kill credit.
    pub thrower: Option<PlayerSlot>,
    /// Cosmetic roll angle.
    pub roll: f32,
}

impl Grenade {
    /// A freshly thrown grenade.
    #[must_use]
    pub fn new(kind: ThrowKind, position: Vec2, angle: f32, thrower: Option<PlayerSlot>) -> Self {
        Self {
            kind,
            position,
            angle,
            speed: GRENADE_SPEED,
            fuse: GRENADE_FUSE,
            exploded: false,
            thrower,
            roll: 0.0,
        }
    }

    /// Roll one frame: move, apply friction, burn fuse, then bounce.
    pub fn update(&mut self, bounds: MapBounds, obstacles: &[Obstacle]) {
        let previous = self.position;
        let step = direction(self.angle) * self.speed;
        self.position += step;

        if self.speed > GRENADE_STOP_SPEED {
            self.speed *= GRENADE_FRICTION;
        } else {
            self.speed = 0.0;
        }
        self.roll += self.speed * 0.3;
        self.fuse = self.fuse.saturating_sub(1);

        self.bounce_off_edges(bounds);
        self.bounce_off_obstacles(previous, step, obstacles);
    }

    fn bounce_off_edges(&mut self, bounds: MapBounds) {
        let r = GRENADE_RADIUS;
        if self.position.x < r || self.position.x > bounds.width - r {
            self.position.x = self.position.x.clamp(r, bounds.width - r);
            self.angle = std::f32::consts::PI - self.angle;
            self.speed *= GRENADE_RESTITUTION;
        }
        if self.position.y < r || self.position.y > bounds.height - r {
            self.position.y = self.position.y.clamp(r, bounds.height - r);
            self.angle = -self.angle;
            self.speed *= GRENADE_RESTITUTION;
        }
    }

    fn bounce_off_obstacles(&mut self, previous: Vec2, step: Vec2, obstacles: &[Obstacle]) {
        if !any_collides_circle(obstacles, self.position, GRENADE_RADIUS) {
            return;
        }
        // Reflect whichever axis carried the grenade into the obstacle
        let x_only = Vec2::new(previous.x + step.x, previous.y);
        let blocked_x = any_collides_circle(obstacles, x_only, GRENADE_RADIUS);
        let y_only = Vec2::new(previous.x, previous.y + step.y);
        let blocked_y = any_collides_circle(obstacles, y_only, GRENADE_RADIUS);

        if blocked_x || !blocked_y {
            self.angle = std::f32::consts::PI - self.angle;
        }
        if blocked_y {
            self.angle = -self.angle;
        }
        self.position = previous;
        self.speed *= GRENADE_RESTITUTION;
    }

    /// Whether the fuse has run out and the grenade has not yet detonated.
    #[must_use]
    pub fn should_explode(&self) -> bool {
        self.fuse == 0 && !self.exploded
    }

    /// Convert into the terminal effect. Yields `Some` at most once.
    pub fn detonate(&mut self) -> Option<Detonation> {
        if !self.should_explode() {
            return None;
        }
        self.exploded = true;
        Some(match self.kind {
            ThrowKind::Frag => Detonation::Explosion(Explosion::new(
                self.position,
                EXPLOSION_RADIUS,
                GRENADE_DAMAGE,
                self.thrower,
            )),
            ThrowKind::Smoke => Detonation::Smoke(SmokeCloud::new(self.position)),
        })
    }
}

/// Result of a detonation.
#[derive(Debug, Clone, PartialEq)]
pub enum Detonation {
    /// Frag blast.
    Explosion(Explosion),
    /// Smoke cloud.
    Smoke(SmokeCloud),
}

/// A blast. Damage is applied once when it is created; the growing radius
/// afterwards is only animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    /// Blast center.
    pub center: Vec2,
    /// Animated radius.
    pub radius: f32,
    /// Damage radius.
    pub max_radius: f32,
    /// Damage at the center.
    pub damage: i32,
    /// Frames left on screen.
    pub lifetime: u32,
    /// Who gets kill credit.
    pub thrower: Option<PlayerSlot>,
}

impl Explosion {
    /// A new blast at `center`.
    #[must_use]
    pub fn new(center: Vec2, max_radius: f32, damage: i32, thrower: Option<PlayerSlot>) -> Self {
        Self {
            center,
            radius: EXPLOSION_START_RADIUS,
            max_radius,
            damage,
            lifetime: EXPLOSION_LIFETIME,
            thrower,
        }
    }

    /// Grow the animation and burn lifetime.
    pub fn update(&mut self) {
        if self.radius < self.max_radius {
            self.radius += EXPLOSION_GROWTH;
        }
        self.lifetime = self.lifetime.saturating_sub(1);
    }

    /// Whether the animation is over.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.lifetime == 0
    }

    /// Damage dealt to something `distance` away, or `None` if out of reach.
    #[must_use]
    pub fn damage_at(&self, distance: f32) -> Option<i32> {
        (distance <= self.max_radius)
            .then(|| explosion_damage(self.damage, distance, self.max_radius))
    }
}

/// Blast damage with linear falloff to half at the edge.
#[must_use]
pub fn explosion_damage(damage: i32, distance: f32, radius: f32) -> i32 {
    if radius <= 0.0 {
        return damage;
    }
    let ratio = (distance / radius).clamp(0.0, 1.0);
    round_to_i32(damage as f32 * (1.0 - ratio * 0.5))
}

/// A lingering smoke screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokeCloud {
    /// Cloud center.
    pub center: Vec2,
    /// Current radius.
    pub radius: f32,
    /// Frames left.
    pub lifetime: u32,
}

impl SmokeCloud {
    /// A new cloud at `center`.
    #[must_use]
    pub fn new(center: Vec2) -> Self {
        Self {
            center,
            radius: SMOKE_START_RADIUS,
            lifetime: SMOKE_LIFETIME,
        }
    }

    /// Expand and burn lifetime.
    pub fn update(&mut self) {
        self.radius = (self.radius + SMOKE_GROWTH).min(SMOKE_RADIUS);
        self.lifetime = self.lifetime.saturating_sub(1);
    }

    /// Whether the cloud has dissipated.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.lifetime == 0
    }

    /// Whether `point` is inside the cloud.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        self.center.distance(point) <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::Obstacle;
    use proptest::prelude::*;

    fn frag_at(position: Vec2, angle: f32) -> Grenade {
        Grenade::new(ThrowKind::Frag, position, angle, Some(PlayerSlot::One))
    }

    #[test]
    fn test_fuse_fires_exactly_once() {
        let bounds = MapBounds::default();
        let mut grenade = frag_at(Vec2::new(2500.0, 2500.0), 0.0);
        for _ in 0..89 {
            grenade.update(bounds, &[]);
            assert!(!grenade.should_explode());
        }
        grenade.update(bounds, &[]);
        assert!(grenade.should_explode());
        assert!(matches!(grenade.detonate(), Some(Detonation::Explosion(_))));
        for _ in 0..10 {
            grenade.update(bounds, &[]);
            assert!(!grenade.should_explode());
            assert!(grenade.detonate().is_none());
        }
    }

    #[test]
    fn test_friction_stops_grenade() {
        let bounds = MapBounds::default();
        let mut grenade = frag_at(Vec2::new(2500.0, 2500.0), 0.0);
        grenade.update(bounds, &[]);
        assert!((grenade.speed - 9.8).abs() < 1e-5);
        for _ in 0..200 {
            grenade.update(bounds, &[]);
        }
        assert_eq!(grenade.speed, 0.0);
    }

    #[test]
    fn test_edge_bounce_reflects_x() {
        let bounds = MapBounds::default();
        let mut grenade = frag_at(Vec2::new(12.0, 2500.0), std::f32::consts::PI);
        grenade.update(bounds, &[]);
        assert_eq!(grenade.position.x, GRENADE_RADIUS);
        assert!(grenade.angle.abs() < 1e-5);
        assert!((grenade.speed - 10.0 * 0.98 * 0.7).abs() < 1e-4);
    }

    #[test]
    fn test_obstacle_bounce_reverts_position() {
        let bounds = MapBounds::default();
        let wall = Obstacle::new(2515.0, 2400.0, 50.0, 200.0);
        let start = Vec2::new(2500.0, 2500.0);
        let mut grenade = frag_at(start, 0.0);
        grenade.update(bounds, &[wall]);
        assert_eq!(grenade.position, start);
        assert!((grenade.angle - std::f32::consts::PI).abs() < 1e-5);
    }

    #[test]
    fn test_smoke_detonates_into_cloud() {
        let bounds = MapBounds::default();
        let mut grenade = Grenade::new(ThrowKind::Smoke, Vec2::new(1000.0, 1000.0), 0.0, None);
        for _ in 0..GRENADE_FUSE {
            grenade.update(bounds, &[]);
        }
        let Some(Detonation::Smoke(mut cloud)) = grenade.detonate() else {
            panic!("smoke grenade should produce a cloud");
        };
        for _ in 0..100 {
            cloud.update();
        }
        assert_eq!(cloud.radius, SMOKE_RADIUS);
        assert!(cloud.contains(cloud.center + Vec2::new(149.0, 0.0)));
        for _ in 0..SMOKE_LIFETIME {
            cloud.update();
        }
        assert!(cloud.is_done());
    }

    #[test]
    fn test_explosion_endpoints() {
        assert_eq!(explosion_damage(100, 0.0, 120.0), 100);
        assert_eq!(explosion_damage(100, 120.0, 120.0), 50);
        assert_eq!(explosion_damage(100, 60.0, 120.0), 75);
        let blast = Explosion::new(Vec2::ZERO, 120.0, 100, None);
        assert_eq!(blast.damage_at(120.0), Some(50));
        assert_eq!(blast.damage_at(120.5), None);
    }

    #[test]
    fn test_explosion_animation_is_finite() {
        let mut blast = Explosion::new(Vec2::ZERO, 120.0, 100, None);
        for _ in 0..EXPLOSION_LIFETIME {
            assert!(!blast.is_done());
            blast.update();
        }
        assert!(blast.is_done());
        assert!(blast.radius >= 120.0);
    }

    proptest! {
        #[test]
        fn prop_explosion_damage_between_half_and_full(dmg in 1i32..500, frac in 0.0f32..=1.0) {
            let radius = 120.0;
            let d = explosion_damage(dmg, frac * radius, radius);
            let expected = (dmg as f32 * (1.0 - (frac * radius) / radius * 0.5)).round() as i32;
            prop_assert_eq!(d, expected);
            prop_assert!(d <= dmg);
            prop_assert!(d >= (dmg as f32 * 0.5).round() as i32);
        }
    }
}
