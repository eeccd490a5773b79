//! Robot AI.
//!
//! Robots run a three-state machine each frame:
//!
//! - **Patrol**: wander at half speed between random waypoints.
//! - **Chase**: close on the target player at full speed.
//! - **Attack**: hold position and fire (knife robots keep closing).
//!
//! The state is recomputed from scratch every frame from the distance to
//! the target, so there is no hysteresis.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::difficulty::DifficultySettings;
use crate::math::{angle_to, direction, MapBounds};
use crate::obstacle::Obstacle;
use crate::projectile::{Projectile, ProjectileOwner, ProjectileTag, PROJECTILE_RADIUS};

/// Robot collision radius.
pub const ROBOT_RADIUS: f32 = 20.0;

/// Detection range for knife robots.
pub const KNIFE_DETECT_RANGE: f32 = 600.0;

/// Detection range for ranged robots.
pub const DETECT_RANGE: f32 = 400.0;

/// Distance inside which robots switch to attacking.
pub const ATTACK_RANGE: f32 = 300.0;

/// Patrol waypoints stay this far from the map edge.
pub const PATROL_MARGIN: i32 = 100;

/// A patrol waypoint counts as reached inside this distance.
pub const PATROL_ARRIVAL: f32 = 50.0;

/// Knife reach.
pub const KNIFE_RANGE: f32 = 50.0;

/// Knife damage.
pub const KNIFE_DAMAGE: i32 = 15;

/// Frames between knife attacks.
pub const KNIFE_COOLDOWN: u32 = 30;

/// Frames a freeze hit lasts.
pub const FREEZE_FRAMES: u32 = 120;

/// Speed multiplier while frozen.
pub const FREEZE_SLOW: f32 = 0.3;

/// Headshot marker radius.
pub const HEADSHOT_RADIUS: f32 = 8.0;

/// Headshot marker offset above the body center.
pub const HEADSHOT_OFFSET: f32 = 35.0;

/// Speed of a plain robot bullet.
pub const GUN_BULLET_SPEED: f32 = 8.0;

/// Throwing knife damage.
pub const THROWING_KNIFE_DAMAGE: i32 = 25;

/// Throwing knife speed.
pub const THROWING_KNIFE_SPEED: f32 = 12.0;

/// Dual pistol damage per round.
pub const DUAL_PISTOL_DAMAGE: i32 = 8;

/// Dual pistol round speed.
pub const DUAL_PISTOL_SPEED: f32 = 14.0;

/// Robot variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotKind {
    /// Single bullets at difficulty damage.
    Gun,
    /// Melee only; faster and with a longer detection range.
    Knife,
    /// Slow, heavy single throws.
    ThrowingKnife,
    /// Two light rounds per shot, fast fire rate.
    DualPistol,
}

impl RobotKind {
    /// Base speed multiplier.
    #[must_use]
    pub const fn speed_factor(self) -> f32 {
        match self {
            RobotKind::Gun => 1.0,
            RobotKind::Knife => 1.2,
            RobotKind::ThrowingKnife => 0.9,
            RobotKind::DualPistol => 1.1,
        }
    }

    /// Frames between shots given the difficulty's interval.
    #[must_use]
    pub fn fire_interval(self, base: u32) -> u32 {
        match self {
            RobotKind::DualPistol => (base / 2).max(15),
            RobotKind::ThrowingKnife => base + 20,
            RobotKind::Gun | RobotKind::Knife => base,
        }
    }

    /// Detection range for this kind.
    #[must_use]
    pub const fn detect_range(self) -> f32 {
        match self {
            RobotKind::Knife => KNIFE_DETECT_RANGE,
            _ => DETECT_RANGE,
        }
    }
}

/// Behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RobotState {
    /// Wandering between waypoints.
    #[default]
    Patrol,
    /// Closing on the target.
    Chase,
    /// In weapon range.
    Attack,
}

/// A hostile robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    /// Position, facing and health.
    pub body: Combatant,
    /// Variant.
    pub kind: RobotKind,
    /// Current behavior.
    pub state: RobotState,
    /// Current patrol waypoint.
    pub patrol_target: Vec2,
    /// Speed when not frozen.
    pub base_speed: f32,
    /// Frames until the next shot.
    pub fire_cooldown: u32,
    /// Frames between shots.
    pub fire_interval: u32,
    /// Frames until the next knife attack.
    pub knife_cooldown: u32,
    /// Frames of freeze remaining.
    pub frozen: u32,
    /// Damage of a plain bullet.
    pub bullet_damage: i32,
    /// Aim jitter half-width.
    pub aim_jitter: f32,
    /// Whether the headshot marker is shown (a sniper is equipped).
    pub headshot_marked: bool,
}

impl Robot {
    /// Create a robot with stats from `settings`.
    pub fn new(
        kind: RobotKind,
        position: Vec2,
        settings: &DifficultySettings,
        bounds: MapBounds,
        rng: &mut Pcg32,
    ) -> Self {
        let speed = settings.speed * kind.speed_factor();
        Self {
            body: Combatant::new(position, settings.health, ROBOT_RADIUS, speed),
            kind,
            state: RobotState::Patrol,
            patrol_target: random_waypoint(bounds, rng),
            base_speed: speed,
            fire_cooldown: 0,
            fire_interval: kind.fire_interval(settings.fire_interval),
            knife_cooldown: 0,
            frozen: 0,
            bullet_damage: settings.damage,
            aim_jitter: settings.aim_jitter,
            headshot_marked: false,
        }
    }

    /// Whether the robot is still alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    /// Speed this frame, after freeze.
    #[must_use]
    pub const fn effective_speed(&self) -> f32 {
        self.body.speed
    }

    /// Apply a freeze hit, restarting the countdown.
    pub fn freeze(&mut self) {
        self.frozen = FREEZE_FRAMES;
    }

    /// Run one frame of AI against the target player's position.
    pub fn update(
        &mut self,
        target: Vec2,
        bounds: MapBounds,
        obstacles: &[Obstacle],
        rng: &mut Pcg32,
    ) {
        if self.frozen > 0 {
            self.frozen -= 1;
            self.body.speed = self.base_speed * FREEZE_SLOW;
        } else {
            self.body.speed = self.base_speed;
        }

        let dist = self.body.distance_to(target);
        self.state = if dist < ATTACK_RANGE {
            RobotState::Attack
        } else if dist < self.kind.detect_range() {
            RobotState::Chase
        } else {
            RobotState::Patrol
        };

        match self.state {
            RobotState::Patrol => {
                let to_waypoint = self.patrol_target - self.body.position;
                let d = to_waypoint.length();
                if d < PATROL_ARRIVAL {
                    self.patrol_target = random_waypoint(bounds, rng);
                } else {
                    self.body.position += to_waypoint / d * self.body.speed * 0.5;
                    self.body.angle = angle_to(Vec2::ZERO, to_waypoint);
                }
            }
            RobotState::Chase => {
                self.step_towards(target, dist);
                self.body.angle = angle_to(self.body.position, target);
            }
            RobotState::Attack => {
                self.body.angle = angle_to(self.body.position, target);
                if self.kind == RobotKind::Knife && dist > KNIFE_RANGE {
                    self.step_towards(target, dist);
                }
            }
        }

        self.body.position = bounds.clamp_entity(self.body.position, self.body.radius);
        for obstacle in obstacles {
            if obstacle.collides_circle(self.body.position, self.body.radius) {
                self.body.position = obstacle.push_out(self.body.position);
            }
        }

        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        self.knife_cooldown = self.knife_cooldown.saturating_sub(1);
        self.body.tick_flash();
    }

    fn step_towards(&mut self, target: Vec2, dist: f32) {
        if dist > 0.0 {
            self.body.position += (target - self.body.position) / dist * self.body.speed;
        }
    }

    /// Whether a knife attack on `target` is possible now.
    #[must_use]
    pub fn can_knife(&self, target: Vec2) -> bool {
        self.kind == RobotKind::Knife
            && self.knife_cooldown == 0
            && self.body.distance_to(target) < KNIFE_RANGE
    }

    /// Swing the knife. Returns damage dealt.
    pub fn knife_attack(&mut self) -> i32 {
        self.knife_cooldown = KNIFE_COOLDOWN;
        KNIFE_DAMAGE
    }

    /// Whether a ranged shot is possible now.
    #[must_use]
    pub fn can_shoot(&self) -> bool {
        self.kind != RobotKind::Knife && self.fire_cooldown == 0 && self.state == RobotState::Attack
    }

    /// Fire at the current facing with random jitter.
    pub fn shoot(&mut self, rng: &mut Pcg32) -> Vec<Projectile> {
        self.fire_cooldown = self.fire_interval;
        let jitter = if self.aim_jitter > 0.0 {
            rng.random_range(-self.aim_jitter..=self.aim_jitter)
        } else {
            0.0
        };
        let angle = self.body.angle + jitter;
        let origin = self.body.position;
        let round = |angle: f32, speed: f32, damage: i32, tag: ProjectileTag| {
            Projectile::new(origin, angle, speed, damage, tag, ProjectileOwner::Robot)
        };
        match self.kind {
            RobotKind::Gun => vec![round(
                angle,
                GUN_BULLET_SPEED,
                self.bullet_damage,
                ProjectileTag::RobotGun,
            )],
            RobotKind::ThrowingKnife => vec![round(
                angle,
                THROWING_KNIFE_SPEED,
                THROWING_KNIFE_DAMAGE,
                ProjectileTag::RobotThrowingKnife,
            )],
            RobotKind::DualPistol => [-0.1, 0.1]
                .into_iter()
                .map(|offset| {
                    round(
                        angle + offset,
                        DUAL_PISTOL_SPEED,
                        DUAL_PISTOL_DAMAGE,
                        ProjectileTag::RobotDualPistol,
                    )
                })
                .collect(),
            RobotKind::Knife => Vec::new(),
        }
    }

    /// Center of the headshot marker.
    #[must_use]
    pub fn headshot_center(&self) -> Vec2 {
        self.body.position - Vec2::new(0.0, HEADSHOT_OFFSET)
    }

    /// Whether a projectile at `point` hits the headshot marker.
    #[must_use]
    pub fn check_headshot(&self, point: Vec2) -> bool {
        self.headshot_center().distance(point) < HEADSHOT_RADIUS + PROJECTILE_RADIUS
    }

    /// Facing as a unit vector.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        direction(self.body.angle)
    }
}

/// A random waypoint inside the patrol margin.
pub fn random_waypoint(bounds: MapBounds, rng: &mut Pcg32) -> Vec2 {
    let max_x = (bounds.width as i32 - PATROL_MARGIN).max(PATROL_MARGIN);
    let max_y = (bounds.height as i32 - PATROL_MARGIN).max(PATROL_MARGIN);
    Vec2::new(
        rng.random_range(PATROL_MARGIN..=max_x) as f32,
        rng.random_range(PATROL_MARGIN..=max_y) as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::Difficulty;
    use rand::SeedableRng;

    fn robot(kind: RobotKind, position: Vec2) -> (Robot, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(42);
        let settings = Difficulty::Easy.settings();
        let robot = Robot::new(kind, position, &settings, MapBounds::default(), &mut rng);
        (robot, rng)
    }

    #[test]
    fn test_kind_modifiers() {
        let (gun, _) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        let (knife, _) = robot(RobotKind::Knife, Vec2::new(1000.0, 1000.0));
        let (dual, _) = robot(RobotKind::DualPistol, Vec2::new(1000.0, 1000.0));
        let (thrower, _) = robot(RobotKind::ThrowingKnife, Vec2::new(1000.0, 1000.0));
        assert_eq!(gun.base_speed, 2.0);
        assert!((knife.base_speed - 2.4).abs() < 1e-6);
        assert_eq!(dual.fire_interval, 45);
        assert_eq!(thrower.fire_interval, 110);
        assert_eq!(RobotKind::DualPistol.fire_interval(20), 15);
    }

    #[test]
    fn test_state_selection_by_distance() {
        let bounds = MapBounds::default();
        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.update(Vec2::new(1350.0, 1000.0), bounds, &[], &mut rng);
        assert_eq!(gun.state, RobotState::Chase);
        gun.update(Vec2::new(1200.0, 1000.0), bounds, &[], &mut rng);
        assert_eq!(gun.state, RobotState::Attack);
        gun.update(Vec2::new(3000.0, 3000.0), bounds, &[], &mut rng);
        assert_eq!(gun.state, RobotState::Patrol);

        let (mut knife, mut rng) = robot(RobotKind::Knife, Vec2::new(1000.0, 1000.0));
        knife.update(Vec2::new(1550.0, 1000.0), bounds, &[], &mut rng);
        assert_eq!(knife.state, RobotState::Chase);
    }

    #[test]
    fn test_chase_moves_toward_target() {
        let bounds = MapBounds::default();
        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.update(Vec2::new(1350.0, 1000.0), bounds, &[], &mut rng);
        assert!((gun.body.position.x - 1002.0).abs() < 1e-4);
        assert!(gun.body.angle.abs() < 1e-6);
    }

    #[test]
    fn test_attack_holds_position_unless_knife() {
        let bounds = MapBounds::default();
        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.update(Vec2::new(1100.0, 1000.0), bounds, &[], &mut rng);
        assert_eq!(gun.body.position, Vec2::new(1000.0, 1000.0));

        let (mut knife, mut rng) = robot(RobotKind::Knife, Vec2::new(1000.0, 1000.0));
        knife.update(Vec2::new(1100.0, 1000.0), bounds, &[], &mut rng);
        assert!(knife.body.position.x > 1000.0);
    }

    #[test]
    fn test_freeze_slows_then_recovers() {
        let bounds = MapBounds::default();
        let far = Vec2::new(4000.0, 4000.0);
        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.freeze();
        for _ in 0..FREEZE_FRAMES {
            gun.update(far, bounds, &[], &mut rng);
            assert!((gun.effective_speed() - 0.3 * gun.base_speed).abs() < 1e-6);
        }
        assert_eq!(gun.frozen, 0);
        gun.update(far, bounds, &[], &mut rng);
        assert_eq!(gun.effective_speed(), gun.base_speed);
    }

    #[test]
    fn test_knife_attack_cooldown() {
        let (mut knife, _) = robot(RobotKind::Knife, Vec2::new(1000.0, 1000.0));
        let target = Vec2::new(1030.0, 1000.0);
        assert!(knife.can_knife(target));
        assert_eq!(knife.knife_attack(), KNIFE_DAMAGE);
        assert!(!knife.can_knife(target));
        assert!(!knife.can_knife(Vec2::new(1100.0, 1000.0)));
        assert!(!knife.can_shoot());
    }

    #[test]
    fn test_shoot_variants() {
        let bounds = MapBounds::default();
        let target = Vec2::new(1100.0, 1000.0);

        let (mut dual, mut rng) = robot(RobotKind::DualPistol, Vec2::new(1000.0, 1000.0));
        dual.update(target, bounds, &[], &mut rng);
        assert!(dual.can_shoot());
        let rounds = dual.shoot(&mut rng);
        assert_eq!(rounds.len(), 2);
        assert!(rounds.iter().all(|r| r.damage == DUAL_PISTOL_DAMAGE));
        assert!(!dual.can_shoot());

        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.update(target, bounds, &[], &mut rng);
        let rounds = gun.shoot(&mut rng);
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].damage, 5);
        assert!(rounds[0].angle.abs() <= 0.3 + 1e-6);
    }

    #[test]
    fn test_headshot_zone_above_body() {
        let (gun, _) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        assert!(gun.check_headshot(Vec2::new(1000.0, 965.0)));
        assert!(gun.check_headshot(Vec2::new(1012.0, 965.0)));
        assert!(!gun.check_headshot(Vec2::new(1000.0, 1000.0)));
    }

    #[test]
    fn test_obstacle_push_out() {
        let bounds = MapBounds::default();
        let wall = Obstacle::new(1010.0, 900.0, 100.0, 200.0);
        let (mut gun, mut rng) = robot(RobotKind::Gun, Vec2::new(1000.0, 1000.0));
        gun.update(Vec2::new(4000.0, 4000.0), bounds, &[wall], &mut rng);
        let before = Vec2::new(1000.0, 1000.0);
        assert!(gun.body.position.x < before.x + 2.0);
    }
}
