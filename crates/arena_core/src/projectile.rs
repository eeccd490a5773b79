//! Moving point projectiles and their damage rules.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combatant::PlayerSlot;
use crate::math::{direction, round_to_i32, MapBounds};
use crate::weapon::{WeaponFlags, WeaponKind};

/// Collision radius of every projectile.
pub const PROJECTILE_RADIUS: f32 = 5.0;

/// Frames a projectile lives before it fizzles.
pub const PROJECTILE_LIFETIME: u32 = 180;

/// Distance over which shotgun damage falls off.
pub const SHOTGUN_FALLOFF_RANGE: f32 = 150.0;

/// Fraction of shotgun damage lost at full falloff range.
pub const SHOTGUN_FALLOFF: f32 = 0.8;

/// Floor for shotgun pellet damage.
pub const SHOTGUN_MIN_DAMAGE: i32 = 10;

/// Sniper damage on a headshot.
pub const SNIPER_HEADSHOT_DAMAGE: i32 = 150;

/// Sniper damage on a body hit.
pub const SNIPER_BODY_DAMAGE: i32 = 50;

/// What fired a projectile, for damage rules and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileTag {
    /// Fired from a player weapon.
    Weapon(WeaponKind),
    /// Plain robot bullet.
    RobotGun,
    /// Robot throwing knife.
    RobotThrowingKnife,
    /// Robot dual pistol round.
    RobotDualPistol,
    /// Boss spread shot.
    Boss,
}

impl ProjectileTag {
    /// Weapon flags for player rounds; empty for enemy rounds.
    #[must_use]
    pub fn flags(self) -> WeaponFlags {
        match self {
            ProjectileTag::Weapon(kind) => kind.stats().flags,
            _ => WeaponFlags::NONE,
        }
    }

    /// Whether this round uses the headshot zone.
    #[must_use]
    pub fn is_sniper(self) -> bool {
        self.flags().contains(WeaponFlags::SNIPER)
    }
}

/// Who a projectile belongs to. Decides which targets it may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileOwner {
    /// A player's round; hits robots, the boss, or the PvP opponent.
    Player(PlayerSlot),
    /// A robot's round; hits players.
    Robot,
    /// The boss's round; hits players.
    Boss,
}

impl ProjectileOwner {
    /// Whether the owner is hostile to players.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, ProjectileOwner::Robot | ProjectileOwner::Boss)
    }
}

/// A round in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Where the round was fired from; drives distance falloff.
    pub origin: Vec2,
    /// Current position.
    pub position: Vec2,
    /// Travel direction in radians.
    pub angle: f32,
    /// Units per frame.
    pub speed: f32,
    /// Base damage before tag-specific rules.
    pub damage: i32,
    /// Source weapon or enemy variant.
    pub tag: ProjectileTag,
    /// Which side fired it.
    pub owner: ProjectileOwner,
    /// Frames left to live.
    pub lifetime: u32,
}

impl Projectile {
    /// Spawn a projectile at `origin`.
    #[must_use]
    pub fn new(
        origin: Vec2,
        angle: f32,
        speed: f32,
        damage: i32,
        tag: ProjectileTag,
        owner: ProjectileOwner,
    ) -> Self {
        Self {
            origin,
            position: origin,
            angle,
            speed,
            damage,
            tag,
            owner,
            lifetime: PROJECTILE_LIFETIME,
        }
    }

    /// Advance one frame along the travel angle.
    pub fn advance(&mut self) {
        self.position += direction(self.angle) * self.speed;
        self.lifetime = self.lifetime.saturating_sub(1);
    }

    /// Whether the round has run out of lifetime or left the map.
    #[must_use]
    pub fn is_spent(&self, bounds: MapBounds) -> bool {
        self.lifetime == 0 || !bounds.contains(self.position)
    }

    /// Distance from the firing point.
    #[must_use]
    pub fn distance_travelled(&self) -> f32 {
        self.origin.distance(self.position)
    }

    /// Damage dealt when this round connects.
    ///
    /// `headshot` only matters for sniper rounds.
    #[must_use]
    pub fn hit_damage(&self, headshot: bool) -> i32 {
        let flags = self.tag.flags();
        if flags.contains(WeaponFlags::SNIPER) {
            if headshot {
                SNIPER_HEADSHOT_DAMAGE
            } else {
                SNIPER_BODY_DAMAGE
            }
        } else if flags.contains(WeaponFlags::SHOTGUN) {
            shotgun_damage(self.damage, self.distance_travelled())
        } else {
            self.damage
        }
    }

    /// Damage dealt to a player in a duel.
    ///
    /// Players have no head zone, so sniper rounds keep their catalog damage.
    /// Shotgun falloff still applies.
    #[must_use]
    pub fn player_hit_damage(&self) -> i32 {
        if self.tag.flags().contains(WeaponFlags::SNIPER) {
            self.damage
        } else {
            self.hit_damage(false)
        }
    }
}

/// Shotgun pellet damage after distance falloff.
///
/// Full damage at the muzzle, dropping linearly by 80% towards 150 units,
/// never below [`SHOTGUN_MIN_DAMAGE`]. At 150 units and beyond a pellet only
/// deals the floor.
#[must_use]
pub fn shotgun_damage(base: i32, distance: f32) -> i32 {
    if distance >= SHOTGUN_FALLOFF_RANGE {
        return SHOTGUN_MIN_DAMAGE;
    }
    let falloff = distance.max(0.0) / SHOTGUN_FALLOFF_RANGE;
    let scaled = base as f32 * (1.0 - falloff * SHOTGUN_FALLOFF);
    SHOTGUN_MIN_DAMAGE.max(round_to_i32(scaled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn player_round(kind: WeaponKind) -> Projectile {
        let stats = kind.stats();
        Projectile::new(
            Vec2::new(100.0, 100.0),
            0.0,
            stats.projectile_speed,
            stats.damage,
            ProjectileTag::Weapon(kind),
            ProjectileOwner::Player(PlayerSlot::One),
        )
    }

    #[test]
    fn test_shotgun_damage_endpoints() {
        assert_eq!(shotgun_damage(65, 0.0), 65);
        assert_eq!(shotgun_damage(65, 149.0), 13);
        assert_eq!(shotgun_damage(65, 150.0), SHOTGUN_MIN_DAMAGE);
        assert_eq!(shotgun_damage(65, 500.0), SHOTGUN_MIN_DAMAGE);
        assert_eq!(shotgun_damage(12, 100.0), SHOTGUN_MIN_DAMAGE);
    }

    #[test]
    fn test_sniper_damage_overrides_catalog() {
        let round = player_round(WeaponKind::Sniper);
        assert_eq!(round.hit_damage(true), 150);
        assert_eq!(round.hit_damage(false), 50);
        assert_eq!(round.player_hit_damage(), 180);
    }

    #[test]
    fn test_player_hits_keep_shotgun_falloff() {
        let mut pellet = player_round(WeaponKind::Shotgun);
        assert_eq!(pellet.player_hit_damage(), pellet.damage);
        pellet.position = pellet.origin + Vec2::new(200.0, 0.0);
        assert_eq!(pellet.player_hit_damage(), SHOTGUN_MIN_DAMAGE);
    }

    #[test]
    fn test_advance_and_expiry() {
        let bounds = MapBounds::default();
        let mut round = player_round(WeaponKind::Rifle);
        round.advance();
        assert!((round.position.x - 122.0).abs() < 1e-4);
        assert_eq!(round.lifetime, PROJECTILE_LIFETIME - 1);
        assert!(!round.is_spent(bounds));

        round.position = Vec2::new(-1.0, 10.0);
        assert!(round.is_spent(bounds));
    }

    #[test]
    fn test_shotgun_round_uses_distance() {
        let mut round = player_round(WeaponKind::Shotgun);
        round.position = round.origin + Vec2::new(75.0, 0.0);
        // 65 * (1 - 0.5 * 0.8) = 39
        assert_eq!(round.hit_damage(false), 39);
    }

    proptest! {
        #[test]
        fn prop_shotgun_damage_bounded(base in 10i32..300, distance in 0.0f32..2000.0) {
            let dmg = shotgun_damage(base, distance);
            prop_assert!(dmg >= SHOTGUN_MIN_DAMAGE);
            prop_assert!(dmg <= base);
            if distance >= SHOTGUN_FALLOFF_RANGE {
                prop_assert_eq!(dmg, SHOTGUN_MIN_DAMAGE);
            } else {
                let expected = (base as f32 * (1.0 - distance / 150.0 * 0.8)).round() as i32;
                prop_assert_eq!(dmg, expected.max(SHOTGUN_MIN_DAMAGE));
            }
        }
    }
}
