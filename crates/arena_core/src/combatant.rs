//! Shared state for everything that moves, aims and takes damage.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Frames the hit flash stays lit after taking damage.
pub const HIT_FLASH_FRAMES: u32 = 10;

/// Which player seat an entity or projectile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerSlot {
    /// First player (host in online matches).
    One,
    /// Second player (co-op partner or PvP opponent).
    Two,
}

impl PlayerSlot {
    /// Index into the player list.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }
}

/// Position, facing and health of a living thing in the arena.
///
/// The hit flash is cosmetic only. It does not grant invulnerability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Center of the collision circle.
    pub position: Vec2,
    /// Facing angle in radians.
    pub angle: f32,
    /// Current health; dead at zero or below.
    pub health: i32,
    /// Health cap.
    pub max_health: i32,
    /// Collision radius.
    pub radius: f32,
    /// Movement speed in units per frame.
    pub speed: f32,
    /// Frames left on the damage flash.
    pub hit_flash: u32,
}

impl Combatant {
    /// Create a combatant at full health.
    #[must_use]
    pub fn new(position: Vec2, health: i32, radius: f32, speed: f32) -> Self {
        Self {
            position,
            angle: 0.0,
            health,
            max_health: health,
            radius,
            speed,
            hit_flash: 0,
        }
    }

    /// Apply damage and return whether this hit killed the combatant.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health -= amount;
        self.hit_flash = HIT_FLASH_FRAMES;
        self.health <= 0
    }

    /// Whether health is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Health as a fraction of max, clamped to `[0, 1]`.
    #[must_use]
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0 {
            return 0.0;
        }
        (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
    }

    /// Restore health to max.
    pub fn heal_full(&mut self) {
        self.health = self.max_health;
    }

    /// Count down the hit flash.
    pub fn tick_flash(&mut self) {
        self.hit_flash = self.hit_flash.saturating_sub(1);
    }

    /// Distance between centers.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position.distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_damage_reports_death() {
        let mut c = Combatant::new(Vec2::ZERO, 40, 20.0, 2.0);
        assert!(!c.take_damage(28));
        assert_eq!(c.health, 12);
        assert_eq!(c.hit_flash, HIT_FLASH_FRAMES);
        assert!(c.take_damage(28));
        assert!(!c.is_alive());
    }

    #[test]
    fn test_hit_flash_is_not_invulnerability() {
        let mut c = Combatant::new(Vec2::ZERO, 100, 18.0, 5.0);
        c.take_damage(10);
        c.take_damage(10);
        assert_eq!(c.health, 80);
    }

    #[test]
    fn test_health_fraction_clamps() {
        let mut c = Combatant::new(Vec2::ZERO, 100, 18.0, 5.0);
        c.take_damage(150);
        assert_eq!(c.health_fraction(), 0.0);
        c.heal_full();
        assert_eq!(c.health_fraction(), 1.0);
    }

    #[test]
    fn test_slot_opponent() {
        assert_eq!(PlayerSlot::One.opponent(), PlayerSlot::Two);
        assert_eq!(PlayerSlot::Two.index(), 1);
    }
}
