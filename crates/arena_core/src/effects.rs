//! Short-lived cosmetic effects and the follow camera.
//!
//! None of this feeds back into combat. It lives in the simulation so that
//! renderers and replays see the same effects at the same frames.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::combatant::PlayerSlot;
use crate::math::{direction, MapBounds};
use crate::weapon::WeaponKind;

/// Frames a muzzle flash is visible.
pub const MUZZLE_FLASH_FRAMES: u32 = 4;

/// Frames a shell casing lives.
pub const CASING_FRAMES: u32 = 60;

/// Frames the medkit heal effect lasts.
pub const HEAL_EFFECT_FRAMES: u32 = 60;

/// Casing velocity damping per frame.
pub const CASING_FRICTION: f32 = 0.92;

/// Downward pull on casings per frame.
pub const CASING_GRAVITY: f32 = 0.15;

/// Full screen size.
pub const SCREEN_WIDTH: f32 = 1280.0;

/// Full screen height.
pub const SCREEN_HEIGHT: f32 = 720.0;

/// Muzzle flash at the end of a barrel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuzzleFlash {
    /// Barrel tip.
    pub position: Vec2,
    /// Shot direction.
    pub angle: f32,
    /// Relative size.
    pub size: f32,
    /// Frames left.
    pub life: u32,
}

/// Ejected brass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShellCasing {
    /// Position.
    pub position: Vec2,
    /// Velocity.
    pub velocity: Vec2,
    /// Spin angle.
    pub rotation: f32,
    /// Spin per frame.
    pub spin: f32,
    /// Frames left.
    pub life: u32,
}

/// Ring shown around a player who used a medkit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealEffect {
    /// Player being healed; the effect follows them.
    pub slot: PlayerSlot,
    /// Current center.
    pub position: Vec2,
    /// Frames left.
    pub life: u32,
}

impl HealEffect {
    /// Progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        1.0 - self.life as f32 / HEAL_EFFECT_FRAMES as f32
    }
}

fn barrel_length(kind: WeaponKind) -> f32 {
    match kind {
        WeaponKind::Rifle => 28.0,
        WeaponKind::Handgun => 16.0,
        WeaponKind::Shotgun => 32.0,
        WeaponKind::Sniper => 40.0,
        WeaponKind::Rpg => 35.0,
        _ => 20.0,
    }
}

fn flash_size(kind: WeaponKind) -> f32 {
    match kind {
        WeaponKind::Handgun => 0.7,
        WeaponKind::Shotgun => 1.5,
        WeaponKind::Sniper => 1.2,
        _ => 1.0,
    }
}

/// Every live cosmetic effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    /// Muzzle flashes.
    pub flashes: Vec<MuzzleFlash>,
    /// Shell casings.
    pub casings: Vec<ShellCasing>,
    /// Heal rings.
    pub heals: Vec<HealEffect>,
}

impl Effects {
    /// Spawn the effects for a shot from `kind`.
    pub fn on_fire(
        &mut self,
        kind: WeaponKind,
        shooter: Vec2,
        angle: f32,
        radius: f32,
        rng: &mut Pcg32,
    ) {
        let facing = direction(angle);
        if kind != WeaponKind::Rpg {
            self.flashes.push(MuzzleFlash {
                position: shooter + facing * barrel_length(kind),
                angle,
                size: flash_size(kind),
                life: MUZZLE_FLASH_FRAMES,
            });
        }
        if kind.ejects_casing() {
            let eject = angle + std::f32::consts::FRAC_PI_2 + rng.random_range(-0.3..=0.3);
            let speed = rng.random_range(3.0..=6.0);
            self.casings.push(ShellCasing {
                position: shooter + facing * (radius + 8.0),
                velocity: direction(eject) * speed,
                rotation: rng.random_range(0.0..std::f32::consts::TAU),
                spin: rng.random_range(-0.5..=0.5),
                life: CASING_FRAMES,
            });
        }
    }

    /// Spawn a heal ring on a player.
    pub fn on_heal(&mut self, slot: PlayerSlot, position: Vec2) {
        self.heals.push(HealEffect {
            slot,
            position,
            life: HEAL_EFFECT_FRAMES,
        });
    }

    /// Advance every effect and drop the expired ones.
    ///
    /// `players` gives each slot's position so heal rings can follow.
    pub fn update(&mut self, players: [Option<Vec2>; 2]) {
        self.flashes.retain_mut(|flash| {
            flash.life = flash.life.saturating_sub(1);
            flash.life > 0
        });
        self.casings.retain_mut(|casing| {
            casing.position += casing.velocity;
            casing.velocity *= CASING_FRICTION;
            casing.velocity.y += CASING_GRAVITY;
            casing.rotation += casing.spin;
            casing.life = casing.life.saturating_sub(1);
            casing.life > 0
        });
        self.heals.retain_mut(|heal| {
            if let Some(position) = players[heal.slot.index()] {
                heal.position = position;
            }
            heal.life = heal.life.saturating_sub(1);
            heal.life > 0
        });
    }

    /// Total live effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flashes.len() + self.casings.len() + self.heals.len()
    }

    /// Whether nothing is showing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Viewport that follows a point and never shows past the map edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Top-left corner in world space.
    pub offset: Vec2,
    /// Viewport size.
    pub view: Vec2,
}

impl Camera {
    /// A camera with the given viewport size at the origin.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            offset: Vec2::ZERO,
            view: Vec2::new(width, height),
        }
    }

    /// Full-screen camera.
    #[must_use]
    pub const fn full_screen() -> Self {
        Self::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }

    /// Half-width camera for local split screen.
    #[must_use]
    pub const fn split_screen() -> Self {
        Self::new(SCREEN_WIDTH / 2.0, SCREEN_HEIGHT)
    }

    /// Center on `target`, clamped to the map.
    pub fn update(&mut self, target: Vec2, bounds: MapBounds) {
        let half = (self.view / 2.0).floor();
        let max = Vec2::new(bounds.width, bounds.height) - self.view;
        self.offset = (target - half).clamp(Vec2::ZERO, max.max(Vec2::ZERO));
    }

    /// World point to screen point.
    #[must_use]
    pub fn apply(&self, point: Vec2) -> Vec2 {
        point - self.offset
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::full_screen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_fire_effects_by_kind() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut fx = Effects::default();
        fx.on_fire(WeaponKind::Rifle, Vec2::new(100.0, 100.0), 0.0, 18.0, &mut rng);
        assert_eq!(fx.flashes.len(), 1);
        assert_eq!(fx.casings.len(), 1);
        assert_eq!(fx.flashes[0].position, Vec2::new(128.0, 100.0));

        fx.on_fire(WeaponKind::Rpg, Vec2::ZERO, 0.0, 18.0, &mut rng);
        fx.on_fire(WeaponKind::Shotgun, Vec2::ZERO, 0.0, 18.0, &mut rng);
        assert_eq!(fx.flashes.len(), 2);
        assert_eq!(fx.casings.len(), 1);
    }

    #[test]
    fn test_effects_expire() {
        let mut rng = Pcg32::seed_from_u64(0);
        let mut fx = Effects::default();
        fx.on_fire(WeaponKind::Handgun, Vec2::ZERO, 0.0, 18.0, &mut rng);
        fx.on_heal(PlayerSlot::One, Vec2::ZERO);
        for _ in 0..MUZZLE_FLASH_FRAMES {
            fx.update([Some(Vec2::new(5.0, 5.0)), None]);
        }
        assert!(fx.flashes.is_empty());
        assert_eq!(fx.heals[0].position, Vec2::new(5.0, 5.0));
        for _ in MUZZLE_FLASH_FRAMES..CASING_FRAMES {
            fx.update([None, None]);
        }
        assert!(fx.is_empty());
    }

    #[test]
    fn test_camera_clamps_to_map() {
        let bounds = MapBounds::default();
        let mut cam = Camera::full_screen();
        cam.update(Vec2::new(100.0, 100.0), bounds);
        assert_eq!(cam.offset, Vec2::ZERO);
        cam.update(Vec2::new(2500.0, 2500.0), bounds);
        assert_eq!(cam.offset, Vec2::new(1860.0, 2140.0));
        cam.update(Vec2::new(4990.0, 4990.0), bounds);
        assert_eq!(cam.offset, Vec2::new(3720.0, 4280.0));
        assert_eq!(cam.apply(Vec2::new(4000.0, 4500.0)), Vec2::new(280.0, 220.0));
    }
}
