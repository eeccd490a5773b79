//! Weapon instances and the ammo/reload/recoil model.
//!
//! A [`Loadout`] is the ordered set of weapons a player carries plus the
//! per-player firing state: fire cooldown, the reload state machine and
//! accumulated recoil. Invalid actions (firing on cooldown, reloading a full
//! magazine, ...) are silent no-ops, never errors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::grenade::ThrowKind;
use crate::math::direction;
use crate::projectile::{Projectile, ProjectileOwner, ProjectileTag};
use crate::weapon::{WeaponFlags, WeaponKind};

/// Recoil never accumulates past this.
pub const MAX_RECOIL: f32 = 15.0;

/// Per-frame recoil decay factor.
pub const RECOIL_RECOVERY: f32 = 0.85;

/// Recoil below this snaps to zero.
pub const RECOIL_EPSILON: f32 = 0.1;

/// Fire cooldown applied when switching weapons.
pub const SWITCH_COOLDOWN: u32 = 15;

/// Extra distance beyond the shooter's radius where rounds spawn.
pub const MUZZLE_OFFSET: f32 = 10.0;

/// Angular offsets of shotgun pellets.
pub const SHOTGUN_SPREAD: [f32; 3] = [-0.12, 0.0, 0.12];

/// Angular offsets of dual-pistol rounds.
pub const DUAL_SPREAD: [f32; 2] = [-0.1, 0.1];

/// One carried weapon: catalog kind plus its remaining ammunition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeaponInstance {
    /// Catalog entry.
    pub kind: WeaponKind,
    /// Rounds in the magazine.
    pub ammo: u32,
    /// Magazine refills left.
    pub reloads: u32,
}

impl WeaponInstance {
    /// A fresh instance with a full magazine and the catalog's reloads.
    #[must_use]
    pub fn new(kind: WeaponKind) -> Self {
        let stats = kind.stats();
        Self {
            kind,
            ammo: stats.max_ammo,
            reloads: stats.reloads,
        }
    }

    /// Magazine capacity.
    #[must_use]
    pub fn max_ammo(&self) -> u32 {
        self.kind.stats().max_ammo
    }
}

/// Reload progress for the equipped weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReloadState {
    /// Whether a reload is running.
    pub active: bool,
    /// Frames remaining.
    pub timer: u32,
    /// Total frames of this reload.
    pub duration: u32,
}

impl ReloadState {
    /// Progress in `[0, 1]`; zero when idle.
    #[must_use]
    pub fn phase(&self) -> f32 {
        if !self.active || self.duration == 0 {
            return 0.0;
        }
        1.0 - self.timer as f32 / self.duration as f32
    }
}

/// What a successful trigger pull produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FireOutcome {
    /// Declined: cooldown, reload, or empty magazine.
    None,
    /// A melee swing from the shooter's center.
    Melee {
        /// Swing origin.
        origin: Vec2,
        /// Swing direction.
        angle: f32,
        /// Damage per target.
        damage: i32,
    },
    /// A thrown grenade leaving the hand.
    Throw {
        /// Frag or smoke.
        kind: ThrowKind,
        /// Spawn point just outside the thrower.
        position: Vec2,
        /// Throw direction.
        angle: f32,
    },
    /// One or more rounds.
    Projectiles(Vec<Projectile>),
}

impl FireOutcome {
    /// Whether the trigger pull was declined.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, FireOutcome::None)
    }
}

/// Carried weapons and firing state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    weapons: Vec<WeaponInstance>,
    current: usize,
    fire_cooldown: u32,
    reload: ReloadState,
    recoil: f32,
}

impl Loadout {
    /// Build a loadout from weapon kinds, equipping the first.
    ///
    /// Falls back to the baseline arsenal when `kinds` is empty.
    #[must_use]
    pub fn new(kinds: &[WeaponKind]) -> Self {
        let kinds: &[WeaponKind] = if kinds.is_empty() {
            &WeaponKind::BASELINE
        } else {
            kinds
        };
        Self {
            weapons: kinds.iter().copied().map(WeaponInstance::new).collect(),
            current: 0,
            fire_cooldown: 0,
            reload: ReloadState::default(),
            recoil: 0.0,
        }
    }

    /// The baseline arsenal.
    #[must_use]
    pub fn baseline() -> Self {
        Self::new(&WeaponKind::BASELINE)
    }

    /// All carried weapons in slot order.
    #[must_use]
    pub fn weapons(&self) -> &[WeaponInstance] {
        &self.weapons
    }

    /// Index of the equipped weapon.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    /// The equipped weapon.
    #[must_use]
    pub fn current(&self) -> &WeaponInstance {
        &self.weapons[self.current]
    }

    fn current_mut(&mut self) -> &mut WeaponInstance {
        &mut self.weapons[self.current]
    }

    /// Kind of the equipped weapon.
    #[must_use]
    pub fn current_kind(&self) -> WeaponKind {
        self.current().kind
    }

    /// Whether `kind` is carried.
    #[must_use]
    pub fn has(&self, kind: WeaponKind) -> bool {
        self.weapons.iter().any(|w| w.kind == kind)
    }

    /// Append a weapon if not already carried. Returns whether it was added.
    pub fn add(&mut self, kind: WeaponKind) -> bool {
        if self.has(kind) {
            return false;
        }
        self.weapons.push(WeaponInstance::new(kind));
        true
    }

    /// Frames until the next shot is allowed.
    #[must_use]
    pub const fn fire_cooldown(&self) -> u32 {
        self.fire_cooldown
    }

    /// Reload progress.
    #[must_use]
    pub const fn reload(&self) -> &ReloadState {
        &self.reload
    }

    /// Whether a reload is running.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reload.active
    }

    /// Accumulated recoil.
    #[must_use]
    pub const fn recoil(&self) -> f32 {
        self.recoil
    }

    /// Whether the equipped weapon could fire this frame.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        let weapon = self.current();
        self.fire_cooldown == 0
            && !self.reload.active
            && (weapon.kind.is_melee() || weapon.ammo > 0)
    }

    /// Pull the trigger on the equipped weapon.
    ///
    /// `origin` is the shooter's center and `radius` its collision radius;
    /// rounds and throws spawn just outside that circle.
    pub fn fire(
        &mut self,
        origin: Vec2,
        angle: f32,
        radius: f32,
        owner: ProjectileOwner,
    ) -> FireOutcome {
        if !self.can_fire() {
            return FireOutcome::None;
        }
        let kind = self.current_kind();
        let stats = kind.stats();
        if !kind.is_melee() {
            self.current_mut().ammo -= 1;
        }
        self.fire_cooldown = stats.fire_interval;

        if kind.is_melee() {
            return FireOutcome::Melee {
                origin,
                angle,
                damage: stats.damage,
            };
        }

        let muzzle = origin + direction(angle) * (radius + MUZZLE_OFFSET);
        if kind.is_thrown() {
            let throw = if stats.flags.contains(WeaponFlags::SMOKE) {
                ThrowKind::Smoke
            } else {
                ThrowKind::Frag
            };
            return FireOutcome::Throw {
                kind: throw,
                position: muzzle,
                angle,
            };
        }

        self.apply_recoil(stats.recoil);
        let spread: &[f32] = if stats.flags.contains(WeaponFlags::SHOTGUN) {
            &SHOTGUN_SPREAD
        } else if stats.flags.contains(WeaponFlags::DUAL) {
            &DUAL_SPREAD
        } else {
            &[0.0]
        };
        let rounds = spread
            .iter()
            .map(|offset| {
                Projectile::new(
                    muzzle,
                    angle + offset,
                    stats.projectile_speed,
                    stats.damage,
                    ProjectileTag::Weapon(kind),
                    owner,
                )
            })
            .collect();
        FireOutcome::Projectiles(rounds)
    }

    /// Begin reloading the equipped weapon. Returns whether a reload started.
    pub fn start_reload(&mut self) -> bool {
        let weapon = *self.current();
        if self.reload.active
            || weapon.kind.never_reloads()
            || weapon.reloads == 0
            || weapon.ammo >= weapon.max_ammo()
        {
            return false;
        }
        let duration = weapon.kind.stats().reload_frames.max(1);
        self.reload = ReloadState {
            active: true,
            timer: duration,
            duration,
        };
        true
    }

    /// Advance the reload by one frame. Returns whether it finished now.
    pub fn update_reload(&mut self) -> bool {
        if !self.reload.active {
            return false;
        }
        self.reload.timer = self.reload.timer.saturating_sub(1);
        if self.reload.timer > 0 {
            return false;
        }
        self.reload = ReloadState::default();
        let weapon = self.current_mut();
        weapon.reloads = weapon.reloads.saturating_sub(1);
        weapon.ammo = weapon.max_ammo();
        true
    }

    /// Equip the next weapon, wrapping around.
    ///
    /// Cancels any reload in progress and imposes [`SWITCH_COOLDOWN`].
    pub fn switch_weapon(&mut self) {
        self.select(self.current + 1);
    }

    /// Equip the weapon in slot `index` (modulo the slot count).
    pub fn select(&mut self, index: usize) {
        let index = index % self.weapons.len();
        if index == self.current {
            return;
        }
        self.current = index;
        self.fire_cooldown = SWITCH_COOLDOWN;
        self.reload = ReloadState::default();
    }

    /// Add recoil, capped at [`MAX_RECOIL`].
    pub fn apply_recoil(&mut self, amount: f32) {
        self.recoil = (self.recoil + amount).min(MAX_RECOIL);
    }

    /// Per-frame bookkeeping: cooldown, recoil decay and reload progress.
    ///
    /// Returns whether a reload completed this frame.
    pub fn tick(&mut self) -> bool {
        self.fire_cooldown = self.fire_cooldown.saturating_sub(1);
        self.recoil *= RECOIL_RECOVERY;
        if self.recoil < RECOIL_EPSILON {
            self.recoil = 0.0;
        }
        self.update_reload()
    }
}

impl Default for Loadout {
    fn default() -> Self {
        Self::baseline()
    }
}
