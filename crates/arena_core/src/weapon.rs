//! Immutable weapon catalog.
//!
//! Every weapon in the game is a [`WeaponKind`] variant. Its numbers live in a
//! single static table indexed by the variant, and its behavioral quirks are
//! expressed as [`WeaponFlags`] rather than by matching on names.
//!
//! # Example
//!
//! ```
//! use arena_core::weapon::{WeaponFlags, WeaponKind};
//!
//! let shotgun = WeaponKind::Shotgun.stats();
//! assert!(shotgun.flags.contains(WeaponFlags::SHOTGUN));
//! assert_eq!(shotgun.max_ammo, 8);
//! assert!(WeaponKind::Knife.is_melee());
//! ```

use serde::{Deserialize, Serialize};

/// Capability flags for a weapon.
///
/// Implemented as a small bitset so that combinations are cheap to test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WeaponFlags(u16);

impl WeaponFlags {
    // ========================================
    // Attack form
    // ========================================

    /// Close-range swing; never consumes ammo or reloads.
    pub const MELEE: Self = Self(1 << 0);
    /// Thrown fragmentation grenade.
    pub const GRENADE: Self = Self(1 << 1);
    /// Thrown smoke grenade.
    pub const SMOKE: Self = Self(1 << 2);

    // ========================================
    // Projectile behavior
    // ========================================

    /// Fires a pellet spread whose damage falls off with distance.
    pub const SHOTGUN: Self = Self(1 << 3);
    /// Fires two parallel rounds per trigger pull.
    pub const DUAL: Self = Self(1 << 4);
    /// Slows the target on hit.
    pub const FREEZE: Self = Self(1 << 5);
    /// Arcs half damage to nearby robots.
    pub const ELECTRIC: Self = Self(1 << 6);
    /// Fixed headshot/body damage.
    pub const SNIPER: Self = Self(1 << 7);

    // ========================================
    // Ammunition
    // ========================================

    /// Ammo cannot be replenished by reloading.
    pub const NO_RELOAD: Self = Self(1 << 8);

    /// Empty flag set.
    pub const NONE: Self = Self(0);

    /// Combine two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any flag in `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for WeaponFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Catalog entry for one weapon kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeaponStats {
    /// Display name.
    pub name: &'static str,
    /// Magazine capacity.
    pub max_ammo: u32,
    /// Spare magazines a fresh instance starts with.
    pub reloads: u32,
    /// Frames between shots.
    pub fire_interval: u32,
    /// Base damage per projectile or swing.
    pub damage: i32,
    /// Projectile (or throw) speed in units per frame.
    pub projectile_speed: f32,
    /// Recoil added per shot.
    pub recoil: f32,
    /// Frames a reload takes.
    pub reload_frames: u32,
    /// Behavioral flags.
    pub flags: WeaponFlags,
    /// Unlock price in coins; `None` for the starting arsenal.
    pub price: Option<u32>,
}

/// Every weapon a player can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Automatic rifle.
    Rifle,
    /// Sidearm.
    Handgun,
    /// Combat knife.
    Knife,
    /// Fragmentation grenade.
    Grenade,
    /// Smoke grenade.
    SmokeGrenade,
    /// Pump shotgun.
    Shotgun,
    /// Rocket launcher.
    Rpg,
    /// Sniper rifle.
    Sniper,
    /// Flamethrower.
    Flamethrower,
    /// Laser rifle.
    Laser,
    /// Minigun.
    Minigun,
    /// Crossbow.
    Crossbow,
    /// Electric gun.
    Electric,
    /// Freeze ray.
    Freeze,
    /// Pair of pistols.
    DualPistols,
    /// Throwing knives.
    ThrowingKnives,
}

const fn entry(
    name: &'static str,
    max_ammo: u32,
    reloads: u32,
    fire_interval: u32,
    damage: i32,
    projectile_speed: f32,
    recoil: f32,
    reload_frames: u32,
    flags: WeaponFlags,
    price: Option<u32>,
) -> WeaponStats {
    WeaponStats {
        name,
        max_ammo,
        reloads,
        fire_interval,
        damage,
        projectile_speed,
        recoil,
        reload_frames,
        flags,
        price,
    }
}

const THROWN: WeaponFlags = WeaponFlags::GRENADE.union(WeaponFlags::NO_RELOAD);
const SMOKE_THROWN: WeaponFlags = WeaponFlags::SMOKE.union(WeaponFlags::NO_RELOAD);

/// Stats table, in [`WeaponKind::ALL`] order.
static CATALOG: [WeaponStats; WeaponKind::COUNT] = [
    entry("Rifle", 30, 5, 6, 28, 22.0, 3.0, 90, WeaponFlags::NONE, None),
    entry("Handgun", 17, 6, 8, 18, 20.0, 2.0, 60, WeaponFlags::NONE, None),
    entry("Knife", 999, 999, 20, 45, 0.0, 0.0, 0, WeaponFlags::MELEE, None),
    entry("Grenade", 4, 0, 50, 100, 10.0, 0.0, 0, THROWN, None),
    entry("Smoke Grenade", 2, 0, 60, 0, 10.0, 0.0, 0, SMOKE_THROWN, Some(40)),
    entry("Shotgun", 8, 4, 35, 65, 18.0, 6.0, 120, WeaponFlags::SHOTGUN, Some(10)),
    entry("RPG", 1, 8, 90, 200, 12.0, 8.0, 150, WeaponFlags::NONE, Some(50)),
    entry("Sniper", 10, 3, 50, 180, 35.0, 10.0, 120, WeaponFlags::SNIPER, Some(150)),
    entry("Flamethrower", 100, 2, 2, 12, 10.0, 1.0, 180, WeaponFlags::NONE, Some(80)),
    entry("Laser", 50, 4, 3, 18, 50.0, 0.0, 90, WeaponFlags::NONE, Some(120)),
    entry("Minigun", 200, 2, 2, 15, 24.0, 2.0, 180, WeaponFlags::NONE, Some(200)),
    entry("Crossbow", 12, 5, 45, 90, 28.0, 1.0, 100, WeaponFlags::NONE, Some(100)),
    entry("Electric", 30, 4, 12, 30, 25.0, 2.0, 90, WeaponFlags::ELECTRIC, Some(140)),
    entry("Freeze", 40, 4, 6, 14, 18.0, 1.0, 90, WeaponFlags::FREEZE, Some(110)),
    entry("Dual Pistols", 14, 6, 6, 35, 22.0, 4.0, 80, WeaponFlags::DUAL, Some(60)),
    entry("Throwing Knives", 16, 8, 10, 50, 26.0, 0.0, 40, WeaponFlags::NONE, Some(70)),
];

impl WeaponKind {
    /// Number of weapon kinds.
    pub const COUNT: usize = 16;

    /// All kinds in catalog order.
    pub const ALL: [WeaponKind; Self::COUNT] = [
        WeaponKind::Rifle,
        WeaponKind::Handgun,
        WeaponKind::Knife,
        WeaponKind::Grenade,
        WeaponKind::SmokeGrenade,
        WeaponKind::Shotgun,
        WeaponKind::Rpg,
        WeaponKind::Sniper,
        WeaponKind::Flamethrower,
        WeaponKind::Laser,
        WeaponKind::Minigun,
        WeaponKind::Crossbow,
        WeaponKind::Electric,
        WeaponKind::Freeze,
        WeaponKind::DualPistols,
        WeaponKind::ThrowingKnives,
    ];

    /// The starting arsenal every player has.
    pub const BASELINE: [WeaponKind; 4] = [
        WeaponKind::Rifle,
        WeaponKind::Handgun,
        WeaponKind::Knife,
        WeaponKind::Grenade,
    ];

    /// Position of this kind in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up a kind by catalog index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Catalog stats for this kind.
    #[must_use]
    pub fn stats(self) -> &'static WeaponStats {
        &CATALOG[self as usize]
    }

    /// Display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.stats().name
    }

    /// Whether this is a melee weapon.
    #[must_use]
    pub fn is_melee(self) -> bool {
        self.stats().flags.contains(WeaponFlags::MELEE)
    }

    /// Whether this weapon is thrown rather than fired.
    #[must_use]
    pub fn is_thrown(self) -> bool {
        self.stats()
            .flags
            .intersects(WeaponFlags::GRENADE.union(WeaponFlags::SMOKE))
    }

    /// Whether this weapon can never be reloaded.
    #[must_use]
    pub fn never_reloads(self) -> bool {
        self.stats()
            .flags
            .intersects(WeaponFlags::MELEE.union(WeaponFlags::NO_RELOAD))
    }

    /// Whether this weapon ejects a shell casing when fired.
    #[must_use]
    pub const fn ejects_casing(self) -> bool {
        matches!(
            self,
            WeaponKind::Rifle | WeaponKind::Handgun | WeaponKind::Sniper
        )
    }

    /// Kinds that can be bought in the shop, in catalog order.
    pub fn purchasable() -> impl Iterator<Item = WeaponKind> {
        Self::ALL.into_iter().filter(|k| k.stats().price.is_some())
    }
}
