//! Players.
//!
//! There is one player type. What drives it is described by a
//! [`ControlSource`] and what it carries by a [`LoadoutPolicy`], so a local
//! co-op partner, a networked opponent and the autopilot teammate all share
//! the same movement, firing and damage code.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combatant::{Combatant, PlayerSlot};
use crate::config::GameMode;
use crate::input::PlayerInput;
use crate::loadout::{FireOutcome, Loadout};
use crate::math::{angle_to, MapBounds};
use crate::obstacle::{any_collides_circle, Obstacle};
use crate::projectile::ProjectileOwner;
use crate::weapon::WeaponKind;

/// Player collision radius.
pub const PLAYER_RADIUS: f32 = 18.0;

/// Player movement speed.
pub const PLAYER_SPEED: f32 = 5.0;

/// Horizontal offset of each co-op spawn from the center.
pub const COOP_SPAWN_OFFSET: f32 = 100.0;

/// Who decides what a player does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlSource {
    /// The main local player.
    LocalPrimary,
    /// A second player on the same machine.
    LocalSecondary,
    /// A peer whose state arrives in network snapshots.
    Remote,
    /// The built-in autopilot.
    AiProxy,
}

impl ControlSource {
    /// Whether per-frame input is simulated locally.
    #[must_use]
    pub const fn is_local(self) -> bool {
        !matches!(self, ControlSource::Remote)
    }
}

/// Which weapons a player may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadoutPolicy {
    /// Baseline plus every saved unlock; earns coins and uses medkits.
    Full,
    /// Baseline only, no economy. Keeps second players on equal footing.
    Baseline,
}

/// Set of purchased weapons, one bit per [`WeaponKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Unlocks(u32);

impl Unlocks {
    /// Nothing unlocked.
    pub const NONE: Self = Self(0);

    const fn bit(kind: WeaponKind) -> u32 {
        1 << kind.index()
    }

    /// Whether `kind` is unlocked.
    #[must_use]
    pub const fn contains(self, kind: WeaponKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }

    /// Mark `kind` unlocked. Returns whether it was new.
    pub fn insert(&mut self, kind: WeaponKind) -> bool {
        let new = !self.contains(kind);
        self.0 |= Self::bit(kind);
        new
    }

    /// Unlocked kinds in catalog order.
    pub fn iter(self) -> impl Iterator<Item = WeaponKind> {
        WeaponKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl FromIterator<WeaponKind> for Unlocks {
    fn from_iter<I: IntoIterator<Item = WeaponKind>>(iter: I) -> Self {
        let mut unlocks = Self::NONE;
        for kind in iter {
            unlocks.insert(kind);
        }
        unlocks
    }
}

/// A player in the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Seat.
    pub slot: PlayerSlot,
    /// Position, facing and health.
    pub body: Combatant,
    /// Carried weapons and firing state.
    pub loadout: Loadout,
    /// What drives this player.
    pub control: ControlSource,
    /// What this player may carry.
    pub policy: LoadoutPolicy,
    /// Currency.
    pub coins: u32,
    /// Purchased weapons.
    pub unlocks: Unlocks,
    /// Medkit charges.
    pub medkits: u32,
    /// Kills credited to this player.
    pub kills: u32,
    /// Score credited to this player.
    pub score: u32,
}

impl Player {
    /// Create a player with the baseline loadout.
    #[must_use]
    pub fn new(
        slot: PlayerSlot,
        position: Vec2,
        health: i32,
        control: ControlSource,
        policy: LoadoutPolicy,
    ) -> Self {
        Self {
            slot,
            body: Combatant::new(position, health, PLAYER_RADIUS, PLAYER_SPEED),
            loadout: Loadout::baseline(),
            control,
            policy,
            coins: 0,
            unlocks: Unlocks::NONE,
            medkits: 0,
            kills: 0,
            score: 0,
        }
    }

    /// Whether the player is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.body.is_alive()
    }

    /// Whether this player takes part in the coin economy.
    #[must_use]
    pub const fn earns_coins(&self) -> bool {
        matches!(self.policy, LoadoutPolicy::Full)
    }

    /// Apply saved progress. Ignored under [`LoadoutPolicy::Baseline`].
    pub fn restore(&mut self, coins: u32, unlocks: Unlocks, medkits: u32) {
        if !self.earns_coins() {
            return;
        }
        self.coins = coins;
        self.medkits = medkits;
        for kind in unlocks.iter() {
            self.unlock(kind);
        }
    }

    /// Add a weapon to the unlocks and the loadout. Returns whether it was new.
    pub fn unlock(&mut self, kind: WeaponKind) -> bool {
        self.unlocks.insert(kind);
        self.loadout.add(kind)
    }

    /// Credit coins. Returns whether the balance changed.
    pub fn add_coins(&mut self, amount: u32) -> bool {
        if !self.earns_coins() || amount == 0 {
            return false;
        }
        self.coins += amount;
        true
    }

    /// Spend a medkit to heal to full.
    ///
    /// Declines without charges or at full health.
    pub fn use_medkit(&mut self) -> bool {
        if self.medkits == 0 || self.body.health >= self.body.max_health {
            return false;
        }
        self.medkits -= 1;
        self.body.heal_full();
        true
    }

    /// Move by the input's direction keys.
    ///
    /// Each axis is tested against the obstacles separately so the player
    /// slides along walls instead of sticking to them.
    pub fn apply_movement(&mut self, input: &PlayerInput, bounds: MapBounds, obstacles: &[Obstacle]) {
        let step = input.movement() * self.body.speed;
        if step == Vec2::ZERO {
            return;
        }
        let pos = self.body.position;
        let radius = self.body.radius;
        // Clamp before testing so the border walls never block the last step
        let next_x = bounds.clamp_entity(Vec2::new(pos.x + step.x, pos.y), radius);
        let next_y = bounds.clamp_entity(Vec2::new(pos.x, pos.y + step.y), radius);
        if !any_collides_circle(obstacles, next_x, radius) {
            self.body.position.x = next_x.x;
        }
        if !any_collides_circle(obstacles, next_y, radius) {
            self.body.position.y = next_y.y;
        }
    }

    /// Face `point`.
    pub fn aim_at(&mut self, point: Vec2) {
        self.body.angle = angle_to(self.body.position, point);
    }

    /// Pull the trigger on the equipped weapon.
    pub fn fire(&mut self) -> FireOutcome {
        self.loadout.fire(
            self.body.position,
            self.body.angle,
            self.body.radius,
            ProjectileOwner::Player(self.slot),
        )
    }

    /// Per-frame cooldowns. Returns whether a reload finished.
    pub fn tick_timers(&mut self) -> bool {
        self.body.tick_flash();
        self.loadout.tick()
    }
}

/// Starting positions for both seats.
///
/// Online PvP puts the host on the left and the joiner on the right; the
/// local seat is always [`PlayerSlot::One`].
#[must_use]
pub fn spawn_positions(mode: GameMode, bounds: MapBounds, host: bool) -> [Vec2; 2] {
    let center = bounds.center();
    let left = Vec2::new(bounds.width / 4.0, center.y);
    let right = Vec2::new(bounds.width * 3.0 / 4.0, center.y);
    match mode {
        GameMode::Solo => [center, center],
        GameMode::Coop | GameMode::OnlineCoop => [
            center - Vec2::new(COOP_SPAWN_OFFSET, 0.0),
            center + Vec2::new(COOP_SPAWN_OFFSET, 0.0),
        ],
        GameMode::Pvp => [left, right],
        GameMode::OnlinePvp => {
            if host {
                [left, right]
            } else {
                [right, left]
            }
        }
    }
}
