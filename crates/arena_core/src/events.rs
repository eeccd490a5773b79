//! Events produced by a simulation tick.
//!
//! The simulation never calls out to rendering, audio or storage. Hosts read
//! these events after each tick to drive sounds, effects and saves.

use serde::{Deserialize, Serialize};

use crate::arena::Handle;
use crate::combatant::PlayerSlot;
use crate::wave::WaveProgress;

/// Something that can take damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A robot in the cohort.
    Robot(Handle),
    /// The boss.
    Boss,
    /// A player.
    Player(PlayerSlot),
}

/// How damage was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// A projectile strike.
    Projectile,
    /// A sniper round in the headshot zone.
    Headshot,
    /// One hop of an electric chain.
    Chain,
    /// An explosion.
    Explosion,
    /// A knife swing.
    Melee,
    /// Touching the boss.
    Contact,
}

/// A single combat interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Damage landed.
    Damage {
        /// Who was hit.
        target: Target,
        /// Amount dealt.
        amount: i32,
        /// Delivery.
        source: DamageSource,
    },
    /// A target was frozen.
    Frozen {
        /// The frozen robot.
        target: Target,
    },
    /// A target died.
    Killed {
        /// Who died.
        target: Target,
        /// Player credited with the kill, if any.
        credited: Option<PlayerSlot>,
    },
}

/// Coin threshold reached that opens the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopPrompt {
    /// Enough coins for the shotgun.
    Shotgun,
    /// Enough coins for the RPG.
    Rpg,
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Every enemy defeated.
    Victory,
    /// The players were wiped out.
    Defeat,
    /// A PvP match won by the given player.
    PvpWinner(PlayerSlot),
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Damage, freezes and deaths in resolution order.
    pub combat: Vec<CombatEvent>,
    /// Projectiles spawned by players and enemies.
    pub shots_fired: u32,
    /// Grenades and smoke clouds that went off.
    pub detonations: u32,
    /// Reloads that completed.
    pub reloads_finished: u32,
    /// Wave director result, when it did anything other than wait.
    pub wave: Option<WaveProgress>,
    /// Shop opened because of a coin threshold.
    pub shop_prompt: Option<ShopPrompt>,
    /// Set when the match ended this tick.
    pub outcome: Option<MatchOutcome>,
    /// Persistent progress changed and should be saved.
    pub progress_changed: bool,
}

impl TickEvents {
    /// Number of kills recorded this tick.
    #[must_use]
    pub fn kill_count(&self) -> usize {
        self.combat
            .iter()
            .filter(|event| matches!(event, CombatEvent::Killed { .. }))
            .count()
    }

    /// Total damage dealt to `target` this tick.
    #[must_use]
    pub fn damage_to(&self, target: Target) -> i32 {
        self.combat
            .iter()
            .filter_map(|event| match event {
                CombatEvent::Damage {
                    target: t, amount, ..
                } if *t == target => Some(*amount),
                _ => None,
            })
            .sum()
    }
}
