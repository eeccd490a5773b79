//! # Arena Core
//!
//! Deterministic combat simulation for a top-down arena shooter.
//!
//! This crate contains the per-frame game logic only:
//! - No rendering or audio
//! - No blocking IO inside the frame step
//! - No system randomness (one seeded `Pcg32` per match)
//!
//! This separation enables:
//! - Headless runs and autopilot testing
//! - Replays verified by state hash
//! - Peer-to-peer online play with snapshot exchange
//!
//! ## Crate Structure
//!
//! - [`weapon`], [`loadout`] - Weapon catalog and per-player firing state
//! - [`projectile`], [`grenade`], [`combat`] - Rounds, throwables and hit rules
//! - [`robot`], [`boss`], [`wave`] - Enemy AI and the wave director
//! - [`player`], [`shop`] - Players, control sources and the coin economy
//! - [`simulation`], [`systems`] - Frame orchestrator and its systems
//! - [`session`], [`net`], [`driver`] - Persistence, networking and the host loop
//! - [`replay`] - Recording and verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod arena;
pub mod boss;
pub mod combat;
pub mod combatant;
pub mod config;
pub mod difficulty;
pub mod driver;
pub mod effects;
pub mod error;
pub mod events;
pub mod grenade;
pub mod input;
pub mod loadout;
pub mod math;
pub mod net;
pub mod obstacle;
pub mod player;
pub mod projectile;
pub mod replay;
pub mod robot;
pub mod session;
pub mod shop;
pub mod simulation;
pub mod systems;
pub mod wave;
pub mod weapon;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::arena::{EntityArena, Handle};
    pub use crate::combatant::{Combatant, PlayerSlot};
    pub use crate::config::{GameMode, MatchConfig, ObstacleSetup, TICK_RATE};
    pub use crate::difficulty::{Difficulty, DifficultySettings};
    pub use crate::driver::MatchSession;
    pub use crate::error::{ArenaError, Result};
    pub use crate::events::{CombatEvent, DamageSource, MatchOutcome, ShopPrompt, Target, TickEvents};
    pub use crate::input::{FrameInput, PlayerInput};
    pub use crate::loadout::{FireOutcome, Loadout};
    pub use crate::math::MapBounds;
    pub use crate::net::{LoopbackLink, NetworkLink, Snapshot, SnapshotValue};
    pub use crate::obstacle::{MapLayout, Obstacle, ObstacleSource};
    pub use crate::player::{ControlSource, LoadoutPolicy, Player};
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::session::{MemoryStore, ProgressStore, RonFileStore, SaveData, Session};
    pub use crate::shop::ShopItem;
    pub use crate::simulation::{MatchPhase, Simulation};
    pub use crate::wave::WaveProgress;
    pub use crate::weapon::{WeaponFlags, WeaponKind};
}
