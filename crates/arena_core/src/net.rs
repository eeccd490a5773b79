//! Peer state exchange for online modes.
//!
//! Each peer sends its own player as a flat [`Snapshot`] once per frame and
//! applies whatever snapshots arrived to the remote player. Inbound position,
//! facing, health and the shooting flag are authoritative; a set shooting
//! flag fires the remote player's equipped weapon locally.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combatant::PlayerSlot;
use crate::error::{ArenaError, Result};
use crate::player::Player;
use crate::simulation::Simulation;

/// Snapshot key for the x coordinate.
pub const KEY_X: &str = "x";
/// Snapshot key for the y coordinate.
pub const KEY_Y: &str = "y";
/// Snapshot key for facing.
pub const KEY_ANGLE: &str = "angle";
/// Snapshot key for health.
pub const KEY_HEALTH: &str = "health";
/// Snapshot key for the equipped weapon slot.
pub const KEY_WEAPON: &str = "weapon_idx";
/// Snapshot key for the trigger state.
pub const KEY_SHOOTING: &str = "shooting";
/// Snapshot key for the display name.
pub const KEY_NAME: &str = "name";

/// One value in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SnapshotValue {
    /// Floating point number.
    Float(f32),
    /// Integer.
    Int(i64),
    /// Flag.
    Bool(bool),
    /// Text.
    Text(String),
}

impl SnapshotValue {
    fn kind(&self) -> &'static str {
        match self {
            SnapshotValue::Float(_) => "float",
            SnapshotValue::Int(_) => "int",
            SnapshotValue::Bool(_) => "bool",
            SnapshotValue::Text(_) => "text",
        }
    }
}

/// Flat key/value record describing one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot(pub BTreeMap<String, SnapshotValue>);

fn wrong_type(field: &str, expected: &str, found: &SnapshotValue) -> ArenaError {
    ArenaError::SnapshotField {
        field: field.to_string(),
        message: format!("expected {expected}, found {}", found.kind()),
    }
}

impl Snapshot {
    /// Empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn insert(&mut self, key: &str, value: SnapshotValue) {
        self.0.insert(key.to_string(), value);
    }

    /// Raw field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.0.get(key)
    }

    /// Numeric field. Integers are widened.
    pub fn float(&self, key: &str) -> Result<Option<f32>> {
        match self.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Float(v)) => Ok(Some(*v)),
            Some(SnapshotValue::Int(v)) => Ok(Some(*v as f32)),
            Some(other) => Err(wrong_type(key, "number", other)),
        }
    }

    /// Integer field.
    pub fn int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_type(key, "int", other)),
        }
    }

    /// Flag field.
    pub fn flag(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(wrong_type(key, "bool", other)),
        }
    }

    /// Text field.
    pub fn text(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Text(v)) => Ok(Some(v.as_str())),
            Some(other) => Err(wrong_type(key, "text", other)),
        }
    }
}

/// Describe a local player for the peer.
#[must_use]
pub fn snapshot_from_player(player: &Player, shooting: bool, name: &str) -> Snapshot {
    let mut snapshot = Snapshot::new();
    snapshot.insert(KEY_X, SnapshotValue::Float(player.body.position.x));
    snapshot.insert(KEY_Y, SnapshotValue::Float(player.body.position.y));
    snapshot.insert(KEY_ANGLE, SnapshotValue::Float(player.body.angle));
    snapshot.insert(KEY_HEALTH, SnapshotValue::Int(i64::from(player.body.health)));
    snapshot.insert(
        KEY_WEAPON,
        SnapshotValue::Int(i64::try_from(player.loadout.current_index()).unwrap_or(0)),
    );
    snapshot.insert(KEY_SHOOTING, SnapshotValue::Bool(shooting));
    snapshot.insert(KEY_NAME, SnapshotValue::Text(name.to_string()));
    snapshot
}

/// Decoded peer state. Absent fields leave the local value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteState {
    /// Position, when both coordinates were sent.
    pub position: Option<Vec2>,
    /// Facing.
    pub angle: Option<f32>,
    /// Health.
    pub health: Option<i32>,
    /// Equipped weapon slot.
    pub weapon_index: Option<usize>,
    /// Whether the trigger is held.
    pub shooting: bool,
    /// Display name.
    pub name: Option<String>,
}

impl RemoteState {
    /// Decode a snapshot.
    ///
    /// # Errors
    /// Returns [`ArenaError::SnapshotField`] when a field has the wrong type
    /// or is out of range.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let position = match (snapshot.float(KEY_X)?, snapshot.float(KEY_Y)?) {
            (Some(x), Some(y)) => Some(Vec2::new(x, y)),
            _ => None,
        };
        let health = snapshot
            .int(KEY_HEALTH)?
            .map(|h| {
                i32::try_from(h).map_err(|_| ArenaError::SnapshotField {
                    field: KEY_HEALTH.to_string(),
                    message: format!("{h} does not fit a health value"),
                })
            })
            .transpose()?;
        let weapon_index = snapshot
            .int(KEY_WEAPON)?
            .map(|i| {
                usize::try_from(i).map_err(|_| ArenaError::SnapshotField {
                    field: KEY_WEAPON.to_string(),
                    message: format!("{i} is not a weapon slot"),
                })
            })
            .transpose()?;
        Ok(Self {
            position,
            angle: snapshot.float(KEY_ANGLE)?,
            health,
            weapon_index,
            shooting: snapshot.flag(KEY_SHOOTING)?.unwrap_or(false),
            name: snapshot.text(KEY_NAME)?.map(str::to_string),
        })
    }
}

impl Simulation {
    /// Overwrite a remote player with peer state.
    ///
    /// Returns the number of rounds the shooting flag produced.
    pub fn apply_remote_state(&mut self, slot: PlayerSlot, state: &RemoteState) -> u32 {
        let bounds = self.bounds;
        let Some(player) = self.player_mut(slot) else {
            return 0;
        };
        if let Some(position) = state.position {
            player.body.position = bounds.clamp_entity(position, player.body.radius);
        }
        if let Some(angle) = state.angle {
            player.body.angle = angle;
        }
        if let Some(health) = state.health {
            player.body.health = health.clamp(0, player.body.max_health);
        }
        if let Some(index) = state.weapon_index {
            if index != player.loadout.current_index() && index < player.loadout.weapons().len() {
                player.loadout.select(index);
            }
        }
        if state.shooting {
            self.fire_remote(slot)
        } else {
            0
        }
    }

    /// Decode and apply a snapshot to the remote player.
    ///
    /// # Errors
    /// Returns the decode error; nothing is applied in that case.
    pub fn apply_remote_snapshot(&mut self, slot: PlayerSlot, snapshot: &Snapshot) -> Result<u32> {
        let state = RemoteState::from_snapshot(snapshot)?;
        Ok(self.apply_remote_state(slot, &state))
    }
}

/// Transport for snapshots.
pub trait NetworkLink: std::fmt::Debug + Send {
    /// Queue a snapshot for the peer.
    fn send_snapshot(&mut self, snapshot: &Snapshot) -> Result<()>;

    /// Drain snapshots received since the last call, oldest first.
    fn receive_snapshots(&mut self) -> Result<Vec<Snapshot>>;
}

type Queue = Arc<Mutex<VecDeque<Snapshot>>>;

/// One end of an in-process link.
#[derive(Debug, Clone)]
pub struct LoopbackLink {
    outbox: Queue,
    inbox: Queue,
}

impl LoopbackLink {
    /// Two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a: Queue = Arc::default();
        let b: Queue = Arc::default();
        (
            Self {
                outbox: Arc::clone(&a),
                inbox: Arc::clone(&b),
            },
            Self {
                outbox: b,
                inbox: a,
            },
        )
    }
}

fn poisoned<T>(_: T) -> ArenaError {
    ArenaError::Link("loopback queue poisoned".to_string())
}

impl NetworkLink for LoopbackLink {
    fn send_snapshot(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.outbox
            .lock()
            .map_err(poisoned)?
            .push_back(snapshot.clone());
        Ok(())
    }

    fn receive_snapshots(&mut self) -> Result<Vec<Snapshot>> {
        Ok(self.inbox.lock().map_err(poisoned)?.drain(..).collect())
    }
}
