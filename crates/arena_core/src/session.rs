//! Saved progress and the login session that owns it.
//!
//! Progress is coins, purchased weapons and medkit charges. A [`Session`]
//! is created when a match starts and holds the active [`ProgressStore`];
//! store failures are logged and never reach the simulation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::player::{Player, Unlocks};
use crate::weapon::WeaponKind;

/// File name used when nobody is logged in.
pub const GUEST_SAVE_NAME: &str = "guest";

/// Persistent progress for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// Coin balance.
    pub coins: u32,
    /// Purchased weapons in catalog order.
    pub unlocked: Vec<WeaponKind>,
    /// Medkit charges.
    pub medkits: u32,
}

impl SaveData {
    /// Capture the progress of a player.
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        Self {
            coins: player.coins,
            unlocked: player.unlocks.iter().collect(),
            medkits: player.medkits,
        }
    }

    /// Unlocks as a set.
    #[must_use]
    pub fn unlocks(&self) -> Unlocks {
        self.unlocked.iter().copied().collect()
    }

    /// Apply to a player. Players without the full loadout ignore it.
    pub fn apply(&self, player: &mut Player) {
        player.restore(self.coins, self.unlocks(), self.medkits);
    }
}

/// Backend that loads and stores [`SaveData`].
pub trait ProgressStore: fmt::Debug + Send {
    /// Load the current save. A store with nothing saved yet returns the
    /// default.
    fn load_save(&self) -> Result<SaveData>;

    /// Persist `data`, replacing what was there.
    fn save_game(&mut self, data: &SaveData) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: SaveData,
    saves: u32,
    fail: bool,
}

impl MemoryStore {
    /// A store already holding `data`.
    #[must_use]
    pub fn with_data(data: SaveData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// A store whose every operation fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Last saved data.
    #[must_use]
    pub const fn data(&self) -> &SaveData {
        &self.data
    }

    /// Number of successful saves.
    #[must_use]
    pub const fn save_count(&self) -> u32 {
        self.saves
    }
}

impl ProgressStore for MemoryStore {
    fn load_save(&self) -> Result<SaveData> {
        if self.fail {
            return Err(ArenaError::Store("memory store unavailable".to_string()));
        }
        Ok(self.data.clone())
    }

    fn save_game(&mut self, data: &SaveData) -> Result<()> {
        if self.fail {
            return Err(ArenaError::Store("memory store unavailable".to_string()));
        }
        self.data = data.clone();
        self.saves += 1;
        Ok(())
    }
}

/// Store backed by one RON file per user.
#[derive(Debug, Clone)]
pub struct RonFileStore {
    path: PathBuf,
}

impl RonFileStore {
    /// Store at an explicit file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `user` (or the guest) inside `dir`.
    #[must_use]
    pub fn for_user(dir: impl AsRef<Path>, user: Option<&str>) -> Self {
        let name = user.filter(|u| !u.is_empty()).unwrap_or(GUEST_SAVE_NAME);
        Self::new(dir.as_ref().join(format!("{name}.ron")))
    }

    /// File backing this store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for RonFileStore {
    fn load_save(&self) -> Result<SaveData> {
        if !self.path.exists() {
            return Ok(SaveData::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(ron::from_str(&contents)?)
    }

    fn save_game(&mut self, data: &SaveData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(data, ron::ser::PrettyConfig::default())?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// The logged-in user and their progress store.
///
/// Dropped at logout. Every store call goes through here so failures are
/// logged in one place.
#[derive(Debug)]
pub struct Session {
    user: Option<String>,
    store: Box<dyn ProgressStore>,
}

impl Session {
    /// Start a session for `user`, or a guest session with `None`.
    pub fn new(store: impl ProgressStore + 'static, user: Option<String>) -> Self {
        if let Some(user) = &user {
            tracing::info!(user, "Session started");
        }
        Self {
            user,
            store: Box::new(store),
        }
    }

    /// Guest session.
    pub fn guest(store: impl ProgressStore + 'static) -> Self {
        Self::new(store, None)
    }

    /// Logged-in user name.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Whether this is a guest session.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    /// Load saved progress, falling back to a fresh save on failure.
    #[must_use]
    pub fn load(&self) -> SaveData {
        match self.store.load_save() {
            Ok(data) => data,
            Err(error) => {
                tracing::warn!(%error, user = ?self.user, "Failed to load progress");
                SaveData::default()
            }
        }
    }

    /// Save progress. Returns whether the store accepted it.
    pub fn save(&mut self, data: &SaveData) -> bool {
        match self.store.save_game(data) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, user = ?self.user, "Failed to save progress");
                false
            }
        }
    }

    /// Save the progress of `player`.
    pub fn save_player(&mut self, player: &Player) -> bool {
        self.save(&SaveData::from_player(player))
    }
}
