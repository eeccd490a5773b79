//! Replay system for recording and playing back matches.
//!
//! A replay stores the serialized starting state and every non-idle action
//! taken during the match. Because the simulation is deterministic, feeding
//! the same actions back reproduces the match exactly, which
//! [`ReplayPlayer::verify`] checks against the recorded final hash.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::combatant::PlayerSlot;
use crate::error::{ArenaError, Result};
use crate::input::FrameInput;
use crate::shop::ShopItem;
use crate::simulation::Simulation;

/// Bumped whenever the encoded layout changes.
pub const REPLAY_VERSION: u32 = 1;

/// Something a player did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReplayAction {
    /// Frame input. Frames without a recorded input replay as idle.
    Input(FrameInput),
    /// Shop purchase, applied before that tick's input.
    Buy {
        /// Buyer.
        slot: PlayerSlot,
        /// What was bought.
        item: ShopItem,
    },
}

/// A single action record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayCommand {
    /// Tick the action applies to.
    pub tick: u64,
    /// The action.
    pub action: ReplayAction,
}

/// A recorded match: starting state plus every action that mattered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Encoding version, checked on load.
    pub version: u32,
    /// Name of the scenario that was played.
    pub scenario_id: String,
    /// Seed the match was created with.
    pub seed: u64,
    /// Tick of the initial state.
    pub start_tick: u64,
    /// Bincode-encoded simulation at `start_tick`.
    pub initial_state: Vec<u8>,
    /// Actions in tick order.
    pub commands: Vec<ReplayCommand>,
    /// Tick count when recording stopped.
    pub final_tick: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay from a simulation's current state.
    ///
    /// # Errors
    /// Returns an error if the state cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, initial_state: &Simulation) -> Result<Self> {
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            seed: initial_state.config().seed,
            start_tick: initial_state.current_tick(),
            initial_state: initial_state.serialize()?,
            commands: Vec::new(),
            final_tick: initial_state.current_tick(),
            final_hash: initial_state.state_hash(),
        })
    }

    /// Record the input for `tick`. Idle frames are not stored.
    pub fn record_input(&mut self, tick: u64, input: FrameInput) {
        if input == FrameInput::default() {
            return;
        }
        self.commands.push(ReplayCommand {
            tick,
            action: ReplayAction::Input(input),
        });
    }

    /// Record a purchase made before `tick` ran.
    pub fn record_purchase(&mut self, tick: u64, slot: PlayerSlot, item: ShopItem) {
        self.commands.push(ReplayCommand {
            tick,
            action: ReplayAction::Buy { slot, item },
        });
    }

    /// Finalize the replay with end-of-match state.
    pub fn finalize(&mut self, simulation: &Simulation) {
        self.final_tick = simulation.current_tick();
        self.final_hash = simulation.state_hash();
    }

    /// Write the replay as bincode.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Read a replay written by [`Replay::save`].
    ///
    /// # Errors
    /// Returns an error if reading or decoding fails or the version differs.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let replay: Self = bincode::deserialize(&bytes)?;

        if replay.version != REPLAY_VERSION {
            return Err(ArenaError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }

    /// Restore the starting simulation.
    ///
    /// # Errors
    /// Returns an error if state deserialization fails.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Commands recorded for a tick.
    #[must_use]
    pub fn commands_at_tick(&self, tick: u64) -> Vec<&ReplayCommand> {
        self.commands.iter().filter(|cmd| cmd.tick == tick).collect()
    }

    /// Ticks covered by the replay.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick.saturating_sub(self.start_tick)
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}

/// Steps a [`Replay`] forward, or back by re-simulating from the start.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    simulation: Simulation,
    command_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at the start of the replay.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let simulation = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            simulation,
            command_index: 0,
        })
    }

    /// Advance by one tick. Returns true while ticks remain.
    pub fn advance(&mut self) -> bool {
        let tick = self.simulation.current_tick();
        if tick >= self.replay.final_tick {
            return false;
        }

        let mut input = FrameInput::default();
        while let Some(cmd) = self.replay.commands.get(self.command_index) {
            if cmd.tick > tick {
                break;
            }
            if cmd.tick == tick {
                match cmd.action {
                    ReplayAction::Input(frame) => input = frame,
                    ReplayAction::Buy { slot, item } => {
                        self.simulation.buy(slot, item);
                    }
                }
            }
            self.command_index += 1;
        }

        self.simulation.tick(&input);
        self.simulation.current_tick() < self.replay.final_tick
    }

    /// Rewind and play up to `target_tick`.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        self.simulation = self.replay.restore_initial_state()?;
        self.command_index = 0;
        while self.simulation.current_tick() < target_tick && self.advance() {}
        Ok(())
    }

    /// Current tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.simulation.current_tick()
    }

    /// Re-simulated world.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Source recording.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether playback reached the recorded end.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.simulation.current_tick() >= self.replay.final_tick
    }

    /// Play the whole replay and compare the final hash.
    ///
    /// # Errors
    /// Returns [`ArenaError::DesyncDetected`] when the hashes differ, or a
    /// restore error.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.final_tick)?;
        let actual = self.simulation.state_hash();
        if actual != self.replay.final_hash {
            tracing::warn!(
                tick = self.current_tick(),
                expected = self.replay.final_hash,
                actual,
                "Replay desync"
            );
            return Err(ArenaError::DesyncDetected {
                tick: self.current_tick(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::difficulty::Difficulty;
    use crate::input::PlayerInput;

    fn recorded(ticks: u64) -> Replay {
        let mut sim = Simulation::new(MatchConfig::solo(Difficulty::Medium, 77));
        let mut replay = Replay::new("unit", &sim).unwrap();
        for tick in 0..ticks {
            let input = if tick % 3 == 0 {
                FrameInput::solo(PlayerInput {
                    up: true,
                    ..PlayerInput::firing_at(tick as f32 * 0.1)
                })
            } else {
                FrameInput::default()
            };
            replay.record_input(sim.current_tick(), input);
            sim.tick(&input);
        }
        replay.finalize(&sim);
        replay
    }

    #[test]
    fn test_idle_frames_are_not_stored() {
        let replay = recorded(30);
        assert_eq!(replay.command_count(), 10);
        assert_eq!(replay.commands_at_tick(3).len(), 1);
        assert!(replay.commands_at_tick(4).is_empty());
        assert_eq!(replay.duration(), 30);
        assert_eq!(replay.seed, 77);
    }

    #[test]
    fn test_replay_verifies() {
        let mut player = ReplayPlayer::new(recorded(120)).unwrap();
        player.verify().unwrap();
        assert!(player.is_finished());
    }

    #[test]
    fn test_tampered_hash_is_a_desync() {
        let mut replay = recorded(60);
        replay.final_hash ^= 1;
        let mut player = ReplayPlayer::new(replay).unwrap();
        let err = player.verify().unwrap_err();
        assert!(matches!(err, ArenaError::DesyncDetected { tick: 60, .. }));
    }

    #[test]
    fn test_seek_matches_straight_playback() {
        let replay = recorded(90);
        let mut a = ReplayPlayer::new(replay.clone()).unwrap();
        for _ in 0..45 {
            a.advance();
        }
        let mut b = ReplayPlayer::new(replay).unwrap();
        b.seek(80).unwrap();
        b.seek(45).unwrap();
        assert_eq!(a.simulation().state_hash(), b.simulation().state_hash());
    }

    #[test]
    fn test_save_load_and_version_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.replay");
        let replay = recorded(20);
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();
        assert_eq!(loaded.final_hash, replay.final_hash);
        assert_eq!(loaded.command_count(), replay.command_count());

        let mut old = replay;
        old.version = 0;
        old.save(&path).unwrap();
        assert!(matches!(
            Replay::load(&path),
            Err(ArenaError::ReplayVersion { expected: 1, found: 0 })
        ));
    }
}
