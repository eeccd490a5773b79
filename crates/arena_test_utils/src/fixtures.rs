//! Test fixtures and helpers.
//!
//! Pre-built matches and entity placements for consistent testing.

use arena_core::arena::Handle;
use arena_core::boss::Boss;
use arena_core::combatant::PlayerSlot;
use arena_core::config::{GameMode, MatchConfig};
use arena_core::difficulty::Difficulty;
use arena_core::input::{FrameInput, PlayerInput};
use arena_core::math::MapBounds;
use arena_core::robot::{Robot, RobotKind};
use arena_core::simulation::Simulation;
use arena_core::weapon::WeaponKind;
use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// Upper bound on ticks a helper waits for something to happen.
pub const WAIT_LIMIT: u32 = 600;

/// A solo match on an open map with every enemy removed.
///
/// Non-wave difficulties end in victory on the first tick with an empty
/// field, so place an enemy before ticking.
#[must_use]
pub fn quiet_match(difficulty: Difficulty, seed: u64) -> Simulation {
    quiet_match_with(MatchConfig::solo(difficulty, seed))
}

/// [`quiet_match`] for an arbitrary config.
#[must_use]
pub fn quiet_match_with(config: MatchConfig) -> Simulation {
    let mut sim = Simulation::new(config);
    sim.director_mut().clear();
    sim
}

/// A two-player match of `mode` with every enemy removed.
#[must_use]
pub fn quiet_pair(mode: GameMode, seed: u64) -> Simulation {
    quiet_match_with(MatchConfig::solo(Difficulty::Easy, seed).with_mode(mode))
}

/// Build a robot with the stats of `difficulty`.
#[must_use]
pub fn robot(kind: RobotKind, position: Vec2, difficulty: Difficulty) -> Robot {
    let mut rng = Pcg32::seed_from_u64(0);
    Robot::new(
        kind,
        position,
        &difficulty.settings(),
        MapBounds::default(),
        &mut rng,
    )
}

/// Position of the player in `slot`.
///
/// # Panics
///
/// Panics if the slot is empty.
#[must_use]
pub fn player_position(sim: &Simulation, slot: PlayerSlot) -> Vec2 {
    sim.player(slot).expect("player slot is empty").body.position
}

/// Place a robot `offset` away from the primary player.
pub fn place_robot(sim: &mut Simulation, kind: RobotKind, offset: Vec2) -> Handle {
    let at = player_position(sim, PlayerSlot::One) + offset;
    let difficulty = sim.config().difficulty;
    sim.spawn_robot(robot(kind, at, difficulty))
}

/// Place the boss `offset` away from the primary player.
pub fn place_boss(sim: &mut Simulation, offset: Vec2) {
    let at = player_position(sim, PlayerSlot::One) + offset;
    sim.director_mut().set_boss(Some(Boss::new(at)));
}

/// Give the primary player `kind` and equip it.
///
/// # Panics
///
/// Panics if the primary player is missing.
pub fn equip(sim: &mut Simulation, slot: PlayerSlot, kind: WeaponKind) {
    let player = sim.player_mut(slot).expect("player slot is empty");
    player.unlock(kind);
    let index = player
        .loadout
        .weapons()
        .iter()
        .position(|w| w.kind == kind)
        .expect("weapon was just added");
    player.loadout.select(index);
    // Skip the switch delay so the first trigger pull fires.
    while player.loadout.fire_cooldown() > 0 {
        player.loadout.tick();
    }
}

/// Tick with `first` input, then idle until `done` returns true.
///
/// Returns the number of ticks run, or `None` if [`WAIT_LIMIT`] was hit.
pub fn fire_until<F>(sim: &mut Simulation, first: FrameInput, mut done: F) -> Option<u32>
where
    F: FnMut(&Simulation, &arena_core::events::TickEvents) -> bool,
{
    let mut input = first;
    for tick in 1..=WAIT_LIMIT {
        let events = sim.tick(&input);
        if done(sim, &events) {
            return Some(tick);
        }
        input = FrameInput::default();
    }
    None
}

/// Deterministic input for `tick`: strafe, sweep the aim and fire in bursts.
#[must_use]
pub fn scripted_input(tick: u64) -> FrameInput {
    let phase = tick % 240;
    let player = PlayerInput {
        up: phase < 60,
        right: (60..120).contains(&phase),
        down: (120..180).contains(&phase),
        left: phase >= 180,
        aim: Some((tick % 628) as f32 / 100.0),
        fire: tick % 20 < 8,
        reload: tick % 300 == 299,
        switch_weapon: tick % 500 == 250,
        ..PlayerInput::IDLE
    };
    FrameInput::pair(player, PlayerInput { fire: tick % 30 == 0, ..player })
}
