//! Match-level flow: waves, the shop, outcomes and persistence.

use arena_core::combatant::PlayerSlot;
use arena_core::config::{GameMode, MatchConfig};
use arena_core::difficulty::Difficulty;
use arena_core::driver::MatchSession;
use arena_core::events::{MatchOutcome, ShopPrompt, Target, TickEvents};
use arena_core::input::{FrameInput, PlayerInput};
use arena_core::robot::RobotKind;
use arena_core::session::{ProgressStore, RonFileStore, SaveData, Session};
use arena_core::shop::ShopItem;
use arena_core::simulation::{MatchPhase, Simulation};
use arena_core::wave::{WaveProgress, SETTLE_DELAY};
use arena_core::weapon::WeaponKind;
use arena_test_utils::fixtures::{
    place_robot, player_position, quiet_match, quiet_match_with, quiet_pair, WAIT_LIMIT,
};
use glam::Vec2;

fn idle() -> FrameInput {
    FrameInput::default()
}

/// Idle until the director reports anything other than waiting.
fn wait_for_wave(sim: &mut Simulation) -> (u32, TickEvents) {
    for tick in 1..=WAIT_LIMIT {
        let events = sim.tick(&idle());
        if events.wave.is_some() {
            return (tick, events);
        }
    }
    panic!("wave director never reported progress");
}

#[test]
fn test_impossible_runs_five_waves_then_victory() {
    let mut sim = quiet_match(Difficulty::Impossible, 10);
    assert_eq!(sim.director().current_wave(), 1);

    for wave in 2..=5 {
        let (ticks, events) = wait_for_wave(&mut sim);
        assert_eq!(ticks, SETTLE_DELAY + 1);
        assert_eq!(
            events.wave,
            Some(WaveProgress::Advanced {
                wave,
                boss: wave == 5
            })
        );
        assert!(sim.director().robot_count() > 0);
        assert_eq!(sim.boss().is_some(), wave == 5);
        sim.director_mut().clear();
    }

    let events = sim.tick(&idle());
    assert_eq!(events.wave, Some(WaveProgress::Cleared));
    assert_eq!(events.outcome, Some(MatchOutcome::Victory));
    assert!(events.progress_changed);
    assert!(sim.is_over());

    // Nothing moves once the match is over.
    let hash = sim.state_hash();
    sim.tick(&idle());
    assert_eq!(sim.state_hash(), hash);
}

#[test]
fn test_non_wave_match_wins_on_empty_field() {
    let mut sim = quiet_match(Difficulty::Hard, 11);
    let events = sim.tick(&idle());
    assert_eq!(events.wave, Some(WaveProgress::Cleared));
    assert_eq!(sim.outcome(), Some(MatchOutcome::Victory));
}

#[test]
fn test_shop_prompts_fire_once_and_pause_the_world() {
    let mut sim = quiet_match(Difficulty::Easy, 12);
    let robot = place_robot(&mut sim, RobotKind::Gun, Vec2::new(2000.0, 0.0));
    sim.player_mut(PlayerSlot::One).expect("primary player").coins = 10;

    let events = sim.tick(&idle());
    assert_eq!(events.shop_prompt, Some(ShopPrompt::Shotgun));
    assert_eq!(sim.phase(), MatchPhase::Shop);

    let parked = sim.robots().get(robot).map(|r| r.body.position);
    let tick = sim.current_tick();
    sim.tick(&idle());
    assert_eq!(sim.current_tick(), tick + 1);
    assert_eq!(sim.robots().get(robot).map(|r| r.body.position), parked);

    sim.close_shop();
    let events = sim.tick(&idle());
    assert_eq!(events.shop_prompt, None, "each threshold prompts once");

    assert!(sim.buy(PlayerSlot::One, ShopItem::Weapon(WeaponKind::Shotgun)));
    let player = sim.player_mut(PlayerSlot::One).expect("primary player");
    assert_eq!(player.coins, 0);
    assert!(player.loadout.has(WeaponKind::Shotgun));
    player.coins = 50;

    let events = sim.tick(&idle());
    assert_eq!(events.shop_prompt, Some(ShopPrompt::Rpg));
    assert_eq!(sim.phase(), MatchPhase::Shop);

    let events = sim.tick(&FrameInput {
        close_shop: true,
        ..idle()
    });
    assert_eq!(events, TickEvents::default());
    assert_eq!(sim.phase(), MatchPhase::Playing);
}

#[test]
fn test_purchase_rules() {
    let mut sim = quiet_match(Difficulty::Easy, 13);
    place_robot(&mut sim, RobotKind::Gun, Vec2::new(2000.0, 0.0));
    assert!(!sim.buy(PlayerSlot::One, ShopItem::Weapon(WeaponKind::Sniper)));

    sim.player_mut(PlayerSlot::One).expect("primary player").coins = 500;
    assert!(sim.buy(PlayerSlot::One, ShopItem::Weapon(WeaponKind::Sniper)));
    assert!(!sim.buy(PlayerSlot::One, ShopItem::Weapon(WeaponKind::Sniper)));
    assert!(!sim.buy(PlayerSlot::One, ShopItem::Weapon(WeaponKind::Rifle)));
    assert!(sim.buy(PlayerSlot::One, ShopItem::MedkitBundle));

    let player = &sim.players()[0];
    assert_eq!(player.coins, 500 - 150 - 90);
    assert_eq!(player.medkits, 3);
}

#[test]
fn test_coop_defeat_needs_both_players_down() {
    let mut sim = quiet_pair(GameMode::Coop, 14);
    place_robot(&mut sim, RobotKind::Gun, Vec2::new(2000.0, 0.0));

    sim.player_mut(PlayerSlot::One)
        .expect("coop primary")
        .body
        .take_damage(1_000);
    let events = sim.tick(&idle());
    assert_eq!(events.outcome, None);
    assert!(!sim.is_over());

    sim.player_mut(PlayerSlot::Two)
        .expect("coop partner")
        .body
        .take_damage(1_000);
    let events = sim.tick(&idle());
    assert_eq!(events.outcome, Some(MatchOutcome::Defeat));
}

#[test]
fn test_pvp_duel_ends_with_a_winner() {
    let mut sim = quiet_pair(GameMode::Pvp, 15);
    let duel_spot = player_position(&sim, PlayerSlot::One) + Vec2::new(150.0, 0.0);
    sim.player_mut(PlayerSlot::Two)
        .expect("pvp opponent")
        .body
        .position = duel_spot;

    let fire = FrameInput::solo(PlayerInput::firing_at(0.0));
    let mut outcome = None;
    let mut damage = 0;
    for _ in 0..WAIT_LIMIT {
        let events = sim.tick(&fire);
        damage += events.damage_to(Target::Player(PlayerSlot::Two));
        if events.outcome.is_some() {
            outcome = events.outcome;
            break;
        }
    }

    assert_eq!(outcome, Some(MatchOutcome::PvpWinner(PlayerSlot::One)));
    assert!(damage >= 100);
    assert_eq!(sim.players()[0].kills, 1);
    assert_eq!(sim.players()[0].coins, 0, "pvp earns no coins");
}

#[test]
fn test_ai_teammate_engages_nearby_robot() {
    let config = MatchConfig {
        ai_teammate: true,
        ..MatchConfig::solo(Difficulty::Easy, 16).with_mode(GameMode::Coop)
    };
    let mut sim = quiet_match_with(config);
    let offset = player_position(&sim, PlayerSlot::Two) - player_position(&sim, PlayerSlot::One)
        + Vec2::new(200.0, 0.0);
    let target = place_robot(&mut sim, RobotKind::Gun, offset);

    let mut hit = false;
    for _ in 0..120 {
        let events = sim.tick(&idle());
        if events.damage_to(Target::Robot(target)) > 0 {
            hit = true;
            break;
        }
    }
    assert!(hit, "autopilot partner never hit the robot");
}

#[test]
fn test_match_session_persists_to_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = RonFileStore::for_user(dir.path(), Some("ada"));
    let path = store.path().to_path_buf();

    let mut game = MatchSession::new(
        MatchConfig::solo(Difficulty::Easy, 17),
        Some(Session::new(store, Some("ada".to_string()))),
    );
    game.simulation_mut().director_mut().clear();
    game.simulation_mut()
        .player_mut(PlayerSlot::One)
        .expect("primary player")
        .coins = 200;
    assert!(game.buy(ShopItem::Weapon(WeaponKind::Freeze)));
    assert!(path.exists());

    // The empty field wins the match, which saves again.
    let events = game.step(&idle());
    assert_eq!(events.outcome, Some(MatchOutcome::Victory));
    assert_eq!(game.save_count(), 2);

    let reloaded = RonFileStore::new(&path);
    let save = reloaded.load_save().expect("save readable");
    assert_eq!(
        save,
        SaveData {
            coins: 90,
            unlocked: vec![WeaponKind::Freeze],
            medkits: 0,
        }
    );

    let next = MatchSession::new(
        MatchConfig::solo(Difficulty::Easy, 18),
        Some(Session::new(reloaded, Some("ada".to_string()))),
    );
    let player = &next.simulation().players()[0];
    assert_eq!(player.coins, 90);
    assert!(player.loadout.has(WeaponKind::Freeze));
}
