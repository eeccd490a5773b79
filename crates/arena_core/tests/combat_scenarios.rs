//! End-to-end combat scenarios driven through `Simulation::tick`.

use arena_core::combat::CHAIN_RADIUS;
use arena_core::combatant::PlayerSlot;
use arena_core::config::GameMode;
use arena_core::difficulty::Difficulty;
use arena_core::events::{CombatEvent, DamageSource, MatchOutcome, Target, TickEvents};
use arena_core::grenade::GRENADE_FUSE;
use arena_core::input::{FrameInput, PlayerInput};
use arena_core::robot::{RobotKind, FREEZE_FRAMES, FREEZE_SLOW, KNIFE_DAMAGE};
use arena_core::simulation::Simulation;
use arena_core::weapon::WeaponKind;
use arena_test_utils::fixtures::{
    equip, fire_until, place_boss, place_robot, player_position, quiet_match, quiet_pair,
    WAIT_LIMIT,
};
use glam::Vec2;

fn fire_at(angle: f32) -> FrameInput {
    FrameInput::solo(PlayerInput::firing_at(angle))
}

/// Wait out the fire cooldown, pull the trigger once along `angle`, then
/// tick until `target` takes damage and return that tick's events.
fn shoot_until_hit(sim: &mut Simulation, angle: f32, target: Target) -> TickEvents {
    let aim = FrameInput::solo(PlayerInput {
        aim: Some(angle),
        ..PlayerInput::IDLE
    });
    for _ in 0..WAIT_LIMIT {
        if sim.players()[0].loadout.fire_cooldown() == 0 {
            break;
        }
        sim.tick(&aim);
    }

    let mut hit = None;
    fire_until(sim, fire_at(angle), |_, events| {
        if events.damage_to(target) > 0 {
            hit = Some(events.clone());
            true
        } else {
            false
        }
    })
    .expect("shot never landed");
    hit.expect("hit events recorded")
}

#[test]
fn test_rifle_two_shot_kill_on_easy() {
    let mut sim = quiet_match(Difficulty::Easy, 1);
    let robot = place_robot(&mut sim, RobotKind::Gun, Vec2::new(150.0, 0.0));

    let events = shoot_until_hit(&mut sim, 0.0, Target::Robot(robot));
    assert_eq!(events.damage_to(Target::Robot(robot)), 28);
    assert_eq!(sim.robots().get(robot).map(|r| r.body.health), Some(12));
    assert_eq!(sim.players()[0].loadout.current().ammo, 29);

    let before = sim.players()[0].clone();
    let events = shoot_until_hit(&mut sim, 0.0, Target::Robot(robot));
    assert_eq!(events.kill_count(), 1);
    assert!(events.combat.contains(&CombatEvent::Killed {
        target: Target::Robot(robot),
        credited: Some(PlayerSlot::One),
    }));
    let after = &sim.players()[0];
    assert_eq!(after.kills, before.kills + 1);
    assert_eq!(after.score, before.score + 100);
    assert_eq!(after.coins, before.coins + 1);
    assert!(sim.robots().get(robot).is_none());
}

#[test]
fn test_electric_chain_splashes_within_radius() {
    let mut sim = quiet_match(Difficulty::Easy, 2);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Electric);
    let primary = place_robot(&mut sim, RobotKind::Gun, Vec2::new(150.0, 0.0));
    let near = place_robot(&mut sim, RobotKind::Gun, Vec2::new(150.0, CHAIN_RADIUS - 40.0));
    let far = place_robot(&mut sim, RobotKind::Gun, Vec2::new(150.0, -(CHAIN_RADIUS + 40.0)));

    let events = shoot_until_hit(&mut sim, 0.0, Target::Robot(primary));
    assert_eq!(events.damage_to(Target::Robot(primary)), 30);
    assert_eq!(events.damage_to(Target::Robot(near)), 15);
    assert_eq!(events.damage_to(Target::Robot(far)), 0);
    assert!(events.combat.iter().any(|e| matches!(
        e,
        CombatEvent::Damage { target, source: DamageSource::Chain, .. } if *target == Target::Robot(near)
    )));
}

#[test]
fn test_freeze_round_slows_robot() {
    let mut sim = quiet_match(Difficulty::Easy, 3);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Freeze);
    let robot = place_robot(&mut sim, RobotKind::Gun, Vec2::new(150.0, 0.0));

    let events = shoot_until_hit(&mut sim, 0.0, Target::Robot(robot));
    assert!(events.combat.contains(&CombatEvent::Frozen {
        target: Target::Robot(robot)
    }));
    let frozen = sim.robots().get(robot).expect("robot survives a freeze round");
    // The robot system already ran once this tick.
    assert_eq!(frozen.frozen, FREEZE_FRAMES - 1);
    assert!((frozen.body.speed - frozen.base_speed * FREEZE_SLOW).abs() < 1e-5);

    for _ in 0..FREEZE_FRAMES {
        sim.tick(&FrameInput::default());
    }
    let thawed = sim.robots().get(robot).expect("robot still alive");
    assert_eq!(thawed.frozen, 0);
    assert_eq!(thawed.body.speed, thawed.base_speed);
}

#[test]
fn test_sniper_headshot_doubles_kill_score() {
    let mut sim = quiet_match(Difficulty::Easy, 4);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Sniper);
    // Muzzle at 28, rounds advance 35 per tick: the marker sits on a step.
    let reach = 28.0 + 35.0 * 4.0;
    let lateral = (reach * reach - 35.0_f32 * 35.0).sqrt();
    let robot = place_robot(&mut sim, RobotKind::Gun, Vec2::new(lateral, 0.0));
    let marker = player_position(&sim, PlayerSlot::One) + Vec2::new(lateral, -35.0);
    let angle = arena_core::math::angle_to(player_position(&sim, PlayerSlot::One), marker);

    let events = shoot_until_hit(&mut sim, angle, Target::Robot(robot));
    assert!(events.combat.iter().any(|e| matches!(
        e,
        CombatEvent::Damage { source: DamageSource::Headshot, amount: 150, .. }
    )));
    assert_eq!(events.kill_count(), 1);
    assert_eq!(sim.players()[0].score, 200);
}

#[test]
fn test_knife_swing_hits_cone_only() {
    let mut sim = quiet_match(Difficulty::Easy, 5);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Knife);
    let ahead = place_robot(&mut sim, RobotKind::Gun, Vec2::new(40.0, 0.0));
    let behind = place_robot(&mut sim, RobotKind::Gun, Vec2::new(-40.0, 0.0));

    let input = FrameInput::solo(PlayerInput {
        aim: Some(0.0),
        melee: true,
        ..PlayerInput::IDLE
    });
    let events = sim.tick(&input);
    assert_eq!(events.damage_to(Target::Robot(ahead)), 45);
    assert_eq!(events.damage_to(Target::Robot(behind)), 0);
    assert!(sim.robots().get(ahead).is_none());
}

#[test]
fn test_melee_input_ignored_with_gun_equipped() {
    let mut sim = quiet_match(Difficulty::Easy, 5);
    let robot = place_robot(&mut sim, RobotKind::Gun, Vec2::new(40.0, 0.0));
    let input = FrameInput::solo(PlayerInput {
        aim: Some(0.0),
        melee: true,
        ..PlayerInput::IDLE
    });
    let before = sim.players()[0].loadout.clone();
    let events = sim.tick(&input);

    // The robot may shoot back this tick; only the player's side matters.
    let after = &sim.players()[0].loadout;
    assert_eq!(after.current().ammo, before.current().ammo);
    assert!(after.fire_cooldown() <= before.fire_cooldown());
    assert_eq!(events.damage_to(Target::Robot(robot)), 0);
}

#[test]
fn test_sniper_round_ends_duel_in_one_hit() {
    let mut sim = quiet_pair(GameMode::Pvp, 8);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Sniper);
    let across = player_position(&sim, PlayerSlot::One) + Vec2::new(300.0, 0.0);
    sim.player_mut(PlayerSlot::Two)
        .expect("pvp has two players")
        .body
        .position = across;

    let events = shoot_until_hit(&mut sim, 0.0, Target::Player(PlayerSlot::Two));
    assert_eq!(events.damage_to(Target::Player(PlayerSlot::Two)), 180);
    assert_eq!(events.outcome, Some(MatchOutcome::PvpWinner(PlayerSlot::One)));
    assert!(sim.is_over());
}

#[test]
fn test_grenade_detonates_once_after_fuse() {
    let mut sim = quiet_pair(GameMode::Pvp, 6);
    equip(&mut sim, PlayerSlot::One, WeaponKind::Grenade);
    let landing = player_position(&sim, PlayerSlot::One) + Vec2::new(440.0, 0.0);
    sim.player_mut(PlayerSlot::Two)
        .expect("pvp has two players")
        .body
        .position = landing;

    let mut detonated_at = None;
    let mut blast = TickEvents::default();
    for tick in 1..=GRENADE_FUSE + 30 {
        let input = if tick == 1 { fire_at(0.0) } else { FrameInput::default() };
        let events = sim.tick(&input);
        if events.detonations > 0 {
            assert!(detonated_at.is_none(), "grenade detonated twice");
            detonated_at = Some(tick);
            blast = events;
        }
    }

    assert_eq!(detonated_at, Some(GRENADE_FUSE));
    let damage = blast.damage_to(Target::Player(PlayerSlot::Two));
    assert!((25..=50).contains(&damage), "player blast damage was {damage}");
    assert_eq!(blast.damage_to(Target::Player(PlayerSlot::One)), 0);
    assert!(sim.grenades().is_empty());
}

#[test]
fn test_knife_robot_stabs_adjacent_player() {
    let mut sim = quiet_match(Difficulty::Easy, 7);
    place_robot(&mut sim, RobotKind::Knife, Vec2::new(30.0, 0.0));
    let events = sim.tick(&FrameInput::default());
    assert_eq!(events.damage_to(Target::Player(PlayerSlot::One)), KNIFE_DAMAGE);
    assert!(events.combat.iter().any(|e| matches!(
        e,
        CombatEvent::Damage { source: DamageSource::Melee, .. }
    )));
}

#[test]
fn test_boss_contact_damage() {
    let mut sim = quiet_match(Difficulty::Impossible, 8);
    place_boss(&mut sim, Vec2::new(40.0, 0.0));
    let events = sim.tick(&FrameInput::default());
    assert_eq!(events.damage_to(Target::Player(PlayerSlot::One)), 20);
    assert!(events.combat.iter().any(|e| matches!(
        e,
        CombatEvent::Damage { source: DamageSource::Contact, .. }
    )));
    assert!(events.shots_fired >= 5, "boss opens with a spread");
}

#[test]
fn test_medkit_heals_and_requests_save() {
    let mut sim = quiet_match(Difficulty::Easy, 9);
    place_robot(&mut sim, RobotKind::Gun, Vec2::new(2000.0, 0.0));
    {
        let player = sim.player_mut(PlayerSlot::One).expect("primary player");
        player.medkits = 1;
        player.body.take_damage(60);
    }
    let events = sim.tick(&FrameInput::solo(PlayerInput {
        use_medkit: true,
        ..PlayerInput::IDLE
    }));
    let player = &sim.players()[0];
    assert_eq!(player.body.health, player.body.max_health);
    assert_eq!(player.medkits, 0);
    assert_eq!(sim.effects().heals.len(), 1);
    assert!(events.progress_changed);
}
