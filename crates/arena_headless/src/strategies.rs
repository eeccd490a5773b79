//! Pilots for locally controlled players in headless matches.
//!
//! Every pilot is a pure function of the simulation state and the tick, so a
//! headless match stays reproducible from its seed.

use arena_core::combatant::PlayerSlot;
use arena_core::events::ShopPrompt;
use arena_core::input::{FrameInput, PlayerInput};
use arena_core::math::angle_to;
use arena_core::player::{ControlSource, Player};
use arena_core::shop::ShopItem;
use arena_core::simulation::{MatchPhase, Simulation};
use arena_core::systems::{autopilot_input, AUTOPILOT_FIRE_RANGE, AUTOPILOT_FOLLOW_DISTANCE};
use arena_core::weapon::WeaponKind;
use serde::{Deserialize, Serialize};

/// How a local player is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// No input at all.
    Idle,
    /// Fixed strafe-and-sweep pattern, independent of the world.
    Scripted,
    /// Hunt the nearest robot or the boss; the second player stays close to
    /// the first.
    #[default]
    Autopilot,
    /// Hunt the opposing player. Only meaningful in PvP.
    Duelist,
}

impl Strategy {
    /// Every strategy, in declaration order.
    pub const ALL: [Strategy; 4] = [
        Strategy::Idle,
        Strategy::Scripted,
        Strategy::Autopilot,
        Strategy::Duelist,
    ];

    /// Parse a command-line name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "idle" => Some(Strategy::Idle),
            "scripted" => Some(Strategy::Scripted),
            "autopilot" | "auto" => Some(Strategy::Autopilot),
            "duelist" | "duel" => Some(Strategy::Duelist),
            _ => None,
        }
    }

    /// Lowercase identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Strategy::Idle => "idle",
            Strategy::Scripted => "scripted",
            Strategy::Autopilot => "autopilot",
            Strategy::Duelist => "duelist",
        }
    }

    /// Input for one player this tick.
    #[must_use]
    pub fn player_input(self, sim: &Simulation, me: &Player, tick: u64) -> PlayerInput {
        if !me.is_alive() {
            return PlayerInput::IDLE;
        }
        match self {
            Strategy::Idle => PlayerInput::IDLE,
            Strategy::Scripted => scripted(tick, me.slot),
            Strategy::Autopilot => {
                let lead = match me.slot {
                    PlayerSlot::One => None,
                    PlayerSlot::Two => sim.player(PlayerSlot::One),
                };
                autopilot_input(me, lead, sim.robots(), sim.boss())
            }
            Strategy::Duelist => duel(me, sim.player(me.slot.opponent())),
        }
    }

    /// Input for every player the headless runner drives.
    ///
    /// Players steered by the built-in partner AI or by the network are
    /// left idle. While the shop is open the frame only closes it.
    #[must_use]
    pub fn frame_input(self, sim: &Simulation, tick: u64) -> FrameInput {
        if sim.phase() == MatchPhase::Shop {
            return FrameInput {
                close_shop: true,
                ..FrameInput::default()
            };
        }
        let mut frame = FrameInput::default();
        for player in sim.players() {
            let driven = matches!(
                player.control,
                ControlSource::LocalPrimary | ControlSource::LocalSecondary
            );
            if driven {
                frame.players[player.slot.index()] = self.player_input(sim, player, tick);
            }
        }
        frame
    }

    /// What this pilot buys when the shop opens with `prompt`.
    #[must_use]
    pub const fn purchase_for(self, prompt: ShopPrompt) -> Option<ShopItem> {
        match self {
            Strategy::Idle | Strategy::Scripted | Strategy::Duelist => None,
            Strategy::Autopilot => Some(ShopItem::Weapon(match prompt {
                ShopPrompt::Shotgun => WeaponKind::Shotgun,
                ShopPrompt::Rpg => WeaponKind::Rpg,
            })),
        }
    }
}

/// Strafe in a square, sweep the aim and fire in bursts.
fn scripted(tick: u64, slot: PlayerSlot) -> PlayerInput {
    let phase = (tick + slot.index() as u64 * 120) % 240;
    PlayerInput {
        up: phase < 60,
        right: (60..120).contains(&phase),
        down: (120..180).contains(&phase),
        left: phase >= 180,
        aim: Some((tick % 628) as f32 / 100.0),
        fire: tick % 20 < 8,
        reload: tick % 300 == 299,
        switch_weapon: tick % 600 == 300,
        ..PlayerInput::IDLE
    }
}

/// Close to firing range of the opponent and shoot.
fn duel(me: &Player, opponent: Option<&Player>) -> PlayerInput {
    let Some(opponent) = opponent.filter(|p| p.is_alive()) else {
        return PlayerInput::IDLE;
    };
    let here = me.body.position;
    let there = opponent.body.position;
    let offset = there - here;
    let distance = offset.length();

    let mut input = PlayerInput {
        aim: Some(angle_to(here, there)),
        fire: distance <= AUTOPILOT_FIRE_RANGE,
        ..PlayerInput::IDLE
    };
    if distance > AUTOPILOT_FOLLOW_DISTANCE {
        input.left = offset.x < 0.0;
        input.right = offset.x > 0.0;
        input.up = offset.y < 0.0;
        input.down = offset.y > 0.0;
    }

    let weapon = me.loadout.current();
    if weapon.kind.is_melee() {
        input.switch_weapon = distance > AUTOPILOT_FOLLOW_DISTANCE;
        input.melee = !input.switch_weapon;
        input.fire = false;
    } else if weapon.ammo == 0 {
        if weapon.reloads > 0 && !weapon.kind.never_reloads() {
            input.reload = true;
        } else {
            input.switch_weapon = true;
        }
        input.fire = false;
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_core::config::{GameMode, MatchConfig};
    use arena_core::difficulty::Difficulty;

    #[test]
    fn test_parse_round_trips_names() {
        for strategy in Strategy::ALL {
            assert_eq!(Strategy::parse(strategy.name()), Some(strategy));
        }
        assert_eq!(Strategy::parse("turtle"), None);
    }

    #[test]
    fn test_idle_frame_is_default() {
        let sim = Simulation::new(MatchConfig::solo(Difficulty::Easy, 1));
        assert_eq!(Strategy::Idle.frame_input(&sim, 0), FrameInput::default());
    }

    #[test]
    fn test_ai_partner_left_to_the_simulation() {
        let config = MatchConfig {
            ai_teammate: true,
            ..MatchConfig::solo(Difficulty::Easy, 1).with_mode(GameMode::Coop)
        };
        let sim = Simulation::new(config);
        let frame = Strategy::Scripted.frame_input(&sim, 5);
        assert_ne!(frame.players[0], PlayerInput::IDLE);
        assert_eq!(frame.players[1], PlayerInput::IDLE);
    }

    #[test]
    fn test_duelist_aims_at_opponent() {
        let sim = Simulation::new(MatchConfig::solo(Difficulty::Easy, 1).with_mode(GameMode::Pvp));
        let frame = Strategy::Duelist.frame_input(&sim, 0);
        let one = frame.players[0];
        let two = frame.players[1];
        // Spawns face each other along the x axis, far out of range.
        assert_eq!(one.aim, Some(0.0));
        assert!(one.right && !one.fire);
        assert!(two.left);
    }

    #[test]
    fn test_shop_frame_closes_shop() {
        let mut sim = Simulation::new(MatchConfig::solo(Difficulty::Easy, 1));
        sim.open_shop();
        let frame = Strategy::Autopilot.frame_input(&sim, 0);
        assert!(frame.close_shop);
        assert_eq!(frame.players, [PlayerInput::IDLE; 2]);
    }

    #[test]
    fn test_only_autopilot_shops() {
        assert_eq!(
            Strategy::Autopilot.purchase_for(ShopPrompt::Rpg),
            Some(ShopItem::Weapon(WeaponKind::Rpg))
        );
        assert_eq!(Strategy::Duelist.purchase_for(ShopPrompt::Shotgun), None);
    }
}
