//! Per-frame player intent.
//!
//! Hosts translate keyboards, gamepads or touch sticks into these shapes
//! once per frame. The simulation never sees raw devices.

use serde::{Deserialize, Serialize};

use crate::combatant::PlayerSlot;
use crate::math::DIAGONAL_FACTOR;
use glam::Vec2;

/// Intent for one player for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Move up (negative y).
    pub up: bool,
    /// Move down.
    pub down: bool,
    /// Move left.
    pub left: bool,
    /// Move right.
    pub right: bool,
    /// Aim angle in radians; `None` keeps the current facing or auto-aims.
    pub aim: Option<f32>,
    /// Fire the equipped weapon.
    pub fire: bool,
    /// Start a reload.
    pub reload: bool,
    /// Cycle to the next weapon.
    pub switch_weapon: bool,
    /// Knife attack regardless of the equipped weapon.
    pub melee: bool,
    /// Consume a medkit.
    pub use_medkit: bool,
}

impl PlayerInput {
    /// No movement and no actions.
    pub const IDLE: Self = Self {
        up: false,
        down: false,
        left: false,
        right: false,
        aim: None,
        fire: false,
        reload: false,
        switch_weapon: false,
        melee: false,
        use_medkit: false,
    };

    /// Aim at `angle` and hold the trigger.
    #[must_use]
    pub const fn firing_at(angle: f32) -> Self {
        Self {
            aim: Some(angle),
            fire: true,
            ..Self::IDLE
        }
    }

    /// Movement vector before speed, with diagonals scaled down.
    #[must_use]
    pub fn movement(&self) -> Vec2 {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up {
            dy -= 1.0;
        }
        if self.down {
            dy += 1.0;
        }
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        let mut v = Vec2::new(dx, dy);
        if dx != 0.0 && dy != 0.0 {
            v *= DIAGONAL_FACTOR;
        }
        v
    }
}

/// Intent for every local player for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Per-slot input.
    pub players: [PlayerInput; 2],
    /// Close the shop and resume play.
    pub close_shop: bool,
}

impl FrameInput {
    /// Input for the primary player only.
    #[must_use]
    pub const fn solo(input: PlayerInput) -> Self {
        Self {
            players: [input, PlayerInput::IDLE],
            close_shop: false,
        }
    }

    /// Input for both slots.
    #[must_use]
    pub const fn pair(one: PlayerInput, two: PlayerInput) -> Self {
        Self {
            players: [one, two],
            close_shop: false,
        }
    }

    /// Input for one slot.
    #[must_use]
    pub const fn get(&self, slot: PlayerSlot) -> &PlayerInput {
        &self.players[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_movement_is_scaled() {
        let input = PlayerInput {
            up: true,
            right: true,
            ..PlayerInput::IDLE
        };
        let v = input.movement();
        assert!((v.x - 0.707).abs() < 1e-6);
        assert!((v.y + 0.707).abs() < 1e-6);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let input = PlayerInput {
            left: true,
            right: true,
            ..PlayerInput::IDLE
        };
        assert_eq!(input.movement(), Vec2::ZERO);
    }
}
