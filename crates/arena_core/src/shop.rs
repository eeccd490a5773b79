//! Coin shop.
//!
//! Weapons are bought once at their catalog price. Medkits come in a bundle
//! that is only sold when the player has none left. The shop also decides
//! when to open itself on reaching a coin threshold.

use serde::{Deserialize, Serialize};

use crate::events::ShopPrompt;
use crate::player::Player;
use crate::weapon::WeaponKind;

/// Coins for a medkit bundle.
pub const MEDKIT_BUNDLE_PRICE: u32 = 90;

/// Charges in a medkit bundle.
pub const MEDKIT_BUNDLE_SIZE: u32 = 3;

/// Balance that first opens the shop, while the shotgun is missing.
pub const SHOTGUN_PROMPT_COINS: u32 = 10;

/// Balance that opens the shop again, once the shotgun is owned but not the RPG.
pub const RPG_PROMPT_COINS: u32 = 50;

/// Something for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShopItem {
    /// Permanent weapon unlock.
    Weapon(WeaponKind),
    /// [`MEDKIT_BUNDLE_SIZE`] medkit charges.
    MedkitBundle,
}

impl ShopItem {
    /// Price in coins; `None` for weapons that are never sold.
    #[must_use]
    pub fn price(self) -> Option<u32> {
        match self {
            ShopItem::Weapon(kind) => kind.stats().price,
            ShopItem::MedkitBundle => Some(MEDKIT_BUNDLE_PRICE),
        }
    }

    /// Everything the shop lists, weapons in catalog order then medkits.
    pub fn catalog() -> impl Iterator<Item = ShopItem> {
        WeaponKind::purchasable()
            .map(ShopItem::Weapon)
            .chain(std::iter::once(ShopItem::MedkitBundle))
    }
}

/// Whether `player` may buy `item` right now.
#[must_use]
pub fn can_buy(player: &Player, item: ShopItem) -> bool {
    if !player.earns_coins() {
        return false;
    }
    let Some(price) = item.price() else {
        return false;
    };
    let available = match item {
        ShopItem::Weapon(kind) => !player.unlocks.contains(kind) && !player.loadout.has(kind),
        ShopItem::MedkitBundle => player.medkits == 0,
    };
    available && player.coins >= price
}

/// Buy `item`. Returns whether the purchase went through.
pub fn buy(player: &mut Player, item: ShopItem) -> bool {
    if !can_buy(player, item) {
        return false;
    }
    let Some(price) = item.price() else {
        return false;
    };
    player.coins -= price;
    match item {
        ShopItem::Weapon(kind) => {
            player.unlock(kind);
        }
        ShopItem::MedkitBundle => player.medkits += MEDKIT_BUNDLE_SIZE,
    }
    tracing::debug!(?item, price, coins = player.coins, "Purchase");
    true
}

/// Tracks which automatic shop prompts have already fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShopPrompts {
    shotgun: bool,
    rpg: bool,
}

impl ShopPrompts {
    /// Check the player's balance against the thresholds.
    ///
    /// Each threshold prompts at most once per match.
    pub fn check(&mut self, player: &Player) -> Option<ShopPrompt> {
        let has_shotgun = player.loadout.has(WeaponKind::Shotgun);
        let has_rpg = player.loadout.has(WeaponKind::Rpg);
        if !self.shotgun && !has_shotgun && player.coins >= SHOTGUN_PROMPT_COINS {
            self.shotgun = true;
            return Some(ShopPrompt::Shotgun);
        }
        if !self.rpg && has_shotgun && !has_rpg && player.coins >= RPG_PROMPT_COINS {
            self.rpg = true;
            return Some(ShopPrompt::Rpg);
        }
        None
    }

    /// Whether the given prompt has fired.
    #[must_use]
    pub const fn fired(&self, prompt: ShopPrompt) -> bool {
        match prompt {
            ShopPrompt::Shotgun => self.shotgun,
            ShopPrompt::Rpg => self.rpg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::PlayerSlot;
    use crate::player::{ControlSource, LoadoutPolicy};
    use glam::Vec2;

    fn rich(coins: u32) -> Player {
        let mut p = Player::new(
            PlayerSlot::One,
            Vec2::ZERO,
            100,
            ControlSource::LocalPrimary,
            LoadoutPolicy::Full,
        );
        p.coins = coins;
        p
    }

    #[test]
    fn test_buy_weapon_once() {
        let mut p = rich(25);
        assert!(buy(&mut p, ShopItem::Weapon(WeaponKind::Shotgun)));
        assert_eq!(p.coins, 15);
        assert!(p.loadout.has(WeaponKind::Shotgun));
        assert!(!buy(&mut p, ShopItem::Weapon(WeaponKind::Shotgun)));
        assert!(!buy(&mut p, ShopItem::Weapon(WeaponKind::Rifle)), "baseline is not sold");
    }

    #[test]
    fn test_insufficient_coins() {
        let mut p = rich(49);
        assert!(!buy(&mut p, ShopItem::Weapon(WeaponKind::Rpg)));
        assert_eq!(p.coins, 49);
    }

    #[test]
    fn test_medkit_bundle_only_when_empty() {
        let mut p = rich(200);
        assert!(buy(&mut p, ShopItem::MedkitBundle));
        assert_eq!(p.medkits, 3);
        assert_eq!(p.coins, 110);
        assert!(!buy(&mut p, ShopItem::MedkitBundle));
    }

    #[test]
    fn test_prompts_fire_once_per_threshold() {
        let mut prompts = ShopPrompts::default();
        let mut p = rich(9);
        assert_eq!(prompts.check(&p), None);
        p.coins = 10;
        assert_eq!(prompts.check(&p), Some(ShopPrompt::Shotgun));
        assert_eq!(prompts.check(&p), None);

        p.unlock(WeaponKind::Shotgun);
        p.coins = 50;
        assert_eq!(prompts.check(&p), Some(ShopPrompt::Rpg));
        p.coins = 80;
        assert_eq!(prompts.check(&p), None);
        assert!(prompts.fired(ShopPrompt::Rpg));
    }
}
