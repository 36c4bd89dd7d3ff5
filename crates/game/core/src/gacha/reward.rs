//! Deciding what a user receives on top of the drawn item.

use crate::gacha::{ObjectKind, Rarity, RewardItem};

/// Side rewards of a draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claim {
    /// The user already held the item's unlock marker.
    pub duplicate: bool,
    /// One token of this rarity is granted.
    pub token: Option<Rarity>,
    /// The item's unlock marker should be granted now.
    pub unlock: Option<String>,
}

impl Claim {
    /// Evaluate the side rewards for `item`.
    ///
    /// `already_unlocked` is whether the user holds the unlock marker;
    /// `copies` is the collection count after the draw.
    ///
    /// # Rules
    ///
    /// ```text
    /// duplicate = item has a marker and the user holds it
    /// token     = give_tokens and (duplicate or kind == person)
    /// unlock    = no token, has a marker, not held, and the collectable
    ///             threshold (if any) is reached
    /// ```
    pub fn evaluate(item: &RewardItem, already_unlocked: bool, copies: u32) -> Self {
        let duplicate = item.unlock_marker.is_some() && already_unlocked;

        if item.give_tokens && (duplicate || item.kind == ObjectKind::Person) {
            return Self {
                duplicate,
                token: Some(item.rarity),
                unlock: None,
            };
        }

        let threshold_met = !item.is_collectable() || copies >= item.collectable_threshold;
        let unlock = item
            .unlock_marker
            .as_ref()
            .filter(|_| !already_unlocked && threshold_met)
            .cloned();

        Self {
            duplicate,
            token: None,
            unlock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character_with_marker() -> RewardItem {
        let mut item = RewardItem::new("Aria", 1, Rarity::SSR);
        item.unlock_marker = Some("role-aria".to_string());
        item
    }

    #[test]
    fn first_copy_unlocks_marker() {
        let claim = Claim::evaluate(&character_with_marker(), false, 0);
        assert!(!claim.duplicate);
        assert_eq!(claim.token, None);
        assert_eq!(claim.unlock.as_deref(), Some("role-aria"));
    }

    #[test]
    fn duplicate_grants_token() {
        let claim = Claim::evaluate(&character_with_marker(), true, 0);
        assert!(claim.duplicate);
        assert_eq!(claim.token, Some(Rarity::SSR));
        assert_eq!(claim.unlock, None);
    }

    #[test]
    fn duplicate_without_tokens_grants_nothing() {
        let mut item = character_with_marker();
        item.give_tokens = false;
        let claim = Claim::evaluate(&item, true, 0);
        assert!(claim.duplicate);
        assert_eq!(claim, Claim { duplicate: true, token: None, unlock: None });
    }

    #[test]
    fn person_always_grants_token() {
        let item = RewardItem::new("Merchant", 1, Rarity::UR).kind(ObjectKind::Person);
        let claim = Claim::evaluate(&item, false, 1);
        assert_eq!(claim.token, Some(Rarity::UR));
    }

    #[test]
    fn collectable_waits_for_threshold() {
        let mut item = RewardItem::new("Shard", 1, Rarity::R).kind(ObjectKind::Object);
        item.unlock_marker = Some("role-shard".to_string());
        item.collectable_threshold = 3;

        assert_eq!(Claim::evaluate(&item, false, 2).unlock, None);
        assert_eq!(
            Claim::evaluate(&item, false, 3).unlock.as_deref(),
            Some("role-shard")
        );
    }
}
