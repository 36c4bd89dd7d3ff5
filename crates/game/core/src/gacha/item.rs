//! Reward items and their classification.

use crate::combat::CombatProfile;
use crate::random::RandomSource;
use crate::validation::{self, ValidationError};

/// Flavor lines a collectable item can carry.
pub const COLLECTABLE_REPLY_SLOTS: usize = 3;

/// Item rarity, declared in ascending severity so `Ord` follows
/// `R < UR < SR < SSR`.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rarity {
    R,
    UR,
    SR,
    SSR,
}

impl Rarity {
    /// Highest rarity first, as shown on the banner.
    pub const DISPLAY_ORDER: [Rarity; 4] = [Rarity::SSR, Rarity::SR, Rarity::UR, Rarity::R];

    /// Only SSR resets pity.
    pub const fn is_rare(self) -> bool {
        matches!(self, Rarity::SSR)
    }

    /// Position on the banner (0 = shown first).
    pub const fn display_rank(self) -> u8 {
        match self {
            Rarity::SSR => 0,
            Rarity::SR => 1,
            Rarity::UR => 2,
            Rarity::R => 3,
        }
    }

    /// Name of the token granted for a duplicate of this rarity.
    pub fn token_name(self) -> String {
        format!("Token {self}")
    }
}

/// What an item is, which decides where it can be used.
///
/// Accepts the localized aliases the bot historically stored
/// (`personaje`, `persona`, `objeto`).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ObjectKind {
    /// Usable in combat and as a favorite.
    #[default]
    #[strum(to_string = "character", serialize = "personaje")]
    #[cfg_attr(feature = "serde", serde(alias = "personaje"))]
    Character,
    /// Sellable inventory item that always grants tokens when enabled.
    #[strum(to_string = "person", serialize = "persona")]
    #[cfg_attr(feature = "serde", serde(alias = "persona"))]
    Person,
    /// Sellable inventory item.
    #[strum(to_string = "object", serialize = "objeto")]
    #[cfg_attr(feature = "serde", serde(alias = "objeto"))]
    Object,
}

impl ObjectKind {
    /// Person and object items are counted in the inventory and can be sold.
    pub const fn is_inventory(self) -> bool {
        matches!(self, ObjectKind::Person | ObjectKind::Object)
    }
}

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

/// One drawable outcome in a guild's pool.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RewardItem {
    pub name: String,
    /// Relative draw weight, always positive.
    #[cfg_attr(feature = "serde", serde(alias = "chance"))]
    pub weight: u32,
    pub rarity: Rarity,
    #[cfg_attr(feature = "serde", serde(default, alias = "promo"))]
    pub promotional: bool,
    /// Hidden from the public banner, still drawable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub secret: bool,
    #[cfg_attr(feature = "serde", serde(default, alias = "objectType"))]
    pub kind: ObjectKind,
    /// Copies needed before the unlock marker is granted; 0 disables it.
    #[cfg_attr(feature = "serde", serde(default, alias = "collectable"))]
    pub collectable_threshold: u32,
    #[cfg_attr(feature = "serde", serde(default = "default_true", alias = "giveTokens"))]
    pub give_tokens: bool,
    /// Role-equivalent marker granted to the user on first unlock.
    #[cfg_attr(feature = "serde", serde(default, alias = "roleGiven"))]
    pub unlock_marker: Option<String>,
    /// Payout per copy when sold.
    #[cfg_attr(feature = "serde", serde(default))]
    pub price: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reply: Option<String>,
    /// Used instead of `reply` while the item is collectable.
    #[cfg_attr(feature = "serde", serde(default))]
    pub collectable_replies: [Option<String>; COLLECTABLE_REPLY_SLOTS],
    #[cfg_attr(feature = "serde", serde(default))]
    pub combat: Option<CombatProfile>,
}

impl RewardItem {
    pub fn new(name: impl Into<String>, weight: u32, rarity: Rarity) -> Self {
        Self {
            name: name.into(),
            weight,
            rarity,
            promotional: false,
            secret: false,
            kind: ObjectKind::Character,
            collectable_threshold: 0,
            give_tokens: true,
            unlock_marker: None,
            price: 0,
            reply: None,
            collectable_replies: Default::default(),
            combat: None,
        }
    }

    pub fn promotional(mut self, promotional: bool) -> Self {
        self.promotional = promotional;
        self
    }

    pub fn kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    pub fn is_collectable(&self) -> bool {
        self.collectable_threshold > 0
    }

    /// Flavor text for one draw: a random collectable reply when any is set,
    /// the plain reply otherwise. The rng is only consulted to pick among
    /// collectable replies.
    pub fn draw_reply<R>(&self, rng: &mut R) -> Option<&str>
    where
        R: RandomSource + ?Sized,
    {
        let replies: Vec<&str> = self
            .collectable_replies
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        if self.is_collectable() && !replies.is_empty() {
            return Some(replies[rng.index(replies.len())]);
        }
        self.reply.as_deref()
    }

    /// Set one collectable reply slot (1-based); `None` clears it.
    pub fn set_collectable_reply(
        &mut self,
        slot: usize,
        reply: Option<String>,
    ) -> Result<(), ValidationError> {
        if !self.is_collectable() {
            return Err(ValidationError::NotCollectable(self.name.clone()));
        }
        let entry = slot
            .checked_sub(1)
            .and_then(|idx| self.collectable_replies.get_mut(idx))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "collectable reply slot",
                value: slot.to_string(),
            })?;
        *entry = reply;
        Ok(())
    }

    /// Changing the threshold to 0 drops the collectable replies.
    pub fn set_collectable_threshold(&mut self, threshold: u32) {
        self.collectable_threshold = threshold;
        if threshold == 0 {
            self.collectable_replies = Default::default();
        }
    }

    /// Checks the fields an admin can edit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::name(&self.name)?;
        validation::weight(self.weight)?;
        if let Some(profile) = &self.combat {
            profile.stats.validate()?;
            profile.affinities.validate()?;
        }
        Ok(())
    }

    /// Inventory items can be sold only when they carry a price.
    pub fn is_sellable(&self) -> bool {
        self.kind.is_inventory() && self.price > 0
    }
}
