//! Gacha rules: weighted draws, pity, collections and token economy.
//!
//! A draw request flows through the [`PityState`] (which decides the pool),
//! the weighted selector (which picks the item), and back into the pity and
//! [`Collection`] records. Everything is pure: the runtime loads the records,
//! calls into this module, and persists what comes back.
mod banner;
mod collection;
mod draw;
mod item;
mod pity;
mod reward;
mod search;
mod selector;
mod wallet;

pub use banner::{Banner, BannerEntry, RarityShare};
pub use collection::{Collection, InsufficientCopies};
pub use draw::{DrawEngine, DrawGroup, DrawOutcome, TenDraw};
pub use item::{ObjectKind, Rarity, RewardItem};
pub use pity::PityState;
pub use reward::Claim;
pub use search::{Named, find_by_name, position_by_name};
pub use selector::{Weighted, select_weighted};
pub use wallet::{Exchange, ExchangeError, TokenWallet};
