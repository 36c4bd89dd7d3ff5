//! Request-level services over guild records.
//!
//! Each service is a cheap `Clone` handle. Read-modify-write cycles on a
//! user's records are serialized per (guild, user) through [`UserLocks`];
//! different users never wait on each other.

mod admin;
mod confirm;
mod draw;
mod economy;

pub use admin::{AdminService, BossField, ItemField};
pub use confirm::{ConfirmedOperation, DEFAULT_CONFIRM_TIMEOUT, PendingOperation};
pub use draw::{DrawResult, DrawService, PityView, TenDrawResult};
pub use economy::{EconomyService, InventoryEntry, RedeemReceipt, SaleReceipt};

use std::collections::HashMap;
use std::sync::Arc;

use gacha_core::{GuildId, RandomSource, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Random source shared by every service of a runtime.
pub type SharedRng = Arc<Mutex<Box<dyn RandomSource>>>;

pub fn shared_rng(source: impl RandomSource + 'static) -> SharedRng {
    let boxed: Box<dyn RandomSource> = Box::new(source);
    Arc::new(Mutex::new(boxed))
}

/// One async mutex per (guild, user).
#[derive(Clone, Default)]
pub struct UserLocks {
    locks: Arc<Mutex<HashMap<(GuildId, UserId), Arc<Mutex<()>>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other request of this user holds the lock.
    ///
    /// Slots nobody holds or waits on are dropped on the way in, so the map
    /// only keeps users with a request in flight.
    pub async fn lock(&self, guild: GuildId, user: UserId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(locks.entry((guild, user)).or_default())
        };
        slot.lock_owned().await
    }

    /// Users with a tracked slot.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_waits_other_user_does_not() {
        let locks = UserLocks::new();
        let held = locks.lock(GuildId(1), UserId(1)).await;

        let other = tokio::time::timeout(Duration::from_millis(50), locks.lock(GuildId(1), UserId(2)));
        assert!(other.await.is_ok());

        let same = tokio::time::timeout(Duration::from_millis(50), locks.lock(GuildId(1), UserId(1)));
        assert!(same.await.is_err());

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.lock(GuildId(1), UserId(1)));
        assert!(again.await.is_ok());
    }

    #[tokio::test]
    async fn released_slots_are_pruned() {
        let locks = UserLocks::new();
        for user in 0..100 {
            drop(locks.lock(GuildId(1), UserId(user)).await);
        }
        let held = locks.lock(GuildId(1), UserId(500)).await;
        assert_eq!(locks.tracked().await, 1);

        drop(locks.lock(GuildId(2), UserId(1)).await);
        assert_eq!(locks.tracked().await, 2);
        drop(held);
    }
}
