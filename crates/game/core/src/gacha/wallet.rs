//! Rarity tokens and the exchanges that spend them.

use std::collections::BTreeMap;

use crate::error::{ErrorSeverity, GameError};
use crate::gacha::Rarity;

/// Token balances of one user, keyed by token name (`Token SSR`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TokenWallet {
    balances: BTreeMap<String, u32>,
}

impl TokenWallet {
    pub fn balance(&self, rarity: Rarity) -> u32 {
        self.balances.get(&rarity.token_name()).copied().unwrap_or(0)
    }

    /// Adds tokens and returns the new balance.
    pub fn add(&mut self, rarity: Rarity, amount: u32) -> u32 {
        let balance = self.balances.entry(rarity.token_name()).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Removes tokens; fails without change when the balance is short.
    pub fn remove(&mut self, rarity: Rarity, amount: u32) -> Result<u32, ExchangeError> {
        let available = self.balance(rarity);
        if available < amount {
            return Err(ExchangeError::InsufficientTokens {
                rarity,
                required: amount,
                available,
            });
        }
        let left = available - amount;
        self.balances.insert(rarity.token_name(), left);
        Ok(left)
    }

    /// Balances in banner order, skipping empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (Rarity, u32)> + '_ {
        Rarity::DISPLAY_ORDER
            .into_iter()
            .map(|rarity| (rarity, self.balance(rarity)))
            .filter(|(_, amount)| *amount > 0)
    }
}

/// A guild-defined trade of tokens for a reward.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Exchange {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(alias = "rewardName"))]
    pub reward_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub prices: BTreeMap<Rarity, u32>,
    #[cfg_attr(feature = "serde", serde(default, alias = "roleGiven"))]
    pub unlock_marker: Option<String>,
}

impl Exchange {
    /// Debits every price from the wallet, or nothing at all.
    pub fn redeem(&self, wallet: &mut TokenWallet) -> Result<(), ExchangeError> {
        if self.prices.values().all(|amount| *amount == 0) {
            return Err(ExchangeError::Unpriced(self.id.clone()));
        }
        for (rarity, amount) in &self.prices {
            let available = wallet.balance(*rarity);
            if available < *amount {
                return Err(ExchangeError::InsufficientTokens {
                    rarity: *rarity,
                    required: *amount,
                    available,
                });
            }
        }
        for (rarity, amount) in &self.prices {
            wallet.remove(*rarity, *amount)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("not enough {rarity} tokens: {required} required, {available} available")]
    InsufficientTokens {
        rarity: Rarity,
        required: u32,
        available: u32,
    },

    #[error("exchange {0} has no prices configured")]
    Unpriced(String),
}

impl GameError for ExchangeError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Precondition
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientTokens { .. } => "INSUFFICIENT_TOKENS",
            Self::Unpriced(_) => "EXCHANGE_UNPRICED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(prices: &[(Rarity, u32)]) -> Exchange {
        Exchange {
            id: "1".to_string(),
            reward_name: "Crown".to_string(),
            prices: prices.iter().copied().collect(),
            unlock_marker: None,
        }
    }

    #[test]
    fn wallet_add_and_remove() {
        let mut wallet = TokenWallet::default();
        assert_eq!(wallet.add(Rarity::SR, 3), 3);
        assert_eq!(wallet.remove(Rarity::SR, 2), Ok(1));
        assert!(wallet.remove(Rarity::SR, 2).is_err());
        assert_eq!(wallet.balance(Rarity::SR), 1);
    }

    #[test]
    fn redeem_is_all_or_nothing() {
        let mut wallet = TokenWallet::default();
        wallet.add(Rarity::SSR, 1);
        wallet.add(Rarity::SR, 1);

        let err = exchange(&[(Rarity::SSR, 1), (Rarity::SR, 2)])
            .redeem(&mut wallet)
            .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::InsufficientTokens { rarity: Rarity::SR, .. }
        ));
        assert_eq!(wallet.balance(Rarity::SSR), 1);
        assert_eq!(wallet.balance(Rarity::SR), 1);

        exchange(&[(Rarity::SSR, 1), (Rarity::SR, 1)])
            .redeem(&mut wallet)
            .unwrap();
        assert_eq!(wallet.iter().count(), 0);
    }

    #[test]
    fn unpriced_exchange_is_rejected() {
        let mut wallet = TokenWallet::default();
        assert_eq!(
            exchange(&[]).redeem(&mut wallet),
            Err(ExchangeError::Unpriced("1".to_string()))
        );
    }
}
