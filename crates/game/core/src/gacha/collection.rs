//! Per-user copy counts for collectable and inventory items.

use std::collections::BTreeMap;

/// Selling or spending more copies than the user owns.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("only {owned} copies of `{item}` owned, {requested} requested")]
pub struct InsufficientCopies {
    pub item: String,
    pub owned: u32,
    pub requested: u32,
}

/// Copy counts keyed by item name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Collection {
    counts: BTreeMap<String, u32>,
}

impl Collection {
    pub fn count(&self, item: &str) -> u32 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Adds one copy and returns the new count.
    pub fn increment(&mut self, item: &str) -> u32 {
        let count = self.counts.entry(item.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Removes `quantity` copies; entries that reach zero are dropped.
    pub fn remove(&mut self, item: &str, quantity: u32) -> Result<u32, InsufficientCopies> {
        let owned = self.count(item);
        if quantity > owned {
            return Err(InsufficientCopies {
                item: item.to_string(),
                owned,
                requested: quantity,
            });
        }
        let left = owned - quantity;
        if left == 0 {
            self.counts.remove(item);
        } else {
            self.counts.insert(item.to_string(), left);
        }
        Ok(left)
    }

    /// Moves the count of `from` onto `to` (used when an item is renamed).
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(count) = self.counts.remove(from) {
            *self.counts.entry(to.to_string()).or_insert(0) += count;
        }
    }

    pub fn forget(&mut self, item: &str) -> Option<u32> {
        self.counts.remove(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_removes() {
        let mut collection = Collection::default();
        assert_eq!(collection.increment("Coin"), 1);
        assert_eq!(collection.increment("Coin"), 2);
        assert_eq!(collection.remove("Coin", 1), Ok(1));
        assert_eq!(collection.remove("Coin", 1), Ok(0));
        assert!(collection.is_empty());
    }

    #[test]
    fn refuses_to_go_negative() {
        let mut collection = Collection::default();
        collection.increment("Coin");
        let err = collection.remove("Coin", 3).unwrap_err();
        assert_eq!(err.owned, 1);
        assert_eq!(collection.count("Coin"), 1);
    }

    #[test]
    fn rename_merges_counts() {
        let mut collection = Collection::default();
        collection.increment("Old");
        collection.increment("Old");
        collection.increment("New");
        collection.rename("Old", "New");
        assert_eq!(collection.count("Old"), 0);
        assert_eq!(collection.count("New"), 3);
    }
}
