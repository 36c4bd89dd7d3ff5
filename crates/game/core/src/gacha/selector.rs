//! Weighted random selection.

use crate::gacha::RewardItem;
use crate::random::RandomSource;

/// Anything that carries a draw weight.
pub trait Weighted {
    fn weight(&self) -> u32;
}

impl Weighted for RewardItem {
    fn weight(&self) -> u32 {
        self.weight
    }
}

/// Pick one candidate with probability `weight / Σweight`.
///
/// # Algorithm
///
/// ```text
/// roll ∈ [0, Σweight)
/// for entry in candidates (list order):
///     if roll < entry.weight: return entry
///     roll -= entry.weight
/// return first candidate
/// ```
///
/// Sub-pools are selected by passing a filtered iterator; the total is
/// recomputed over whatever the iterator yields. Returns `None` only for an
/// empty candidate set. A set whose weights sum to zero yields its first entry.
pub fn select_weighted<'a, T, I, R>(candidates: I, rng: &mut R) -> Option<&'a T>
where
    T: Weighted + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: Clone,
    R: RandomSource + ?Sized,
{
    let candidates = candidates.into_iter();
    let first = candidates.clone().next()?;

    let total: u64 = candidates.clone().map(|entry| u64::from(entry.weight())).sum();
    if total == 0 {
        return Some(first);
    }

    let mut roll = rng.below(total);
    for entry in candidates {
        let weight = u64::from(entry.weight());
        if roll < weight {
            return Some(entry);
        }
        roll -= weight;
    }

    Some(first)
}
