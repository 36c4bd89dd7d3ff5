//! Case-insensitive lookup by partial name.

use crate::combat::{Boss, CommonSkill};
use crate::gacha::{Exchange, RewardItem};

/// Records addressable by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for RewardItem {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Boss {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for CommonSkill {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Exchange {
    fn name(&self) -> &str {
        &self.reward_name
    }
}

/// Index of the best match for `query`: exact, then prefix, then substring.
///
/// Matching is trimmed and case-insensitive. Within a tier the first record
/// in list order wins.
pub fn position_by_name<T: Named>(records: &[T], query: &str) -> Option<usize> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let names: Vec<String> = records.iter().map(|r| r.name().to_lowercase()).collect();

    names
        .iter()
        .position(|name| *name == needle)
        .or_else(|| names.iter().position(|name| name.starts_with(&needle)))
        .or_else(|| names.iter().position(|name| name.contains(&needle)))
}

pub fn find_by_name<'a, T: Named>(records: &'a [T], query: &str) -> Option<&'a T> {
    position_by_name(records, query).map(|idx| &records[idx])
}
