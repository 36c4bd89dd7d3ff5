//! Public odds for the banner display.

use crate::gacha::{Rarity, RewardItem};

#[derive(Clone, Debug, PartialEq)]
pub struct BannerEntry {
    pub name: String,
    pub rarity: Rarity,
    pub promotional: bool,
    /// Chance of this item on a normal draw, in percent.
    pub percent: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RarityShare {
    pub rarity: Rarity,
    pub percent: f64,
}

/// Odds of every public item, highest rarity first.
///
/// Secret items stay in the draw pool but are excluded here, so the shown
/// percentages are relative to the public pool only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Banner {
    pub entries: Vec<BannerEntry>,
    pub rarities: Vec<RarityShare>,
}

impl Banner {
    pub fn from_items(items: &[RewardItem]) -> Self {
        let public: Vec<&RewardItem> = items.iter().filter(|item| !item.secret).collect();
        let total: u64 = public.iter().map(|item| u64::from(item.weight)).sum();
        if total == 0 {
            return Self::default();
        }
        let percent = |weight: u64| weight as f64 * 100.0 / total as f64;

        let mut entries: Vec<BannerEntry> = public
            .iter()
            .map(|item| BannerEntry {
                name: item.name.clone(),
                rarity: item.rarity,
                promotional: item.promotional,
                percent: percent(u64::from(item.weight)),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.rarity
                .display_rank()
                .cmp(&b.rarity.display_rank())
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });

        let rarities = Rarity::DISPLAY_ORDER
            .into_iter()
            .filter_map(|rarity| {
                let weight: u64 = public
                    .iter()
                    .filter(|item| item.rarity == rarity)
                    .map(|item| u64::from(item.weight))
                    .sum();
                (weight > 0).then(|| RarityShare {
                    rarity,
                    percent: percent(weight),
                })
            })
            .collect();

        Self { entries, rarities }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hides_secrets_and_orders_by_rarity_then_name() {
        let items = vec![
            RewardItem::new("zeta", 50, Rarity::R),
            RewardItem::new("Alpha", 25, Rarity::R),
            RewardItem::new("Hidden", 900, Rarity::SSR).secret(true),
            RewardItem::new("Star", 25, Rarity::SSR),
        ];
        let banner = Banner::from_items(&items);

        let names: Vec<&str> = banner.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Star", "Alpha", "zeta"]);
        assert!((banner.entries[0].percent - 25.0).abs() < 1e-9);

        assert_eq!(banner.rarities.len(), 2);
        assert_eq!(banner.rarities[0].rarity, Rarity::SSR);
        assert!((banner.rarities[1].percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn empty_pool_gives_empty_banner() {
        assert!(Banner::from_items(&[]).is_empty());
    }
}
