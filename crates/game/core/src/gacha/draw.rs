//! Single and ten-draw operations over a guild's item pool.

use crate::config::GameConfig;
use crate::gacha::selector::select_weighted;
use crate::gacha::{Collection, PityState, Rarity, RewardItem};
use crate::random::RandomSource;

/// Result of one draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawOutcome {
    pub item: RewardItem,
    /// The pool was restricted to SSR by pity.
    pub forced: bool,
    /// Copies owned after this draw, for person/object items.
    pub collectable_count: Option<u32>,
}

/// Copies of one item within a ten-draw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawGroup {
    pub name: String,
    pub rarity: Rarity,
    pub count: u32,
}

/// Ten sequential draws with a headline and a grouped summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenDraw {
    pub draws: Vec<DrawOutcome>,
    headline: usize,
    /// Count by name, in first-seen order.
    pub groups: Vec<DrawGroup>,
}

impl TenDraw {
    /// One of the highest-rarity results.
    pub fn headline(&self) -> &DrawOutcome {
        &self.draws[self.headline]
    }

    pub fn headline_index(&self) -> usize {
        self.headline
    }
}

/// Draw engine bound to one guild's pool and pity setting.
pub struct DrawEngine<'a> {
    items: &'a [RewardItem],
    pity_max: u32,
}

impl<'a> DrawEngine<'a> {
    pub fn new(items: &'a [RewardItem], pity_max: u32) -> Self {
        Self { items, pity_max }
    }

    /// Draw one item, updating pity and the user's collection.
    ///
    /// 1. Empty pool → `None`.
    /// 2. Pity forcing: SSR pool, narrowed to promotional SSRs when the
    ///    guarantee is set and such items exist. No SSR at all falls through.
    /// 3. Otherwise the whole pool by weight.
    /// 4. SSR resets pity (recording whether it was promotional), anything
    ///    else increments it.
    /// 5. Person/object items gain a copy in the collection.
    pub fn draw<R>(
        &self,
        pity: &mut PityState,
        collection: &mut Collection,
        rng: &mut R,
    ) -> Option<DrawOutcome>
    where
        R: RandomSource + ?Sized,
    {
        let (item, forced) = self.choose(pity, rng)?;

        if item.rarity.is_rare() {
            pity.record_rare(item.promotional);
        } else {
            pity.record_non_rare();
        }

        let collectable_count = item
            .kind
            .is_inventory()
            .then(|| collection.increment(&item.name));

        Some(DrawOutcome {
            item: item.clone(),
            forced,
            collectable_count,
        })
    }

    /// Ten sequential draws; each one observes the pity left by the previous.
    pub fn draw_ten<R>(
        &self,
        pity: &mut PityState,
        collection: &mut Collection,
        rng: &mut R,
    ) -> Option<TenDraw>
    where
        R: RandomSource + ?Sized,
    {
        let mut draws = Vec::with_capacity(GameConfig::TEN_DRAW_COUNT);
        for _ in 0..GameConfig::TEN_DRAW_COUNT {
            draws.push(self.draw(pity, collection, rng)?);
        }

        let best = draws.iter().map(|d| d.item.rarity).max()?;
        let tied: Vec<usize> = draws
            .iter()
            .enumerate()
            .filter(|(_, d)| d.item.rarity == best)
            .map(|(idx, _)| idx)
            .collect();
        let headline = tied[rng.index(tied.len())];

        let mut groups: Vec<DrawGroup> = Vec::new();
        for outcome in &draws {
            match groups.iter_mut().find(|g| g.name == outcome.item.name) {
                Some(group) => group.count += 1,
                None => groups.push(DrawGroup {
                    name: outcome.item.name.clone(),
                    rarity: outcome.item.rarity,
                    count: 1,
                }),
            }
        }

        Some(TenDraw {
            draws,
            headline,
            groups,
        })
    }

    fn choose<R>(&self, pity: &PityState, rng: &mut R) -> Option<(&'a RewardItem, bool)>
    where
        R: RandomSource + ?Sized,
    {
        let items = self.items;
        if pity.should_force_rare(self.pity_max) {
            if pity.guaranteed_promotional {
                let promotional = items.iter().filter(|i| i.rarity.is_rare() && i.promotional);
                if let Some(item) = select_weighted(promotional, rng) {
                    return Some((item, true));
                }
            }
            if let Some(item) = select_weighted(items.iter().filter(|i| i.rarity.is_rare()), rng) {
                return Some((item, true));
            }
        }

        select_weighted(items, rng).map(|item| (item, false))
    }
}
