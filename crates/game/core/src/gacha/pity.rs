//! Pity tracking: the guaranteed-rare counter and the 50/50 guarantee.

/// Per (guild, user) pity record. Defaults to `{0, false}` on first access.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PityState {
    /// Draws since the last SSR.
    pub counter: u32,
    /// Set after losing the 50/50; the next forced SSR comes from the
    /// promotional pool.
    #[cfg_attr(feature = "serde", serde(default, alias = "guaranteedPromo"))]
    pub guaranteed_promotional: bool,
}

impl PityState {
    pub fn record_non_rare(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }

    /// Reset after an SSR. Losing the 50/50 (a standard SSR) sets the
    /// guarantee; winning it clears the guarantee.
    pub fn record_rare(&mut self, was_promotional: bool) {
        self.counter = 0;
        self.guaranteed_promotional = !was_promotional;
    }

    /// True when the upcoming draw is the `pity_max`-th since the last SSR.
    pub fn should_force_rare(&self, pity_max: u32) -> bool {
        self.counter >= pity_max.saturating_sub(1)
    }

    /// Draws left until a forced SSR, counting the forced draw itself.
    pub fn draws_until_guarantee(&self, pity_max: u32) -> u32 {
        pity_max.saturating_sub(self.counter).max(1)
    }
}
