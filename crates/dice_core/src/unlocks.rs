//! Availability queries over the catalog and player state.
//!
//! Everything here is a pure read. Unknown ids answer "no" instead of
//! erroring so UI queries stay total. The economy re-asks the same
//! questions before every mutation.

use crate::data::{Catalog, TierKey, UnlockCondition};
use crate::state::ProgressionState;

/// Read-only view answering "can the player do X right now?".
#[derive(Debug, Clone, Copy)]
pub struct UnlockResolver<'a> {
    catalog: &'a Catalog,
    state: &'a ProgressionState,
}

impl<'a> UnlockResolver<'a> {
    /// Create a resolver over a catalog and state snapshot.
    #[must_use]
    pub const fn new(catalog: &'a Catalog, state: &'a ProgressionState) -> Self {
        Self { catalog, state }
    }

    /// Whether dice of `key` can be bought, derived from the unlock
    /// condition rather than the cached flag.
    #[must_use]
    pub fn is_tier_unlocked(&self, key: TierKey) -> bool {
        match self.catalog.get_tier(key).map(|t| &t.unlocked_by) {
            Some(UnlockCondition::Start) => true,
            Some(UnlockCondition::Skill(id)) => self.state.has_skill(id),
            None => false,
        }
    }

    /// Price of the next die of `key`, `None` for tiers not in the catalog.
    #[must_use]
    pub fn die_cost(&self, key: TierKey) -> Option<u64> {
        self.state.tier(key).map(|t| t.cost)
    }

    /// Unlocked and affordable.
    #[must_use]
    pub fn is_die_purchasable(&self, key: TierKey) -> bool {
        self.is_tier_unlocked(key)
            && self
                .die_cost(key)
                .is_some_and(|cost| self.state.can_afford(cost))
    }

    /// Not yet purchased and every prerequisite purchased.
    #[must_use]
    pub fn is_skill_available(&self, id: &str) -> bool {
        let Some(skill) = self.catalog.get_skill(id) else {
            return false;
        };
        !self.state.has_skill(id) && skill.prerequisites.iter().all(|p| self.state.has_skill(p))
    }

    /// Available and affordable.
    #[must_use]
    pub fn is_skill_purchasable(&self, id: &str) -> bool {
        self.is_skill_available(id)
            && self
                .catalog
                .get_skill(id)
                .is_some_and(|s| self.state.can_afford(s.cost))
    }

    /// Prerequisites of `id` not yet purchased, in catalog order.
    #[must_use]
    pub fn missing_prerequisites(&self, id: &str) -> Vec<&'a str> {
        let state = self.state;
        self.catalog
            .get_skill(id)
            .map(|s| {
                s.prerequisites
                    .iter()
                    .filter(|p| !state.has_skill(p))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids of every skill that could be bought with enough currency.
    pub fn available_skills(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.catalog
            .skills
            .iter()
            .filter(|s| self.is_skill_available(&s.id))
            .map(|s| s.id.as_str())
    }

    /// Below max level and every prerequisite upgrade has a level.
    #[must_use]
    pub fn is_upgrade_available(&self, id: &str) -> bool {
        let Some(upgrade) = self.catalog.get_upgrade(id) else {
            return false;
        };
        self.state.upgrade_level(id) < upgrade.max_level
            && upgrade
                .prerequisites
                .iter()
                .all(|p| self.state.upgrade_level(p) > 0)
    }

    /// Price of the next level, `None` for unknown or maxed upgrades.
    #[must_use]
    pub fn upgrade_cost(&self, id: &str, growth: f64) -> Option<u64> {
        let upgrade = self.catalog.get_upgrade(id)?;
        let level = self.state.upgrade_level(id);
        (level < upgrade.max_level).then(|| upgrade.cost_at_level(level, growth))
    }

    /// Available and affordable.
    #[must_use]
    pub fn is_upgrade_purchasable(&self, id: &str, growth: f64) -> bool {
        self.is_upgrade_available(id)
            && self
                .upgrade_cost(id, growth)
                .is_some_and(|cost| self.state.can_afford(cost))
    }
}
