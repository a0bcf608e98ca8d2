//! Read-only projections for presentation layers.

use serde::{Deserialize, Serialize};

use crate::data::{SkillBranch, TierKey};
use crate::economy::Economy;
use crate::state::DieId;

/// One row of the dice shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierView {
    /// Tier key.
    pub key: TierKey,
    /// Display name.
    pub name: String,
    /// Whether dice of this tier can be bought.
    pub unlocked: bool,
    /// Dice owned.
    pub count: u32,
    /// Price of the next die.
    pub cost: u64,
    /// Unlocked and affordable.
    pub affordable: bool,
}

/// One node of the skill tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillView {
    /// Skill id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Branch the node sits in.
    pub branch: SkillBranch,
    /// Price.
    pub cost: u64,
    /// Already bought.
    pub purchased: bool,
    /// Not bought and every prerequisite bought.
    pub available: bool,
    /// Available and affordable.
    pub affordable: bool,
}

/// One owned die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DieView {
    /// Die id.
    pub id: DieId,
    /// Tier.
    pub tier: TierKey,
    /// Face shown.
    pub face: u8,
    /// Rolling display active.
    pub rolling: bool,
}

/// One legacy upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeView {
    /// Upgrade id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current level.
    pub level: u32,
    /// Highest level.
    pub max_level: u32,
    /// Price of the next level, `None` when maxed.
    pub next_cost: Option<u64>,
    /// Below max level with prerequisites met and affordable.
    pub affordable: bool,
}

impl Economy {
    /// Shop rows in catalog order.
    #[must_use]
    pub fn tier_views(&self) -> Vec<TierView> {
        let resolver = self.resolver();
        self.catalog()
            .tiers
            .iter()
            .filter_map(|data| {
                let runtime = self.state().tier(data.key)?;
                Some(TierView {
                    key: data.key,
                    name: data.name.clone(),
                    unlocked: runtime.unlocked,
                    count: runtime.count,
                    cost: runtime.cost,
                    affordable: resolver.is_die_purchasable(data.key),
                })
            })
            .collect()
    }

    /// Skill tree nodes in catalog order.
    #[must_use]
    pub fn skill_views(&self) -> Vec<SkillView> {
        let resolver = self.resolver();
        self.catalog()
            .skills
            .iter()
            .map(|skill| SkillView {
                id: skill.id.clone(),
                name: skill.name.clone(),
                branch: skill.branch,
                cost: skill.cost,
                purchased: self.state().has_skill(&skill.id),
                available: resolver.is_skill_available(&skill.id),
                affordable: resolver.is_skill_purchasable(&skill.id),
            })
            .collect()
    }

    /// Owned dice in purchase order.
    #[must_use]
    pub fn die_views(&self) -> Vec<DieView> {
        self.state()
            .dice
            .values()
            .map(|die| DieView {
                id: die.id,
                tier: die.tier,
                face: die.face,
                rolling: die.rolling,
            })
            .collect()
    }

    /// Legacy upgrades in catalog order.
    #[must_use]
    pub fn upgrade_views(&self) -> Vec<UpgradeView> {
        let resolver = self.resolver();
        let growth = self.config().upgrade_cost_growth;
        self.catalog()
            .upgrades
            .iter()
            .map(|upgrade| UpgradeView {
                id: upgrade.id.clone(),
                name: upgrade.name.clone(),
                level: self.state().upgrade_level(&upgrade.id),
                max_level: upgrade.max_level,
                next_cost: resolver.upgrade_cost(&upgrade.id, growth),
                affordable: resolver.is_upgrade_purchasable(&upgrade.id, growth),
            })
            .collect()
    }
}
