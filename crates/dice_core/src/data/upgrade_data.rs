//! Levelled legacy upgrades.
//!
//! These predate the skill tree and stack per level instead of being
//! one-shot purchases. Their price grows with every level bought.

use serde::{Deserialize, Serialize};

use super::tier_data::TierKey;

/// Per-level effect of an upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    /// Adds `per_level * level` to the legacy multiplier of one tier.
    TierMultiplier {
        /// Tier affected.
        tier: TierKey,
        /// Bonus per level (e.g. 0.1 for +10%).
        per_level: f64,
    },

    /// Adds `per_level * level` to the high-face draw bias.
    HighRollChance {
        /// Probability per level.
        per_level: f64,
    },

    /// Shortens the rolling display by `per_level * level` of its length.
    RollSpeed {
        /// Fraction per level.
        per_level: f64,
    },

    /// Widens the hover activation radius by `per_level * level` pixels.
    HoverRadius {
        /// Pixels per level.
        per_level: f64,
    },

    /// Multiplies the legacy multiplier on a rolled 6.
    SixesBonus {
        /// Factor applied.
        factor: f64,
    },

    /// No effect of its own; only gates other upgrades.
    Gate,
}

/// Data-driven upgrade definition.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "steel_multiplier",
///     name: "Steel Die Multiplier",
///     description: "Increases gold earned from Steel dice by +10% per level",
///     max_level: 10,
///     cost: 50,
///     effect: TierMultiplier(tier: steel, per_level: 0.1),
///     prerequisites: [],
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeData {
    /// Unique identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Highest purchasable level.
    pub max_level: u32,

    /// Price of the first level.
    pub cost: u64,

    /// Effect per level.
    pub effect: UpgradeEffect,

    /// Upgrade ids that need at least one level first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl UpgradeData {
    /// Price of the level after `level`, given the per-level growth factor.
    ///
    /// Each purchase floors `cost * growth`, so the price is compounded
    /// with truncation at every step rather than computed in closed form.
    #[must_use]
    pub fn cost_at_level(&self, level: u32, growth: f64) -> u64 {
        let mut cost = self.cost;
        for _ in 0..level {
            let next = (cost as f64 * growth).floor();
            cost = if next >= u64::MAX as f64 {
                u64::MAX
            } else {
                next as u64
            };
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_compounds_with_truncation() {
        let upgrade = UpgradeData {
            id: "steel_multiplier".to_string(),
            name: "Steel Die Multiplier".to_string(),
            description: String::new(),
            max_level: 10,
            cost: 50,
            effect: UpgradeEffect::TierMultiplier {
                tier: TierKey::Steel,
                per_level: 0.1,
            },
            prerequisites: vec![],
        };

        assert_eq!(upgrade.cost_at_level(0, 1.5), 50);
        assert_eq!(upgrade.cost_at_level(1, 1.5), 75);
        assert_eq!(upgrade.cost_at_level(2, 1.5), 112);
        assert_eq!(upgrade.cost_at_level(3, 1.5), 168);
    }
}
