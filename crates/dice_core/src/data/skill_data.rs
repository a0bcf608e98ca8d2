//! Skill tree data structures.

use serde::{Deserialize, Serialize};

use super::tier_data::TierKey;

/// Thematic branch a skill belongs to, used for UI grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillBranch {
    /// Tier unlocks, honing and income.
    Main,
    /// Probability modifiers.
    Luck,
    /// Hover and auto-roll.
    Automation,
    /// Per-face value transforms.
    FaceValue,
}

impl SkillBranch {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::Luck => "Luck",
            Self::Automation => "Automation",
            Self::FaceValue => "Face Value",
        }
    }
}

/// Effect granted by a purchased skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Honing: add to one tier's multiplier.
    TierMultiplier {
        /// Tier whose multiplier grows.
        tier: TierKey,
        /// Amount added to the multiplier (e.g. 0.1 for +0.1x).
        magnitude: f64,
    },

    /// Add to the multiplier applied to every reward.
    GlobalIncome {
        /// Fraction added (e.g. 0.05 for +5%).
        magnitude: f64,
    },

    /// Chance to draw the face from {4, 5, 6} instead of a plain d6.
    HighRollChance {
        /// Probability added to the bias.
        chance: f64,
    },

    /// Chance to double the final reward.
    CriticalHit {
        /// Probability per roll.
        chance: f64,
    },

    /// Chance for a rolled 6 to be valued as 7.
    SixesSense {
        /// Probability per six.
        chance: f64,
    },

    /// Flat bonus to the value of a rolled 1.
    FlatOnes {
        /// Amount added before multipliers.
        amount: f64,
    },

    /// Replace the value of a rolled 2.
    TwoOverride {
        /// Replacement value.
        value: f64,
    },

    /// Percentage boost to the value of 1, 2 and 3 before multipliers.
    LowRollBoost {
        /// Percent (e.g. 50.0 for +50%).
        percent: f64,
    },

    /// Percentage boost to the reward of 4, 5 and 6 after multipliers.
    HighRollBoost {
        /// Percent (e.g. 25.0 for +25%).
        percent: f64,
    },

    /// Dice can be rolled by hovering.
    HoverRoll,

    /// Enlarges the hover activation area.
    HoverRadius {
        /// Percent added to the radius.
        percent: f64,
    },

    /// Periodically rolls an idle die.
    AutoRoll {
        /// Interval between automatic rolls in milliseconds.
        interval_ms: u64,
    },
}

/// Data-driven skill definition.
///
/// # Example RON
///
/// ```ron
/// (
///     id: "MAIN-01",
///     name: "Steel Honing I",
///     branch: Main,
///     description: "Sharpen the edges of your Steel die for slightly better returns.",
///     cost: 15,
///     prerequisites: [],
///     effect: Some(TierMultiplier(tier: steel, magnitude: 0.1)),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillData {
    /// Unique identifier (e.g. `MAIN-01`).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Branch for grouping.
    pub branch: SkillBranch,

    /// Flavour text.
    #[serde(default)]
    pub description: String,

    /// Fixed currency cost.
    pub cost: u64,

    /// Skill ids that must be purchased first.
    #[serde(default)]
    pub prerequisites: Vec<String>,

    /// Effect once purchased. Unlock skills have none; the tier catalog
    /// refers to them instead.
    #[serde(default)]
    pub effect: Option<SkillEffect>,
}

impl SkillData {
    /// Check if this skill has a specific prerequisite.
    #[must_use]
    pub fn requires(&self, skill_id: &str) -> bool {
        self.prerequisites.iter().any(|p| p == skill_id)
    }

    /// Honing bonus this skill gives to `tier`, if any.
    #[must_use]
    pub fn honing_for(&self, tier: TierKey) -> Option<f64> {
        match self.effect {
            Some(SkillEffect::TierMultiplier { tier: t, magnitude }) if t == tier => {
                Some(magnitude)
            }
            _ => None,
        }
    }

    /// Global income bonus of this skill, if any.
    #[must_use]
    pub fn global_income(&self) -> Option<f64> {
        match self.effect {
            Some(SkillEffect::GlobalIncome { magnitude }) => Some(magnitude),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn honing() -> SkillData {
        SkillData {
            id: "MAIN-02".to_string(),
            name: "Steel Honing II".to_string(),
            branch: SkillBranch::Main,
            description: String::new(),
            cost: 40,
            prerequisites: vec!["MAIN-01".to_string()],
            effect: Some(SkillEffect::TierMultiplier {
                tier: TierKey::Steel,
                magnitude: 0.15,
            }),
        }
    }

    #[test]
    fn test_requires() {
        let skill = honing();
        assert!(skill.requires("MAIN-01"));
        assert!(!skill.requires("MAIN-03"));
    }

    #[test]
    fn test_honing_matches_only_target_tier() {
        let skill = honing();
        assert_eq!(skill.honing_for(TierKey::Steel), Some(0.15));
        assert_eq!(skill.honing_for(TierKey::Copper), None);
        assert_eq!(skill.global_income(), None);
    }

    #[test]
    fn test_global_income() {
        let mut skill = honing();
        skill.effect = Some(SkillEffect::GlobalIncome { magnitude: 0.05 });
        assert_eq!(skill.global_income(), Some(0.05));
        assert_eq!(skill.honing_for(TierKey::Steel), None);
    }

    #[test]
    fn test_parse_from_ron() {
        let text = r#"(
            id: "LUCK-01",
            name: "Beginner's Luck",
            branch: Luck,
            cost: 50,
            prerequisites: ["MAIN-01"],
            effect: Some(HighRollChance(chance: 0.05)),
        )"#;
        let skill: SkillData = ron::from_str(text).unwrap();
        assert_eq!(skill.branch, SkillBranch::Luck);
        assert_eq!(
            skill.effect,
            Some(SkillEffect::HighRollChance { chance: 0.05 })
        );
        assert!(skill.description.is_empty());
    }
}
