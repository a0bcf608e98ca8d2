//! Die tier definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a die tier.
///
/// Declaration order is progression order, which is also the order the
/// shop lists tiers in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TierKey {
    /// Starting tier.
    Steel,
    /// Second tier.
    Copper,
    /// Third tier.
    Silver,
    /// Fourth tier.
    Gold,
    /// Fifth tier.
    Emerald,
    /// Sixth tier.
    Platinum,
    /// Seventh tier.
    Diamond,
    /// Eighth tier.
    Ruby,
    /// Final tier.
    Obsidian,
}

impl TierKey {
    /// All tiers in progression order.
    pub const ALL: [Self; 9] = [
        Self::Steel,
        Self::Copper,
        Self::Silver,
        Self::Gold,
        Self::Emerald,
        Self::Platinum,
        Self::Diamond,
        Self::Ruby,
        Self::Obsidian,
    ];

    /// Lowercase identifier used in data files and the wire protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steel => "steel",
            Self::Copper => "copper",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Emerald => "emerald",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
            Self::Ruby => "ruby",
            Self::Obsidian => "obsidian",
        }
    }
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

/// What makes a tier purchasable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnlockCondition {
    /// Available from the first session.
    Start,
    /// Available once the named skill is purchased.
    Skill(String),
}

impl UnlockCondition {
    /// Skill id this condition waits on, if any.
    #[must_use]
    pub fn skill_id(&self) -> Option<&str> {
        match self {
            Self::Start => None,
            Self::Skill(id) => Some(id),
        }
    }
}

/// Data-driven die tier definition.
///
/// # Example RON
///
/// ```ron
/// (
///     key: copper,
///     name: "Copper",
///     base_cost: 50,
///     multiplier: 1.5,
///     unlocked_by: Skill("MAIN-03"),
/// )
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierData {
    /// Tier identifier.
    pub key: TierKey,

    /// Display name.
    pub name: String,

    /// Price of the first die of this tier.
    pub base_cost: u64,

    /// Base reward multiplier before honing.
    pub multiplier: f64,

    /// Unlock condition.
    pub unlocked_by: UnlockCondition,
}

impl TierData {
    /// Whether the tier is unlocked before any skill is bought.
    #[must_use]
    pub fn is_starter(&self) -> bool {
        self.unlocked_by == UnlockCondition::Start
    }

    /// Price of the next die given how many are already owned.
    ///
    /// `floor(base_cost * growth^owned)`, saturating at `u64::MAX`.
    #[must_use]
    pub fn scaled_cost(&self, owned: u32, growth: f64) -> u64 {
        let exponent = i32::try_from(owned).unwrap_or(i32::MAX);
        let cost = (self.base_cost as f64 * growth.powi(exponent)).floor();
        if cost >= u64::MAX as f64 {
            u64::MAX
        } else {
            cost as u64
        }
    }
}
