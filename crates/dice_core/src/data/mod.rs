//! Static game data: die tiers, the skill tree and legacy upgrades.
//!
//! This module contains pure data structures deserialized from RON. The
//! built-in catalog is embedded at compile time, so there is no file IO
//! here; `dice_tools` validates alternative catalogs from disk.

mod catalog;
mod skill_data;
mod tier_data;
mod upgrade_data;

pub use catalog::Catalog;
pub use skill_data::{SkillBranch, SkillData, SkillEffect};
pub use tier_data::{TierData, TierKey, UnlockCondition};
pub use upgrade_data::{UpgradeData, UpgradeEffect};
