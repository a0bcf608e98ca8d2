//! # Dice Core
//!
//! Progression engine for the dice tycoon game.
//!
//! This crate contains **only** game rules:
//! - No rendering
//! - No IO
//! - No wall clock (callers pass `now` in milliseconds)
//! - No OS randomness (draws go through [`rng::RollRng`])
//!
//! Hosts drive it with purchases and rolls and read the results back
//! through [`views`]. Identical inputs and seeds produce identical states,
//! which the determinism tests rely on.
//!
//! ## Crate Structure
//!
//! - [`data`] - Tier, skill and upgrade catalogs loaded from RON
//! - [`state`] - Mutable player progression
//! - [`unlocks`] - Availability queries
//! - [`roll`] - Reward calculation
//! - [`economy`] - The controller that mutates state
//! - [`automation`] - Hover and auto-roll capabilities
//! - [`snapshot`] - Persisted form of the state

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod automation;
pub mod data;
pub mod economy;
pub mod error;
pub mod math;
pub mod rng;
pub mod roll;
pub mod snapshot;
pub mod state;
pub mod unlocks;
pub mod views;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::automation::AutomationProfile;
    pub use crate::data::{
        Catalog, SkillBranch, SkillData, SkillEffect, TierData, TierKey, UnlockCondition,
        UpgradeData, UpgradeEffect,
    };
    pub use crate::economy::{Economy, EconomyConfig, RejectReason};
    pub use crate::error::{CatalogError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::rng::{RollRng, SeededRng};
    pub use crate::roll::{compute_reward, RollOutcome};
    pub use crate::snapshot::Snapshot;
    pub use crate::state::{DieId, DieInstance, ProgressionState, TierRuntimeState};
    pub use crate::unlocks::UnlockResolver;
    pub use crate::views::{DieView, SkillView, TierView, UpgradeView};
}
