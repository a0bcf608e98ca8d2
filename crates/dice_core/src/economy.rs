//! Purchases, rolls and resets.
//!
//! [`Economy`] owns the player state and is the only thing that mutates
//! it. Every operation validates first and mutates second, so a rejected
//! call leaves the state exactly as it was.
//!
//! Each operation comes in two forms. The `try_*` form reports why it was
//! rejected; the plain form logs the reason at `debug` and returns a
//! neutral value (`None`, `false` or `0`), which is what user-facing hosts
//! call.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::automation::{self, AutomationProfile};
use crate::data::{Catalog, TierKey, UpgradeEffect};
use crate::math::Vec2Fixed;
use crate::rng::RollRng;
use crate::roll::{compute_reward, RollOutcome};
use crate::snapshot::Snapshot;
use crate::state::{DieId, DieInstance, ProgressionState};
use crate::unlocks::UnlockResolver;

/// Tunable economy constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Balance of a fresh or reset game.
    pub starting_currency: u64,
    /// Minimum time between rewarded rolls of one die.
    pub roll_cooldown_ms: u64,
    /// How long a die shows as rolling before upgrades shorten it.
    pub roll_display_ms: u64,
    /// Growth factor of die prices per owned die of the tier.
    pub cost_growth: f64,
    /// Growth factor of upgrade prices per level.
    pub upgrade_cost_growth: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_currency: 100,
            roll_cooldown_ms: 300,
            roll_display_ms: 600,
            cost_growth: 1.15,
            upgrade_cost_growth: 1.5,
        }
    }
}

/// Why an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Tier not in the catalog.
    #[error("Unknown tier: {0}")]
    UnknownTier(TierKey),

    /// Tier exists but its unlock skill is not owned.
    #[error("Tier {0} is locked")]
    TierLocked(TierKey),

    /// Balance below price.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Price of the purchase.
        required: u64,
        /// Balance at the time of the call.
        available: u64,
    },

    /// No die with this id.
    #[error("Unknown die: {0}")]
    UnknownDie(DieId),

    /// The die was rolled too recently.
    #[error("Die {die} is cooling down for another {remaining_ms} ms")]
    CooldownActive {
        /// Die that was asked to roll.
        die: DieId,
        /// Time until it may roll again.
        remaining_ms: u64,
    },

    /// Skill not in the catalog.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// Skill already in the purchased set.
    #[error("Skill {0} already purchased")]
    AlreadyPurchased(String),

    /// Skill prerequisites not all purchased.
    #[error("Skill {skill} is missing prerequisites: {}", missing.join(", "))]
    MissingPrerequisites {
        /// Skill that was asked for.
        skill: String,
        /// Prerequisites not yet purchased.
        missing: Vec<String>,
    },

    /// Upgrade not in the catalog.
    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    /// Upgrade already at its maximum level.
    #[error("Upgrade {0} is at max level")]
    MaxLevel(String),

    /// A prerequisite upgrade has no level yet.
    #[error("Upgrade {0} is locked")]
    UpgradeLocked(String),

    /// Every die id has been handed out.
    #[error("No die ids left")]
    DieIdsExhausted,
}

/// The economy controller: catalog, configuration and player state.
#[derive(Debug, Clone)]
pub struct Economy {
    catalog: Arc<Catalog>,
    config: EconomyConfig,
    state: ProgressionState,
}

impl Default for Economy {
    fn default() -> Self {
        Self::new(Catalog::builtin(), EconomyConfig::default())
    }
}

impl Economy {
    /// Start a fresh game.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, config: EconomyConfig) -> Self {
        let state =
            ProgressionState::initial(&catalog, config.starting_currency, config.cost_growth);
        Self {
            catalog,
            config,
            state,
        }
    }

    /// Resume from a snapshot, repairing anything inconsistent with the catalog.
    #[must_use]
    pub fn from_snapshot(catalog: Arc<Catalog>, config: EconomyConfig, snapshot: Snapshot) -> Self {
        let mut economy = Self::new(catalog, config);
        economy.restore(snapshot);
        economy
    }

    /// Catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Shared handle to the catalog.
    #[must_use]
    pub fn catalog_arc(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Current player state.
    #[must_use]
    pub const fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Availability queries over the current state.
    #[must_use]
    pub fn resolver(&self) -> UnlockResolver<'_> {
        UnlockResolver::new(&self.catalog, &self.state)
    }

    /// Current balance.
    #[must_use]
    pub const fn currency(&self) -> u64 {
        self.state.currency
    }

    // ------------------------------------------------------------------
    // Dice
    // ------------------------------------------------------------------

    /// Buy one die of `tier` at its current scaled price.
    ///
    /// # Errors
    ///
    /// Rejects unknown or locked tiers, insufficient funds and exhausted die
    /// ids.
    pub fn try_purchase_die(&mut self, tier: TierKey) -> Result<DieId, RejectReason> {
        if self.catalog.get_tier(tier).is_none() {
            return Err(RejectReason::UnknownTier(tier));
        }
        if !self.resolver().is_tier_unlocked(tier) {
            return Err(RejectReason::TierLocked(tier));
        }
        let cost = self
            .resolver()
            .die_cost(tier)
            .ok_or(RejectReason::UnknownTier(tier))?;
        if !self.state.can_afford(cost) {
            return Err(RejectReason::InsufficientFunds {
                required: cost,
                available: self.state.currency,
            });
        }
        let id = self
            .state
            .allocate_die_id()
            .ok_or(RejectReason::DieIdsExhausted)?;
        self.state.spend(cost);

        self.state.dice.insert(id, DieInstance::new(id, tier));
        if let Some(runtime) = self.state.tiers.get_mut(&tier) {
            runtime.count += 1;
        }
        self.state.refresh_tiers(&self.catalog, self.config.cost_growth);
        self.check_invariants();

        info!("Purchased {} die {} for {}", tier, id, cost);
        Ok(id)
    }

    /// Silent form of [`Self::try_purchase_die`].
    pub fn purchase_die(&mut self, tier: TierKey) -> Option<DieId> {
        self.try_purchase_die(tier)
            .map_err(|reason| debug!("Die purchase rejected: {reason}"))
            .ok()
    }

    /// Roll a die at `now` and credit the reward.
    ///
    /// The die shows the new face and is marked rolling until
    /// [`Self::finish_roll`] or [`Self::settle_rolls`] clears it.
    ///
    /// # Errors
    ///
    /// Rejects unknown dice and dice inside their cooldown window.
    pub fn try_roll_die<R: RollRng + ?Sized>(
        &mut self,
        id: DieId,
        forced_face: Option<u8>,
        now: u64,
        rng: &mut R,
    ) -> Result<RollOutcome, RejectReason> {
        let die = self.state.die(id).ok_or(RejectReason::UnknownDie(id))?;
        if !die.cooldown_elapsed(now, self.config.roll_cooldown_ms) {
            let elapsed = die.last_roll_time.map_or(0, |last| now.saturating_sub(last));
            return Err(RejectReason::CooldownActive {
                die: id,
                remaining_ms: self.config.roll_cooldown_ms.saturating_sub(elapsed),
            });
        }

        let outcome = compute_reward(&self.catalog, &self.state, die, forced_face, rng);

        self.state.credit(outcome.reward);
        if let Some(die) = self.state.dice.get_mut(&id) {
            die.face = outcome.face;
            die.rolling = true;
            die.last_roll_time = Some(now);
        }
        self.check_invariants();

        debug!(
            "Rolled {} -> face {} reward {}{}",
            id,
            outcome.face,
            outcome.reward,
            if outcome.critical { " (critical)" } else { "" }
        );
        Ok(outcome)
    }

    /// Silent form of [`Self::try_roll_die`]: the reward, or 0.
    pub fn roll_die<R: RollRng + ?Sized>(
        &mut self,
        id: DieId,
        forced_face: Option<u8>,
        now: u64,
        rng: &mut R,
    ) -> u64 {
        match self.try_roll_die(id, forced_face, now, rng) {
            Ok(outcome) => outcome.reward,
            Err(reason) => {
                debug!("Roll rejected: {reason}");
                0
            }
        }
    }

    /// How long a roll shows as rolling, after roll-speed upgrades.
    #[must_use]
    pub fn rolling_display_ms(&self) -> u64 {
        let reduction: f64 = self
            .catalog
            .upgrades
            .iter()
            .filter_map(|u| match u.effect {
                UpgradeEffect::RollSpeed { per_level } => {
                    Some(per_level * f64::from(self.state.upgrade_level(&u.id)))
                }
                _ => None,
            })
            .sum();
        let factor = (1.0 - reduction).clamp(0.0, 1.0);
        (self.config.roll_display_ms as f64 * factor).round() as u64
    }

    /// Clear the rolling flag of `id` if its last roll happened at
    /// `roll_time`. A later roll supersedes the pending clear.
    ///
    /// Returns true if the flag was cleared.
    pub fn finish_roll(&mut self, id: DieId, roll_time: u64) -> bool {
        match self.state.dice.get_mut(&id) {
            Some(die) if die.rolling && die.last_roll_time == Some(roll_time) => {
                die.rolling = false;
                true
            }
            _ => false,
        }
    }

    /// Clear every rolling flag whose display window has elapsed at `now`.
    ///
    /// Returns how many dice settled.
    pub fn settle_rolls(&mut self, now: u64) -> usize {
        let window = self.rolling_display_ms();
        let mut settled = 0;
        for die in self.state.dice.values_mut().filter(|d| d.rolling) {
            let done = die
                .last_roll_time
                .map_or(true, |t| now.saturating_sub(t) >= window);
            if done {
                die.rolling = false;
                settled += 1;
            }
        }
        settled
    }

    /// Store a presentation position for a die. Never read by the engine.
    ///
    /// Returns false for unknown dice.
    pub fn update_die_position(&mut self, id: DieId, position: Vec2Fixed) -> bool {
        match self.state.dice.get_mut(&id) {
            Some(die) => {
                die.position = position;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Skills and upgrades
    // ------------------------------------------------------------------

    /// Buy a skill. Returns the tiers it unlocked.
    ///
    /// # Errors
    ///
    /// Rejects unknown or owned skills, unmet prerequisites and
    /// insufficient funds.
    pub fn try_purchase_skill(&mut self, id: &str) -> Result<Vec<TierKey>, RejectReason> {
        let skill = self
            .catalog
            .get_skill(id)
            .ok_or_else(|| RejectReason::UnknownSkill(id.to_string()))?;
        if self.state.has_skill(id) {
            return Err(RejectReason::AlreadyPurchased(id.to_string()));
        }
        let missing = self.resolver().missing_prerequisites(id);
        if !missing.is_empty() {
            return Err(RejectReason::MissingPrerequisites {
                skill: id.to_string(),
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }
        let cost = skill.cost;
        if !self.state.spend(cost) {
            return Err(RejectReason::InsufficientFunds {
                required: cost,
                available: self.state.currency,
            });
        }

        self.state.purchased_skills.insert(id.to_string());
        self.state.refresh_tiers(&self.catalog, self.config.cost_growth);
        let unlocked: Vec<TierKey> = self.catalog.tiers_unlocked_by(id).map(|t| t.key).collect();
        self.check_invariants();

        info!("Purchased skill {} for {}", id, cost);
        for tier in &unlocked {
            info!("Unlocked tier {}", tier);
        }
        Ok(unlocked)
    }

    /// Silent form of [`Self::try_purchase_skill`].
    pub fn purchase_skill(&mut self, id: &str) -> bool {
        self.try_purchase_skill(id)
            .map_err(|reason| debug!("Skill purchase rejected: {reason}"))
            .is_ok()
    }

    /// Buy the next level of an upgrade. Returns the new level.
    ///
    /// # Errors
    ///
    /// Rejects unknown, maxed or locked upgrades and insufficient funds.
    pub fn try_purchase_upgrade(&mut self, id: &str) -> Result<u32, RejectReason> {
        let upgrade = self
            .catalog
            .get_upgrade(id)
            .ok_or_else(|| RejectReason::UnknownUpgrade(id.to_string()))?;
        let level = self.state.upgrade_level(id);
        if level >= upgrade.max_level {
            return Err(RejectReason::MaxLevel(id.to_string()));
        }
        if !self.resolver().is_upgrade_available(id) {
            return Err(RejectReason::UpgradeLocked(id.to_string()));
        }
        let cost = upgrade.cost_at_level(level, self.config.upgrade_cost_growth);
        if !self.state.spend(cost) {
            return Err(RejectReason::InsufficientFunds {
                required: cost,
                available: self.state.currency,
            });
        }

        let level = level + 1;
        self.state.upgrade_levels.insert(id.to_string(), level);
        self.check_invariants();

        info!("Upgraded {} to level {} for {}", id, level, cost);
        Ok(level)
    }

    /// Silent form of [`Self::try_purchase_upgrade`].
    pub fn purchase_upgrade(&mut self, id: &str) -> bool {
        self.try_purchase_upgrade(id)
            .map_err(|reason| debug!("Upgrade purchase rejected: {reason}"))
            .is_ok()
    }

    /// Return to the starting state.
    pub fn reset_progression(&mut self) {
        self.state = ProgressionState::initial(
            &self.catalog,
            self.config.starting_currency,
            self.config.cost_growth,
        );
        info!("Progression reset");
    }

    // ------------------------------------------------------------------
    // Automation
    // ------------------------------------------------------------------

    /// Automation capabilities owned right now.
    #[must_use]
    pub fn automation(&self) -> AutomationProfile {
        AutomationProfile::from_state(&self.catalog, &self.state)
    }

    /// Die an automatic roll at `now` should pick, `None` when nothing is
    /// eligible.
    pub fn auto_roll_target<R: RollRng + ?Sized>(&self, now: u64, rng: &mut R) -> Option<DieId> {
        automation::pick_auto_roll_target(&self.state, now, self.config.roll_cooldown_ms, rng)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Flat copy of the state for saving.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Replace the state with a repaired copy of `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.into_state(&self.catalog, self.config.cost_growth);
        self.check_invariants();
        info!(
            "Restored progression: {} currency, {} dice, {} skills",
            self.state.currency,
            self.state.dice.len(),
            self.state.purchased_skills.len()
        );
    }

    /// Hash of the gameplay-relevant state.
    ///
    /// Positions are not included. Two economies that saw the same
    /// operations with the same random draws hash equal.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.state.currency.hash(&mut hasher);

        // Tiers in key order
        for (key, runtime) in &self.state.tiers {
            key.hash(&mut hasher);
            runtime.hash(&mut hasher);
        }

        // Dice in id order
        self.state.dice.len().hash(&mut hasher);
        for die in self.state.dice.values() {
            die.id.hash(&mut hasher);
            die.tier.hash(&mut hasher);
            die.face.hash(&mut hasher);
            die.rolling.hash(&mut hasher);
            die.last_roll_time.hash(&mut hasher);
        }

        self.state.purchased_skills.hash(&mut hasher);
        self.state.upgrade_levels.hash(&mut hasher);
        self.state.next_die_id.hash(&mut hasher);

        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn check_invariants(&self) {
        let violations = self
            .state
            .invariant_violations(&self.catalog, self.config.cost_growth);
        assert!(violations.is_empty(), "State invariants violated: {violations:?}");
    }

    #[cfg(not(feature = "debug-validation"))]
    #[allow(clippy::unused_self)]
    fn check_invariants(&self) {}
}
