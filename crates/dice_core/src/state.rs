//! Mutable player progression.
//!
//! [`ProgressionState`] is the aggregate root: balance, owned dice, per-tier
//! runtime records, purchased skills and upgrade levels. It knows how to
//! move currency and how to recompute derived tier fields, but it never
//! decides whether a purchase is allowed. That is the economy's job.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{Catalog, TierKey, UnlockCondition};
use crate::math::Vec2Fixed;

/// Unique identifier of a purchased die.
///
/// Allocated from a monotonically increasing counter, so ordering by id is
/// purchase order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DieId(pub u64);

impl fmt::Display for DieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "die-{}", self.0)
    }
}

/// A purchased die.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DieInstance {
    /// Unique id.
    pub id: DieId,
    /// Tier this die belongs to.
    pub tier: TierKey,
    /// Face currently shown (1-6).
    pub face: u8,
    /// Whether the rolling display is active.
    pub rolling: bool,
    /// Time of the last rewarded roll in milliseconds, `None` if never rolled.
    pub last_roll_time: Option<u64>,
    /// Where the presentation layer placed the die.
    #[serde(default)]
    pub position: Vec2Fixed,
}

impl DieInstance {
    /// A fresh die showing 1.
    #[must_use]
    pub fn new(id: DieId, tier: TierKey) -> Self {
        Self {
            id,
            tier,
            face: 1,
            rolling: false,
            last_roll_time: None,
            position: Vec2Fixed::ZERO,
        }
    }

    /// Whether the cooldown since the last roll has elapsed at `now`.
    #[must_use]
    pub fn cooldown_elapsed(&self, now: u64, cooldown_ms: u64) -> bool {
        match self.last_roll_time {
            None => true,
            Some(last) => now.saturating_sub(last) >= cooldown_ms,
        }
    }
}

/// Per-tier mutable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TierRuntimeState {
    /// Whether dice of this tier can be bought.
    pub unlocked: bool,
    /// Dice of this tier owned.
    pub count: u32,
    /// Price of the next die.
    pub cost: u64,
}

/// Aggregate player state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressionState {
    /// Currency balance.
    pub currency: u64,
    /// Runtime record for every catalog tier.
    pub tiers: BTreeMap<TierKey, TierRuntimeState>,
    /// Owned dice in purchase order.
    pub dice: BTreeMap<DieId, DieInstance>,
    /// Purchased skill ids. Append-only.
    pub purchased_skills: BTreeSet<String>,
    /// Levels of legacy upgrades with at least one level.
    pub upgrade_levels: BTreeMap<String, u32>,
    /// Next die id to hand out.
    pub next_die_id: u64,
}

impl ProgressionState {
    /// Starting state for a catalog.
    #[must_use]
    pub fn initial(catalog: &Catalog, starting_currency: u64, cost_growth: f64) -> Self {
        let mut state = Self {
            currency: starting_currency,
            tiers: BTreeMap::new(),
            dice: BTreeMap::new(),
            purchased_skills: BTreeSet::new(),
            upgrade_levels: BTreeMap::new(),
            next_die_id: 1,
        };
        state.refresh_tiers(catalog, cost_growth);
        state
    }

    /// Check if the balance covers `cost`.
    #[must_use]
    pub const fn can_afford(&self, cost: u64) -> bool {
        self.currency >= cost
    }

    /// Spend currency if available.
    ///
    /// Returns true if the transaction succeeded. Never goes negative.
    pub fn spend(&mut self, cost: u64) -> bool {
        if self.currency >= cost {
            self.currency -= cost;
            true
        } else {
            false
        }
    }

    /// Add currency, saturating at `u64::MAX`.
    pub fn credit(&mut self, amount: u64) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Whether a skill has been purchased.
    #[must_use]
    pub fn has_skill(&self, id: &str) -> bool {
        self.purchased_skills.contains(id)
    }

    /// Current level of an upgrade (0 when never bought).
    #[must_use]
    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.upgrade_levels.get(id).copied().unwrap_or(0)
    }

    /// Runtime record of a tier.
    #[must_use]
    pub fn tier(&self, key: TierKey) -> Option<&TierRuntimeState> {
        self.tiers.get(&key)
    }

    /// Look up a die.
    #[must_use]
    pub fn die(&self, id: DieId) -> Option<&DieInstance> {
        self.dice.get(&id)
    }

    /// Allocate the next die id. `None` once ids are exhausted; `u64::MAX`
    /// is never handed out.
    pub fn allocate_die_id(&mut self) -> Option<DieId> {
        let next = self.next_die_id.checked_add(1)?;
        let id = DieId(self.next_die_id);
        self.next_die_id = next;
        Some(id)
    }

    /// Recompute `unlocked` and `cost` of every catalog tier from the
    /// purchased set and owned counts. Tiers missing from the catalog are
    /// dropped.
    pub fn refresh_tiers(&mut self, catalog: &Catalog, cost_growth: f64) {
        let mut tiers = BTreeMap::new();
        for data in &catalog.tiers {
            let count = self.tiers.get(&data.key).map_or(0, |t| t.count);
            let unlocked = match &data.unlocked_by {
                UnlockCondition::Start => true,
                UnlockCondition::Skill(id) => self.has_skill(id),
            };
            tiers.insert(
                data.key,
                TierRuntimeState {
                    unlocked,
                    count,
                    cost: data.scaled_cost(count, cost_growth),
                },
            );
        }
        self.tiers = tiers;
    }

    /// Check the structural invariants against a catalog.
    ///
    /// Returns every violation found. Used by `debug-validation` builds and
    /// by tests; a correct engine never produces any.
    #[must_use]
    pub fn invariant_violations(&self, catalog: &Catalog, cost_growth: f64) -> Vec<String> {
        let mut violations = Vec::new();

        for skill_id in &self.purchased_skills {
            match catalog.get_skill(skill_id) {
                None => violations.push(format!("Purchased unknown skill '{skill_id}'")),
                Some(skill) => {
                    for prereq in &skill.prerequisites {
                        if !self.has_skill(prereq) {
                            violations.push(format!(
                                "Skill '{skill_id}' purchased without prerequisite '{prereq}'"
                            ));
                        }
                    }
                }
            }
        }

        for data in &catalog.tiers {
            let Some(runtime) = self.tiers.get(&data.key) else {
                violations.push(format!("Tier '{}' has no runtime record", data.key));
                continue;
            };
            let expected = match &data.unlocked_by {
                UnlockCondition::Start => true,
                UnlockCondition::Skill(id) => self.has_skill(id),
            };
            if runtime.unlocked != expected {
                violations.push(format!("Tier '{}' unlock flag is stale", data.key));
            }
            if runtime.cost != data.scaled_cost(runtime.count, cost_growth) {
                violations.push(format!("Tier '{}' cost is stale", data.key));
            }
            let owned = self.dice.values().filter(|d| d.tier == data.key).count();
            if owned != runtime.count as usize {
                violations.push(format!(
                    "Tier '{}' count {} does not match {} owned dice",
                    data.key, runtime.count, owned
                ));
            }
        }

        for die in self.dice.values() {
            if catalog.get_tier(die.tier).is_none() {
                violations.push(format!("Die {} references unknown tier '{}'", die.id, die.tier));
            }
            if !(1..=6).contains(&die.face) {
                violations.push(format!("Die {} shows face {}", die.id, die.face));
            }
            if die.id.0 >= self.next_die_id {
                violations.push(format!("Die {} is ahead of the id counter", die.id));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let catalog = Catalog::builtin();
        let state = ProgressionState::initial(&catalog, 100, 1.15);

        assert_eq!(state.currency, 100);
        assert!(state.dice.is_empty());
        assert!(state.purchased_skills.is_empty());
        assert_eq!(state.tiers.len(), 9);
        assert!(state.tier(TierKey::Steel).unwrap().unlocked);
        assert!(!state.tier(TierKey::Copper).unwrap().unlocked);
        assert_eq!(state.tier(TierKey::Steel).unwrap().cost, 10);
        assert!(state.invariant_violations(&catalog, 1.15).is_empty());
    }

    #[test]
    fn test_spend_never_goes_negative() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 100, 1.15);

        assert!(state.can_afford(50));
        assert!(state.spend(50));
        assert_eq!(state.currency, 50);

        assert!(!state.can_afford(100));
        assert!(!state.spend(100));
        assert_eq!(state.currency, 50); // Unchanged
    }

    #[test]
    fn test_credit_saturates() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, u64::MAX - 1, 1.15);
        state.credit(10);
        assert_eq!(state.currency, u64::MAX);
    }

    #[test]
    fn test_refresh_tiers_tracks_skills() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 0, 1.15);
        state.purchased_skills.insert("MAIN-03".to_string());
        state.refresh_tiers(&catalog, 1.15);
        assert!(state.tier(TierKey::Copper).unwrap().unlocked);
    }

    #[test]
    fn test_die_ids_increase() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 0, 1.15);
        let a = state.allocate_die_id().unwrap();
        let b = state.allocate_die_id().unwrap();
        assert!(b > a);
        assert_eq!(a.to_string(), "die-1");
    }

    #[test]
    fn test_die_ids_exhaust_without_overflow() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 0, 1.15);
        state.next_die_id = u64::MAX - 1;
        assert_eq!(state.allocate_die_id(), Some(DieId(u64::MAX - 1)));
        assert_eq!(state.allocate_die_id(), None);
        assert_eq!(state.next_die_id, u64::MAX);
    }

    #[test]
    fn test_cooldown_elapsed() {
        let mut die = DieInstance::new(DieId(1), TierKey::Steel);
        assert!(die.cooldown_elapsed(0, 300));
        die.last_roll_time = Some(1_000);
        assert!(!die.cooldown_elapsed(1_299, 300));
        assert!(die.cooldown_elapsed(1_300, 300));
    }

    #[test]
    fn test_invariant_violations_detect_stale_unlock() {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 0, 1.15);
        state.purchased_skills.insert("MAIN-03".to_string());
        let violations = state.invariant_violations(&catalog, 1.15);
        assert!(violations.iter().any(|v| v.contains("unlock flag is stale")));
        assert!(violations.iter().any(|v| v.contains("without prerequisite")));
    }
}
