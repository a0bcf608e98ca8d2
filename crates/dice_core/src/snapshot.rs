//! Flat persisted form of the player state.
//!
//! A snapshot carries only what cannot be derived: balance, dice, tier
//! counts, purchased skills and upgrade levels. Unlock flags and costs are
//! recomputed from the catalog on restore, so a snapshot written against an
//! older catalog still loads into a consistent state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::data::{Catalog, TierKey};
use crate::state::{DieInstance, ProgressionState, TierRuntimeState};

/// Serializable copy of a [`ProgressionState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Currency balance.
    pub currency: u64,
    /// Owned dice in purchase order.
    pub dice: Vec<DieInstance>,
    /// Tier runtime records as they were saved.
    #[serde(default)]
    pub tiers: BTreeMap<TierKey, TierRuntimeState>,
    /// Purchased skill ids.
    #[serde(default)]
    pub purchased_skills: BTreeSet<String>,
    /// Upgrade levels.
    #[serde(default)]
    pub upgrade_levels: BTreeMap<String, u32>,
    /// Next die id to hand out.
    #[serde(default)]
    pub next_die_id: u64,
}

impl Snapshot {
    /// Capture a state.
    #[must_use]
    pub fn capture(state: &ProgressionState) -> Self {
        Self {
            currency: state.currency,
            dice: state.dice.values().cloned().collect(),
            tiers: state.tiers.clone(),
            purchased_skills: state.purchased_skills.clone(),
            upgrade_levels: state.upgrade_levels.clone(),
            next_die_id: state.next_die_id,
        }
    }

    /// Rebuild a consistent state against `catalog`.
    ///
    /// Dice of tiers the catalog lacks or with the reserved id `u64::MAX`
    /// are dropped, faces are clamped to
    /// 1..=6, rolling flags are cleared, skills and upgrades whose
    /// prerequisites are not all present are dropped, and tier counts,
    /// unlock flags and costs are recomputed.
    #[must_use]
    pub fn into_state(self, catalog: &Catalog, cost_growth: f64) -> ProgressionState {
        let purchased_skills = retain_closed(self.purchased_skills, |id| {
            catalog.get_skill(id).map(|s| s.prerequisites.as_slice())
        });

        let leveled: BTreeSet<String> = self
            .upgrade_levels
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(id, _)| id.clone())
            .collect();
        let kept_upgrades = retain_closed(leveled, |id| {
            catalog.get_upgrade(id).map(|u| u.prerequisites.as_slice())
        });
        let upgrade_levels = self
            .upgrade_levels
            .into_iter()
            .filter(|(id, _)| kept_upgrades.contains(id))
            .filter_map(|(id, level)| {
                let max = catalog.get_upgrade(&id)?.max_level;
                Some((id, level.min(max)))
            })
            .collect();

        let mut dice = BTreeMap::new();
        let mut counts: BTreeMap<TierKey, u32> = BTreeMap::new();
        let mut next_die_id = self.next_die_id.max(1);
        for mut die in self.dice {
            if catalog.get_tier(die.tier).is_none() {
                warn!("Dropping die {} of unknown tier '{}'", die.id, die.tier);
                continue;
            }
            if die.id.0 == u64::MAX {
                warn!("Dropping die {} with an id outside the allocatable range", die.id);
                continue;
            }
            if dice.contains_key(&die.id) {
                warn!("Dropping duplicate die {}", die.id);
                continue;
            }
            die.face = die.face.clamp(1, 6);
            die.rolling = false;
            next_die_id = next_die_id.max(die.id.0.saturating_add(1));
            *counts.entry(die.tier).or_default() += 1;
            dice.insert(die.id, die);
        }

        let mut state = ProgressionState {
            currency: self.currency,
            tiers: counts
                .into_iter()
                .map(|(key, count)| {
                    (
                        key,
                        TierRuntimeState {
                            count,
                            ..TierRuntimeState::default()
                        },
                    )
                })
                .collect(),
            dice,
            purchased_skills,
            upgrade_levels,
            next_die_id,
        };
        state.refresh_tiers(catalog, cost_growth);
        state
    }
}

/// Keep the largest subset of `ids` in which every member is known and has
/// all of its prerequisites in the subset.
fn retain_closed<'c, F>(mut ids: BTreeSet<String>, prerequisites: F) -> BTreeSet<String>
where
    F: Fn(&str) -> Option<&'c [String]>,
{
    loop {
        let dropped: Vec<String> = ids
            .iter()
            .filter(|id| match prerequisites(id) {
                None => true,
                Some(prereqs) => !prereqs.iter().all(|p| ids.contains(p)),
            })
            .cloned()
            .collect();
        if dropped.is_empty() {
            return ids;
        }
        for id in dropped {
            warn!("Dropping '{id}' from snapshot: unknown or missing prerequisites");
            ids.remove(&id);
        }
    }
}
