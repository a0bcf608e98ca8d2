//! The full static catalog: tiers, skills and upgrades.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::skill_data::{SkillData, SkillEffect};
use super::tier_data::{TierData, TierKey, UnlockCondition};
use super::upgrade_data::{UpgradeData, UpgradeEffect};
use crate::error::{CatalogError, Result};

/// The catalog shipped with the game.
const BUILTIN_CATALOG: &str = include_str!("../../assets/data/catalog.ron");

/// Complete immutable game data.
///
/// Loaded once, validated, then shared behind an `Arc`. Nothing in here is
/// ever mutated during play; runtime flags live in
/// [`ProgressionState`](crate::state::ProgressionState).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Die tiers in progression order.
    pub tiers: Vec<TierData>,

    /// Skill tree nodes in display order.
    pub skills: Vec<SkillData>,

    /// Levelled legacy upgrades.
    #[serde(default)]
    pub upgrades: Vec<UpgradeData>,
}

impl Catalog {
    /// The built-in catalog, parsed on first use.
    ///
    /// # Panics
    ///
    /// Panics if the embedded data is invalid, which the test suite rules out.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        static BUILTIN: OnceLock<Arc<Catalog>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                Arc::new(
                    Self::from_ron_str("builtin", BUILTIN_CATALOG)
                        .expect("embedded catalog must be valid"),
                )
            })
            .clone()
    }

    /// Parse and validate a catalog from RON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or the data is inconsistent.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let catalog: Self = ron::from_str(text).map_err(|e| CatalogError::ParseError {
            source_name: source_name.to_string(),
            source: e,
        })?;

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(CatalogError::ValidationError {
                source_name: source_name.to_string(),
                errors,
            });
        }

        tracing::debug!(
            "Loaded catalog '{}' with {} tiers, {} skills, {} upgrades",
            source_name,
            catalog.tiers.len(),
            catalog.skills.len(),
            catalog.upgrades.len()
        );
        Ok(catalog)
    }

    /// Find a tier by key.
    #[must_use]
    pub fn get_tier(&self, key: TierKey) -> Option<&TierData> {
        self.tiers.iter().find(|t| t.key == key)
    }

    /// Find a skill by id.
    #[must_use]
    pub fn get_skill(&self, id: &str) -> Option<&SkillData> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// Find an upgrade by id.
    #[must_use]
    pub fn get_upgrade(&self, id: &str) -> Option<&UpgradeData> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    /// Tiers whose unlock condition names `skill_id`.
    pub fn tiers_unlocked_by<'a>(&'a self, skill_id: &'a str) -> impl Iterator<Item = &'a TierData> {
        self.tiers
            .iter()
            .filter(move |t| t.unlocked_by.skill_id() == Some(skill_id))
    }

    /// Skill prerequisite graph as an adjacency map (id -> prerequisite ids).
    #[must_use]
    pub fn prerequisite_map(&self) -> BTreeMap<&str, &[String]> {
        self.skills
            .iter()
            .map(|s| (s.id.as_str(), s.prerequisites.as_slice()))
            .collect()
    }

    /// Validate internal consistency.
    ///
    /// Checks for:
    /// - Duplicate tier keys, skill ids and upgrade ids
    /// - Unlock conditions and prerequisites naming unknown skills
    /// - Prerequisite cycles in the skill tree and the upgrade table
    /// - Effects naming tiers that are not in the catalog
    /// - Zero costs and probabilities outside [0, 1]
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen_tiers = HashSet::new();
        for tier in &self.tiers {
            if !seen_tiers.insert(tier.key) {
                errors.push(format!("Duplicate tier '{}'", tier.key));
            }
            if tier.base_cost == 0 {
                errors.push(format!("Tier '{}' has zero base cost", tier.key));
            }
            if !(tier.multiplier.is_finite() && tier.multiplier >= 0.0) {
                errors.push(format!("Tier '{}' has invalid multiplier", tier.key));
            }
            if let UnlockCondition::Skill(id) = &tier.unlocked_by {
                if self.get_skill(id).is_none() {
                    errors.push(format!("Tier '{}' unlocked by unknown skill '{}'", tier.key, id));
                }
            }
        }
        if !self.tiers.iter().any(TierData::is_starter) {
            errors.push("No tier is unlocked at start".to_string());
        }

        let mut seen_skills = HashSet::new();
        for skill in &self.skills {
            if !seen_skills.insert(skill.id.as_str()) {
                errors.push(format!("Duplicate skill '{}'", skill.id));
            }
            if skill.cost == 0 {
                errors.push(format!("Skill '{}' has zero cost", skill.id));
            }
            for prereq in &skill.prerequisites {
                if self.get_skill(prereq).is_none() {
                    errors.push(format!(
                        "Skill '{}' has unknown prerequisite '{}'",
                        skill.id, prereq
                    ));
                }
            }
            if let Some(effect) = &skill.effect {
                self.check_skill_effect(&skill.id, effect, &mut errors);
            }
        }

        let mut seen_upgrades = HashSet::new();
        for upgrade in &self.upgrades {
            if !seen_upgrades.insert(upgrade.id.as_str()) {
                errors.push(format!("Duplicate upgrade '{}'", upgrade.id));
            }
            if upgrade.cost == 0 || upgrade.max_level == 0 {
                errors.push(format!("Upgrade '{}' can never be bought", upgrade.id));
            }
            for prereq in &upgrade.prerequisites {
                if self.get_upgrade(prereq).is_none() {
                    errors.push(format!(
                        "Upgrade '{}' has unknown prerequisite '{}'",
                        upgrade.id, prereq
                    ));
                }
            }
            if let UpgradeEffect::TierMultiplier { tier, .. } = upgrade.effect {
                if self.get_tier(tier).is_none() {
                    errors.push(format!(
                        "Upgrade '{}' targets unknown tier '{}'",
                        upgrade.id, tier
                    ));
                }
            }
        }

        if let Some(cycle) = find_cycle(&self.prerequisite_map()) {
            errors.push(format!("Skill prerequisite cycle: {}", cycle.join(" -> ")));
        }
        let upgrade_graph: BTreeMap<&str, &[String]> = self
            .upgrades
            .iter()
            .map(|u| (u.id.as_str(), u.prerequisites.as_slice()))
            .collect();
        if let Some(cycle) = find_cycle(&upgrade_graph) {
            errors.push(format!("Upgrade prerequisite cycle: {}", cycle.join(" -> ")));
        }

        errors
    }

    fn check_skill_effect(&self, id: &str, effect: &SkillEffect, errors: &mut Vec<String>) {
        let chance = match *effect {
            SkillEffect::TierMultiplier { tier, .. } => {
                if self.get_tier(tier).is_none() {
                    errors.push(format!("Skill '{id}' hones unknown tier '{tier}'"));
                }
                None
            }
            SkillEffect::HighRollChance { chance }
            | SkillEffect::CriticalHit { chance }
            | SkillEffect::SixesSense { chance } => Some(chance),
            SkillEffect::AutoRoll { interval_ms } => {
                if interval_ms == 0 {
                    errors.push(format!("Skill '{id}' has zero auto-roll interval"));
                }
                None
            }
            _ => None,
        };
        if let Some(p) = chance {
            if !(0.0..=1.0).contains(&p) {
                errors.push(format!("Skill '{id}' has probability {p} outside [0, 1]"));
            }
        }
    }
}

/// Depth-first search for a cycle in a prerequisite graph.
///
/// Returns the ids along the first cycle found, starting and ending with
/// the same id. Edges to unknown ids are ignored here; they are reported
/// separately.
fn find_cycle(graph: &BTreeMap<&str, &[String]>) -> Option<Vec<String>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        node: &'a str,
        graph: &BTreeMap<&'a str, &'a [String]>,
        marks: &mut BTreeMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match marks.get(node) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            None => {}
        }

        marks.insert(node, Mark::Visiting);
        path.push(node);
        if let Some(prereqs) = graph.get(node) {
            for prereq in prereqs.iter() {
                let Some((key, _)) = graph.get_key_value(prereq.as_str()) else {
                    continue;
                };
                if let Some(cycle) = visit(*key, graph, marks, path) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut marks = BTreeMap::new();
    let mut path = Vec::new();
    for node in graph.keys() {
        if let Some(cycle) = visit(*node, graph, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}
