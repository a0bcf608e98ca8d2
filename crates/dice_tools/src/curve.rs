//! Price curves for catalog tuning.

use serde::Serialize;

use dice_core::data::{Catalog, TierKey};

/// Price of one die on a tier's curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CostPoint {
    /// Dice already owned when buying this one.
    pub owned: u32,
    /// Price of this die.
    pub cost: u64,
    /// Total spent on the tier including this die.
    pub cumulative: u64,
}

/// Prices of the first `count` dice of `tier`, or `None` if the catalog
/// has no such tier.
#[must_use]
pub fn tier_cost_curve(
    catalog: &Catalog,
    tier: TierKey,
    count: u32,
    growth: f64,
) -> Option<Vec<CostPoint>> {
    let data = catalog.get_tier(tier)?;
    let mut cumulative = 0u64;
    let points = (0..count)
        .map(|owned| {
            let cost = data.scaled_cost(owned, growth);
            cumulative = cumulative.saturating_add(cost);
            CostPoint {
                owned,
                cost,
                cumulative,
            }
        })
        .collect();
    Some(points)
}

/// One skill on the way to a target skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    /// Skill id.
    pub id: String,
    /// Its price.
    pub cost: u64,
}

/// Every skill needed to buy `target` from scratch, prerequisites first,
/// or `None` if the skill is unknown.
///
/// Buying the steps in order is always legal.
#[must_use]
pub fn skill_path(catalog: &Catalog, target: &str) -> Option<Vec<PathStep>> {
    catalog.get_skill(target)?;
    let mut path = Vec::new();
    visit(catalog, target, &mut path);
    Some(path)
}

fn visit(catalog: &Catalog, id: &str, path: &mut Vec<PathStep>) {
    if path.iter().any(|step| step.id == id) {
        return;
    }
    let Some(skill) = catalog.get_skill(id) else {
        return;
    };
    for prereq in &skill.prerequisites {
        visit(catalog, prereq, path);
    }
    path.push(PathStep {
        id: skill.id.clone(),
        cost: skill.cost,
    });
}

/// Total price of a path.
#[must_use]
pub fn path_cost(path: &[PathStep]) -> u64 {
    path.iter().map(|step| step.cost).fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steel_curve() {
        let curve = tier_cost_curve(&Catalog::builtin(), TierKey::Steel, 4, 1.15).unwrap();
        let costs: Vec<u64> = curve.iter().map(|p| p.cost).collect();
        // 10, 11.5, 13.225, 15.20875 floored
        assert_eq!(costs, vec![10, 11, 13, 15]);
        assert_eq!(curve[3].cumulative, 49);
    }

    #[test]
    fn test_empty_curve() {
        let curve = tier_cost_curve(&Catalog::builtin(), TierKey::Gold, 0, 1.15).unwrap();
        assert!(curve.is_empty());
    }

    #[test]
    fn test_copper_path() {
        let path = skill_path(&Catalog::builtin(), "MAIN-03").unwrap();
        let ids: Vec<&str> = path.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["MAIN-01", "MAIN-02", "MAIN-03"]);
        assert_eq!(path_cost(&path), 155);
    }

    #[test]
    fn test_unknown_skill() {
        assert_eq!(skill_path(&Catalog::builtin(), "MAIN-99"), None);
    }
}
