//! Hover and auto-roll capabilities unlocked by the Automation branch and
//! the `hover_radius` upgrade.
//!
//! The engine only answers which capabilities are owned and which die an
//! automatic roll should pick. Scheduling the periodic trigger belongs to
//! the host (see `dice_headless::session`).

use serde::{Deserialize, Serialize};

use crate::data::{Catalog, SkillEffect, UpgradeEffect};
use crate::rng::RollRng;
use crate::state::{DieId, ProgressionState};

/// Automation capabilities derived from purchased skills and upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AutomationProfile {
    /// Dice roll when hovered.
    pub hover_roll: bool,
    /// Percent added to the hover activation radius.
    pub hover_radius_percent: f64,
    /// Pixels added to the hover activation radius by upgrade levels.
    #[serde(default)]
    pub hover_radius_px: f64,
    /// Interval between automatic rolls, `None` when auto-roll is not owned.
    pub auto_roll_interval_ms: Option<u64>,
}

impl AutomationProfile {
    /// Derive the profile. When several auto-roll skills are owned the
    /// shortest interval wins.
    #[must_use]
    pub fn from_state(catalog: &Catalog, state: &ProgressionState) -> Self {
        let mut profile = Self::default();
        let owned = catalog
            .skills
            .iter()
            .filter(|s| state.has_skill(&s.id))
            .filter_map(|s| s.effect.as_ref());
        for effect in owned {
            match *effect {
                SkillEffect::HoverRoll => profile.hover_roll = true,
                SkillEffect::HoverRadius { percent } => profile.hover_radius_percent += percent,
                SkillEffect::AutoRoll { interval_ms } => {
                    profile.auto_roll_interval_ms = Some(
                        profile
                            .auto_roll_interval_ms
                            .map_or(interval_ms, |current| current.min(interval_ms)),
                    );
                }
                _ => {}
            }
        }
        for upgrade in &catalog.upgrades {
            if let UpgradeEffect::HoverRadius { per_level } = upgrade.effect {
                let level = f64::from(state.upgrade_level(&upgrade.id));
                profile.hover_radius_px += per_level * level;
            }
        }
        profile
    }
}

/// Dice that an automatic roll may pick at `now`: not rolling and out of
/// cooldown, in purchase order.
#[must_use]
pub fn eligible_dice(state: &ProgressionState, now: u64, cooldown_ms: u64) -> Vec<DieId> {
    state
        .dice
        .values()
        .filter(|d| !d.rolling && d.cooldown_elapsed(now, cooldown_ms))
        .map(|d| d.id)
        .collect()
}

/// Pick an eligible die uniformly, `None` when nothing is eligible.
pub fn pick_auto_roll_target<R: RollRng + ?Sized>(
    state: &ProgressionState,
    now: u64,
    cooldown_ms: u64,
    rng: &mut R,
) -> Option<DieId> {
    let eligible = eligible_dice(state, now, cooldown_ms);
    if eligible.is_empty() {
        return None;
    }
    Some(eligible[rng.pick(eligible.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TierKey;
    use crate::rng::SeededRng;
    use crate::state::DieInstance;

    fn state_with(skills: &[&str]) -> (std::sync::Arc<Catalog>, ProgressionState) {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 0, 1.15);
        for s in skills {
            state.purchased_skills.insert((*s).to_string());
        }
        (catalog, state)
    }

    fn add_die(state: &mut ProgressionState) -> DieId {
        let id = state.allocate_die_id().unwrap();
        state.dice.insert(id, DieInstance::new(id, TierKey::Steel));
        id
    }

    #[test]
    fn test_profile_without_skills() {
        let (catalog, state) = state_with(&[]);
        let profile = AutomationProfile::from_state(&catalog, &state);
        assert_eq!(profile, AutomationProfile::default());
    }

    #[test]
    fn test_profile_progression() {
        let (catalog, state) = state_with(&["MAIN-01", "AUTO-01", "AUTO-02"]);
        let profile = AutomationProfile::from_state(&catalog, &state);
        assert!(profile.hover_roll);
        assert!((profile.hover_radius_percent - 30.0).abs() < f64::EPSILON);
        assert_eq!(profile.auto_roll_interval_ms, None);

        let (catalog, state) = state_with(&["MAIN-01", "AUTO-01", "AUTO-02", "AUTO-03"]);
        let profile = AutomationProfile::from_state(&catalog, &state);
        assert_eq!(profile.auto_roll_interval_ms, Some(10_000));

        let (catalog, state) =
            state_with(&["MAIN-01", "AUTO-01", "AUTO-02", "AUTO-03", "AUTO-04"]);
        let profile = AutomationProfile::from_state(&catalog, &state);
        assert_eq!(profile.auto_roll_interval_ms, Some(5_000));
    }

    #[test]
    fn test_hover_radius_upgrade_levels_widen_radius() {
        let (catalog, mut state) = state_with(&["MAIN-01", "AUTO-01", "AUTO-02"]);
        state.upgrade_levels.insert("hover_radius".to_string(), 3);
        let profile = AutomationProfile::from_state(&catalog, &state);
        assert!((profile.hover_radius_px - 15.0).abs() < f64::EPSILON);
        assert!((profile.hover_radius_percent - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eligible_excludes_rolling_and_cooling_dice() {
        let (_, mut state) = state_with(&[]);
        let idle = add_die(&mut state);
        let rolling = add_die(&mut state);
        let cooling = add_die(&mut state);

        state.dice.get_mut(&rolling).unwrap().rolling = true;
        state.dice.get_mut(&cooling).unwrap().last_roll_time = Some(900);

        assert_eq!(eligible_dice(&state, 1_000, 300), vec![idle]);
        assert_eq!(eligible_dice(&state, 1_200, 300), vec![idle, cooling]);
    }

    #[test]
    fn test_pick_none_when_nothing_eligible() {
        let (_, state) = state_with(&[]);
        let mut rng = SeededRng::new(3);
        assert_eq!(pick_auto_roll_target(&state, 0, 300, &mut rng), None);
    }

    #[test]
    fn test_pick_covers_all_eligible() {
        let (_, mut state) = state_with(&[]);
        let ids: Vec<DieId> = (0..3).map(|_| add_die(&mut state)).collect();
        let mut rng = SeededRng::new(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..200 {
            seen.insert(pick_auto_roll_target(&state, 0, 300, &mut rng).unwrap());
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), ids);
    }
}
