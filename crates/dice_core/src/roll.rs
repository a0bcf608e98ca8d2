//! Reward calculation for a single roll.
//!
//! The pipeline runs in a fixed order and later steps consume the output
//! of earlier ones:
//!
//! 1. Face: forced, luck-biased towards {4, 5, 6}, or a plain d6
//! 2. Base value: sixes sense, two override, flat ones, low-roll boost
//! 3. Tier multiplier: catalog multiplier plus honing
//! 4. Legacy multiplier: levelled tier upgrades, sixes bonus
//! 5. Global income multiplier
//! 6. `floor(base * tier * legacy * global)`
//! 7. High-roll boost on the floored reward
//! 8. Critical hit doubling
//!
//! The high-roll boost runs after the multipliers; the low-roll transforms
//! run before them.
//!
//! Nothing here mutates state. Chance only enters through [`RollRng`], and
//! a draw is only consumed when the matching modifier is owned.

use crate::data::{Catalog, SkillEffect, TierKey, UpgradeEffect};
use crate::rng::RollRng;
use crate::state::{DieInstance, ProgressionState};

/// Result of a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollOutcome {
    /// Face shown after the roll (1-6).
    pub face: u8,
    /// Currency earned.
    pub reward: u64,
    /// The critical hit doubled the reward.
    pub critical: bool,
    /// A six was valued as seven.
    pub sixes_sense: bool,
}

impl RollOutcome {
    /// Outcome that leaves the die as it was and pays nothing.
    #[must_use]
    pub const fn unchanged(face: u8) -> Self {
        Self {
            face,
            reward: 0,
            critical: false,
            sixes_sense: false,
        }
    }
}

/// Tier-independent modifiers from purchased skills and upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RollModifiers {
    /// Probability of drawing from {4, 5, 6}, clamped to [0, 1].
    pub high_roll_bias: f64,
    /// Probability of doubling the reward.
    pub critical_chance: f64,
    /// Probability of valuing a six as seven.
    pub sixes_sense_chance: f64,
    /// Flat amount added to a rolled 1.
    pub flat_ones: f64,
    /// Replacement value for a rolled 2.
    pub two_override: Option<f64>,
    /// Percent added to 1, 2 and 3 before multipliers.
    pub low_roll_percent: f64,
    /// Percent added to 4, 5 and 6 after multipliers.
    pub high_roll_percent: f64,
    /// Sum of global income bonuses.
    pub global_income: f64,
    /// Factor applied to the legacy multiplier on a six, 1.0 when not owned.
    pub sixes_bonus: f64,
}

impl RollModifiers {
    /// Collect modifiers from purchased skills (in catalog order) and
    /// upgrade levels.
    #[must_use]
    pub fn collect(catalog: &Catalog, state: &ProgressionState) -> Self {
        let mut mods = Self {
            sixes_bonus: 1.0,
            ..Self::default()
        };

        let owned = catalog
            .skills
            .iter()
            .filter(|s| state.has_skill(&s.id))
            .filter_map(|s| s.effect.as_ref());
        for effect in owned {
            match *effect {
                SkillEffect::GlobalIncome { magnitude } => mods.global_income += magnitude,
                SkillEffect::HighRollChance { chance } => mods.high_roll_bias += chance,
                SkillEffect::CriticalHit { chance } => {
                    mods.critical_chance = mods.critical_chance.max(chance);
                }
                SkillEffect::SixesSense { chance } => {
                    mods.sixes_sense_chance = mods.sixes_sense_chance.max(chance);
                }
                SkillEffect::FlatOnes { amount } => mods.flat_ones += amount,
                SkillEffect::TwoOverride { value } => mods.two_override = Some(value),
                SkillEffect::LowRollBoost { percent } => mods.low_roll_percent += percent,
                SkillEffect::HighRollBoost { percent } => mods.high_roll_percent += percent,
                SkillEffect::TierMultiplier { .. }
                | SkillEffect::HoverRoll
                | SkillEffect::HoverRadius { .. }
                | SkillEffect::AutoRoll { .. } => {}
            }
        }

        for upgrade in &catalog.upgrades {
            let level = state.upgrade_level(&upgrade.id);
            if level == 0 {
                continue;
            }
            match upgrade.effect {
                UpgradeEffect::HighRollChance { per_level } => {
                    mods.high_roll_bias += per_level * f64::from(level);
                }
                UpgradeEffect::SixesBonus { factor } => mods.sixes_bonus *= factor,
                UpgradeEffect::TierMultiplier { .. }
                | UpgradeEffect::RollSpeed { .. }
                | UpgradeEffect::HoverRadius { .. }
                | UpgradeEffect::Gate => {}
            }
        }

        mods.high_roll_bias = mods.high_roll_bias.clamp(0.0, 1.0);
        mods
    }
}

/// Tier multiplier after honing: catalog multiplier plus every purchased
/// honing magnitude aimed at `tier`. `None` for tiers not in the catalog.
#[must_use]
pub fn effective_tier_multiplier(
    catalog: &Catalog,
    state: &ProgressionState,
    tier: TierKey,
) -> Option<f64> {
    let data = catalog.get_tier(tier)?;
    let honing: f64 = catalog
        .skills
        .iter()
        .filter(|s| state.has_skill(&s.id))
        .filter_map(|s| s.honing_for(tier))
        .sum();
    Some(data.multiplier + honing)
}

/// Additive level-based bonus from legacy tier upgrades, before the sixes
/// bonus.
#[must_use]
pub fn legacy_tier_multiplier(catalog: &Catalog, state: &ProgressionState, tier: TierKey) -> f64 {
    let bonus: f64 = catalog
        .upgrades
        .iter()
        .filter_map(|u| match u.effect {
            UpgradeEffect::TierMultiplier { tier: t, per_level } if t == tier => {
                Some(per_level * f64::from(state.upgrade_level(&u.id)))
            }
            _ => None,
        })
        .sum();
    1.0 + bonus
}

/// Compute the outcome of rolling `die`.
///
/// A `forced_face` in 1..=6 skips the face draw; anything else falls back
/// to a random draw. A die whose tier is missing from the catalog pays
/// nothing and keeps its face.
pub fn compute_reward<R: RollRng + ?Sized>(
    catalog: &Catalog,
    state: &ProgressionState,
    die: &DieInstance,
    forced_face: Option<u8>,
    rng: &mut R,
) -> RollOutcome {
    let Some(tier_multiplier) = effective_tier_multiplier(catalog, state, die.tier) else {
        return RollOutcome::unchanged(die.face);
    };
    let mods = RollModifiers::collect(catalog, state);

    let face = match forced_face {
        Some(f) if (1..=6).contains(&f) => f,
        _ => draw_face(&mods, rng),
    };

    let (value, sixes_sense) = base_value(face, &mods, rng);

    let mut legacy = legacy_tier_multiplier(catalog, state, die.tier);
    if face == 6 {
        legacy *= mods.sixes_bonus;
    }

    let global = 1.0 + mods.global_income;

    let mut reward = floor_to_u64(value * tier_multiplier * legacy * global);

    if face >= 4 && mods.high_roll_percent > 0.0 {
        reward = floor_to_u64(reward as f64 * (1.0 + mods.high_roll_percent / 100.0));
    }

    let critical = mods.critical_chance > 0.0 && rng.chance(mods.critical_chance);
    if critical {
        reward = reward.saturating_mul(2);
    }

    RollOutcome {
        face,
        reward,
        critical,
        sixes_sense,
    }
}

fn draw_face<R: RollRng + ?Sized>(mods: &RollModifiers, rng: &mut R) -> u8 {
    if mods.high_roll_bias > 0.0 && rng.chance(mods.high_roll_bias) {
        rng.high_face()
    } else {
        rng.d6()
    }
}

/// Face value before multipliers, and whether sixes sense fired.
fn base_value<R: RollRng + ?Sized>(face: u8, mods: &RollModifiers, rng: &mut R) -> (f64, bool) {
    let mut value = f64::from(face);
    let mut sixes_sense = false;

    if face == 6 && mods.sixes_sense_chance > 0.0 && rng.chance(mods.sixes_sense_chance) {
        value = 7.0;
        sixes_sense = true;
    }
    if face == 2 {
        if let Some(v) = mods.two_override {
            value = v;
        }
    }
    if face == 1 {
        value += mods.flat_ones;
    }
    if face <= 3 && mods.low_roll_percent > 0.0 {
        value = (value * (1.0 + mods.low_roll_percent / 100.0)).max(0.0);
    }

    (value, sixes_sense)
}

/// Truncate a non-negative product to currency, saturating at `u64::MAX`.
fn floor_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        if value == f64::INFINITY {
            return u64::MAX;
        }
        return 0;
    }
    let floored = value.floor();
    if floored >= u64::MAX as f64 {
        u64::MAX
    } else {
        floored as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DieId;

    /// Draws that always answer the same way.
    struct Canned {
        chance: bool,
        face: u8,
        high: u8,
    }

    impl RollRng for Canned {
        fn chance(&mut self, _p: f64) -> bool {
            self.chance
        }
        fn d6(&mut self) -> u8 {
            self.face
        }
        fn high_face(&mut self) -> u8 {
            self.high
        }
        fn pick(&mut self, _len: usize) -> usize {
            0
        }
    }

    fn never() -> Canned {
        Canned {
            chance: false,
            face: 1,
            high: 4,
        }
    }

    fn always() -> Canned {
        Canned {
            chance: true,
            face: 1,
            high: 6,
        }
    }

    fn setup(skills: &[&str]) -> (std::sync::Arc<Catalog>, ProgressionState) {
        let catalog = Catalog::builtin();
        let mut state = ProgressionState::initial(&catalog, 100, 1.15);
        for s in skills {
            state.purchased_skills.insert((*s).to_string());
        }
        state.refresh_tiers(&catalog, 1.15);
        (catalog, state)
    }

    fn die(tier: TierKey) -> DieInstance {
        DieInstance::new(DieId(1), tier)
    }

    fn roll(skills: &[&str], tier: TierKey, face: u8, rng: &mut Canned) -> RollOutcome {
        let (catalog, state) = setup(skills);
        compute_reward(&catalog, &state, &die(tier), Some(face), rng)
    }

    #[test]
    fn test_plain_steel_roll() {
        let outcome = roll(&[], TierKey::Steel, 3, &mut never());
        assert_eq!(outcome.face, 3);
        assert_eq!(outcome.reward, 3);
        assert!(!outcome.critical);
    }

    #[test]
    fn test_tier_multiplier_is_floored() {
        // 3 * 1.5 = 4.5
        let outcome = roll(&[], TierKey::Copper, 3, &mut never());
        assert_eq!(outcome.reward, 4);
    }

    #[test]
    fn test_honing_adds_to_tier_multiplier() {
        // 4 * (1 + 0.1 + 0.15)
        let outcome = roll(&["MAIN-01", "MAIN-02"], TierKey::Steel, 4, &mut never());
        assert_eq!(outcome.reward, 5);

        // Honing for another tier does nothing here.
        let outcome = roll(&["MAIN-01", "MAIN-02"], TierKey::Copper, 4, &mut never());
        assert_eq!(outcome.reward, 6);
    }

    #[test]
    fn test_global_income() {
        // 6 * 1 * 1.05 = 6.3
        let outcome = roll(&["MAIN-06"], TierKey::Steel, 6, &mut never());
        assert_eq!(outcome.reward, 6);

        // 6 * 10 * 1.05 = 63
        let outcome = roll(&["MAIN-06"], TierKey::Emerald, 6, &mut never());
        assert_eq!(outcome.reward, 63);
    }

    #[test]
    fn test_face_value_transforms() {
        // 1 + 2
        assert_eq!(roll(&["FACE-01"], TierKey::Steel, 1, &mut never()).reward, 3);
        // 2 -> 4
        assert_eq!(roll(&["FACE-02"], TierKey::Steel, 2, &mut never()).reward, 4);
        // (1 + 2) * 1.5 = 4.5
        assert_eq!(
            roll(&["FACE-01", "FACE-03"], TierKey::Steel, 1, &mut never()).reward,
            4
        );
        // 4 * 1.5 = 6
        assert_eq!(
            roll(&["FACE-02", "FACE-03"], TierKey::Steel, 2, &mut never()).reward,
            6
        );
        // Low boost leaves high faces alone.
        assert_eq!(roll(&["FACE-03"], TierKey::Steel, 5, &mut never()).reward, 5);
    }

    #[test]
    fn test_high_roll_boost_applies_after_multipliers() {
        // floor(floor(5 * 1.5) * 1.25) = floor(7 * 1.25) = 8
        let outcome = roll(&["FACE-04"], TierKey::Copper, 5, &mut never());
        assert_eq!(outcome.reward, 8);

        // Before the multipliers it would have been floor(5 * 1.25 * 1.5) = 9.
        assert_ne!(outcome.reward, 9);

        // Low faces are not boosted.
        assert_eq!(roll(&["FACE-04"], TierKey::Copper, 3, &mut never()).reward, 4);
    }

    #[test]
    fn test_sixes_sense_values_six_as_seven() {
        let outcome = roll(&["LUCK-04"], TierKey::Steel, 6, &mut always());
        assert_eq!(outcome.face, 6);
        assert!(outcome.sixes_sense);
        // Critical hit is not owned, so no doubling.
        assert_eq!(outcome.reward, 7);

        let outcome = roll(&["LUCK-04"], TierKey::Steel, 6, &mut never());
        assert!(!outcome.sixes_sense);
        assert_eq!(outcome.reward, 6);
    }

    #[test]
    fn test_critical_hit_doubles() {
        let outcome = roll(&["LUCK-03"], TierKey::Steel, 5, &mut always());
        assert!(outcome.critical);
        assert_eq!(outcome.reward, 10);

        let outcome = roll(&["LUCK-03"], TierKey::Steel, 5, &mut never());
        assert!(!outcome.critical);
        assert_eq!(outcome.reward, 5);
    }

    #[test]
    fn test_no_crit_without_skill() {
        let outcome = roll(&[], TierKey::Steel, 5, &mut always());
        assert!(!outcome.critical);
        assert_eq!(outcome.reward, 5);
    }

    #[test]
    fn test_luck_bias_draws_high_face() {
        let (catalog, state) = setup(&["LUCK-01"]);
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), None, &mut always());
        assert_eq!(outcome.face, 6);

        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), None, &mut never());
        assert_eq!(outcome.face, 1);
    }

    #[test]
    fn test_no_bias_without_luck() {
        let (catalog, state) = setup(&[]);
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), None, &mut always());
        assert_eq!(outcome.face, 1);
    }

    #[test]
    fn test_invalid_forced_face_falls_back_to_draw() {
        let (catalog, state) = setup(&[]);
        let mut rng = Canned {
            chance: false,
            face: 2,
            high: 4,
        };
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), Some(9), &mut rng);
        assert_eq!(outcome.face, 2);
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), Some(0), &mut rng);
        assert_eq!(outcome.face, 2);
    }

    #[test]
    fn test_legacy_upgrades() {
        let (catalog, mut state) = setup(&[]);
        state.upgrade_levels.insert("steel_multiplier".to_string(), 3);
        // 5 * 1.3 = 6.5
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), Some(5), &mut never());
        assert_eq!(outcome.reward, 6);

        state.upgrade_levels.insert("sixes_bonus".to_string(), 1);
        // 6 * 1.3 * 2 = 15.6
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), Some(6), &mut never());
        assert_eq!(outcome.reward, 15);
        // Sixes bonus only applies to sixes.
        let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), Some(5), &mut never());
        assert_eq!(outcome.reward, 6);
    }

    #[test]
    fn test_unknown_tier_pays_nothing() {
        let (catalog, state) = setup(&[]);
        let mut small = (*catalog).clone();
        small.tiers.retain(|t| t.key == TierKey::Steel);
        let mut d = die(TierKey::Gold);
        d.face = 4;
        let outcome = compute_reward(&small, &state, &d, Some(6), &mut always());
        assert_eq!(outcome, RollOutcome::unchanged(4));
    }

    #[test]
    fn test_modifiers_collect() {
        let (catalog, mut state) = setup(&["LUCK-01", "LUCK-02", "MAIN-06", "MAIN-12"]);
        state.upgrade_levels.insert("lucky_rolls".to_string(), 2);
        let mods = RollModifiers::collect(&catalog, &state);
        assert!((mods.high_roll_bias - 0.25).abs() < 1e-9);
        assert!((mods.global_income - 0.15).abs() < 1e-9);
        assert!((mods.sixes_bonus - 1.0).abs() < f64::EPSILON);
        assert_eq!(mods.two_override, None);
    }

    #[test]
    fn test_high_roll_bias_is_clamped() {
        let (catalog, mut state) = setup(&["LUCK-01", "LUCK-02"]);
        state.upgrade_levels.insert("lucky_rolls".to_string(), 20);
        let mods = RollModifiers::collect(&catalog, &state);
        assert!((mods.high_roll_bias - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lucky_rolls_upgrade_biases_faces_without_luck_skills() {
        let (catalog, mut state) = setup(&[]);
        let mut rng = crate::rng::SeededRng::new(7);
        let plain: Vec<u8> = (0..200)
            .map(|_| compute_reward(&catalog, &state, &die(TierKey::Steel), None, &mut rng).face)
            .collect();
        assert!(plain.iter().any(|&f| f < 4));

        state.upgrade_levels.insert("lucky_rolls".to_string(), 20);
        let mods = RollModifiers::collect(&catalog, &state);
        assert!((mods.high_roll_bias - 1.0).abs() < f64::EPSILON);
        for _ in 0..200 {
            let outcome = compute_reward(&catalog, &state, &die(TierKey::Steel), None, &mut rng);
            assert!(outcome.face >= 4, "drew {}", outcome.face);
        }
    }

    #[test]
    fn test_floor_to_u64_edges() {
        assert_eq!(floor_to_u64(-3.0), 0);
        assert_eq!(floor_to_u64(f64::NAN), 0);
        assert_eq!(floor_to_u64(f64::INFINITY), u64::MAX);
        assert_eq!(floor_to_u64(2.999), 2);
    }
}
