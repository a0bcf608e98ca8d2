//! Gameplay scenarios for dice_core.
//!
//! These walk the economy through the situations a player actually hits
//! and check balances, unlocks and rewards at each step.

use dice_core::prelude::*;
use dice_test_utils::fixtures::{
    economy_with_currency, economy_with_skills, economy_with_steel_dice, ScriptedRng,
};

// =============================================================================
// Purchases
// =============================================================================

mod purchases {
    use super::*;

    #[test]
    fn test_first_roll_pays_face_value() {
        let (mut economy, ids) = economy_with_steel_dice(100, 1);
        let reward = economy.roll_die(ids[0], Some(3), 0, &mut ScriptedRng::always_face(1));
        assert_eq!(reward, 3);
        assert_eq!(economy.currency(), 103);
    }

    #[test]
    fn test_unlock_skill_with_exact_funds() {
        let mut economy = economy_with_skills(100, &["MAIN-02"]);
        assert!(economy.resolver().is_skill_purchasable("MAIN-03"));

        assert!(economy.purchase_skill("MAIN-03"));

        assert_eq!(economy.currency(), 0);
        assert!(economy.state().has_skill("MAIN-03"));
        assert!(economy.state().tier(TierKey::Copper).unwrap().unlocked);
        assert!(economy.resolver().is_tier_unlocked(TierKey::Copper));
    }

    #[test]
    fn test_copper_becomes_buyable_after_unlock() {
        let mut economy = economy_with_skills(50, &["MAIN-03"]);
        let id = economy.purchase_die(TierKey::Copper).unwrap();
        assert_eq!(economy.currency(), 0);
        assert_eq!(economy.state().die(id).unwrap().tier, TierKey::Copper);
        assert_eq!(economy.state().tier(TierKey::Copper).unwrap().cost, 57);
    }

    #[test]
    fn test_insufficient_funds_change_nothing() {
        let mut economy = economy_with_currency(9);
        let hash = economy.state_hash();
        assert!(economy.purchase_die(TierKey::Steel).is_none());
        assert!(!economy.purchase_skill("MAIN-01"));
        assert!(!economy.purchase_upgrade("steel_multiplier"));
        assert_eq!(economy.state_hash(), hash);
    }

    #[test]
    fn test_second_skill_purchase_is_noop() {
        let mut economy = economy_with_currency(100);
        assert!(economy.purchase_skill("MAIN-01"));
        assert_eq!(economy.currency(), 85);
        assert!(!economy.purchase_skill("MAIN-01"));
        assert_eq!(economy.currency(), 85);
    }
}

// =============================================================================
// Rolling
// =============================================================================

mod rolling {
    use super::*;

    #[test]
    fn test_double_roll_inside_cooldown() {
        let (mut economy, ids) = economy_with_steel_dice(0, 1);
        let mut rng = ScriptedRng::always_face(5);

        assert_eq!(economy.roll_die(ids[0], None, 10_000, &mut rng), 5);
        assert_eq!(economy.roll_die(ids[0], None, 10_150, &mut rng), 0);
        assert_eq!(economy.currency(), 5);
    }

    #[test]
    fn test_honing_raises_tier_multiplier() {
        let mut economy = economy_with_skills(10, &["MAIN-02"]);
        let id = economy.purchase_die(TierKey::Steel).unwrap();
        // Steel 1.0 + 0.1 + 0.15
        let reward = economy.roll_die(id, Some(4), 0, &mut ScriptedRng::always_face(1));
        assert_eq!(reward, 5);
    }

    #[test]
    fn test_face_value_skills() {
        let mut economy = economy_with_skills(1_000, &["FACE-03"]);
        let id = economy.purchase_die(TierKey::Steel).unwrap();
        let start = economy.currency();
        let mut rng = ScriptedRng::always_face(1);

        // Steel multiplier after MAIN-01 and MAIN-02 is 1.25
        // 1 -> (1 + 2) * 1.5 = 4.5, * 1.25 = 5.625
        assert_eq!(economy.roll_die(id, Some(1), 0, &mut rng), 5);
        // 2 -> 4 * 1.5 = 6, * 1.25 = 7.5
        assert_eq!(economy.roll_die(id, Some(2), 1_000, &mut rng), 7);
        // 3 -> 3 * 1.5 = 4.5, * 1.25 = 5.625
        assert_eq!(economy.roll_die(id, Some(3), 2_000, &mut rng), 5);
        assert_eq!(economy.currency(), start + 17);
    }

    #[test]
    fn test_high_roll_boost_after_multipliers() {
        let mut economy = economy_with_skills(10_000, &["FACE-04"]);
        let id = economy.purchase_die(TierKey::Steel).unwrap();

        // floor(6 * 1.25 * 1.05) = 7, then floor(7 * 1.25) = 8
        let reward = economy.roll_die(id, Some(6), 0, &mut ScriptedRng::always_face(1));
        assert_eq!(reward, 8);
    }

    #[test]
    fn test_critical_hit_doubles() {
        let mut economy = economy_with_skills(10_000, &["LUCK-03"]);
        let id = economy.purchase_die(TierKey::Steel).unwrap();
        // Bias draw fails, critical succeeds
        let mut rng = ScriptedRng::always_face(1).with_chances([false, true]);

        let outcome = economy.try_roll_die(id, None, 0, &mut rng).unwrap();
        assert!(outcome.critical);
        assert_eq!(outcome.face, 1);
        // floor(1 * 1.1) = 1, doubled
        assert_eq!(outcome.reward, 2);
        assert_eq!(rng.remaining_chances(), 0);
    }

    #[test]
    fn test_luck_bias_draws_high_face() {
        let mut economy = economy_with_skills(10_000, &["LUCK-01"]);
        let id = economy.purchase_die(TierKey::Steel).unwrap();
        let mut rng = ScriptedRng::always_face(1).with_chances([true]).with_faces([6]);

        let outcome = economy.try_roll_die(id, None, 0, &mut rng).unwrap();
        assert_eq!(outcome.face, 6);
    }

    #[test]
    fn test_display_window_and_settling() {
        let (mut economy, ids) = economy_with_steel_dice(0, 2);
        let mut rng = ScriptedRng::always_face(2);
        economy.roll_die(ids[0], None, 0, &mut rng);
        economy.roll_die(ids[1], None, 300, &mut rng);

        assert_eq!(economy.settle_rolls(600), 1);
        let views = economy.die_views();
        assert!(!views[0].rolling);
        assert!(views[1].rolling);
        assert_eq!(economy.settle_rolls(900), 1);
    }
}

// =============================================================================
// Automation
// =============================================================================

mod automation {
    use super::*;

    #[test]
    fn test_auto_roll_unlocks_with_skills() {
        let economy = economy_with_skills(0, &["AUTO-02"]);
        assert_eq!(economy.automation().auto_roll_interval_ms, None);
        assert!(economy.automation().hover_roll);

        let economy = economy_with_skills(0, &["AUTO-04"]);
        assert_eq!(economy.automation().auto_roll_interval_ms, Some(5_000));
    }

    #[test]
    fn test_auto_roll_target_rolls_eligible_die() {
        let (mut economy, ids) = economy_with_steel_dice(0, 3);
        let mut rng = ScriptedRng::always_face(3).with_picks([2]);

        let target = economy.auto_roll_target(0, &mut rng).unwrap();
        assert_eq!(target, ids[2]);
        assert_eq!(economy.roll_die(target, None, 0, &mut rng), 3);

        // Two dice left, index wraps
        let mut rng = ScriptedRng::always_face(3).with_picks([2]);
        assert_eq!(economy.auto_roll_target(100, &mut rng), Some(ids[0]));
    }
}

// =============================================================================
// Reset and persistence
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn test_reset_restores_start() {
        let mut economy = economy_with_skills(5_000, &["MAIN-03"]);
        economy.purchase_die(TierKey::Copper);
        economy.reset_progression();

        let fresh = economy_with_currency(5_000);
        assert_eq!(economy.state_hash(), fresh.state_hash());
        assert!(!economy.state().tier(TierKey::Copper).unwrap().unlocked);
    }

    #[test]
    fn test_snapshot_survives_json() {
        let mut economy = economy_with_skills(500, &["LUCK-01"]);
        economy.purchase_die(TierKey::Steel);

        let json = serde_json::to_string(&economy.snapshot()).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();
        let restored = Economy::from_snapshot(economy.catalog_arc(), *economy.config(), snapshot);

        assert_eq!(restored.state_hash(), economy.state_hash());
    }
}
