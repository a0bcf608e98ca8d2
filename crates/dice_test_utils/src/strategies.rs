//! Property-based testing strategies.
//!
//! Generates arbitrary sequences of player actions so properties can be
//! checked over states the hand-written tests never reach.

use dice_core::prelude::*;
use proptest::prelude::*;

/// One player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Buy a die of a tier.
    BuyDie(TierKey),
    /// Buy a skill by id (may be unknown).
    BuySkill(String),
    /// Buy an upgrade level by id (may be unknown).
    BuyUpgrade(String),
    /// Roll the n-th owned die (wrapped), optionally forcing the face.
    Roll {
        /// Index into the owned dice.
        index: usize,
        /// Forced face, possibly out of range.
        forced: Option<u8>,
    },
    /// Let time pass.
    Wait(u64),
    /// Start over.
    Reset,
}

/// Any tier key.
pub fn arb_tier_key() -> impl Strategy<Value = TierKey> {
    prop::sample::select(TierKey::ALL.to_vec())
}

/// A catalog skill id, or occasionally an unknown one.
pub fn arb_skill_id() -> impl Strategy<Value = String> {
    let ids: Vec<String> = Catalog::builtin()
        .skills
        .iter()
        .map(|s| s.id.clone())
        .collect();
    prop_oneof![
        9 => prop::sample::select(ids),
        1 => "[A-Z]{4}-[0-9]{2}",
    ]
}

/// A catalog upgrade id, or occasionally an unknown one.
pub fn arb_upgrade_id() -> impl Strategy<Value = String> {
    let ids: Vec<String> = Catalog::builtin()
        .upgrades
        .iter()
        .map(|u| u.id.clone())
        .collect();
    prop_oneof![
        9 => prop::sample::select(ids),
        1 => "[a-z_]{3,12}",
    ]
}

/// A single action, weighted towards rolling and buying dice.
pub fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => arb_tier_key().prop_map(Action::BuyDie),
        3 => arb_skill_id().prop_map(Action::BuySkill),
        1 => arb_upgrade_id().prop_map(Action::BuyUpgrade),
        6 => (0usize..16, prop::option::of(0u8..9))
            .prop_map(|(index, forced)| Action::Roll { index, forced }),
        3 => (0u64..1_000).prop_map(Action::Wait),
        1 => Just(Action::Reset),
    ]
}

/// A sequence of actions.
pub fn arb_actions(max_len: usize) -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(arb_action(), 0..max_len)
}

/// Apply an action. `now` is the session clock and advances only on
/// [`Action::Wait`].
pub fn apply(economy: &mut Economy, action: &Action, now: &mut u64, rng: &mut dyn RollRng) {
    match action {
        Action::BuyDie(tier) => {
            economy.purchase_die(*tier);
        }
        Action::BuySkill(id) => {
            economy.purchase_skill(id);
        }
        Action::BuyUpgrade(id) => {
            economy.purchase_upgrade(id);
        }
        Action::Roll { index, forced } => {
            let ids: Vec<DieId> = economy.state().dice.keys().copied().collect();
            if !ids.is_empty() {
                economy.roll_die(ids[index % ids.len()], *forced, *now, rng);
            }
        }
        Action::Wait(ms) => {
            *now += ms;
            economy.settle_rolls(*now);
        }
        Action::Reset => economy.reset_progression(),
    }
}
