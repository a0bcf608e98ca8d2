//! Test fixtures and helpers.
//!
//! Pre-built economies and a scripted random source for consistent
//! testing.

use std::collections::VecDeque;

use dice_core::prelude::*;

/// Fresh economy over the built-in catalog with a given balance.
#[must_use]
pub fn economy_with_currency(currency: u64) -> Economy {
    Economy::new(
        Catalog::builtin(),
        EconomyConfig {
            starting_currency: currency,
            ..EconomyConfig::default()
        },
    )
}

/// Economy that owns `skills` (plus whatever they need) and has
/// `currency` to spend. Resetting it returns to `currency`.
///
/// Skills are bought through the economy in catalog order, so missing
/// prerequisites are bought along the way.
///
/// # Panics
///
/// Panics if a skill id is not in the catalog.
#[must_use]
pub fn economy_with_skills(currency: u64, skills: &[&str]) -> Economy {
    let catalog = Catalog::builtin();
    let mut wanted: Vec<String> = Vec::new();
    for id in skills {
        collect_prerequisites(&catalog, id, &mut wanted);
    }

    let mut economy = economy_with_currency(u64::MAX / 2);
    for skill in &catalog.skills {
        if wanted.contains(&skill.id) {
            assert!(economy.purchase_skill(&skill.id), "could not buy {}", skill.id);
        }
    }
    with_balance(&economy, currency)
}

fn collect_prerequisites(catalog: &Catalog, id: &str, out: &mut Vec<String>) {
    let skill = catalog
        .get_skill(id)
        .unwrap_or_else(|| panic!("unknown skill {id}"));
    for prereq in &skill.prerequisites {
        collect_prerequisites(catalog, prereq, out);
    }
    if !out.iter().any(|s| s == id) {
        out.push(id.to_string());
    }
}

/// Economy with `dice` steel dice and `currency` left over.
///
/// # Panics
///
/// Panics if the purchases fail.
#[must_use]
pub fn economy_with_steel_dice(currency: u64, dice: usize) -> (Economy, Vec<DieId>) {
    let mut economy = economy_with_currency(u64::MAX / 2);
    let ids = (0..dice)
        .map(|_| {
            economy
                .purchase_die(TierKey::Steel)
                .expect("steel is always purchasable with enough funds")
        })
        .collect();
    (with_balance(&economy, currency), ids)
}

/// Copy of `economy` whose balance and starting currency are `currency`.
fn with_balance(economy: &Economy, currency: u64) -> Economy {
    let mut snapshot = economy.snapshot();
    snapshot.currency = currency;
    let mut target = economy_with_currency(currency);
    target.restore(snapshot);
    target
}

/// Random source that replays scripted draws.
///
/// When a script runs dry, `chance` answers false, faces answer the
/// fallback face and `pick` answers 0.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    chances: VecDeque<bool>,
    faces: VecDeque<u8>,
    picks: VecDeque<usize>,
    fallback_face: u8,
}

impl ScriptedRng {
    /// Source where every chance fails and every face is `face`.
    #[must_use]
    pub fn always_face(face: u8) -> Self {
        Self {
            fallback_face: face,
            ..Self::default()
        }
    }

    /// Queue chance outcomes.
    #[must_use]
    pub fn with_chances(mut self, outcomes: impl IntoIterator<Item = bool>) -> Self {
        self.chances.extend(outcomes);
        self
    }

    /// Queue face draws.
    #[must_use]
    pub fn with_faces(mut self, faces: impl IntoIterator<Item = u8>) -> Self {
        self.faces.extend(faces);
        self
    }

    /// Queue pick indices.
    #[must_use]
    pub fn with_picks(mut self, picks: impl IntoIterator<Item = usize>) -> Self {
        self.picks.extend(picks);
        self
    }

    /// Chance outcomes not yet consumed.
    #[must_use]
    pub fn remaining_chances(&self) -> usize {
        self.chances.len()
    }

    fn next_face(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or(self.fallback_face.max(1))
    }
}

impl RollRng for ScriptedRng {
    fn chance(&mut self, _p: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }

    fn d6(&mut self) -> u8 {
        self.next_face()
    }

    fn high_face(&mut self) -> u8 {
        self.next_face().max(4)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_economy_with_skills_buys_prerequisites() {
        let economy = economy_with_skills(42, &["MAIN-03"]);
        assert_eq!(economy.currency(), 42);
        for id in ["MAIN-01", "MAIN-02", "MAIN-03"] {
            assert!(economy.state().has_skill(id));
        }
        assert!(economy.state().tier(TierKey::Copper).unwrap().unlocked);
    }

    #[test]
    fn test_steel_dice_fixture() {
        let (economy, ids) = economy_with_steel_dice(0, 3);
        assert_eq!(ids.len(), 3);
        assert_eq!(economy.currency(), 0);
        assert_eq!(economy.state().tier(TierKey::Steel).unwrap().count, 3);
    }

    #[test]
    fn test_scripted_rng_replays_then_falls_back() {
        let mut rng = ScriptedRng::always_face(2)
            .with_chances([true])
            .with_faces([5]);
        assert!(rng.chance(0.0));
        assert!(!rng.chance(1.0));
        assert_eq!(rng.d6(), 5);
        assert_eq!(rng.d6(), 2);
        assert_eq!(rng.high_face(), 4);
        assert_eq!(rng.pick(3), 0);
    }
}
