//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the economy produces identical
//! results given identical operations and seeds.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the engine must avoid:
//!
//! - **Wall clock**: time only enters as the `now` argument.
//! - **OS randomness**: every draw goes through a seeded `RollRng`.
//! - **Map iteration order**: state lives in `BTreeMap`/`BTreeSet`, so
//!   iteration is key-ordered.

use std::thread;

use dice_core::prelude::*;
use tracing::debug;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps played per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Economy is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a scenario multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the scenario
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for i in 0..steps {
            step(&mut state, i);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// A seeded economy together with its clock.
#[derive(Debug, Clone)]
pub struct GreedySession {
    /// The economy being played.
    pub economy: Economy,
    /// Random source for rolls and auto-roll picks.
    pub rng: SeededRng,
    /// Current time in milliseconds.
    pub now: u64,
}

impl GreedySession {
    /// Fresh game with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            economy: Economy::default(),
            rng: SeededRng::new(seed),
            now: 0,
        }
    }

    /// Advance the clock by `tick_ms`, roll every die, then spend greedily:
    /// the cheapest available skill first, otherwise the newest affordable
    /// die tier.
    pub fn step(&mut self, tick_ms: u64) {
        self.now += tick_ms;
        self.economy.settle_rolls(self.now);

        let ids: Vec<DieId> = self.economy.state().dice.keys().copied().collect();
        for id in ids {
            self.economy.roll_die(id, None, self.now, &mut self.rng);
        }

        let resolver = self.economy.resolver();
        let cheapest_skill = resolver
            .available_skills()
            .filter_map(|id| self.economy.catalog().get_skill(id))
            .filter(|s| self.economy.state().can_afford(s.cost))
            .min_by_key(|s| s.cost)
            .map(|s| s.id.clone());
        if let Some(id) = cheapest_skill {
            self.economy.purchase_skill(&id);
            return;
        }

        let tier = TierKey::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| self.economy.resolver().is_die_purchasable(*t));
        if let Some(tier) = tier {
            self.economy.purchase_die(tier);
        }
    }
}

/// Play the greedy strategy from `seed` for `steps` steps, `runs` times,
/// and compare final hashes.
#[must_use]
pub fn verify_greedy_determinism(seed: u64, runs: usize, steps: u64) -> DeterminismResult {
    verify_determinism(
        runs,
        steps,
        || GreedySession::new(seed),
        |session, _| session.step(350),
        |session| session.economy.state_hash(),
    )
}

/// Play the greedy strategy from `seed` on `threads` scoped threads and
/// collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
#[must_use]
pub fn run_parallel_sessions(seed: u64, threads: usize, steps: u64) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(move || {
                    let mut session = GreedySession::new(seed);
                    for _ in 0..steps {
                        session.step(350);
                    }
                    session.economy.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Step two sessions side by side and return the first step after which
/// their hashes differ.
pub fn find_divergence(a: &mut GreedySession, b: &mut GreedySession, steps: u64) -> Option<u64> {
    for i in 0..steps {
        a.step(350);
        b.step(350);
        let (ha, hb) = (a.economy.state_hash(), b.economy.state_hash());
        if ha != hb {
            debug!("Sessions diverged at step {i}: {ha:#x} vs {hb:#x}");
            return Some(i);
        }
    }
    None
}
