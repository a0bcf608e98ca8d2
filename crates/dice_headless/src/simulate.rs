//! Virtual-time playthroughs for balance checks.
//!
//! A simulated player clicks every die as soon as its cooldown allows,
//! lets owned auto-roll skills fire on their own schedule, and spends the
//! balance greedily after every tick. No tokio timers are involved: time
//! is a counter, so an hour of play takes milliseconds to compute and the
//! same seed always produces the same report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dice_core::data::{Catalog, TierKey};
use dice_core::economy::{Economy, EconomyConfig};
use dice_core::rng::SeededRng;
use dice_core::state::DieId;

/// Parameters of a simulated playthrough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Seed for every random draw.
    pub seed: u64,
    /// Length of the run in milliseconds of game time.
    pub duration_ms: u64,
    /// Clock step. Manual clicks happen once per step.
    pub tick_ms: u64,
    /// Click dice by hand. Off means only auto-roll earns.
    pub manual_rolls: bool,
    /// Economy constants.
    pub economy: EconomyConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            duration_ms: 10 * 60 * 1000,
            tick_ms: 300,
            manual_rolls: true,
            economy: EconomyConfig::default(),
        }
    }
}

/// When a tier became purchasable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierUnlock {
    pub tier: TierKey,
    pub at_ms: u64,
}

/// Outcome of a simulated playthrough.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub duration_ms: u64,
    pub final_currency: u64,
    pub total_earned: u64,
    pub manual_rolls: u64,
    pub auto_rolls: u64,
    pub critical_hits: u64,
    pub dice: BTreeMap<TierKey, u32>,
    pub skills: Vec<String>,
    pub upgrades: BTreeMap<String, u32>,
    pub tier_unlocks: Vec<TierUnlock>,
    pub final_state_hash: u64,
}

impl SimulationReport {
    /// Average earnings per minute of game time.
    #[must_use]
    pub fn earnings_per_minute(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.total_earned as f64 * 60_000.0 / self.duration_ms as f64
    }
}

struct Simulation {
    economy: Economy,
    rng: SeededRng,
    now: u64,
    next_auto_roll: Option<u64>,
    report: SimulationReport,
}

impl Simulation {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            economy: Economy::new(Catalog::builtin(), config.economy),
            rng: SeededRng::new(config.seed),
            now: 0,
            next_auto_roll: None,
            report: SimulationReport {
                seed: config.seed,
                duration_ms: config.duration_ms,
                tier_unlocks: vec![TierUnlock {
                    tier: TierKey::Steel,
                    at_ms: 0,
                }],
                ..SimulationReport::default()
            },
        }
    }

    fn roll(&mut self, id: DieId) -> bool {
        match self
            .economy
            .try_roll_die(id, None, self.now, &mut self.rng)
        {
            Ok(outcome) => {
                self.report.total_earned += outcome.reward;
                if outcome.critical {
                    self.report.critical_hits += 1;
                }
                true
            }
            Err(_) => false,
        }
    }

    fn manual_rolls(&mut self) {
        let ids: Vec<DieId> = self.economy.state().dice.keys().copied().collect();
        for id in ids {
            if self.roll(id) {
                self.report.manual_rolls += 1;
            }
        }
    }

    fn auto_roll(&mut self) {
        let Some(interval) = self.economy.automation().auto_roll_interval_ms else {
            self.next_auto_roll = None;
            return;
        };
        let due = *self.next_auto_roll.get_or_insert(self.now + interval);
        if self.now < due {
            return;
        }
        self.next_auto_roll = Some(self.now + interval);

        if let Some(id) = self.economy.auto_roll_target(self.now, &mut self.rng) {
            if self.roll(id) {
                self.report.auto_rolls += 1;
            }
        }
    }

    /// Buy one thing: the cheapest affordable skill, else the best
    /// affordable die, else the cheapest affordable upgrade level.
    fn spend_once(&mut self) -> bool {
        let resolver = self.economy.resolver();
        let skill = resolver
            .available_skills()
            .filter_map(|id| self.economy.catalog().get_skill(id))
            .filter(|s| self.economy.state().can_afford(s.cost))
            .min_by_key(|s| s.cost)
            .map(|s| s.id.clone());
        if let Some(id) = skill {
            if let Ok(unlocked) = self.economy.try_purchase_skill(&id) {
                debug!("t={}ms bought {}", self.now, id);
                for tier in unlocked {
                    info!("t={}ms unlocked {}", self.now, tier);
                    self.report.tier_unlocks.push(TierUnlock {
                        tier,
                        at_ms: self.now,
                    });
                }
                return true;
            }
        }

        let tier = TierKey::ALL
            .iter()
            .rev()
            .copied()
            .find(|t| self.economy.resolver().is_die_purchasable(*t));
        if let Some(tier) = tier {
            return self.economy.purchase_die(tier).is_some();
        }

        let growth = self.economy.config().upgrade_cost_growth;
        let resolver = self.economy.resolver();
        let upgrade = self
            .economy
            .catalog()
            .upgrades
            .iter()
            .filter(|u| resolver.is_upgrade_purchasable(&u.id, growth))
            .min_by_key(|u| resolver.upgrade_cost(&u.id, growth))
            .map(|u| u.id.clone());
        match upgrade {
            Some(id) => self.economy.purchase_upgrade(&id),
            None => false,
        }
    }

    fn tick(&mut self, manual: bool) {
        self.economy.settle_rolls(self.now);
        self.auto_roll();
        if manual {
            self.manual_rolls();
        }
        while self.spend_once() {}
    }

    fn finish(mut self) -> SimulationReport {
        let state = self.economy.state();
        self.report.final_currency = state.currency;
        self.report.dice = state
            .tiers
            .iter()
            .filter(|(_, t)| t.count > 0)
            .map(|(key, t)| (*key, t.count))
            .collect();
        self.report.skills = state.purchased_skills.iter().cloned().collect();
        self.report.upgrades = state
            .upgrade_levels
            .iter()
            .filter(|(_, level)| **level > 0)
            .map(|(id, level)| (id.clone(), *level))
            .collect();
        self.report.final_state_hash = self.economy.state_hash();
        self.report
    }
}

/// Play a full run and report what happened.
#[must_use]
pub fn simulate(config: &SimulationConfig) -> SimulationReport {
    let tick_ms = config.tick_ms.max(1);
    let mut sim = Simulation::new(config);

    while sim.now <= config.duration_ms {
        sim.tick(config.manual_rolls);
        sim.now += tick_ms;
    }

    let report = sim.finish();
    info!(
        "Simulated {} s: earned {}, {} skills, {} tiers unlocked",
        config.duration_ms / 1000,
        report.total_earned,
        report.skills.len(),
        report.tier_unlocks.len()
    );
    report
}
