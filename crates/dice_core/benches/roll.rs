//! Reward calculation benchmarks for dice_core.
//!
//! Run with: `cargo bench -p dice_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dice_core::prelude::*;

fn loaded_economy() -> Economy {
    let mut economy = Economy::new(
        Catalog::builtin(),
        EconomyConfig {
            starting_currency: u64::MAX / 2,
            ..EconomyConfig::default()
        },
    );
    let skills: Vec<String> = economy
        .catalog()
        .skills
        .iter()
        .map(|s| s.id.clone())
        .collect();
    // Catalog order lists prerequisites first
    for id in &skills {
        economy.purchase_skill(id);
    }
    economy.purchase_die(TierKey::Steel);
    economy
}

/// Runs reward calculation benchmarks.
pub fn roll_benchmark(c: &mut Criterion) {
    let mut bare = Economy::default();
    bare.purchase_die(TierKey::Steel);
    let loaded = loaded_economy();

    let mut rng = SeededRng::new(42);
    c.bench_function("compute_reward_no_skills", |b| {
        let die = bare.state().dice.values().next().cloned();
        b.iter(|| {
            if let Some(die) = &die {
                black_box(compute_reward(
                    bare.catalog(),
                    bare.state(),
                    die,
                    None,
                    &mut rng,
                ));
            }
        });
    });

    let mut rng = SeededRng::new(42);
    c.bench_function("compute_reward_all_skills", |b| {
        let die = loaded.state().dice.values().next().cloned();
        b.iter(|| {
            if let Some(die) = &die {
                black_box(compute_reward(
                    loaded.catalog(),
                    loaded.state(),
                    die,
                    None,
                    &mut rng,
                ));
            }
        });
    });
}

criterion_group!(benches, roll_benchmark);
criterion_main!(benches);
