//! Dice Tycoon - Development Tools

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dice_core::data::{Catalog, TierKey};
use dice_core::economy::EconomyConfig;
use dice_tools::curve::{path_cost, skill_path, tier_cost_curve};
use dice_tools::validate::validate_path;

#[derive(Parser)]
#[command(name = "dice-tools")]
#[command(about = "Development tools for Dice Tycoon")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog file or a directory of catalogs
    Validate {
        /// Path to a RON catalog or a data directory
        #[arg(default_value = "crates/dice_core/assets/data")]
        path: PathBuf,

        /// Print summaries as RON
        #[arg(long)]
        ron: bool,
    },

    /// Print the price of successive dice of a tier
    CostCurve {
        /// Tier key (steel, copper, ...)
        #[arg(short, long, default_value = "steel")]
        tier: TierKey,

        /// Number of dice
        #[arg(short, long, default_value = "20")]
        count: u32,

        /// Price growth per owned die
        #[arg(long)]
        growth: Option<f64>,
    },

    /// Print every skill needed to reach a skill, with the total price
    SkillPath {
        /// Target skill id
        id: String,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path, ron } => {
            tracing::info!("Validating catalogs in: {}", path.display());
            match validate_path(&path) {
                Ok(summaries) => {
                    for (file, summary) in &summaries {
                        if ron {
                            match ron::ser::to_string_pretty(
                                summary,
                                ron::ser::PrettyConfig::default(),
                            ) {
                                Ok(text) => println!("// {}\n{text}", file.display()),
                                Err(e) => tracing::warn!("Cannot print summary: {e}"),
                            }
                        } else {
                            println!(
                                "{}: {} tiers, {} skills, {} upgrades",
                                file.display(),
                                summary.tiers,
                                summary.skills,
                                summary.upgrades
                            );
                        }
                    }
                    tracing::info!("Validation passed");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::CostCurve {
            tier,
            count,
            growth,
        } => {
            let growth = growth.unwrap_or(EconomyConfig::default().cost_growth);
            let Some(curve) = tier_cost_curve(&Catalog::builtin(), tier, count, growth) else {
                tracing::error!("Tier {tier} is not in the catalog");
                return ExitCode::FAILURE;
            };
            println!("{:>6} {:>14} {:>16}", "owned", "cost", "cumulative");
            for point in curve {
                println!("{:>6} {:>14} {:>16}", point.owned, point.cost, point.cumulative);
            }
            ExitCode::SUCCESS
        }
        Commands::SkillPath { id } => {
            let Some(path) = skill_path(&Catalog::builtin(), &id) else {
                tracing::error!("Unknown skill: {id}");
                return ExitCode::FAILURE;
            };
            for step in &path {
                println!("{:<10} {:>10}", step.id, step.cost);
            }
            println!("{:<10} {:>10}", "total", path_cost(&path));
            ExitCode::SUCCESS
        }
    }
}
