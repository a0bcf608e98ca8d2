//! Headless dice tycoon host.
//!
//! Plays the game without a user interface, controlled via JSON on
//! stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p dice_headless
//!
//! # Resume a saved game with a fixed seed
//! cargo run -p dice_headless -- run --save saves/dice.json --seed 42
//!
//! # Simulate an hour of greedy play
//! cargo run -p dice_headless -- simulate --seconds 3600 --json
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dice_core::data::Catalog;
use dice_core::economy::EconomyConfig;
use dice_headless::{load_or_initial, run_stdio, simulate, Session, SessionConfig, SimulationConfig};

#[derive(Parser)]
#[command(name = "dice_headless")]
#[command(about = "Headless dice tycoon host")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively over stdin/stdout
    Run {
        /// Snapshot file to resume from and save to
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Random seed for rolls
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Never roll automatically, even with auto-roll skills
        #[arg(long)]
        no_auto_roll: bool,
    },

    /// Play a seeded greedy strategy in virtual time
    Simulate {
        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Game time to simulate in seconds
        #[arg(long, default_value = "600")]
        seconds: u64,

        /// Clock step in milliseconds
        #[arg(long, default_value = "300")]
        tick_ms: u64,

        /// Only earn through auto-roll
        #[arg(long)]
        no_clicks: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr (stdout is for protocol)
    let default_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();

    match cli.command {
        Some(Commands::Run {
            save,
            seed,
            no_auto_roll,
        }) => {
            cmd_run(SessionConfig {
                save_path: save,
                seed,
                auto_roll: !no_auto_roll,
                economy: EconomyConfig::default(),
            })
            .await
        }
        Some(Commands::Simulate {
            seed,
            seconds,
            tick_ms,
            no_clicks,
            json,
        }) => cmd_simulate(
            &SimulationConfig {
                seed,
                duration_ms: seconds.saturating_mul(1000),
                tick_ms,
                manual_rolls: !no_clicks,
                economy: EconomyConfig::default(),
            },
            json,
        ),
        None => {
            cmd_run(SessionConfig {
                auto_roll: true,
                ..SessionConfig::default()
            })
            .await
        }
    }
}

/// Run an interactive session
async fn cmd_run(config: SessionConfig) -> ExitCode {
    tracing::info!("Starting interactive session");

    let economy = load_or_initial(config.save_path.as_deref(), Catalog::builtin(), config.economy);
    let mut session = Session::new(economy, &config);
    match run_stdio(&mut session).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Session failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Simulate and print the report
fn cmd_simulate(config: &SimulationConfig, json: bool) -> ExitCode {
    let report = simulate(config);

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!("Failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("Seed:            {}", report.seed);
    println!("Game time:       {} s", report.duration_ms / 1000);
    println!("Total earned:    {}", report.total_earned);
    println!("Per minute:      {:.1}", report.earnings_per_minute());
    println!("Final currency:  {}", report.final_currency);
    println!(
        "Rolls:           {} manual, {} auto, {} critical",
        report.manual_rolls, report.auto_rolls, report.critical_hits
    );
    println!("Skills:          {}", report.skills.len());
    println!("Dice:");
    for (tier, count) in &report.dice {
        println!("  {:<10} {count}", tier.as_str());
    }
    println!("Unlocks:");
    for unlock in &report.tier_unlocks {
        println!(
            "  {:<10} {:>8.1} s",
            unlock.tier.as_str(),
            unlock.at_ms as f64 / 1000.0
        );
    }
    println!("State hash:      {:#018x}", report.final_state_hash);
    ExitCode::SUCCESS
}
