//! Headless host for the dice tycoon engine.
//!
//! Runs a game without a user interface, driven by JSON commands on stdin
//! with results on stdout. This enables:
//!
//! - **Scripted play**: a controller process buys, rolls and queries
//! - **Persistence**: the game is saved after every change and resumed on start
//! - **Balance checks**: seeded virtual-time playthroughs via [`simulate`]
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (purchase_die, roll, query, ...)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Play interactively, saving to dice.json
//! echo '{"cmd":"purchase_die","tier":"steel"}' | cargo run -p dice_headless -- run --save dice.json
//!
//! # Ten simulated minutes
//! cargo run -p dice_headless -- simulate --seed 7 --seconds 600
//! ```

use std::path::PathBuf;

use dice_core::economy::EconomyConfig;

pub mod protocol;
pub mod runner;
pub mod save;
pub mod session;
pub mod simulate;

pub use protocol::{Command, Response, StateReport};
pub use runner::{handle_command, run_lines, run_stdio};
pub use save::{load_or_initial, load_snapshot, save_snapshot, SaveError};
pub use session::Session;
pub use simulate::{simulate, SimulationConfig, SimulationReport};

/// Settings for an interactive session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionConfig {
    /// Snapshot file. `None` plays without saving.
    pub save_path: Option<PathBuf>,
    /// Seed for roll randomness.
    pub seed: u64,
    /// Run the auto-roll task when the skills allow it.
    pub auto_roll: bool,
    /// Economy constants.
    pub economy: EconomyConfig,
}
