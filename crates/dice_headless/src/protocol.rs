//! JSON protocol for headless play.
//!
//! The host communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Player commands
//! **Output (stdout):** Results and state
//!
//! # Protocol Flow
//!
//! 1. Host starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Host answers every command with exactly one response
//! 4. On `quit` (or end of input) the host outputs `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","currency":100}
//! -> {"cmd":"purchase_die","tier":"steel"}
//! <- {"type":"die_purchased","die_id":1,"tier":"steel","currency":90}
//! -> {"cmd":"roll","die_id":1}
//! <- {"type":"rolled","die_id":1,"face":4,"reward":4,"critical":false,"currency":94}
//! -> {"cmd":"purchase_skill","skill_id":"MAIN-02"}
//! <- {"type":"rejected","cmd":"purchase_skill","reason":"Skill MAIN-02 is missing prerequisites: MAIN-01"}
//! -> {"cmd":"query"}
//! <- {"type":"state","currency":94,"dice":[...],"tiers":[...],...}
//! ```

use serde::{Deserialize, Serialize};

use dice_core::automation::AutomationProfile;
use dice_core::data::TierKey;
use dice_core::economy::Economy;
use dice_core::state::DieId;
use dice_core::views::{DieView, SkillView, TierView, UpgradeView};

// ============================================================================
// Input Commands (controller -> host)
// ============================================================================

/// Commands accepted by the headless host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Buy a die of a tier.
    PurchaseDie { tier: TierKey },

    /// Roll a die, optionally forcing the face.
    Roll {
        die_id: DieId,
        #[serde(default)]
        face: Option<u8>,
    },

    /// Buy a skill.
    PurchaseSkill { skill_id: String },

    /// Buy the next level of a legacy upgrade.
    PurchaseUpgrade { upgrade_id: String },

    /// Store a presentation position for a die.
    Move { die_id: DieId, x: f64, y: f64 },

    /// Start over from the initial state.
    Reset,

    /// Report the full state without changing it.
    Query,

    /// Report the state hash.
    Hash,

    /// Shut down.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgments and rejections.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PurchaseDie { .. } => "purchase_die",
            Self::Roll { .. } => "roll",
            Self::PurchaseSkill { .. } => "purchase_skill",
            Self::PurchaseUpgrade { .. } => "purchase_upgrade",
            Self::Move { .. } => "move",
            Self::Reset => "reset",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (host -> controller)
// ============================================================================

/// Responses sent by the headless host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Host is ready to accept commands.
    Ready { version: String, currency: u64 },

    /// Acknowledgment of a command with no other result.
    Ack { cmd: String },

    /// The command was valid but the game refused it.
    Rejected { cmd: String, reason: String },

    /// The input line could not be understood.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// A die was bought.
    DiePurchased {
        die_id: DieId,
        tier: TierKey,
        currency: u64,
    },

    /// A die was rolled.
    Rolled {
        die_id: DieId,
        face: u8,
        reward: u64,
        critical: bool,
        currency: u64,
    },

    /// A skill was bought.
    SkillPurchased {
        skill_id: String,
        unlocked_tiers: Vec<TierKey>,
        currency: u64,
    },

    /// An upgrade level was bought.
    UpgradePurchased {
        upgrade_id: String,
        level: u32,
        currency: u64,
    },

    /// Full state.
    State(Box<StateReport>),

    /// State hash for determinism checks.
    StateHash { hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

/// Everything a presentation layer needs to draw the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    pub currency: u64,
    pub dice: Vec<DieView>,
    pub tiers: Vec<TierView>,
    pub skills: Vec<SkillView>,
    pub upgrades: Vec<UpgradeView>,
    pub automation: AutomationProfile,
    pub hash: u64,
}

impl StateReport {
    /// Collect a report from an economy.
    pub fn from_economy(economy: &Economy) -> Self {
        Self {
            currency: economy.currency(),
            dice: economy.die_views(),
            tiers: economy.tier_views(),
            skills: economy.skill_views(),
            upgrades: economy.upgrade_views(),
            automation: economy.automation(),
            hash: economy.state_hash(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(currency: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            currency,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create a rejection.
    pub fn rejected(cmd: &str, reason: impl std::fmt::Display) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}
