//! Domain records the engine monitors.
//!
//! These are snapshots of data owned by the back-office screens. The engine
//! never mutates them except through the stage transition machine, and every
//! derived field (stage age, overdue flag) is recomputed on read because
//! "now" keeps moving while records stand still.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Pipeline stages ─────────────────────────────────────────────────────────

/// Closed set of sales pipeline stages, in board order.
///
/// Each stage optionally carries a deadline in days. A lead sitting in a
/// stage strictly longer than the deadline is overdue; Closed Client has no
/// deadline and can never be overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Contact,
    AutomaticContact,
    ManualContact,
    Proposal,
    ClosedClient,
}

impl Stage {
    /// All stages in board order.
    pub const ALL: [Stage; 5] = [
        Stage::Contact,
        Stage::AutomaticContact,
        Stage::ManualContact,
        Stage::Proposal,
        Stage::ClosedClient,
    ];

    /// Stage deadline in days. `None` means the stage never expires.
    pub fn deadline_days(&self) -> Option<i64> {
        match self {
            Stage::Contact => Some(7),
            Stage::AutomaticContact => Some(5),
            Stage::ManualContact => Some(30),
            Stage::Proposal => Some(15),
            Stage::ClosedClient => None,
        }
    }

    /// Board label shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Contact => "Contact",
            Stage::AutomaticContact => "Automatic Contact",
            Stage::ManualContact => "Manual Contact",
            Stage::Proposal => "Proposal",
            Stage::ClosedClient => "Closed Client",
        }
    }

    /// Machine-readable name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Contact => "contact",
            Stage::AutomaticContact => "automatic_contact",
            Stage::ManualContact => "manual_contact",
            Stage::Proposal => "proposal",
            Stage::ClosedClient => "closed_client",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "contact" => Ok(Stage::Contact),
            "automatic_contact" => Ok(Stage::AutomaticContact),
            "manual_contact" => Ok(Stage::ManualContact),
            "proposal" => Ok(Stage::Proposal),
            "closed_client" => Ok(Stage::ClosedClient),
            other => Err(format!(
                "unknown stage '{other}' (expected one of: contact, automatic_contact, manual_contact, proposal, closed_client)"
            )),
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A sales lead with its licensing dates and pipeline position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,
    /// Company or display name shown on the board and in notifications.
    pub company: String,
    /// Recipient for stage automations. Absent when the lead has no email.
    #[serde(default)]
    pub contact_email: Option<String>,
    /// AVCB/CLCB license expiry date.
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Next scheduled follow-up.
    #[serde(default)]
    pub next_action_at: Option<DateTime<Utc>>,
    pub stage: Stage,
    /// Reset on every stage transition; the base of the stage clock.
    pub last_updated_at: DateTime<Utc>,
}

impl LeadRecord {
    /// Whole days spent in the current stage, floored, never negative.
    pub fn days_in_stage(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_updated_at).num_days().max(0)
    }

    /// True when the stage has a deadline and the lead has exceeded it.
    /// A lead exactly at the deadline is not overdue yet.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.stage.deadline_days() {
            Some(deadline) => self.days_in_stage(now) > deadline,
            None => false,
        }
    }
}

/// A licensing process (renewal, inspection, filing) with a due date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: String,
    /// Process kind, e.g. "AVCB renewal" or "CLCB inspection".
    pub kind: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Quote lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

/// A quote sent to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub id: String,
    pub client_name: String,
    pub status: BudgetStatus,
    pub amount: f64,
    /// Last status or content change; the base for staleness checks.
    pub last_updated_at: DateTime<Utc>,
}

/// One scan pass worth of domain state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub leads: Vec<LeadRecord>,
    #[serde(default)]
    pub processes: Vec<ProcessRecord>,
    #[serde(default)]
    pub budgets: Vec<BudgetRecord>,
}

impl Snapshot {
    pub fn record_count(&self) -> usize {
        self.leads.len() + self.processes.len() + self.budgets.len()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
