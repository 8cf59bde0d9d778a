//! Notification model for the alert feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification category. One settings flag exists per category.
///
/// `Reminder` has no extractor; it is reserved for host-authored entries
/// (manual reminders) that go straight into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Document,
    Budget,
    FollowUp,
    Process,
    Reminder,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Document,
        Category::Budget,
        Category::FollowUp,
        Category::Process,
        Category::Reminder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Budget => "budget",
            Category::FollowUp => "follow_up",
            Category::Process => "process",
            Category::Reminder => "reminder",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "document" => Ok(Category::Document),
            "budget" => Ok(Category::Budget),
            "follow_up" | "followup" => Ok(Category::FollowUp),
            "process" => Ok(Category::Process),
            "reminder" => Ok(Category::Reminder),
            other => Err(format!(
                "unknown category '{other}' (expected one of: document, budget, follow_up, process, reminder)"
            )),
        }
    }
}

/// Notification priority, highest urgency first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, lower is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        write!(f, "{s}")
    }
}

/// One entry in the alert feed.
///
/// The id is deterministic: `category:source_id:epoch`, where the epoch is
/// the date (YYYYMMDD) of the underlying condition instance. Rescanning an
/// unchanged condition rebuilds the same id, and the dedup key
/// `(category, source_id)` identifies the condition family across epochs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub category: Category,
    /// Id of the record that produced this signal.
    pub source_id: String,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    /// Opaque navigation target resolved by the host application.
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        category: Category,
        source_id: &str,
        epoch: &str,
        priority: Priority,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::id_for(category, source_id, epoch),
            category,
            source_id: source_id.to_string(),
            priority,
            title: title.into(),
            message: message.into(),
            action_url: None,
            due_date: None,
            is_read: false,
            created_at,
        }
    }

    /// Deterministic id shared by every scan of the same condition instance.
    pub fn id_for(category: Category, source_id: &str, epoch: &str) -> String {
        format!("{}:{}:{}", category.as_str(), source_id, epoch)
    }

    pub fn with_action_url(mut self, url: impl Into<String>) -> Self {
        self.action_url = Some(url.into());
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// At most one live notification per dedup key.
    pub fn dedup_key(&self) -> (Category, &str) {
        (self.category, self.source_id.as_str())
    }

    /// Candidates missing a required field are dropped at ingest.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && !self.source_id.is_empty()
            && !self.title.is_empty()
            && !self.message.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
