//! Signal extractors: pure scans that turn a domain snapshot into candidate
//! notifications.
//!
//! Extractors never touch the store and never perform I/O; all side effects
//! happen after the whole pass. A disabled category returns before looking
//! at a single record. Conditions with no date simply do not participate.

use chrono::{DateTime, Duration, Utc};

use firedesk_core::records::{BudgetRecord, BudgetStatus, LeadRecord, ProcessRecord};

use crate::notification::{Category, Notification, Priority};
use crate::settings::NotificationSettings;

/// Look-ahead window for expiry-style signals.
pub const DUE_WINDOW_DAYS: i64 = 7;
/// At or under this many days left, an expiry signal escalates to high.
pub const URGENT_DAYS: i64 = 3;
/// A pending quote older than this many days raises a signal.
pub const BUDGET_STALE_DAYS: i64 = 5;
/// A pending quote older than this many days escalates to high.
pub const BUDGET_CRITICAL_DAYS: i64 = 10;
/// An approval counts as fresh for this long.
pub const APPROVED_WINDOW_DAYS: i64 = 1;

/// Epoch tag for notification ids: the date of the condition instance.
fn epoch_tag(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d").to_string()
}

/// True when `at` lies in the half-open window `(now, now + DUE_WINDOW_DAYS]`.
fn within_due_window(now: DateTime<Utc>, at: DateTime<Utc>) -> bool {
    let until = at - now;
    until > Duration::zero() && until <= Duration::days(DUE_WINDOW_DAYS)
}

/// Licenses expiring inside the look-ahead window. Already-expired licenses
/// are a document-management concern, not a deadline alert, and stay out.
pub fn license_expiry(
    leads: &[LeadRecord],
    now: DateTime<Utc>,
    settings: &NotificationSettings,
) -> Vec<Notification> {
    if !settings.document {
        return Vec::new();
    }
    let mut out = Vec::new();
    for lead in leads {
        let Some(expiry) = lead.expiration_date else { continue };
        if !within_due_window(now, expiry) {
            continue;
        }
        let days_left = (expiry - now).num_days();
        let priority = if days_left <= URGENT_DAYS {
            Priority::High
        } else {
            Priority::Medium
        };
        out.push(
            Notification::new(
                Category::Document,
                &lead.id,
                &epoch_tag(expiry),
                priority,
                format!("License expiring: {}", lead.company),
                format!(
                    "The fire safety license for {} expires in {} day(s), on {}.",
                    lead.company,
                    days_left,
                    expiry.format("%Y-%m-%d")
                ),
                now,
            )
            .with_due_date(expiry)
            .with_action_url(format!("/leads/{}", lead.id)),
        );
    }
    out
}

/// Follow-ups at or past their scheduled time. No upper bound: an overdue
/// follow-up keeps signalling until acted upon.
pub fn follow_up_due(
    leads: &[LeadRecord],
    now: DateTime<Utc>,
    settings: &NotificationSettings,
) -> Vec<Notification> {
    if !settings.follow_up {
        return Vec::new();
    }
    leads
        .iter()
        .filter_map(|lead| {
            let next = lead.next_action_at?;
            if next > now {
                return None;
            }
            Some(
                Notification::new(
                    Category::FollowUp,
                    &lead.id,
                    &epoch_tag(next),
                    Priority::High,
                    format!("Follow-up due: {}", lead.company),
                    format!(
                        "The follow-up with {} was scheduled for {}.",
                        lead.company,
                        next.format("%Y-%m-%d")
                    ),
                    now,
                )
                .with_due_date(next)
                .with_action_url(format!("/leads/{}", lead.id)),
            )
        })
        .collect()
}

/// Quote signals: stale pending quotes and fresh approvals. The status enum
/// makes the two conditions mutually exclusive for a single record.
pub fn budget_status(
    budgets: &[BudgetRecord],
    now: DateTime<Utc>,
    settings: &NotificationSettings,
) -> Vec<Notification> {
    if !settings.budget {
        return Vec::new();
    }
    let mut out = Vec::new();
    for budget in budgets {
        let since_update = now - budget.last_updated_at;
        match budget.status {
            BudgetStatus::Pending => {
                let days = since_update.num_days();
                if days <= BUDGET_STALE_DAYS {
                    continue;
                }
                let priority = if days > BUDGET_CRITICAL_DAYS {
                    Priority::High
                } else {
                    Priority::Medium
                };
                out.push(
                    Notification::new(
                        Category::Budget,
                        &budget.id,
                        &epoch_tag(budget.last_updated_at),
                        priority,
                        format!("Quote pending: {}", budget.client_name),
                        format!(
                            "The quote for {} has been waiting for {} day(s) with no answer.",
                            budget.client_name, days
                        ),
                        now,
                    )
                    .with_action_url(format!("/budgets/{}", budget.id)),
                );
            }
            BudgetStatus::Approved => {
                if since_update < Duration::zero()
                    || since_update > Duration::days(APPROVED_WINDOW_DAYS)
                {
                    continue;
                }
                out.push(
                    Notification::new(
                        Category::Budget,
                        &budget.id,
                        &epoch_tag(budget.last_updated_at),
                        Priority::Medium,
                        format!("Quote approved: {}", budget.client_name),
                        format!(
                            "The quote for {} was approved. Time to schedule the kick-off.",
                            budget.client_name
                        ),
                        now,
                    )
                    .with_action_url(format!("/budgets/{}", budget.id)),
                );
            }
            BudgetStatus::Draft | BudgetStatus::Rejected => {}
        }
    }
    out
}

/// Licensing processes due inside the same look-ahead window as expiry.
pub fn process_due(
    processes: &[ProcessRecord],
    now: DateTime<Utc>,
    settings: &NotificationSettings,
) -> Vec<Notification> {
    if !settings.process {
        return Vec::new();
    }
    let mut out = Vec::new();
    for process in processes {
        let Some(due) = process.due_date else { continue };
        if !within_due_window(now, due) {
            continue;
        }
        let days_left = (due - now).num_days();
        let priority = if days_left <= URGENT_DAYS {
            Priority::High
        } else {
            Priority::Medium
        };
        out.push(
            Notification::new(
                Category::Process,
                &process.id,
                &epoch_tag(due),
                priority,
                format!("Process due: {}", process.kind),
                format!(
                    "The process '{}' is due in {} day(s), on {}.",
                    process.kind,
                    days_left,
                    due.format("%Y-%m-%d")
                ),
                now,
            )
            .with_due_date(due)
            .with_action_url(format!("/processes/{}", process.id)),
        );
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
