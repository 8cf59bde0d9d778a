//! In-memory, bounded notification feed.
//!
//! The store applies the merge rules that keep the feed stable across
//! repeated scans: deterministic-id deduplication, priority-change
//! re-alerts, epoch rollover, permanent dismissal, and a hard size cap.

use std::collections::VecDeque;

use crate::notification::{Category, Notification, Priority};

/// Maximum live notifications; oldest by creation time evicted first.
pub const FEED_CAP: usize = 50;
/// Remembered dismissed ids; oldest forgotten first.
const DISMISSED_CAP: usize = 256;

/// Outcome of one `ingest` batch.
#[derive(Debug, Default, Clone)]
pub struct IngestOutcome {
    /// High-priority candidates that created a brand-new entry (no live
    /// entry shared their dedup key), in batch order. Toast input.
    pub fresh_high: Vec<Notification>,
    /// Candidates merged into the feed (new, refreshed, or replaced).
    pub ingested: usize,
    pub dropped_malformed: usize,
    pub skipped_dismissed: usize,
}

/// Deduplicated, bounded, read/unread-tagged notification list.
#[derive(Debug, Default)]
pub struct NotificationStore {
    items: Vec<Notification>,
    dismissed: VecDeque<String>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a candidate batch into the feed.
    ///
    /// Per candidate, in order:
    /// - malformed candidates are dropped and logged, never propagated;
    /// - candidates whose exact id was dismissed are skipped;
    /// - same id, same priority: content refreshes, `is_read` and
    ///   `created_at` are preserved;
    /// - same id, changed priority: the newer entry wins and `is_read`
    ///   resets so the user is re-alerted;
    /// - same dedup key, different epoch: the old entry is replaced by the
    ///   fresh one;
    /// - otherwise the candidate is appended as new.
    ///
    /// The whole batch merges before bounding so eviction sees a consistent
    /// set.
    pub fn ingest(&mut self, candidates: Vec<Notification>) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();
        for candidate in candidates {
            if !candidate.is_well_formed() {
                tracing::warn!(
                    "📋 Dropping malformed notification candidate (source '{}')",
                    candidate.source_id
                );
                outcome.dropped_malformed += 1;
                continue;
            }
            if self.dismissed.contains(&candidate.id) {
                outcome.skipped_dismissed += 1;
                continue;
            }
            outcome.ingested += 1;
            match self.items.iter().position(|n| n.dedup_key() == candidate.dedup_key()) {
                Some(idx) => {
                    let existing = &self.items[idx];
                    if existing.id == candidate.id {
                        let mut replacement = candidate;
                        if existing.priority == replacement.priority {
                            replacement.is_read = existing.is_read;
                        }
                        // The feed position of a refreshed condition is stable.
                        replacement.created_at = existing.created_at;
                        self.items[idx] = replacement;
                    } else {
                        // New epoch for the same condition family.
                        self.items[idx] = candidate;
                    }
                }
                None => {
                    if candidate.priority == Priority::High {
                        outcome.fresh_high.push(candidate.clone());
                    }
                    self.items.push(candidate);
                }
            }
        }
        self.truncate();
        outcome
    }

    /// Evict down to [`FEED_CAP`], oldest `created_at` first.
    fn truncate(&mut self) {
        if self.items.len() <= FEED_CAP {
            return;
        }
        // Stable sort: same-instant entries keep insertion order.
        self.items.sort_by_key(|n| n.created_at);
        let excess = self.items.len() - FEED_CAP;
        self.items.drain(..excess);
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.is_read = true;
        }
    }

    /// Remove permanently. The id is remembered so the same condition
    /// instance cannot resurface; a new epoch builds a new id and can.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        let removed = self.items.len() < before;
        if removed {
            self.dismissed.push_back(id.to_string());
            if self.dismissed.len() > DISMISSED_CAP {
                self.dismissed.pop_front();
            }
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == id)
    }

    /// Arbitrary read view over the live entries.
    pub fn filter(&self, predicate: impl Fn(&Notification) -> bool) -> Vec<&Notification> {
        self.items.iter().filter(|n| predicate(n)).collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<&Notification> {
        self.filter(|n| n.category == category)
    }

    pub fn by_priority(&self, priority: Priority) -> Vec<&Notification> {
        self.filter(|n| n.priority == priority)
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }

    /// Feed order: newest first, ties broken by priority (high first).
    pub fn sorted(&self) -> Vec<Notification> {
        let mut list = self.items.clone();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.priority.rank().cmp(&b.priority.rank()))
        });
        list
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 10, 0, 0).unwrap()
    }

    fn candidate(source: &str, epoch: &str, priority: Priority, created: DateTime<Utc>) -> Notification {
        Notification::new(
            Category::Document,
            source,
            epoch,
            priority,
            format!("License expiring: {source}"),
            "expires soon".to_string(),
            created,
        )
    }

    #[test]
    fn repeat_ingest_is_idempotent() {
        let mut store = NotificationStore::new();
        store.ingest(vec![candidate("l1", "20240110", Priority::Medium, at(1))]);
        store.mark_read("document:l1:20240110");
        let outcome = store.ingest(vec![candidate("l1", "20240110", Priority::Medium, at(2))]);

        assert_eq!(store.len(), 1);
        assert!(outcome.fresh_high.is_empty());
        let n = store.get("document:l1:20240110").unwrap();
        assert!(n.is_read, "read state survives a refresh");
        assert_eq!(n.created_at, at(1), "feed position is stable");
    }

    #[test]
    fn priority_change_resets_read_state() {
        let mut store = NotificationStore::new();
        store.ingest(vec![candidate("l1", "20240110", Priority::Medium, at(1))]);
        store.mark_read("document:l1:20240110");

        store.ingest(vec![candidate("l1", "20240110", Priority::High, at(2))]);
        let n = store.get("document:l1:20240110").unwrap();
        assert_eq!(n.priority, Priority::High);
        assert!(!n.is_read, "escalation re-alerts the user");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn new_epoch_replaces_family_entry() {
        let mut store = NotificationStore::new();
        store.ingest(vec![candidate("l1", "20240110", Priority::Medium, at(1))]);
        store.mark_read("document:l1:20240110");

        store.ingest(vec![candidate("l1", "20250110", Priority::Medium, at(2))]);
        assert_eq!(store.len(), 1, "one live entry per dedup key");
        let n = store.get("document:l1:20250110").unwrap();
        assert!(!n.is_read, "a new condition instance starts unread");
        assert!(store.get("document:l1:20240110").is_none());
    }

    #[test]
    fn bounded_at_cap_evicting_oldest() {
        let mut store = NotificationStore::new();
        let first: Vec<_> = (0..30)
            .map(|i| candidate(&format!("a{i}"), "20240110", Priority::Low, at(1)))
            .collect();
        let second: Vec<_> = (0..30)
            .map(|i| candidate(&format!("b{i}"), "20240110", Priority::Low, at(2)))
            .collect();
        store.ingest(first);
        store.ingest(second);

        assert_eq!(store.len(), FEED_CAP);
        let from_day_two = store.iter().filter(|n| n.created_at == at(2)).count();
        assert_eq!(from_day_two, 30, "newest batch fully retained");
        let from_day_one = store.iter().filter(|n| n.created_at == at(1)).count();
        assert_eq!(from_day_one, 20, "oldest entries evicted first");
    }

    #[test]
    fn dismissed_id_stays_gone_until_new_epoch() {
        let mut store = NotificationStore::new();
        store.ingest(vec![candidate("l1", "20240110", Priority::High, at(1))]);
        assert!(store.dismiss("document:l1:20240110"));

        let outcome = store.ingest(vec![candidate("l1", "20240110", Priority::High, at(2))]);
        assert!(store.is_empty(), "same instance never resurfaces");
        assert_eq!(outcome.skipped_dismissed, 1);

        store.ingest(vec![candidate("l1", "20250110", Priority::High, at(3))]);
        assert_eq!(store.len(), 1, "a new epoch is a new alert");
    }

    #[test]
    fn dismiss_unknown_id_is_noop() {
        let mut store = NotificationStore::new();
        assert!(!store.dismiss("document:nobody:20240101"));
    }

    #[test]
    fn malformed_candidates_are_dropped_not_fatal() {
        let mut store = NotificationStore::new();
        let mut bad = candidate("l1", "20240110", Priority::High, at(1));
        bad.title = String::new();
        let outcome = store.ingest(vec![bad, candidate("l2", "20240110", Priority::Low, at(1))]);

        assert_eq!(outcome.dropped_malformed, 1);
        assert_eq!(store.len(), 1);
        assert!(outcome.fresh_high.is_empty(), "dropped entries never toast");
    }

    #[test]
    fn fresh_high_only_for_new_dedup_keys() {
        let mut store = NotificationStore::new();
        let first = store.ingest(vec![candidate("l1", "20240110", Priority::High, at(1))]);
        assert_eq!(first.fresh_high.len(), 1);

        let again = store.ingest(vec![candidate("l1", "20240110", Priority::High, at(2))]);
        assert!(again.fresh_high.is_empty(), "refreshes do not re-toast");

        // Epoch rollover replaces the family entry rather than creating one.
        let rollover = store.ingest(vec![candidate("l1", "20250110", Priority::High, at(3))]);
        assert!(rollover.fresh_high.is_empty());
    }

    #[test]
    fn feed_sort_newest_first_priority_tiebreak() {
        let mut store = NotificationStore::new();
        let low = candidate("l1", "20240110", Priority::Low, at(5));
        let high = Notification::new(
            Category::Budget,
            "b1",
            "20240110",
            Priority::High,
            "t",
            "m",
            at(5),
        );
        let older = candidate("l2", "20240110", Priority::High, at(2));
        store.ingest(vec![low, high, older]);

        let sorted = store.sorted();
        assert_eq!(sorted[0].priority, Priority::High, "tie broken by priority");
        assert_eq!(sorted[0].created_at, at(5));
        assert_eq!(sorted[2].created_at, at(2), "older entries sink");
    }

    #[test]
    fn read_tracking() {
        let mut store = NotificationStore::new();
        store.ingest(vec![
            candidate("l1", "20240110", Priority::Low, at(1)),
            candidate("l2", "20240110", Priority::Low, at(1)),
        ]);
        assert_eq!(store.unread_count(), 2);
        assert!(store.mark_read("document:l1:20240110"));
        assert_eq!(store.unread_count(), 1);
        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert!(!store.mark_read("document:nope:20240110"));
    }

    #[test]
    fn category_and_priority_views() {
        let mut store = NotificationStore::new();
        store.ingest(vec![
            candidate("l1", "20240110", Priority::High, at(1)),
            Notification::new(Category::Budget, "b1", "20240110", Priority::Medium, "t", "m", at(1)),
        ]);
        assert_eq!(store.by_category(Category::Budget).len(), 1);
        assert_eq!(store.by_priority(Priority::High).len(), 1);
        assert_eq!(store.filter(|n| !n.is_read).len(), 2);
    }

    #[test]
    fn last_write_wins_within_one_batch() {
        let mut store = NotificationStore::new();
        store.ingest(vec![
            candidate("l1", "20240110", Priority::Medium, at(1)),
            candidate("l1", "20240110", Priority::High, at(1)),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("document:l1:20240110").unwrap().priority, Priority::High);
    }
}
