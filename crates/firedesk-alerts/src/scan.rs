//! Scan pass and the polling loop that drives it.
//!
//! One pass: read settings, run every enabled extractor over a snapshot,
//! ingest the combined batch atomically, then hand freshly created
//! high-priority entries to the toast sink. The loop is a tokio interval
//! (first tick immediate, so start-up gets a pass) with Notify-based
//! teardown, and passes are serialized by a try-lock guard so a timer tick
//! and a host-triggered rescan can never interleave.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use firedesk_core::records::Snapshot;
use firedesk_core::traits::SnapshotProvider;

use crate::notification::Notification;
use crate::settings::SettingsStore;
use crate::signals;
use crate::store::{IngestOutcome, NotificationStore};

/// Default spacing between stacked toasts.
pub const DEFAULT_TOAST_SPACING: Duration = Duration::from_secs(2);

/// Counters for one scan pass.
#[derive(Debug, Default, Clone)]
pub struct PassSummary {
    pub candidates: usize,
    pub ingested: usize,
    pub dropped_malformed: usize,
    pub skipped_dismissed: usize,
    pub toasts: usize,
}

/// The alerting engine: settings, the feed, and the toast sink.
pub struct AlertEngine {
    store: NotificationStore,
    settings: SettingsStore,
    toast_tx: Option<UnboundedSender<Notification>>,
    toast_spacing: Duration,
}

impl AlertEngine {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            store: NotificationStore::new(),
            settings,
            toast_tx: None,
            toast_spacing: DEFAULT_TOAST_SPACING,
        }
    }

    pub fn set_toast_spacing(&mut self, spacing: Duration) {
        self.toast_spacing = spacing;
    }

    /// Open the toast stream. Replaces any previous sink.
    pub fn toast_stream(&mut self) -> ToastStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.toast_tx = Some(tx);
        ToastStream { rx }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut NotificationStore {
        &mut self.store
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Run one scan pass over a snapshot.
    ///
    /// Extraction is pure and synchronous; the merged batch goes into the
    /// store in one call so bounding sees a consistent set. Toast delivery
    /// is spawned, never awaited.
    pub fn run_pass(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> PassSummary {
        let settings = self.settings.current();
        let mut candidates = Vec::new();
        candidates.extend(signals::license_expiry(&snapshot.leads, now, &settings));
        candidates.extend(signals::follow_up_due(&snapshot.leads, now, &settings));
        candidates.extend(signals::budget_status(&snapshot.budgets, now, &settings));
        candidates.extend(signals::process_due(&snapshot.processes, now, &settings));

        let total = candidates.len();
        let outcome = self.store.ingest(candidates);
        let toasts = if settings.push_enabled {
            self.queue_toasts(&outcome)
        } else {
            0
        };

        let summary = PassSummary {
            candidates: total,
            ingested: outcome.ingested,
            dropped_malformed: outcome.dropped_malformed,
            skipped_dismissed: outcome.skipped_dismissed,
            toasts,
        };
        tracing::info!(
            "🔎 Scan pass: {} candidate(s), {} merged, {} toast(s), feed size {}",
            summary.candidates,
            summary.ingested,
            summary.toasts,
            self.store.len()
        );
        summary
    }

    /// Queue staggered toasts for freshly created high-priority entries.
    fn queue_toasts(&self, outcome: &IngestOutcome) -> usize {
        if outcome.fresh_high.is_empty() {
            return 0;
        }
        let Some(tx) = self.toast_tx.clone() else { return 0 };
        let spacing = self.toast_spacing;
        let batch = outcome.fresh_high.clone();
        let count = batch.len();
        tokio::spawn(async move {
            for notification in batch {
                if tx.send(notification).is_err() {
                    tracing::debug!("🔕 Toast sink closed, dropping remaining toasts");
                    return;
                }
                tokio::time::sleep(spacing).await;
            }
        });
        count
    }
}

/// Host-facing stream of toast notifications.
pub struct ToastStream {
    rx: UnboundedReceiver<Notification>,
}

impl Stream for ToastStream {
    type Item = Notification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for ToastStream {}

/// Run one pass now unless another is already in flight.
///
/// Returns false when the engine was busy or the snapshot was unavailable;
/// the tick is skipped, not queued.
pub fn trigger_pass(engine: &Arc<Mutex<AlertEngine>>, provider: &dyn SnapshotProvider) -> bool {
    let Ok(mut engine) = engine.try_lock() else {
        tracing::debug!("⏭️ Scan pass already in flight, skipping");
        return false;
    };
    let snapshot = match provider.snapshot() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("⚠️ Snapshot unavailable, skipping pass: {e}");
            return false;
        }
    };
    engine.settings_mut().reload();
    engine.run_pass(&snapshot, Utc::now());
    true
}

/// Handle for stopping the scan loop on teardown.
pub struct ScanLoopHandle {
    shutdown: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ScanLoopHandle {
    /// Stop the loop and wait for it to exit. No further passes run after
    /// this returns.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        self.handle.await.ok();
    }
}

/// Spawn the periodic scan loop. The first tick fires immediately, which is
/// the start-up pass.
pub fn spawn_scan_loop(
    engine: Arc<Mutex<AlertEngine>>,
    provider: Arc<dyn SnapshotProvider>,
    interval_secs: u64,
) -> ScanLoopHandle {
    let shutdown = Arc::new(Notify::new());
    let stop = shutdown.clone();
    let handle = tokio::spawn(async move {
        tracing::info!("⏰ Scan loop started (every {interval_secs}s)");
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    trigger_pass(&engine, provider.as_ref());
                }
                _ = stop.notified() => {
                    tracing::info!("🛑 Scan loop stopped");
                    break;
                }
            }
        }
    });
    ScanLoopHandle { shutdown, handle }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Category, Priority};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use firedesk_core::error::Result;
    use firedesk_core::records::{BudgetRecord, BudgetStatus, LeadRecord, Stage};
    use futures::StreamExt;

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap()
    }

    fn lead(id: &str, expiry: DateTime<Utc>) -> LeadRecord {
        LeadRecord {
            id: id.to_string(),
            company: format!("Company {id}"),
            contact_email: None,
            expiration_date: Some(expiry),
            next_action_at: None,
            stage: Stage::Contact,
            last_updated_at: jan(1),
        }
    }

    fn snapshot_with(leads: Vec<LeadRecord>, budgets: Vec<BudgetRecord>) -> Snapshot {
        Snapshot { leads, budgets, ..Snapshot::default() }
    }

    fn settings_store(tag: &str) -> SettingsStore {
        let path = std::env::temp_dir().join(format!("firedesk-scan-{tag}.json"));
        std::fs::remove_file(&path).ok();
        SettingsStore::open(&path)
    }

    struct FixedProvider(Snapshot);

    impl SnapshotProvider for FixedProvider {
        fn snapshot(&self) -> Result<Snapshot> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn pass_merges_all_extractors() {
        let mut engine = AlertEngine::new(settings_store("merge"));
        let snapshot = snapshot_with(
            vec![lead("l1", jan(3))],
            vec![BudgetRecord {
                id: "b1".to_string(),
                client_name: "Client".to_string(),
                status: BudgetStatus::Pending,
                amount: 900.0,
                last_updated_at: jan(1) - ChronoDuration::days(8),
            }],
        );
        let summary = engine.run_pass(&snapshot, jan(1));
        assert_eq!(summary.candidates, 2);
        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.store().by_category(Category::Document).len(), 1);
        assert_eq!(engine.store().by_category(Category::Budget).len(), 1);
    }

    #[test]
    fn scanning_twice_changes_nothing() {
        let mut engine = AlertEngine::new(settings_store("idempotent"));
        let snapshot = snapshot_with(vec![lead("l1", jan(3)), lead("l2", jan(6))], vec![]);

        engine.run_pass(&snapshot, jan(1));
        let ids_read: Vec<String> = engine.store().iter().map(|n| n.id.clone()).collect();
        engine.store_mut().mark_read(&ids_read[0]);

        engine.run_pass(&snapshot, jan(1));
        assert_eq!(engine.store().len(), 2);
        assert!(engine.store().get(&ids_read[0]).unwrap().is_read);
        assert_eq!(engine.store().unread_count(), 1);
    }

    #[test]
    fn toggling_category_off_and_on_matches_always_on() {
        let snapshot = snapshot_with(vec![lead("l1", jan(3))], vec![]);

        let mut toggled = AlertEngine::new(settings_store("toggled"));
        toggled.settings_mut().update(|s| s.document = false).unwrap();
        toggled.run_pass(&snapshot, jan(1));
        assert!(toggled.store().is_empty(), "disabled category stays silent");
        toggled.settings_mut().update(|s| s.document = true).unwrap();
        toggled.run_pass(&snapshot, jan(1));

        let mut always_on = AlertEngine::new(settings_store("always-on"));
        always_on.run_pass(&snapshot, jan(1));

        assert_eq!(toggled.store().len(), always_on.store().len());
        let a: Vec<String> = toggled.store().sorted().into_iter().map(|n| n.id).collect();
        let b: Vec<String> = always_on.store().sorted().into_iter().map(|n| n.id).collect();
        assert_eq!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_fire_once_per_fresh_high_with_spacing() {
        let mut engine = AlertEngine::new(settings_store("toasts"));
        let mut toasts = engine.toast_stream();
        let snapshot = snapshot_with(vec![lead("l1", jan(2)), lead("l2", jan(3))], vec![]);

        let summary = engine.run_pass(&snapshot, jan(1));
        assert_eq!(summary.toasts, 2);

        let t0 = tokio::time::Instant::now();
        let first = toasts.next().await.unwrap();
        assert_eq!(first.priority, Priority::High);
        let second = toasts.next().await.unwrap();
        assert_eq!(second.priority, Priority::High);
        assert!(
            tokio::time::Instant::now() - t0 >= Duration::from_secs(2),
            "stacked toasts are staggered"
        );

        // Rescan: same conditions, no new toasts.
        let summary = engine.run_pass(&snapshot, jan(1));
        assert_eq!(summary.toasts, 0);
    }

    #[tokio::test]
    async fn push_disabled_suppresses_toasts_but_not_feed() {
        let mut engine = AlertEngine::new(settings_store("push-off"));
        engine.settings_mut().update(|s| s.push_enabled = false).unwrap();
        let _toasts = engine.toast_stream();
        let snapshot = snapshot_with(vec![lead("l1", jan(2))], vec![]);

        let summary = engine.run_pass(&snapshot, jan(1));
        assert_eq!(summary.toasts, 0);
        assert_eq!(engine.store().len(), 1, "feed still written");
    }

    #[tokio::test]
    async fn trigger_pass_skips_while_another_holds_the_engine() {
        let engine = Arc::new(Mutex::new(AlertEngine::new(settings_store("busy"))));
        // trigger_pass scans at the wall clock, so the fixture is relative.
        let soon = Utc::now() + ChronoDuration::days(2);
        let provider = FixedProvider(snapshot_with(vec![lead("l1", soon)], vec![]));

        let guard = engine.lock().await;
        assert!(!trigger_pass(&engine, &provider), "busy engine skips the tick");
        drop(guard);

        assert!(trigger_pass(&engine, &provider));
        assert_eq!(engine.lock().await.store().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_loop_runs_startup_pass_and_stops_cleanly() {
        let engine = Arc::new(Mutex::new(AlertEngine::new(settings_store("loop"))));
        let soon = Utc::now() + ChronoDuration::days(2);
        let provider: Arc<dyn SnapshotProvider> =
            Arc::new(FixedProvider(snapshot_with(vec![lead("l1", soon)], vec![])));

        let handle = spawn_scan_loop(engine.clone(), provider, 3600);
        // First tick is immediate; give the loop task a moment to run it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(engine.lock().await.store().len(), 1);

        handle.shutdown().await;
    }

    #[test]
    fn reminder_entries_pass_through_untouched() {
        // Host-authored reminders share the feed but have no extractor.
        let mut engine = AlertEngine::new(settings_store("reminder"));
        let reminder = Notification::new(
            Category::Reminder,
            "me",
            "20240105",
            Priority::Low,
            "Call the fire department",
            "Confirm the inspection slot.",
            jan(1),
        );
        engine.store_mut().ingest(vec![reminder]);

        let snapshot = snapshot_with(vec![lead("l1", jan(3))], vec![]);
        engine.run_pass(&snapshot, jan(1));
        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.store().by_category(Category::Reminder).len(), 1);
    }
}
