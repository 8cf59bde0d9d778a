//! # Firedesk Alerts
//!
//! Deadline-driven alerting engine: scans snapshots of back-office records
//! on a fixed cadence and maintains a deduplicated, bounded, prioritized
//! notification feed.
//!
//! ```text
//! Scan loop (tokio interval, cancelable)
//!   ├── license-expiry  ─┐
//!   ├── follow-up-due   ─┤  pure extractors, gated by settings
//!   ├── budget-status   ─┤
//!   └── process-due     ─┘
//!          ↓
//!   NotificationStore (dedup, cap 50, read state, dismissals)
//!          ↓
//!   ToastStream (staggered high-priority alerts)
//! ```

pub mod notification;
pub mod scan;
pub mod settings;
pub mod signals;
pub mod store;

pub use notification::{Category, Notification, Priority};
pub use scan::{AlertEngine, PassSummary, ScanLoopHandle, ToastStream, spawn_scan_loop, trigger_pass};
pub use settings::{NotificationSettings, SettingsStore};
pub use store::{FEED_CAP, IngestOutcome, NotificationStore};
