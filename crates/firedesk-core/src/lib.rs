//! # Firedesk Core
//!
//! Shared foundation for the Firedesk crates: domain records and pipeline
//! stages, configuration, the error type, and the traits that mark the
//! boundary to external collaborators (snapshots in, email out).

pub mod config;
pub mod error;
pub mod records;
pub mod store;
pub mod traits;

pub use config::{AlertsConfig, AutomationConfig, FiredeskConfig, SmtpConfig};
pub use error::{FiredeskError, Result};
pub use records::{BudgetRecord, BudgetStatus, LeadRecord, ProcessRecord, Snapshot, Stage};
pub use store::RecordStore;
pub use traits::{EmailIdentity, IdentityResolver, Mailer, SnapshotProvider};
