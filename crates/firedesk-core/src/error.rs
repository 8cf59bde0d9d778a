//! Crate-wide error type.
//!
//! Every fallible operation in the Firedesk crates returns [`Result`]. The
//! variants map onto the subsystems that can fail; paths that must not fail
//! (the scan pass, stage automations) log and degrade instead of
//! propagating.

use thiserror::Error;

/// Errors produced by the Firedesk engine crates.
#[derive(Error, Debug)]
pub enum FiredeskError {
    /// Configuration could not be read, parsed, or written.
    #[error("config error: {0}")]
    Config(String),

    /// A file-backed store failed to load or save.
    #[error("store error: {0}")]
    Store(String),

    /// Outbound mail could not be built or sent.
    #[error("mail error: {0}")]
    Mail(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across all Firedesk crates.
pub type Result<T> = std::result::Result<T, FiredeskError>;
