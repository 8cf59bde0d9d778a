//! Seam traits for external collaborators.
//!
//! The engine reads snapshots in and pushes email out; everything else is a
//! host concern. Keeping these seams as traits lets tests swap in-memory
//! fakes for the record store and the SMTP transport.

use async_trait::async_trait;

use crate::error::Result;
use crate::records::Snapshot;

/// Read-only source of domain snapshots for a scan pass.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> Result<Snapshot>;
}

/// A currently connected outbound-email identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailIdentity {
    /// Provider tag ("smtp", "gmail", ...). Informational only.
    pub provider: String,
    /// Sender address.
    pub address: String,
    /// Display name for the From header.
    pub display_name: Option<String>,
}

impl EmailIdentity {
    /// Name used in the From header and in templates.
    pub fn from_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Firedesk")
    }
}

/// Resolves which outbound-email identity, if any, is connected right now.
///
/// Automations re-resolve at dispatch time instead of caching, so an account
/// disconnect takes effect on the very next transition.
pub trait IdentityResolver: Send + Sync {
    fn connected_identity(&self) -> Option<EmailIdentity>;
}

/// Outbound email delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, from: &EmailIdentity, to: &str, subject: &str, body: &str) -> Result<()>;
}
