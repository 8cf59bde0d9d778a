//! Connected outbound-email identity lookup.
//!
//! Firedesk never owns authentication; it only asks which sender, if any,
//! is connected right now. This store derives the answer from the `[smtp]`
//! config section, so flipping `enabled` off disconnects the identity and
//! silences automations on the very next transition.

use firedesk_core::config::SmtpConfig;
use firedesk_core::traits::{EmailIdentity, IdentityResolver};

/// Config-backed identity resolver.
pub struct ConnectedIdentityStore {
    smtp: SmtpConfig,
}

impl ConnectedIdentityStore {
    pub fn new(smtp: SmtpConfig) -> Self {
        Self { smtp }
    }
}

impl IdentityResolver for ConnectedIdentityStore {
    fn connected_identity(&self) -> Option<EmailIdentity> {
        if !self.smtp.enabled || self.smtp.username.is_empty() {
            return None;
        }
        Some(EmailIdentity {
            provider: "smtp".to_string(),
            address: self.smtp.username.clone(),
            display_name: self.smtp.display_name.clone(),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
