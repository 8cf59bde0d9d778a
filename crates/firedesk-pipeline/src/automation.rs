//! Stage automation dispatcher.
//!
//! Maps a stage-transition event to at most one best-effort side effect,
//! keyed on the destination stage. The transition that triggered the
//! dispatch has already been applied and is the source of truth: nothing
//! here can fail it, block it, or roll it back. Failures degrade to logs,
//! and there is no retry queue.

use std::sync::Arc;

use tokio::task::JoinHandle;

use firedesk_core::config::AutomationConfig;
use firedesk_core::records::{LeadRecord, Stage};
use firedesk_core::traits::{EmailIdentity, IdentityResolver, Mailer};

use crate::transition::StageTransitionEvent;

/// Dispatches stage-entry automations.
pub struct AutomationDispatcher {
    config: AutomationConfig,
    identity: Arc<dyn IdentityResolver>,
    mailer: Arc<dyn Mailer>,
}

impl AutomationDispatcher {
    pub fn new(
        config: AutomationConfig,
        identity: Arc<dyn IdentityResolver>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self { config, identity, mailer }
    }

    /// Spawn the dispatch so the caller never waits on it.
    pub fn dispatch_detached(
        self: Arc<Self>,
        event: StageTransitionEvent,
        lead: LeadRecord,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.dispatch(&event, &lead).await })
    }

    /// Handle one transition event. Stages without an automation are no-ops.
    pub async fn dispatch(&self, event: &StageTransitionEvent, lead: &LeadRecord) {
        match event.to_stage {
            Stage::AutomaticContact => self.send_contact_email(lead).await,
            Stage::ManualContact | Stage::Proposal => {
                // Reserved hook points; routed here so future handlers slot
                // in without touching the transition machine.
                tracing::debug!(
                    "🪝 No automation wired for stage '{}' (lead '{}')",
                    event.to_stage.label(),
                    lead.id
                );
            }
            Stage::Contact | Stage::ClosedClient => {}
        }
    }

    /// Best-effort templated email on entering Automatic Contact.
    async fn send_contact_email(&self, lead: &LeadRecord) {
        if !self.config.enabled {
            tracing::debug!("🔕 Stage automation disabled, skipping email for '{}'", lead.id);
            return;
        }
        let Some(identity) = self.identity.connected_identity() else {
            tracing::warn!(
                "📭 No connected email identity, skipping automatic contact for '{}'",
                lead.id
            );
            return;
        };
        let Some(recipient) = lead.contact_email.as_deref() else {
            tracing::warn!("📭 Lead '{}' has no contact email, skipping automatic contact", lead.id);
            return;
        };

        let subject = render_template(&self.config.contact_subject, lead, &identity);
        let body = render_template(&self.config.contact_body, lead, &identity);
        match self.mailer.send(&identity, recipient, &subject, &body).await {
            Ok(()) => {
                tracing::info!("📤 Automatic contact sent to {recipient} for lead '{}'", lead.id);
            }
            Err(e) => {
                tracing::warn!("⚠️ Automatic contact to {recipient} failed (not retried): {e}");
            }
        }
    }
}

/// Fill `{{lead.*}}` and `{{identity.*}}` placeholders.
fn render_template(template: &str, lead: &LeadRecord, identity: &EmailIdentity) -> String {
    template
        .replace("{{lead.id}}", &lead.id)
        .replace("{{lead.company}}", &lead.company)
        .replace("{{lead.stage}}", lead.stage.label())
        .replace("{{identity.name}}", identity.from_name())
        .replace("{{identity.address}}", &identity.address)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
