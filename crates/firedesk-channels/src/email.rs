//! SMTP email channel — async sending via lettre.
//!
//! The only outbound channel Firedesk automations use today. STARTTLS relay
//! with password auth; works with Gmail, Outlook, or a custom server.

use async_trait::async_trait;

use firedesk_core::config::SmtpConfig;
use firedesk_core::error::{FiredeskError, Result};
use firedesk_core::traits::{EmailIdentity, Mailer};

/// Outbound mail over SMTP STARTTLS.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(
        &self,
        from: &EmailIdentity,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<lettre::Message> {
        use lettre::{Message, message::Mailbox, message::header::ContentType};

        let from_mailbox: Mailbox = format!("{} <{}>", from.from_name(), from.address)
            .parse()
            .map_err(|e| FiredeskError::Mail(format!("Invalid from: {e}")))?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| FiredeskError::Mail(format!("Invalid to: {e}")))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| FiredeskError::Mail(format!("Build email: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, from: &EmailIdentity, to: &str, subject: &str, body: &str) -> Result<()> {
        use lettre::{AsyncSmtpTransport, AsyncTransport, transport::smtp::authentication::Credentials};

        let email = self.build_message(from, to, subject, body)?;

        let creds = Credentials::new(self.config.username.clone(), self.config.resolve_password());

        let mailer = AsyncSmtpTransport::<lettre::Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| FiredeskError::Mail(format!("SMTP relay: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build();

        mailer
            .send(email)
            .await
            .map_err(|e| FiredeskError::Mail(format!("SMTP send: {e}")))?;

        tracing::info!("📤 Email sent to: {to}");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
