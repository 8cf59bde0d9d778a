//! # Firedesk Channels
//!
//! Outbound channel implementations. Email over SMTP is the only automation
//! channel today; the `Mailer` seam in firedesk-core leaves room for more.

pub mod email;
pub mod identity;

pub use email::SmtpMailer;
pub use identity::ConnectedIdentityStore;
