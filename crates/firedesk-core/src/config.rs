//! Firedesk configuration system.
//!
//! One TOML file at `~/.firedesk/config.toml` with a section per subsystem.
//! Missing file or missing sections fall back to defaults, so a fresh
//! install runs with zero setup (and with automations silently disabled
//! until SMTP is configured).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FiredeskError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredeskConfig {
    /// Base directory for settings and record files. Tilde is expanded by
    /// the binary, not here.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
}

impl Default for FiredeskConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            alerts: AlertsConfig::default(),
            smtp: SmtpConfig::default(),
            automation: AutomationConfig::default(),
        }
    }
}

impl FiredeskConfig {
    /// Load from the default path, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from an explicit path. A missing or malformed file is an error
    /// here; the caller asked for this exact file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FiredeskError::Config(format!("Failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| FiredeskError::Config(format!("Failed to parse {}: {e}", path.display())))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| FiredeskError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// `~/.firedesk/config.toml`
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// `~/.firedesk`
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".firedesk")
    }
}

fn default_data_dir() -> String {
    "~/.firedesk".to_string()
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

/// Scan cadence and toast pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Seconds between scan passes. 30 minutes by default.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    /// Seconds between stacked high-priority toasts.
    #[serde(default = "default_toast_spacing")]
    pub toast_spacing_secs: u64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            toast_spacing_secs: default_toast_spacing(),
        }
    }
}

fn default_scan_interval() -> u64 {
    1800
}

fn default_toast_spacing() -> u64 {
    2
}

// ─── SMTP ────────────────────────────────────────────────────────────────────

/// Outbound SMTP account used for stage automations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// When false no email identity is considered connected.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address; doubles as the SMTP login.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Display name for the From header.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            display_name: None,
        }
    }
}

impl SmtpConfig {
    /// Password with environment override, so credentials can stay out of
    /// the config file entirely.
    pub fn resolve_password(&self) -> String {
        std::env::var("FIREDESK_SMTP_PASSWORD").unwrap_or_else(|_| self.password.clone())
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

// ─── Automation ──────────────────────────────────────────────────────────────

/// Stage automation switches and templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Master switch for all stage automations.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Subject for the automatic-contact email. `{{lead.*}}` and
    /// `{{identity.*}}` placeholders are filled at dispatch time.
    #[serde(default = "default_contact_subject")]
    pub contact_subject: String,
    /// Plain-text body for the automatic-contact email.
    #[serde(default = "default_contact_body")]
    pub contact_body: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            contact_subject: default_contact_subject(),
            contact_body: default_contact_body(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_contact_subject() -> String {
    "Fire safety license: next steps for {{lead.company}}".to_string()
}

fn default_contact_body() -> String {
    "Hello {{lead.company}} team,\n\n\
     Thank you for getting in touch about your AVCB/CLCB licensing. We have\n\
     received your request and one of our consultants will follow up with a\n\
     tailored proposal shortly.\n\n\
     Best regards,\n\
     {{identity.name}}"
        .to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
