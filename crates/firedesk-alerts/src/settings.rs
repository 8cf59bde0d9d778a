//! Per-category notification settings with flat-file persistence.
//!
//! The file is a small JSON object keyed by category name; its one job is
//! surviving a restart. Loaded on open, saved on every change, and
//! re-readable mid-session so edits from another process land on the next
//! scan pass.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use firedesk_core::error::{FiredeskError, Result};

use crate::notification::Category;

fn default_true() -> bool {
    true
}

/// One enable flag per notification category plus the global push flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub document: bool,
    #[serde(default = "default_true")]
    pub budget: bool,
    #[serde(default = "default_true")]
    pub follow_up: bool,
    #[serde(default = "default_true")]
    pub process: bool,
    #[serde(default = "default_true")]
    pub reminder: bool,
    /// Gates toast emission only; the feed itself is always written.
    #[serde(default = "default_true")]
    pub push_enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            document: true,
            budget: true,
            follow_up: true,
            process: true,
            reminder: true,
            push_enabled: true,
        }
    }
}

impl NotificationSettings {
    /// Whether a category's extractor may run at all.
    pub fn enabled(&self, category: Category) -> bool {
        match category {
            Category::Document => self.document,
            Category::Budget => self.budget,
            Category::FollowUp => self.follow_up,
            Category::Process => self.process,
            Category::Reminder => self.reminder,
        }
    }

    pub fn set_enabled(&mut self, category: Category, on: bool) {
        match category {
            Category::Document => self.document = on,
            Category::Budget => self.budget = on,
            Category::FollowUp => self.follow_up = on,
            Category::Process => self.process = on,
            Category::Reminder => self.reminder = on,
        }
    }
}

/// Settings persistence: load on open, save on change.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: NotificationSettings,
}

impl SettingsStore {
    /// Open the store, reading the file when present and falling back to
    /// defaults on first use or unreadable content.
    pub fn open(path: &Path) -> Self {
        let settings = Self::read(path).unwrap_or_default();
        Self { path: path.to_path_buf(), settings }
    }

    fn read(path: &Path) -> Option<NotificationSettings> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    tracing::warn!("⚠️ Failed to parse {}: {e}", path.display());
                    None
                }
            },
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", path.display());
                None
            }
        }
    }

    pub fn current(&self) -> NotificationSettings {
        self.settings
    }

    /// Re-read the file, picking up edits made by another process. Keeps
    /// the in-memory value when the file is missing or unreadable.
    pub fn reload(&mut self) {
        if let Some(settings) = Self::read(&self.path) {
            self.settings = settings;
        }
    }

    /// Apply a mutation and persist it.
    pub fn update(&mut self, apply: impl FnOnce(&mut NotificationSettings)) -> Result<()> {
        apply(&mut self.settings);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| FiredeskError::Store(format!("serialize settings: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| FiredeskError::Store(format!("write {}: {e}", self.path.display())))?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("firedesk-settings-{tag}.json"))
    }

    #[test]
    fn defaults_on_first_use() {
        let path = temp_path("fresh");
        std::fs::remove_file(&path).ok();
        let store = SettingsStore::open(&path);
        let settings = store.current();
        for category in Category::ALL {
            assert!(settings.enabled(category));
        }
        assert!(settings.push_enabled);
    }

    #[test]
    fn update_survives_reopen() {
        let path = temp_path("persist");
        std::fs::remove_file(&path).ok();

        let mut store = SettingsStore::open(&path);
        store.update(|s| s.set_enabled(Category::Budget, false)).unwrap();

        let reopened = SettingsStore::open(&path);
        assert!(!reopened.current().budget);
        assert!(reopened.current().document, "other flags untouched");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn reload_picks_up_external_edit() {
        let path = temp_path("reload");
        std::fs::remove_file(&path).ok();

        let mut store = SettingsStore::open(&path);
        assert!(store.current().process);

        let mut edited = NotificationSettings::default();
        edited.process = false;
        std::fs::write(&path, serde_json::to_string(&edited).unwrap()).unwrap();

        store.reload();
        assert!(!store.current().process);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json").unwrap();
        let store = SettingsStore::open(&path);
        assert!(store.current().push_enabled);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_fields_default_on() {
        let settings: NotificationSettings = serde_json::from_str(r#"{"budget": false}"#).unwrap();
        assert!(!settings.budget);
        assert!(settings.document);
        assert!(settings.push_enabled);
    }
}
