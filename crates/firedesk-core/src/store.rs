//! File-backed record store.
//!
//! Stand-in for the back-office persistence layer: leads, processes, and
//! budgets live as JSON arrays under the data directory. Loads are
//! tolerant, a malformed element is skipped and logged so one bad record
//! never takes down a scan pass.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{FiredeskError, Result};
use crate::records::{BudgetRecord, LeadRecord, ProcessRecord, Snapshot};
use crate::traits::SnapshotProvider;

const LEADS_FILE: &str = "leads.json";
const PROCESSES_FILE: &str = "processes.json";
const BUDGETS_FILE: &str = "budgets.json";

/// JSON-file store for the three record collections.
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open (and create) the store directory.
    pub fn new(dir: &Path) -> Self {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("⚠️ Could not create record dir {}: {e}", dir.display());
        }
        Self { dir: dir.to_path_buf() }
    }

    /// Load all three collections. Missing files mean empty collections.
    pub fn load_snapshot(&self) -> Snapshot {
        Snapshot {
            leads: self.read_records(LEADS_FILE),
            processes: self.read_records(PROCESSES_FILE),
            budgets: self.read_records(BUDGETS_FILE),
        }
    }

    pub fn save_leads(&self, leads: &[LeadRecord]) -> Result<()> {
        self.write_records(LEADS_FILE, leads)
    }

    pub fn save_processes(&self, processes: &[ProcessRecord]) -> Result<()> {
        self.write_records(PROCESSES_FILE, processes)
    }

    pub fn save_budgets(&self, budgets: &[BudgetRecord]) -> Result<()> {
        self.write_records(BUDGETS_FILE, budgets)
    }

    /// Parse one file element-by-element, dropping the pieces that fail.
    fn read_records<T: DeserializeOwned>(&self, file: &str) -> Vec<T> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Vec::new();
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("⚠️ Failed to read {}: {e}", path.display());
                return Vec::new();
            }
        };
        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("⚠️ Failed to parse {}: {e}", path.display());
                return Vec::new();
            }
        };
        values
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed record #{i} in {file}: {e}");
                    None
                }
            })
            .collect()
    }

    fn write_records<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let path = self.dir.join(file);
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| FiredeskError::Store(format!("serialize {file}: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| FiredeskError::Store(format!("write {}: {e}", path.display())))?;
        tracing::debug!("💾 Saved {} record(s) to {}", records.len(), path.display());
        Ok(())
    }
}

impl SnapshotProvider for RecordStore {
    fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.load_snapshot())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
