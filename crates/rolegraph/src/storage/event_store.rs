//! Ledger event persistence.
//!
//! Stores confirmed [`LedgerEvent`]s as JSON files, one per event:
//!
//! ```text
//! {base_dir}/
//! ├── events/
//! │   └── {seq}.json
//! └── labels.json     — presentation labels (optional)
//! ```
//!
//! File format for events:
//! ```json
//! { "version": 1, "event": { ... LedgerEvent ... } }
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoleGraphError};
use crate::graph::CredentialGraph;
use crate::ledger::{InMemoryLedger, LedgerClient, LedgerEvent};
use crate::verify::VerifierConfig;

// ── File format constants ─────────────────────────────────────────────────────

const EVENT_FILE_VERSION: u32 = 1;

const EVENTS_DIR: &str = "events";
const LABELS_FILE: &str = "labels.json";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Wrapper written to disk for each event.
#[derive(Debug, Serialize, Deserialize)]
struct EventFile {
    /// Format version number.
    version: u32,
    /// The stored event.
    event: LedgerEvent,
}

// ── EventStore ────────────────────────────────────────────────────────────────

/// Filesystem-backed ledger event log.
pub struct EventStore {
    base_dir: PathBuf,
}

impl EventStore {
    /// Create a new `EventStore` rooted at `base_dir`.
    ///
    /// Creates the `events/` sub-directory if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns `RoleGraphError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(EVENTS_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist one event to `events/{seq}.json`.
    ///
    /// # Errors
    ///
    /// Returns `RoleGraphError::SerializationError` if serialization fails,
    /// or `RoleGraphError::Io` for filesystem errors.
    pub fn append(&self, event: &LedgerEvent) -> Result<()> {
        let file = EventFile {
            version: EVENT_FILE_VERSION,
            event: event.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| RoleGraphError::SerializationError(e.to_string()))?;
        std::fs::write(self.event_path(event.seq), json.as_bytes())?;
        Ok(())
    }

    /// Persist every event `ledger` confirmed after the stored head.
    ///
    /// Returns the number of events written.
    pub fn sync_from<L>(&self, ledger: &L) -> Result<usize>
    where
        L: LedgerClient + ?Sized,
    {
        let events = ledger.events_since(self.head()?)?;
        for event in &events {
            self.append(event)?;
        }
        debug!("persisted {} events to {}", events.len(), self.base_dir.display());
        Ok(events.len())
    }

    /// Load every stored event, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns `RoleGraphError::InvalidFileFormat` for malformed or
    /// unsupported files, or `RoleGraphError::Io` for filesystem errors.
    pub fn load_all(&self) -> Result<Vec<LedgerEvent>> {
        let mut events = Vec::new();
        for seq in self.list_seqs()? {
            events.push(self.read_event(&self.event_path(seq))?);
        }
        Ok(events)
    }

    /// Highest stored sequence number, 0 when the log is empty.
    pub fn head(&self) -> Result<u64> {
        Ok(self.list_seqs()?.last().copied().unwrap_or(0))
    }

    /// Rebuild the ledger from the stored log.
    pub fn restore_ledger(&self, verifier: VerifierConfig) -> Result<InMemoryLedger> {
        InMemoryLedger::restore(self.load_all()?, verifier)
    }

    /// Rebuild a local mirror from the stored log.
    pub fn load_mirror(&self) -> Result<CredentialGraph> {
        CredentialGraph::replay(self.load_all()?.iter())
    }

    // ── Labels ────────────────────────────────────────────────────────────────

    /// Write presentation labels to `labels.json`.
    pub fn save_labels<T: Serialize>(&self, labels: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(labels)
            .map_err(|e| RoleGraphError::SerializationError(e.to_string()))?;
        std::fs::write(self.base_dir.join(LABELS_FILE), json.as_bytes())?;
        Ok(())
    }

    /// Read `labels.json`, if present.
    pub fn load_labels<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let path = self.base_dir.join(LABELS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        let labels = serde_json::from_slice(&bytes).map_err(|e| {
            RoleGraphError::InvalidFileFormat(format!(
                "failed to parse labels file {}: {e}",
                path.display()
            ))
        })?;
        Ok(Some(labels))
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn event_path(&self, seq: u64) -> PathBuf {
        self.base_dir.join(EVENTS_DIR).join(format!("{seq}.json"))
    }

    fn read_event(&self, path: &Path) -> Result<LedgerEvent> {
        let bytes = std::fs::read(path)?;
        let file: EventFile = serde_json::from_slice(&bytes).map_err(|e| {
            RoleGraphError::InvalidFileFormat(format!(
                "failed to parse event file {}: {e}",
                path.display()
            ))
        })?;
        if file.version != EVENT_FILE_VERSION {
            return Err(RoleGraphError::InvalidFileFormat(format!(
                "unsupported event file version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(file.event)
    }

    /// Sequence numbers from `{seq}.json` filenames, ascending.
    fn list_seqs(&self) -> Result<Vec<u64>> {
        let mut seqs = Vec::new();
        for entry in std::fs::read_dir(self.base_dir.join(EVENTS_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(seq) = name_str
                .strip_suffix(".json")
                .and_then(|stem| stem.parse::<u64>().ok())
            {
                seqs.push(seq);
            }
        }
        seqs.sort_unstable();
        Ok(seqs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
