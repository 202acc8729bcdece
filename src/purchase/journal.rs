//! Purchase record storage and persistence.

use dashmap::DashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::observability::metrics;
use crate::purchase::types::PurchaseRecord;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Thread-safe store of purchase records, written through to a JSON file.
#[derive(Clone, Default)]
pub struct PurchaseJournal {
    inner: Arc<DashMap<Uuid, PurchaseRecord>>,
    persistence_path: Option<PathBuf>,
}

impl PurchaseJournal {
    /// Create an empty journal.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists; otherwise start empty at that path.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let journal = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: Vec<PurchaseRecord> = serde_json::from_reader(reader)?;
            for record in records {
                journal.inner.insert(record.id, record);
            }
            tracing::info!(path = %path.display(), records = journal.inner.len(), "Loaded purchase journal");
        }
        Ok(journal)
    }

    /// Write every record to disk.
    ///
    /// Writes a sibling temp file then renames it over the journal, so a
    /// crash mid-write leaves the previous version intact.
    pub fn save(&self) -> Result<(), JournalError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut records: Vec<PurchaseRecord> =
            self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &records)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), records = records.len(), "Saved purchase journal");
        Ok(())
    }

    /// Insert or replace a record and persist.
    pub fn upsert(&self, record: &PurchaseRecord) -> Result<(), JournalError> {
        self.inner.insert(record.id, record.clone());
        metrics::record_journal_size(self.inner.len());
        self.save()
    }

    pub fn get(&self, id: &Uuid) -> Option<PurchaseRecord> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Records that still need attention, oldest first.
    pub fn pending(&self) -> Vec<PurchaseRecord> {
        let mut records: Vec<PurchaseRecord> = self
            .inner
            .iter()
            .filter(|r| !r.value().is_terminal())
            .map(|r| r.value().clone())
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        records
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}
