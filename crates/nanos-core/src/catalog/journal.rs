use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::descriptor::ServiceDescriptor;
use crate::catalog::error::CatalogError;
use crate::catalog::DescriptorDao;
use crate::identity::Subject;
use crate::kernel::error::{Error, Result};
use crate::storage::provider::StorageProvider;

/// One line of the journal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum JournalRecord {
    Put { descriptor: ServiceDescriptor },
    Remove { name: String },
}

/// Append-only, durable descriptor store.
///
/// Every write is appended to a JSON-lines journal before the in-memory view
/// changes; opening the store replays the journal. Insertion order survives
/// restarts, an update keeps the original position, and a removal drops it.
pub struct JournalDao {
    storage: Arc<dyn StorageProvider>,
    journal: PathBuf,
    records: RwLock<IndexMap<String, ServiceDescriptor>>,
    skipped: usize,
    // The file ends in an unterminated record; the next append starts a new line.
    torn_tail: AtomicBool,
}

impl JournalDao {
    /// Open (or start) the journal called `name` under the storage root.
    /// A missing journal is an empty catalog.
    pub fn open(storage: Arc<dyn StorageProvider>, name: &str) -> Result<Self> {
        let journal = PathBuf::from(name);
        let mut records = IndexMap::new();
        let mut skipped = 0;
        let mut torn_tail = false;

        if storage.exists(&journal) {
            let mut reader = BufReader::new(storage.open_read(&journal)?);
            let mut line = Vec::new();
            let mut number = 0;
            loop {
                line.clear();
                let read = reader
                    .read_until(b'\n', &mut line)
                    .map_err(|e| Error::io(e, "read_journal", journal.clone()))?;
                if read == 0 {
                    break;
                }
                number += 1;
                torn_tail = line.last() != Some(&b'\n');
                if line.trim_ascii().is_empty() {
                    continue;
                }
                if let Err(err) = Self::replay(&mut records, number, &line) {
                    log::warn!("{} in journal '{}'; skipping", err, name);
                    skipped += 1;
                }
            }
        }

        log::debug!("Journal '{}' replayed: {} descriptors, {} skipped", name, records.len(), skipped);
        Ok(Self {
            storage,
            journal,
            records: RwLock::new(records),
            skipped,
            torn_tail: AtomicBool::new(torn_tail),
        })
    }

    fn replay(records: &mut IndexMap<String, ServiceDescriptor>, line: usize, bytes: &[u8]) -> Result<()> {
        let malformed = |reason: String| Error::MalformedDescriptor { line, reason };
        let text = std::str::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
        let record: JournalRecord = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        match record {
            JournalRecord::Put { descriptor } => {
                descriptor.validate().map_err(malformed)?;
                records.insert(descriptor.name.clone(), descriptor);
            }
            JournalRecord::Remove { name } => {
                records.shift_remove(&name);
            }
        }
        Ok(())
    }

    /// Every descriptor in insertion order, bypassing all access policies.
    pub fn load(&self) -> Vec<ServiceDescriptor> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of journal lines skipped as malformed when opening.
    pub fn skipped_records(&self) -> usize {
        self.skipped
    }

    fn append(&self, record: &JournalRecord) -> Result<()> {
        let line = serde_json::to_string(record).map_err(|source| CatalogError::Encode { source })?;
        let mut out = self.storage.open_append(&self.journal)?;
        if self.torn_tail.load(Ordering::Acquire) {
            writeln!(out).map_err(|e| Error::io(e, "append_journal", self.journal.clone()))?;
            self.torn_tail.store(false, Ordering::Release);
        }
        writeln!(out, "{}", line).map_err(|e| Error::io(e, "append_journal", self.journal.clone()))?;
        out.flush().map_err(|e| Error::io(e, "flush_journal", self.journal.clone()))
    }
}

impl DescriptorDao for JournalDao {
    fn layer(&self) -> &'static str {
        "journal"
    }

    fn select(&self, _subject: &Subject) -> Result<Vec<ServiceDescriptor>> {
        Ok(self.load())
    }

    fn find(&self, _subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(name).cloned())
    }

    fn put(&self, _subject: &Subject, descriptor: ServiceDescriptor) -> Result<ServiceDescriptor> {
        descriptor
            .validate()
            .map_err(|reason| CatalogError::InvalidDescriptor { reason })?;
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        self.append(&JournalRecord::Put { descriptor: descriptor.clone() })?;
        records.insert(descriptor.name.clone(), descriptor.clone());
        Ok(descriptor)
    }

    fn remove(&self, _subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if !records.contains_key(name) {
            return Ok(None);
        }
        self.append(&JournalRecord::Remove { name: name.to_string() })?;
        Ok(records.shift_remove(name))
    }
}

impl fmt::Debug for JournalDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JournalDao")
            .field("journal", &self.journal)
            .field("storage", &self.storage.name())
            .finish()
    }
}
