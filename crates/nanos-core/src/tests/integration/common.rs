use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use crate::catalog::{DescriptorDao, JournalDao, ServiceDescriptor};
use crate::identity::Subject;
use crate::kernel::constants::SERVICES_JOURNAL;
use crate::kernel::{Context, Result, ServiceRegistry};
use crate::storage::LocalStorageProvider;

/// Calls per producer id.
#[derive(Debug, Default)]
pub struct CallCounter {
    calls: std::sync::Mutex<Vec<String>>,
    total: AtomicUsize,
}

impl CallCounter {
    pub fn record(&self, id: &str) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().expect("counter lock").push(id.to_string());
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("counter lock").clone()
    }
}

pub fn setup_data_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary data directory")
}

/// Append descriptors to the services journal under `dir`.
pub fn write_descriptors(dir: &Path, descriptors: &[ServiceDescriptor]) -> Result<()> {
    let provider = Arc::new(LocalStorageProvider::new(dir.to_path_buf()));
    let journal = JournalDao::open(provider, SERVICES_JOURNAL)?;
    for descriptor in descriptors {
        journal.put(&Subject::system(), descriptor.clone())?;
    }
    Ok(())
}

/// One producer per id, each returning its id as a `String`.
pub fn counting_registry(ids: &[&str], counter: &Arc<CallCounter>) -> ServiceRegistry {
    let mut producers = ServiceRegistry::new();
    for id in ids {
        let id = id.to_string();
        let counter = counter.clone();
        producers.register_type(id.clone(), move |_: &Context| {
            counter.record(&id);
            Ok(id.clone())
        });
    }
    producers
}
