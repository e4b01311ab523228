use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::catalog::descriptor::ServiceDescriptor;
use crate::catalog::DescriptorDao;
use crate::identity::Subject;
use crate::kernel::error::Result;

/// Call count and latency of one operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

impl OperationStats {
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.total / self.count as u32
    }
}

/// Shared sink for operation timings.
#[derive(Debug, Default)]
pub struct PerformanceRecorder {
    stats: Mutex<BTreeMap<String, OperationStats>>,
}

impl PerformanceRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &str, elapsed: Duration) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = stats.entry(operation.to_string()).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    pub fn stats(&self, operation: &str) -> Option<OperationStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).get(operation).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, OperationStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Times every operation of its delegate. Results pass through untouched,
/// failures included.
pub struct PerformanceDao {
    delegate: Arc<dyn DescriptorDao>,
    recorder: Arc<PerformanceRecorder>,
}

impl PerformanceDao {
    pub fn new(delegate: Arc<dyn DescriptorDao>, recorder: Arc<PerformanceRecorder>) -> Self {
        Self { delegate, recorder }
    }

    pub fn recorder(&self) -> &Arc<PerformanceRecorder> {
        &self.recorder
    }

    fn measure<T>(&self, operation: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
        let started = Instant::now();
        let outcome = call();
        let elapsed = started.elapsed();
        self.recorder.record(operation, elapsed);
        log::trace!("service catalog {} took {:?}", operation, elapsed);
        outcome
    }
}

impl DescriptorDao for PerformanceDao {
    fn layer(&self) -> &'static str {
        "performance"
    }

    fn delegate(&self) -> Option<Arc<dyn DescriptorDao>> {
        Some(self.delegate.clone())
    }

    fn select(&self, subject: &Subject) -> Result<Vec<ServiceDescriptor>> {
        self.measure("select", || self.delegate.select(subject))
    }

    fn find(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.measure("find", || self.delegate.find(subject, name))
    }

    fn put(&self, subject: &Subject, descriptor: ServiceDescriptor) -> Result<ServiceDescriptor> {
        self.measure("put", || self.delegate.put(subject, descriptor))
    }

    fn remove(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.measure("remove", || self.delegate.remove(subject, name))
    }
}

impl fmt::Debug for PerformanceDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceDao")
            .field("delegate", &self.delegate.layer())
            .finish()
    }
}
