//! # Nanos Service Catalog
//!
//! The durable, ordered collection of [`ServiceDescriptor`]s the kernel boots
//! from. [`JournalDao`] is the raw store; the kernel reads it directly while
//! booting. Everyone else reaches it through the decorator chain built by
//! [`decorate`] from [`EXPORT_CHAIN`]:
//!
//! ```text
//! PerformanceDao -> AuthenticatedDao -> JournalDao
//! ```
//!
//! so measured latency includes the cost of the access check.
use std::fmt::Debug;
use std::sync::Arc;

pub mod auth;
pub mod descriptor;
pub mod error;
pub mod journal;
pub mod perf;
pub mod proxy;

pub use auth::{AuthPolicy, AuthenticatedDao};
pub use descriptor::ServiceDescriptor;
pub use error::CatalogError;
pub use journal::JournalDao;
pub use perf::{OperationStats, PerformanceDao, PerformanceRecorder};
pub use proxy::ProxyDao;

use crate::identity::Subject;
use crate::kernel::error::Result;

/// Access to a descriptor store on behalf of a caller.
pub trait DescriptorDao: Send + Sync + Debug {
    /// Short name of this layer, used for diagnostics.
    fn layer(&self) -> &'static str;

    /// The store this layer wraps, if any.
    fn delegate(&self) -> Option<Arc<dyn DescriptorDao>> {
        None
    }

    /// All descriptors in catalog order.
    fn select(&self, subject: &Subject) -> Result<Vec<ServiceDescriptor>>;

    fn find(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>>;

    /// Insert or update by name.
    fn put(&self, subject: &Subject, descriptor: ServiceDescriptor) -> Result<ServiceDescriptor>;

    fn remove(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>>;
}

/// A cross-cutting policy wrapped around a descriptor store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decorator {
    Performance,
    Authentication,
}

/// Decorators applied to the exported catalog, outermost first.
pub const EXPORT_CHAIN: [Decorator; 2] = [Decorator::Performance, Decorator::Authentication];

/// Settings the decorators are built from.
#[derive(Debug, Clone, Default)]
pub struct ChainConfig {
    pub policy: AuthPolicy,
    pub recorder: Arc<PerformanceRecorder>,
}

/// Wrap `base` in `chain`, listed outermost first.
pub fn decorate(base: Arc<dyn DescriptorDao>, chain: &[Decorator], config: &ChainConfig) -> Arc<dyn DescriptorDao> {
    chain.iter().rev().fold(base, |inner, decorator| match decorator {
        Decorator::Performance => Arc::new(PerformanceDao::new(inner, config.recorder.clone())),
        Decorator::Authentication => Arc::new(AuthenticatedDao::new(inner, config.policy.clone())),
    })
}

/// Layer names from `dao` inwards, e.g. `["performance", "authenticated", "journal"]`.
pub fn layers(dao: &Arc<dyn DescriptorDao>) -> Vec<&'static str> {
    let mut names = vec![dao.layer()];
    let mut next = dao.delegate();
    while let Some(current) = next {
        names.push(current.layer());
        next = current.delegate();
    }
    names
}

#[cfg(test)]
mod tests;
