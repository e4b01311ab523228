use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::descriptor::ServiceDescriptor;
use crate::catalog::error::CatalogError;
use crate::catalog::DescriptorDao;
use crate::identity::Subject;
use crate::kernel::error::Result;

/// Stand-in bound while the store is open; the boot sequencer points it at
/// the exported chain once the store is frozen.
#[derive(Default)]
pub struct ProxyDao {
    delegate: RwLock<Option<Arc<dyn DescriptorDao>>>,
}

impl ProxyDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_delegate(&self, delegate: Arc<dyn DescriptorDao>) {
        *self.delegate.write().unwrap_or_else(PoisonError::into_inner) = Some(delegate);
    }

    pub fn is_connected(&self) -> bool {
        self.delegate.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn target(&self) -> Result<Arc<dyn DescriptorDao>> {
        self.delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| CatalogError::Unavailable.into())
    }
}

impl DescriptorDao for ProxyDao {
    fn layer(&self) -> &'static str {
        "proxy"
    }

    fn delegate(&self) -> Option<Arc<dyn DescriptorDao>> {
        self.delegate.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn select(&self, subject: &Subject) -> Result<Vec<ServiceDescriptor>> {
        self.target()?.select(subject)
    }

    fn find(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.target()?.find(subject, name)
    }

    fn put(&self, subject: &Subject, descriptor: ServiceDescriptor) -> Result<ServiceDescriptor> {
        self.target()?.put(subject, descriptor)
    }

    fn remove(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.target()?.remove(subject, name)
    }
}

impl fmt::Debug for ProxyDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyDao")
            .field("connected", &self.is_connected())
            .finish()
    }
}
