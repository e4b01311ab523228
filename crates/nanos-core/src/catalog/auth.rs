use std::fmt;
use std::sync::Arc;

use crate::catalog::descriptor::ServiceDescriptor;
use crate::catalog::error::CatalogError;
use crate::catalog::DescriptorDao;
use crate::identity::Subject;
use crate::kernel::constants::SERVICE_CAPABILITY;
use crate::kernel::error::Result;

/// Access policy enforced by [`AuthenticatedDao`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Reads need `<capability>.read`, writes `<capability>.write`.
    pub capability: String,
    /// Let callers without a user read.
    pub anonymous_read: bool,
}

impl AuthPolicy {
    pub fn new(capability: impl Into<String>, anonymous_read: bool) -> Self {
        Self { capability: capability.into(), anonymous_read }
    }
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self::new(SERVICE_CAPABILITY, false)
    }
}

#[derive(Debug, Clone, Copy)]
enum Access {
    Read,
    Write,
}

/// Gates every operation on the caller's permissions. Never alters data.
pub struct AuthenticatedDao {
    policy: AuthPolicy,
    delegate: Arc<dyn DescriptorDao>,
}

impl AuthenticatedDao {
    pub fn new(delegate: Arc<dyn DescriptorDao>, policy: AuthPolicy) -> Self {
        Self { policy, delegate }
    }

    pub fn policy(&self) -> &AuthPolicy {
        &self.policy
    }

    fn authorize(&self, subject: &Subject, operation: &str, access: Access) -> Result<()> {
        if let Access::Read = access {
            if self.policy.anonymous_read && subject.is_anonymous() {
                return Ok(());
            }
        }
        let permission = match access {
            Access::Read => format!("{}.read", self.policy.capability),
            Access::Write => format!("{}.write", self.policy.capability),
        };
        if subject.check(&permission) {
            return Ok(());
        }
        log::debug!(
            "Denied '{}' on service catalog for user {:?}",
            operation,
            subject.user().map(|u| u.id)
        );
        Err(CatalogError::AuthorizationDenied {
            operation: operation.to_string(),
            permission,
        }
        .into())
    }
}

impl DescriptorDao for AuthenticatedDao {
    fn layer(&self) -> &'static str {
        "authenticated"
    }

    fn delegate(&self) -> Option<Arc<dyn DescriptorDao>> {
        Some(self.delegate.clone())
    }

    fn select(&self, subject: &Subject) -> Result<Vec<ServiceDescriptor>> {
        self.authorize(subject, "select", Access::Read)?;
        self.delegate.select(subject)
    }

    fn find(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.authorize(subject, "find", Access::Read)?;
        self.delegate.find(subject, name)
    }

    fn put(&self, subject: &Subject, descriptor: ServiceDescriptor) -> Result<ServiceDescriptor> {
        self.authorize(subject, "put", Access::Write)?;
        self.delegate.put(subject, descriptor)
    }

    fn remove(&self, subject: &Subject, name: &str) -> Result<Option<ServiceDescriptor>> {
        self.authorize(subject, "remove", Access::Write)?;
        self.delegate.remove(subject, name)
    }
}

impl fmt::Debug for AuthenticatedDao {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedDao")
            .field("policy", &self.policy)
            .field("delegate", &self.delegate.layer())
            .finish()
    }
}
