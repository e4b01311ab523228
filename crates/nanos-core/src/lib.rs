pub mod catalog;
pub mod identity;
pub mod kernel;
pub mod storage;

// Re-export key public types for the binary
pub use catalog::{AuthPolicy, DescriptorDao, ServiceDescriptor};
pub use identity::{Group, Session, Subject, User};
pub use kernel::error::Error as KernelError;
pub use kernel::{Boot, BootConfig, Context, KeyStore, RoutineCatalog, ServiceRegistry, SingletonFactory};
pub use storage::{Storage, StorageProvider};

#[cfg(test)]
mod tests;
