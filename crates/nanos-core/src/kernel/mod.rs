//! # Nanos Core Kernel
//!
//! The `kernel` module assembles the running system: a phased binding store,
//! the memoizing factories held in it, and the boot sequence that fills it.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Binding Store**: [`Context`](context::Context) maps names and type tags to
//!   values or [`SingletonFactory`](factory::SingletonFactory)s and is frozen once
//!   assembly completes.
//! - **Boot Sequence**: [`Boot`](bootstrap::Boot) installs the foundation
//!   bindings, registers every catalog descriptor, freezes the store, starts eager
//!   services and finally runs the startup routine.
//! - **Producers and Routines**: [`ServiceRegistry`](registry::ServiceRegistry)
//!   maps producer ids to factories; [`RoutineCatalog`](routine::RoutineCatalog)
//!   holds the named entry points.
//! - **Credentials**: the [`KeyStore`](credentials::KeyStore) binding is loaded on
//!   first use from the properties file and credential store.
//! - **Error Handling**: kernel errors ([`Error`](error::Error)) and the `Result`
//!   alias live in the `error` submodule.
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod context;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod registry;
pub mod routine;

pub use bootstrap::Boot;
pub use config::BootConfig;
pub use context::{BindingKey, Context, Phase};
pub use credentials::{CredentialEntry, EntryKind, KeyStore, Properties};
pub use error::{Error, KernelLifecyclePhase, Result};
pub use factory::{Factory, SingletonFactory, Value};
pub use registry::ServiceRegistry;
pub use routine::{Routine, RoutineCatalog};
