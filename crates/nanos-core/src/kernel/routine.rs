use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::context::Context;
use crate::kernel::error::Result;

/// A named routine run against the frozen store.
pub type Routine = Arc<dyn Fn(&Context) -> Result<()> + Send + Sync>;

/// Named routines the startup routine is picked from.
#[derive(Clone, Default)]
pub struct RoutineCatalog {
    routines: BTreeMap<String, Routine>,
}

impl RoutineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a routine, replacing one with the same name.
    pub fn with<F>(mut self, name: impl Into<String>, routine: F) -> Self
    where
        F: Fn(&Context) -> Result<()> + Send + Sync + 'static,
    {
        self.register(name, routine);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, routine: F)
    where
        F: Fn(&Context) -> Result<()> + Send + Sync + 'static,
    {
        self.routines.insert(name.into(), Arc::new(routine));
    }

    pub fn find(&self, name: &str) -> Option<Routine> {
        self.routines.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routines.keys().map(String::as_str)
    }
}

impl fmt::Debug for RoutineCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutineCatalog")
            .field("routines", &self.routines.keys().collect::<Vec<_>>())
            .finish()
    }
}
