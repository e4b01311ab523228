use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::kernel::context::Context;
use crate::kernel::error::Result;
use crate::kernel::factory::{Factory, Value};

/// Producers for the services a descriptor can name, keyed by producer id.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    producers: HashMap<String, Arc<dyn Factory>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer returning a type-erased value.
    pub fn register(&mut self, id: impl Into<String>, producer: impl Factory + 'static) -> &mut Self {
        self.producers.insert(id.into(), Arc::new(producer));
        self
    }

    /// Register a producer returning a concrete type.
    pub fn register_type<T, F>(&mut self, id: impl Into<String>, producer: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&Context) -> Result<T> + Send + Sync + 'static,
    {
        self.register(id, move |context: &Context| -> Result<Value> {
            Ok(Arc::new(producer(context)?) as Value)
        })
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Factory>> {
        self.producers.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.producers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.producers.keys().collect();
        ids.sort();
        f.debug_struct("ServiceRegistry").field("producers", &ids).finish()
    }
}
