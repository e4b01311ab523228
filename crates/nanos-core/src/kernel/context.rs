//! The phased binding store.
//!
//! A [`Context`] maps [`BindingKey`]s to values or [`SingletonFactory`]s. It
//! starts [`Phase::Open`] and is frozen exactly once; after that no key can be
//! added or replaced, while lookups keep resolving and caching factories.
//!
//! [`Context::derive`] returns a child view used while assembling the root:
//! writes land in the child, reads fall through to the parent, and
//! [`Context::freeze`] on the child flattens its bindings into the parent and
//! freezes both. Once an ancestor is frozen, a derived view refuses writes.
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::kernel::error::{Error, Result};
use crate::kernel::factory::{SingletonFactory, Value};

/// Key of a binding: a symbolic name or a type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKey {
    Name(String),
    Type { id: TypeId, name: &'static str },
}

impl BindingKey {
    /// Key naming the type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        BindingKey::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        BindingKey::Name(name.into())
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKey::Name(name) => f.write_str(name),
            BindingKey::Type { name, .. } => f.write_str(name),
        }
    }
}

impl From<&str> for BindingKey {
    fn from(name: &str) -> Self {
        BindingKey::Name(name.to_string())
    }
}

impl From<String> for BindingKey {
    fn from(name: String) -> Self {
        BindingKey::Name(name)
    }
}

impl From<&String> for BindingKey {
    fn from(name: &String) -> Self {
        BindingKey::Name(name.clone())
    }
}

/// Mutability phase of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Open,
    Frozen,
}

#[derive(Clone)]
enum Binding {
    Value(Value),
    Factory(Arc<SingletonFactory>),
}

struct NodeState {
    phase: Phase,
    bindings: HashMap<BindingKey, Binding>,
}

struct ContextNode {
    state: RwLock<NodeState>,
    parent: Option<Context>,
}

/// Handle to a binding store. Cloning is cheap and shares the store.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextNode>,
}

impl Context {
    /// Create an empty, open root store.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Context>) -> Self {
        Self {
            inner: Arc::new(ContextNode {
                state: RwLock::new(NodeState {
                    phase: Phase::Open,
                    bindings: HashMap::new(),
                }),
                parent,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.read().phase
    }

    pub fn is_frozen(&self) -> bool {
        self.phase() == Phase::Frozen
    }

    /// Bind a value, replacing any previous binding for the key.
    pub fn put(&self, key: impl Into<BindingKey>, value: Value) -> Result<()> {
        self.bind(key.into(), Binding::Value(value))
    }

    /// Bind an unresolved factory, replacing any previous binding for the key.
    pub fn put_factory(&self, key: impl Into<BindingKey>, factory: SingletonFactory) -> Result<()> {
        let key = key.into();
        let factory = if factory.has_label() {
            factory
        } else {
            factory.labelled(key.to_string())
        };
        self.bind(key, Binding::Factory(Arc::new(factory)))
    }

    /// Bind `value` under the type key of `T`.
    pub fn put_instance<T: Any + Send + Sync>(&self, value: T) -> Result<()> {
        self.put(BindingKey::of::<T>(), Arc::new(value))
    }

    /// Bind a factory under the type key of `T`.
    pub fn put_type_factory<T: Any + Send + Sync>(&self, factory: SingletonFactory) -> Result<()> {
        self.put_factory(BindingKey::of::<T>(), factory)
    }

    fn bind(&self, key: BindingKey, binding: Binding) -> Result<()> {
        let mut state = self.write();
        if state.phase == Phase::Frozen || self.ancestor_frozen() {
            return Err(Error::FrozenStore { key: key.to_string() });
        }
        log::trace!("Binding '{}'", key);
        state.bindings.insert(key, binding);
        Ok(())
    }

    /// Look up a binding, resolving (and caching) a factory on first use.
    pub fn get(&self, key: impl Into<BindingKey>) -> Result<Value> {
        let key = key.into();
        match self.lookup(&key) {
            Some(Binding::Value(value)) => Ok(value),
            Some(Binding::Factory(factory)) => factory.resolve(self),
            None => Err(Error::UnboundKey { key: key.to_string() }),
        }
    }

    /// Look up a binding and downcast it to `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, key: impl Into<BindingKey>) -> Result<Arc<T>> {
        let key = key.into();
        let value = self.get(key.clone())?;
        value.downcast::<T>().map_err(|_| Error::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Look up the binding under the type key of `T`.
    pub fn instance<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get_as::<T>(BindingKey::of::<T>())
    }

    /// Whether the key is bound here or in a parent.
    pub fn contains(&self, key: impl Into<BindingKey>) -> bool {
        self.lookup(&key.into()).is_some()
    }

    /// All keys visible from this view.
    pub fn keys(&self) -> Vec<BindingKey> {
        let mut keys: Vec<BindingKey> = self.read().bindings.keys().cloned().collect();
        if let Some(parent) = &self.inner.parent {
            for key in parent.keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    // The lock is released before any factory runs; producers read the store.
    fn lookup(&self, key: &BindingKey) -> Option<Binding> {
        if let Some(binding) = self.read().bindings.get(key) {
            return Some(binding.clone());
        }
        self.inner.parent.as_ref().and_then(|parent| parent.lookup(key))
    }

    // Child locks are taken before parent locks, as in `freeze`.
    fn ancestor_frozen(&self) -> bool {
        let mut next = self.inner.parent.as_ref();
        while let Some(parent) = next {
            if parent.read().phase == Phase::Frozen {
                return true;
            }
            next = parent.inner.parent.as_ref();
        }
        false
    }

    /// Create a child view for additive setup while this store and every
    /// ancestor are open.
    pub fn derive(&self) -> Result<Context> {
        if self.is_frozen() || self.ancestor_frozen() {
            return Err(Error::FrozenStore { key: "<derived scope>".to_string() });
        }
        Ok(Self::with_parent(Some(self.clone())))
    }

    /// Freeze the store. On a derived view the bindings are first moved into
    /// the parent, which is frozen in turn. Freezing twice is an error.
    pub fn freeze(&self) -> Result<()> {
        {
            let mut state = self.write();
            if state.phase == Phase::Frozen {
                return Err(Error::AlreadyFrozen);
            }
            if let Some(parent) = &self.inner.parent {
                let mut parent_state = parent.write();
                if parent_state.phase == Phase::Frozen {
                    return Err(Error::AlreadyFrozen);
                }
                parent_state.bindings.extend(state.bindings.drain());
            }
            state.phase = Phase::Frozen;
        }
        match &self.inner.parent {
            Some(parent) => parent.freeze(),
            None => {
                log::debug!("Binding store frozen");
                Ok(())
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NodeState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, NodeState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Context")
            .field("phase", &state.phase)
            .field("bindings", &state.bindings.len())
            .field("derived", &self.inner.parent.is_some())
            .finish()
    }
}
