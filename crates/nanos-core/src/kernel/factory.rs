//! Memoizing producers for the binding store.
//!
//! A [`SingletonFactory`] wraps a [`Factory`] and runs it at most once. The
//! `Unresolved -> Resolving -> Resolved` transition is guarded by a mutex, so
//! concurrent resolvers block on the one in flight instead of constructing a
//! second instance.
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use crate::kernel::context::Context;
use crate::kernel::error::{Error, Result};

/// A type-erased value held by the binding store.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Something that can build a value from the binding store.
pub trait Factory: Send + Sync {
    fn create(&self, context: &Context) -> Result<Value>;
}

impl<F> Factory for F
where
    F: Fn(&Context) -> Result<Value> + Send + Sync,
{
    fn create(&self, context: &Context) -> Result<Value> {
        self(context)
    }
}

enum FactoryState {
    Unresolved,
    Resolving(ThreadId),
    Resolved(Value),
}

/// Runs its producer once and hands out the cached value afterwards.
pub struct SingletonFactory {
    label: String,
    producer: Box<dyn Factory>,
    state: Mutex<FactoryState>,
    settled: Condvar,
}

impl SingletonFactory {
    /// Wrap a producer that already returns a type-erased [`Value`].
    pub fn new(producer: impl Factory + 'static) -> Self {
        Self {
            label: String::new(),
            producer: Box::new(producer),
            state: Mutex::new(FactoryState::Unresolved),
            settled: Condvar::new(),
        }
    }

    /// Wrap a producer returning a concrete type.
    pub fn of<T, F>(producer: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Context) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(move |context: &Context| -> Result<Value> {
            let value = producer(context)?;
            Ok(Arc::new(value) as Value)
        })
    }

    /// Set the label reported in cyclic resolution errors.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn has_label(&self) -> bool {
        !self.label.is_empty()
    }

    /// Whether the producer has completed successfully.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.lock(), FactoryState::Resolved(_))
    }

    /// Return the cached value, running the producer first if needed.
    ///
    /// A failed producer leaves the factory unresolved; the next caller runs
    /// it again. Resolving the same factory from inside its own producer
    /// fails with [`Error::CyclicResolution`].
    ///
    /// Cycles are detected per thread. A producer that resolves its own key
    /// on a thread it spawns and then joins waits on itself forever; producers
    /// may hand work to other threads only for keys other than their own.
    pub fn resolve(&self, context: &Context) -> Result<Value> {
        let current = thread::current().id();
        let mut state = self.lock();
        loop {
            match &*state {
                FactoryState::Resolved(value) => return Ok(value.clone()),
                FactoryState::Resolving(owner) if *owner == current => {
                    return Err(Error::CyclicResolution { key: self.label.clone() });
                }
                FactoryState::Resolving(_) => {
                    state = self.settled.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
                FactoryState::Unresolved => break,
            }
        }
        *state = FactoryState::Resolving(current);
        drop(state);

        // Settles the state on every exit path, including a panicking producer.
        let mut guard = Settle { factory: self, value: None };
        log::debug!("Constructing '{}'", self.label);
        let value = self.producer.create(context)?;
        guard.value = Some(value.clone());
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Settle<'a> {
    factory: &'a SingletonFactory,
    value: Option<Value>,
}

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        let mut state = self.factory.lock();
        *state = match self.value.take() {
            Some(value) => FactoryState::Resolved(value),
            None => FactoryState::Unresolved,
        };
        drop(state);
        self.factory.settled.notify_all();
    }
}

impl fmt::Debug for SingletonFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.lock() {
            FactoryState::Unresolved => "Unresolved",
            FactoryState::Resolving(_) => "Resolving",
            FactoryState::Resolved(_) => "Resolved",
        };
        f.debug_struct("SingletonFactory")
            .field("label", &self.label)
            .field("state", &state)
            .finish()
    }
}
