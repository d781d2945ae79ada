use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Type-keyed store of lazily constructed, shared resources.
///
/// Each type appears at most once. The first caller of
/// [`SharedResources::get_or_insert_with`] constructs the value and every
/// later caller receives the same `Arc`. Cloning the store clones the handle,
/// not the resources.
#[derive(Clone, Default)]
pub struct SharedResources {
    inner: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl std::fmt::Debug for SharedResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResources")
            .field("len", &self.len())
            .finish()
    }
}

impl SharedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource up front. Fails if the type is already present.
    pub fn provide<T>(&self, value: Arc<T>) -> Result<(), ResourceError>
    where
        T: Send + Sync + 'static,
    {
        let mut guard = self.inner.write().map_err(|_| ResourceError::Poisoned)?;
        match guard.entry(TypeId::of::<T>()) {
            Entry::Occupied(_) => Err(ResourceError::AlreadyProvided(std::any::type_name::<T>())),
            Entry::Vacant(slot) => {
                slot.insert(Box::new(value));
                Ok(())
            }
        }
    }

    pub fn get<T>(&self) -> Result<Arc<T>, ResourceError>
    where
        T: Send + Sync + 'static,
    {
        let guard = self.inner.read().map_err(|_| ResourceError::Poisoned)?;
        let stored = guard
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::Missing(std::any::type_name::<T>()))?;
        downcast::<T>(&**stored)
    }

    /// Construct-once accessor.
    ///
    /// `make` runs without holding the lock, so it may read or populate other
    /// resources in the same store. When two first calls race, the value
    /// stored first wins and both callers receive it.
    pub fn get_or_insert_with<T, F>(&self, make: F) -> Result<Arc<T>, ResourceError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Ok(existing) = self.get::<T>() {
            return Ok(existing);
        }
        let built: Box<dyn Any + Send + Sync> = Box::new(Arc::new(make()));
        let mut guard = self.inner.write().map_err(|_| ResourceError::Poisoned)?;
        let stored = guard.entry(TypeId::of::<T>()).or_insert(built);
        downcast::<T>(&**stored)
    }

    pub fn contains<T>(&self) -> bool
    where
        T: Send + Sync + 'static,
    {
        self.inner
            .read()
            .map(|guard| guard.contains_key(&TypeId::of::<T>()))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T>(stored: &(dyn Any + Send + Sync)) -> Result<Arc<T>, ResourceError>
where
    T: Send + Sync + 'static,
{
    stored
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(ResourceError::TypeMismatch(std::any::type_name::<T>()))
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource `{0}` already provided")]
    AlreadyProvided(&'static str),
    #[error("resource `{0}` missing")]
    Missing(&'static str),
    #[error("resource `{0}` stored under the wrong type")]
    TypeMismatch(&'static str),
    #[error("resource store poisoned")]
    Poisoned,
}
