//! Process-wide instance container.
//!
//! Long-lived services such as the [`ConnectionManager`](crate::ConnectionManager)
//! are looked up by type. Applications may install their own [`Container`];
//! types it does not provide fall back to the built-in one.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

/// Shared instance stored in a container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Resolves instances by type.
pub trait Container: Send + Sync {
    /// Get the instance registered for a type, if any.
    fn resolve(&self, type_id: TypeId) -> Option<Instance>;
}

/// A type map that creates instances on first use.
#[derive(Default)]
pub struct DefaultContainer {
    instances: RwLock<HashMap<TypeId, Instance>>,
}

impl DefaultContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance, replacing any previous one of the same type.
    pub fn register<T: Any + Send + Sync>(&self, instance: T) -> Arc<T> {
        let instance = Arc::new(instance);
        self.instances
            .write()
            .insert(TypeId::of::<T>(), Arc::clone(&instance) as Instance);
        instance
    }

    /// Get the instance of a type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resolve(TypeId::of::<T>())
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    /// Get the instance of a type, creating it on first use.
    pub fn get_or_insert_with<T, F>(&self, create: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if let Some(instance) = self.get::<T>() {
            return instance;
        }

        let mut instances = self.instances.write();
        let type_id = TypeId::of::<T>();
        if let Some(instance) = instances
            .get(&type_id)
            .cloned()
            .and_then(|instance| instance.downcast::<T>().ok())
        {
            return instance;
        }
        let instance = Arc::new(create());
        instances.insert(type_id, Arc::clone(&instance) as Instance);
        instance
    }

    /// Number of instances held.
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Check if the container is empty.
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}

impl Container for DefaultContainer {
    fn resolve(&self, type_id: TypeId) -> Option<Instance> {
        self.instances.read().get(&type_id).cloned()
    }
}

impl fmt::Debug for DefaultContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultContainer")
            .field("instances", &self.len())
            .finish()
    }
}

static USER_CONTAINER: RwLock<Option<Arc<dyn Container>>> = RwLock::new(None);

/// The built-in container.
pub fn default_container() -> &'static DefaultContainer {
    static DEFAULT: OnceLock<DefaultContainer> = OnceLock::new();
    DEFAULT.get_or_init(DefaultContainer::new)
}

/// Install a container consulted before the built-in one.
pub fn use_container(container: Arc<dyn Container>) {
    *USER_CONTAINER.write() = Some(container);
}

/// Remove the installed container.
pub fn reset_container() {
    *USER_CONTAINER.write() = None;
}

/// Get the shared instance of a type.
///
/// The installed container is asked first; otherwise the built-in
/// container returns its instance, creating it with `T::default()`.
pub fn get_from_container<T>() -> Arc<T>
where
    T: Any + Send + Sync + Default,
{
    let user = USER_CONTAINER.read().clone();
    if let Some(instance) = user
        .and_then(|container| container.resolve(TypeId::of::<T>()))
        .and_then(|instance| instance.downcast::<T>().ok())
    {
        return instance;
    }
    default_container().get_or_insert_with(T::default)
}
