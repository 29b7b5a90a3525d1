//! Registration table.
//!
//! The registry maps a [`DependencyKey`] to the [`Registration`] that knows
//! which implementation to build and how instances are shared.

use std::collections::HashMap;
use std::sync::Arc;

use minioc_support::rendering::suggest_similar;
use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use crate::constructor::{Instance, Parameter};
use crate::container::{Container, ResolutionPath};
use crate::error::{AlreadyRegisteredError, MiniocError, Result};
use crate::key::DependencyKey;
use crate::lifecycle::Lifecycle;

const MAX_SUGGESTIONS: usize = 3;

/// Builds a fresh instance of an entry's implementation, resolving its
/// constructor parameters through the container.
pub(crate) type BuildFn = fn(&Container, &mut ResolutionPath) -> Result<Instance>;

/// Lists the designated constructor's parameters without building anything.
pub(crate) type DescribeFn = fn() -> Option<Vec<Parameter>>;

/// One identity's binding. Immutable once created.
pub(crate) struct Registration {
    pub key: DependencyKey,
    pub implementation: &'static str,
    pub build: BuildFn,
    pub describe: DescribeFn,
    activation: Activation,
}

impl Registration {
    pub fn new(
        key: DependencyKey,
        implementation: &'static str,
        lifecycle: Lifecycle,
        build: BuildFn,
        describe: DescribeFn,
    ) -> Self {
        let activation = match lifecycle {
            Lifecycle::Transient => Activation::Transient,
            Lifecycle::Singleton => Activation::Singleton(SingletonSlot::new()),
        };

        Self {
            key,
            implementation,
            build,
            describe,
            activation,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match self.activation {
            Activation::Transient => Lifecycle::Transient,
            Activation::Singleton(_) => Lifecycle::Singleton,
        }
    }

    /// Gets an instance according to the entry's lifecycle.
    pub fn get_instance(
        &self,
        container: &Container,
        path: &mut ResolutionPath,
    ) -> Result<Instance> {
        match &self.activation {
            Activation::Transient => {
                trace!(key = %self.key, "Creating new transient instance");
                (self.build)(container, path)
            }
            Activation::Singleton(slot) => {
                slot.get_or_create(&self.key, || (self.build)(container, path))
            }
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("implementation", &self.implementation)
            .field("lifecycle", &self.lifecycle())
            .finish()
    }
}

/// Instance-sharing strategy of an entry.
enum Activation {
    Transient,
    Singleton(SingletonSlot),
}

/// Lazily populated cache cell of a singleton entry.
///
/// Readers of a populated cell never lock. The guard serialises first-time
/// construction so at most one instance is ever stored. It is reentrant:
/// a constructor that (directly or not) resolves its own identity on the
/// same thread recurses instead of deadlocking.
struct SingletonSlot {
    instance: OnceCell<Instance>,
    guard: ReentrantMutex<()>,
}

impl SingletonSlot {
    fn new() -> Self {
        Self {
            instance: OnceCell::new(),
            guard: ReentrantMutex::new(()),
        }
    }

    fn get_or_create(
        &self,
        key: &DependencyKey,
        create: impl FnOnce() -> Result<Instance>,
    ) -> Result<Instance> {
        if let Some(instance) = self.instance.get() {
            trace!(key = %key, "Singleton already initialized, returning cached instance");
            return Ok(Arc::clone(instance));
        }

        let _guard = self.guard.lock();

        // Another thread may have finished construction while we waited.
        if let Some(instance) = self.instance.get() {
            trace!(key = %key, "Singleton initialized by another caller");
            return Ok(Arc::clone(instance));
        }

        debug!(key = %key, "Singleton initializing on first access");
        let created = create()?;
        Ok(Arc::clone(self.instance.get_or_init(|| created)))
    }

    #[cfg(test)]
    fn is_populated(&self) -> bool {
        self.instance.get().is_some()
    }
}

/// Stores every registration of a container.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    registrations: HashMap<DependencyKey, Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a registration.
    ///
    /// # Errors
    /// [`MiniocError::DuplicateRegistration`] if the key is taken and
    /// `allow_override` is false.
    pub fn register(&mut self, registration: Registration, allow_override: bool) -> Result<()> {
        let key = registration.key;

        if let Some(existing) = self.registrations.get(&key) {
            if !allow_override {
                return Err(MiniocError::DuplicateRegistration(AlreadyRegisteredError {
                    key,
                    existing: existing.implementation,
                }));
            }
            warn!(
                key = %key,
                previous = existing.implementation,
                replacement = registration.implementation,
                "Overriding registration"
            );
        }

        debug!(
            key = %key,
            implementation = registration.implementation,
            lifecycle = %registration.lifecycle(),
            "Registered type"
        );
        self.registrations.insert(key, registration);
        Ok(())
    }

    pub fn get(&self, key: &DependencyKey) -> Option<&Registration> {
        self.registrations.get(key)
    }

    pub fn contains(&self, key: &DependencyKey) -> bool {
        self.registrations.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DependencyKey> {
        self.registrations.keys()
    }

    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.values()
    }

    /// Registered identities whose names resemble `key`, for "did you mean?".
    pub fn similar_to(&self, key: &DependencyKey) -> Vec<String> {
        suggest_similar(
            key.type_name(),
            self.registrations.keys().map(DependencyKey::type_name),
            MAX_SUGGESTIONS,
        )
    }
}
