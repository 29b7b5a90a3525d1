//! Host adapter: creating request handlers by name.
//!
//! Web frameworks usually ask for "the handler called `home`" on every
//! request. [`HandlerFactory`] keeps a name → identity table next to a
//! [`Container`] and turns those requests into resolutions.
//!
//! ```rust
//! use std::sync::Arc;
//! use minioc::prelude::*;
//!
//! #[derive(Injectable)]
//! struct HomeHandler;
//!
//! let mut factory = HandlerFactory::new(Container::new());
//! factory.register_handler::<HomeHandler>("home")?;
//!
//! let handler: Arc<HomeHandler> = factory.create("home")?;
//! assert!(factory.create::<HomeHandler>("about").is_err());
//! # Ok::<(), HandlerError>(())
//! ```

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;

use minioc_container::{Container, DependencyKey, Injectable, Instance, Lifecycle, MiniocError};
use tracing::{debug, trace};

/// Errors raised while registering or creating handlers.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler name cannot be empty")]
    EmptyName,

    #[error("Handler name already in use: {0}")]
    DuplicateName(String),

    #[error("Handler {name} is bound to {implementation} as a singleton; handlers must be transient")]
    SharedHandler {
        name: String,
        implementation: &'static str,
    },

    #[error("Couldn't find handler by name: {0}")]
    UnknownHandler(String),

    #[error("Handler {name} is a {registered}, not a {requested}")]
    TypeMismatch {
        name: String,
        registered: &'static str,
        requested: &'static str,
    },

    #[error("Could not register handler {name}")]
    Register {
        name: String,
        #[source]
        source: MiniocError,
    },

    #[error("Could not create handler for name {name}")]
    Resolve {
        name: String,
        #[source]
        source: MiniocError,
    },
}

/// Creates handlers by name through a [`Container`].
///
/// Handlers are registered as their own identity with the transient
/// lifecycle, so every request gets a fresh handler while its dependencies
/// follow their own lifecycles.
#[derive(Debug)]
pub struct HandlerFactory {
    container: Container,
    handlers: HashMap<String, DependencyKey>,
}

impl HandlerFactory {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            handlers: HashMap::new(),
        }
    }

    /// The underlying container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Mutable access for registering the handlers' dependencies.
    pub fn container_mut(&mut self) -> &mut Container {
        &mut self.container
    }

    /// Registers `H` and makes it creatable as `name`.
    ///
    /// One handler type may be published under several names. An existing
    /// transient registration of `H` is reused; a singleton one is rejected
    /// with [`HandlerError::SharedHandler`].
    pub fn register_handler<H: Injectable>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(), HandlerError> {
        let name = name.into();
        if name.is_empty() {
            return Err(HandlerError::EmptyName);
        }
        if self.handlers.contains_key(&name) {
            return Err(HandlerError::DuplicateName(name));
        }

        match self.container.lifecycle_of::<H>() {
            Some(Lifecycle::Transient) => {}
            Some(Lifecycle::Singleton) => {
                return Err(HandlerError::SharedHandler {
                    name,
                    implementation: type_name::<H>(),
                });
            }
            None => {
                if let Err(source) = self.container.register::<H, H>() {
                    return Err(HandlerError::Register { name, source });
                }
            }
        }

        debug!(handler = %name, implementation = type_name::<H>(), "Registered handler");
        self.handlers.insert(name, DependencyKey::of::<H>());
        Ok(())
    }

    /// Returns `true` if a handler is published as `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Published handler names, sorted.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Creates the handler published as `name`, typed as `H`.
    pub fn create<H: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<H>, HandlerError> {
        let key = self.lookup(name)?;
        let requested = DependencyKey::of::<H>();
        if key != requested {
            return Err(HandlerError::TypeMismatch {
                name: name.to_string(),
                registered: key.type_name(),
                requested: requested.type_name(),
            });
        }

        self.container
            .resolve::<H>()
            .map_err(|source| HandlerError::Resolve {
                name: name.to_string(),
                source,
            })
    }

    /// Creates the handler published as `name` without naming its type.
    ///
    /// The returned [`Instance`] holds an `Arc<H>` for the registered `H`.
    pub fn create_any(&self, name: &str) -> Result<Instance, HandlerError> {
        let key = self.lookup(name)?;
        self.container
            .resolve_key(&key)
            .map_err(|source| HandlerError::Resolve {
                name: name.to_string(),
                source,
            })
    }

    fn lookup(&self, name: &str) -> Result<DependencyKey, HandlerError> {
        if name.is_empty() {
            return Err(HandlerError::EmptyName);
        }
        trace!(handler = name, "Creating handler");
        self.handlers
            .get(name)
            .copied()
            .ok_or_else(|| HandlerError::UnknownHandler(name.to_string()))
    }
}
