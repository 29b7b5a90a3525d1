//! Core of the minioc inversion-of-control container.
//!
//! Register implementation types under service identities, then resolve the
//! identities: constructors are fed by resolving their parameters through the
//! same container, honouring each registration's [`Lifecycle`].

pub mod constructor;
pub mod container;
pub mod error;
mod graph;
pub mod key;
pub mod lifecycle;
pub mod provider;
mod registry;
pub mod settings;

pub use constructor::{Arguments, Constructor, ConstructorFn, Implements, Inject, Injectable, Instance, Parameter};
pub use container::{Container, prelude};
pub use error::{MiniocError, Result};
pub use key::DependencyKey;
pub use lifecycle::Lifecycle;
pub use provider::Provider;
pub use settings::ContainerSettings;
