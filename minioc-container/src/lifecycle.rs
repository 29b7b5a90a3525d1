//! Instance lifecycles.
//!
//! A [`Lifecycle`] decides whether resolutions of one identity share an
//! instance:
//! - [`Lifecycle::Transient`]: a fresh instance on every resolve
//! - [`Lifecycle::Singleton`]: one instance per container, built lazily

use std::fmt;

use serde::{Deserialize, Serialize};

/// Controls how instances of a registration are shared.
///
/// # Examples
/// ```
/// use minioc_container::lifecycle::Lifecycle;
///
/// assert_eq!(Lifecycle::default(), Lifecycle::Transient);
/// assert!(Lifecycle::Singleton.is_cached());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Each resolve runs the constructor again. Callers own what they get.
    #[default]
    Transient,

    /// The first resolve runs the constructor; every later resolve, from any
    /// thread, returns that same instance until the container is dropped.
    Singleton,
}

impl Lifecycle {
    /// Returns `true` if resolved instances are cached and shared.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifecycle::Singleton)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Transient => write!(f, "Transient"),
            Lifecycle::Singleton => write!(f, "Singleton"),
        }
    }
}
