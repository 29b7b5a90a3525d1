//! Service identities.
//!
//! [`DependencyKey`] names the abstract service a registration answers for.
//! It is usually built from a trait object type (`dyn Realm`), but any
//! `'static` type works, including a concrete type registered as itself.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use minioc_support::rendering::shorten_type_name;

/// Uniquely identifies a service in the container.
///
/// Equality and hashing only look at the [`TypeId`]; the type name is kept
/// for diagnostics.
///
/// # Examples
/// ```
/// use minioc_container::key::DependencyKey;
///
/// trait Locator {}
///
/// let key = DependencyKey::of::<dyn Locator>();
/// assert!(key.type_name().ends_with("Locator"));
/// assert_eq!(key, DependencyKey::of::<dyn Locator>());
/// assert_ne!(key, DependencyKey::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct DependencyKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl DependencyKey {
    /// Creates the key for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the identity.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without module paths.
    pub fn short_name(&self) -> String {
        shorten_type_name(self.type_name)
    }
}

impl PartialEq for DependencyKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for DependencyKey {}

impl Hash for DependencyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DependencyKey({})", self.type_name)
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
