//! Constructor discovery.
//!
//! Rust has no runtime reflection, so an implementation type describes its
//! constructors itself through [`Injectable`]. A [`Constructor`] knows its
//! ordered parameter list and how to bind resolved values to it by
//! position. `#[derive(Injectable)]` (from the `minioc` facade) writes the
//! impl from the struct's fields; hand-written impls wrap any function:
//!
//! ```
//! use std::sync::Arc;
//! use minioc_container::constructor::{Constructor, Injectable};
//!
//! trait Locator: Send + Sync {}
//!
//! struct LdapRealm {
//!     locator: Arc<dyn Locator>,
//! }
//!
//! impl LdapRealm {
//!     fn new(locator: Arc<dyn Locator>) -> Self {
//!         Self { locator }
//!     }
//! }
//!
//! impl Injectable for LdapRealm {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(LdapRealm::new)]
//!     }
//! }
//!
//! let ctor = &LdapRealm::constructors()[0];
//! assert_eq!(ctor.parameters().len(), 1);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{MiniocError, Result};
use crate::key::DependencyKey;

/// A resolved service with its type erased.
///
/// Always holds an `Arc<I>` for the identity `I` it was resolved under, so
/// cloning it shares the underlying instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A type the container knows how to build.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// The declared constructors, in declaration order.
    ///
    /// The container always uses the first one. An empty list makes every
    /// resolution of the type fail with [`MiniocError::NoConstructor`].
    fn constructors() -> Vec<Constructor<Self>>;
}

/// Binds an implementation type to a service identity.
///
/// Every type implements it for itself. Trait-object identities are bound
/// with [`implements!`](crate::implements) or the derive's
/// `#[injectable(implements = "dyn Trait")]`.
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
    /// Views the shared instance as the identity's contract.
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Implements [`Implements`] for trait-object identities.
///
/// ```
/// use minioc_container::implements;
///
/// trait Realm: Send + Sync {}
/// trait Named: Send + Sync {}
///
/// struct LdapRealm;
/// impl Realm for LdapRealm {}
/// impl Named for LdapRealm {}
///
/// implements!(LdapRealm => dyn Realm, dyn Named);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::constructor::Implements<$service> for $implementation {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

/// A constructor parameter type.
///
/// Parameters are shared handles to other services; their identity is the
/// pointee type.
pub trait Inject: Sized + Send + 'static {
    /// The identity resolved for this parameter.
    fn key() -> DependencyKey;

    /// Rebuilds the parameter from a resolved instance, `None` on mismatch.
    fn from_instance(instance: Instance) -> Option<Self>;
}

impl<I: ?Sized + Send + Sync + 'static> Inject for Arc<I> {
    #[inline]
    fn key() -> DependencyKey {
        DependencyKey::of::<I>()
    }

    fn from_instance(instance: Instance) -> Option<Self> {
        instance
            .downcast::<Arc<I>>()
            .ok()
            .map(|shared| Arc::clone(&*shared))
    }
}

/// One formal parameter of a constructor.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameter {
    key: DependencyKey,
    declared: &'static str,
}

impl Parameter {
    /// Describes a parameter of type `A`.
    pub fn of<A: Inject>() -> Self {
        Self {
            key: A::key(),
            declared: type_name::<A>(),
        }
    }

    /// The identity resolved for this parameter.
    #[inline]
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// The declared parameter type, e.g. `alloc::sync::Arc<dyn app::Locator>`.
    #[inline]
    pub fn declared_type(&self) -> &'static str {
        self.declared
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parameter({})", self.declared)
    }
}

/// Positional argument list handed to a constructor.
#[derive(Default)]
pub struct Arguments {
    values: Vec<(DependencyKey, Instance)>,
    cursor: usize,
}

impl Arguments {
    /// Creates an empty list with room for `capacity` arguments.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Appends the value resolved for the next parameter.
    pub fn push(&mut self, key: DependencyKey, value: Instance) {
        self.values.push((key, value));
    }

    /// Number of bound arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no argument is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the next argument as `A`.
    ///
    /// # Errors
    /// [`MiniocError::ConstructionFailed`] if the list is exhausted or the
    /// value at this position is not an `A`.
    pub fn take<A: Inject>(&mut self) -> Result<A> {
        let position = self.cursor;
        let (key, value) = self.values.get(position).cloned().ok_or_else(|| {
            MiniocError::ConstructionFailed {
                key: A::key(),
                reason: format!("missing argument at position {position}"),
            }
        })?;
        self.cursor += 1;

        A::from_instance(value).ok_or_else(|| MiniocError::ConstructionFailed {
            key,
            reason: format!(
                "argument at position {position} is not a {}",
                type_name::<A>()
            ),
        })
    }
}

/// A function usable as a constructor: every parameter implements [`Inject`].
///
/// Implemented for `Fn` items and closures of up to eight parameters.
pub trait ConstructorFn<Args, C>: Send + Sync + 'static {
    /// The formal parameters, left to right.
    fn parameters() -> Vec<Parameter>;

    /// Calls the function with arguments taken in order.
    fn call(&self, arguments: &mut Arguments) -> Result<C>;
}

macro_rules! impl_constructor_fn {
    ($($param:ident $value:ident),*) => {
        impl<F, C, $($param,)*> ConstructorFn<($($param,)*), C> for F
        where
            F: Fn($($param),*) -> C + Send + Sync + 'static,
            $($param: Inject,)*
        {
            fn parameters() -> Vec<Parameter> {
                vec![$(Parameter::of::<$param>()),*]
            }

            #[allow(unused_variables)]
            fn call(&self, arguments: &mut Arguments) -> Result<C> {
                $(let $value = arguments.take::<$param>()?;)*
                Ok((self)($($value),*))
            }
        }
    };
}

impl_constructor_fn!();
impl_constructor_fn!(A1 a1);
impl_constructor_fn!(A1 a1, A2 a2);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_constructor_fn!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

type InvokeFn<C> = Box<dyn Fn(&mut Arguments) -> Result<C> + Send + Sync>;

/// A designated constructor of `C`.
pub struct Constructor<C> {
    parameters: Vec<Parameter>,
    invoke: InvokeFn<C>,
}

impl<C: 'static> Constructor<C> {
    /// Wraps a function whose parameters are all injectable.
    pub fn new<Args, F>(function: F) -> Self
    where
        F: ConstructorFn<Args, C>,
    {
        Self {
            parameters: F::parameters(),
            invoke: Box::new(move |arguments: &mut Arguments| function.call(arguments)),
        }
    }

    /// The formal parameters, left to right.
    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Invokes the constructor with already-resolved arguments.
    pub fn invoke(&self, arguments: &mut Arguments) -> Result<C> {
        (self.invoke)(arguments)
    }
}

impl<C> fmt::Debug for Constructor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("of", &type_name::<C>())
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Parameters of `C`'s designated constructor, `None` if it declares none.
pub(crate) fn designated_parameters<C: Injectable>() -> Option<Vec<Parameter>> {
    C::constructors()
        .into_iter()
        .next()
        .map(|constructor| constructor.parameters)
}
