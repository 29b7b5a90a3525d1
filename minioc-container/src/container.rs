//! # The Container
//!
//! Maps service identities to implementation types and builds instances on
//! demand, resolving every constructor parameter through itself first.
//!
//! # Lifecycle of a container
//! ```text
//! bootstrap (&mut)                       serve (&, any thread)
//! register / register_singleton  ──>     resolve / exists
//!        add_provider                    resolve_key
//!                                        validate
//! ```
//! Registration needs `&mut Container`, resolution only `&Container`, so
//! the borrow checker keeps registration out of concurrent resolution.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use minioc_container::implements;
//! use minioc_container::prelude::*;
//!
//! trait Locator: Send + Sync {
//!     fn location(&self) -> String;
//! }
//!
//! struct LdapLocator;
//!
//! impl Locator for LdapLocator {
//!     fn location(&self) -> String {
//!         "ldap://default".into()
//!     }
//! }
//!
//! impl Injectable for LdapLocator {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|| LdapLocator)]
//!     }
//! }
//!
//! trait Realm: Send + Sync {
//!     fn describe(&self) -> String;
//! }
//!
//! struct LdapRealm {
//!     locator: Arc<dyn Locator>,
//! }
//!
//! impl Realm for LdapRealm {
//!     fn describe(&self) -> String {
//!         format!("LDAP at {}", self.locator.location())
//!     }
//! }
//!
//! impl Injectable for LdapRealm {
//!     fn constructors() -> Vec<Constructor<Self>> {
//!         vec![Constructor::new(|locator: Arc<dyn Locator>| LdapRealm { locator })]
//!     }
//! }
//!
//! implements!(LdapLocator => dyn Locator);
//! implements!(LdapRealm => dyn Realm);
//!
//! let mut container = Container::new();
//! container.register_singleton::<dyn Locator, LdapLocator>()?;
//! container.register::<dyn Realm, LdapRealm>()?;
//!
//! let realm = container.resolve::<dyn Realm>()?;
//! assert_eq!(realm.describe(), "LDAP at ldap://default");
//! # Ok::<(), MiniocError>(())
//! ```

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::constructor::{Arguments, Implements, Inject, Injectable, Instance, designated_parameters};
use crate::error::{CircularDependencyError, MiniocError, NotRegisteredError, Result};
use crate::graph::GraphValidator;
use crate::key::DependencyKey;
use crate::lifecycle::Lifecycle;
use crate::provider::Provider;
use crate::registry::{Registration, Registry};
use crate::settings::ContainerSettings;

/// Inversion-of-control container.
///
/// Owns its registrations and the cached singleton instances. Independent
/// containers never share anything.
pub struct Container {
    registry: Registry,
    settings: ContainerSettings,
}

impl Container {
    /// Creates an empty container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    /// Creates an empty container with the given settings.
    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            registry: Registry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    // ── Registration ──

    /// Registers `C` under identity `I` with the [`Lifecycle::Transient`]
    /// lifecycle.
    ///
    /// # Errors
    /// [`MiniocError::DuplicateRegistration`] if `I` is already registered.
    pub fn register<I, C>(&mut self) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        self.register_with::<I, C>(Lifecycle::Transient)
    }

    /// Registers `C` under identity `I` as a lazily built singleton.
    ///
    /// # Errors
    /// [`MiniocError::DuplicateRegistration`] if `I` is already registered.
    pub fn register_singleton<I, C>(&mut self) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        self.register_with::<I, C>(Lifecycle::Singleton)
    }

    /// Registers `C` under identity `I` with an explicit lifecycle.
    ///
    /// # Errors
    /// [`MiniocError::DuplicateRegistration`] if `I` is already registered
    /// and [`ContainerSettings::allow_override`] is off.
    pub fn register_with<I, C>(&mut self, lifecycle: Lifecycle) -> Result<()>
    where
        I: ?Sized + Send + Sync + 'static,
        C: Injectable + Implements<I>,
    {
        let registration = Registration::new(
            DependencyKey::of::<I>(),
            type_name::<C>(),
            lifecycle,
            construct::<I, C>,
            designated_parameters::<C>,
        );
        self.registry
            .register(registration, self.settings.allow_override)
    }

    /// Lets a [`Provider`] register its group of services.
    pub fn add_provider(&mut self, provider: &dyn Provider) -> Result<()> {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(self)
    }

    // ── Queries ──

    /// Returns `true` if identity `I` has a registration.
    pub fn exists<I: ?Sized + 'static>(&self) -> bool {
        self.registry.contains(&DependencyKey::of::<I>())
    }

    /// Returns `true` if `key` has a registration.
    pub fn contains_key(&self, key: &DependencyKey) -> bool {
        self.registry.contains(key)
    }

    /// Lifecycle `I` was registered with, if any.
    pub fn lifecycle_of<I: ?Sized + 'static>(&self) -> Option<Lifecycle> {
        self.registry
            .get(&DependencyKey::of::<I>())
            .map(Registration::lifecycle)
    }

    /// Every registered identity, sorted by type name.
    pub fn registered_keys(&self) -> Vec<DependencyKey> {
        let mut keys: Vec<DependencyKey> = self.registry.keys().copied().collect();
        keys.sort_by_key(DependencyKey::type_name);
        keys
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ── Resolution ──

    /// Resolves identity `I`, building whatever its lifecycle requires.
    ///
    /// # Errors
    /// - [`MiniocError::UnregisteredType`]: `I` or one of its transitive
    ///   dependencies has no registration
    /// - [`MiniocError::NoConstructor`]: an implementation on the way declares
    ///   no constructor
    /// - [`MiniocError::CyclicDependency`]: only with
    ///   [`ContainerSettings::detect_cycles`]
    pub fn resolve<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>> {
        let key = DependencyKey::of::<I>();
        let instance = self.resolve_key(&key)?;

        <Arc<I> as Inject>::from_instance(instance).ok_or_else(|| {
            MiniocError::ConstructionFailed {
                key,
                reason: format!("type mismatch: expected Arc<{}>", type_name::<I>()),
            }
        })
    }

    /// Resolves an identity known only by its key.
    ///
    /// The returned [`Instance`] holds an `Arc<I>` for the key's type `I`.
    pub fn resolve_key(&self, key: &DependencyKey) -> Result<Instance> {
        let mut path = ResolutionPath::new(self.settings.detect_cycles);
        self.resolve_in(key, &mut path)
    }

    /// Shared by root and nested resolutions so lifecycles apply at every
    /// depth of the graph.
    pub(crate) fn resolve_in(
        &self,
        key: &DependencyKey,
        path: &mut ResolutionPath,
    ) -> Result<Instance> {
        let registration = self.registry.get(key).ok_or_else(|| {
            MiniocError::UnregisteredType(NotRegisteredError {
                requested: *key,
                required_by: path.consumer().copied(),
                suggestions: self.registry.similar_to(key),
            })
        })?;

        trace!(
            key = %key,
            lifecycle = %registration.lifecycle(),
            depth = path.depth(),
            "Resolving"
        );

        path.enter(*key)?;
        let instance = registration.get_instance(self, path);
        path.leave();
        instance
    }

    /// Checks the whole constructor graph without building anything.
    ///
    /// Reports the first unregistered dependency, implementation without a
    /// constructor, or cycle. Meant for the end of bootstrap.
    pub fn validate(&self) -> Result<()> {
        GraphValidator::new(&self.registry).validate()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════

/// Builds one `C` and hands it out as an `I`.
///
/// Uses the first declared constructor and resolves its parameters left to
/// right through the full resolve path before invoking it.
fn construct<I, C>(container: &Container, path: &mut ResolutionPath) -> Result<Instance>
where
    I: ?Sized + Send + Sync + 'static,
    C: Injectable + Implements<I>,
{
    let constructor = C::constructors()
        .into_iter()
        .next()
        .ok_or_else(|| MiniocError::NoConstructor {
            key: DependencyKey::of::<I>(),
            implementation: type_name::<C>(),
        })?;

    let parameters = constructor.parameters();
    trace!(
        implementation = type_name::<C>(),
        parameters = parameters.len(),
        "Constructing"
    );

    let mut arguments = Arguments::with_capacity(parameters.len());
    for parameter in parameters {
        let value = container.resolve_in(parameter.key(), path)?;
        arguments.push(*parameter.key(), value);
    }

    let built = constructor.invoke(&mut arguments)?;
    let service: Arc<I> = <C as Implements<I>>::upcast(Arc::new(built));
    Ok(Arc::new(service))
}

/// Identities currently being built on this call stack, outermost first.
#[derive(Debug)]
pub(crate) struct ResolutionPath {
    detect_cycles: bool,
    stack: Vec<DependencyKey>,
}

impl ResolutionPath {
    fn new(detect_cycles: bool) -> Self {
        Self {
            detect_cycles,
            stack: Vec::new(),
        }
    }

    fn enter(&mut self, key: DependencyKey) -> Result<()> {
        if self.detect_cycles {
            if let Some(start) = self.stack.iter().position(|k| *k == key) {
                let cycle = CircularDependencyError::new(&self.stack[start..], key);
                warn!(cycle = %cycle.render(), "Circular dependency detected");

                return Err(MiniocError::CyclicDependency(cycle));
            }
        }

        self.stack.push(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    /// The identity whose constructor is asking, if any.
    fn consumer(&self) -> Option<&DependencyKey> {
        self.stack.last()
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::constructor::{Constructor, Implements, Injectable};
    pub use crate::error::{MiniocError, Result};
    pub use crate::key::DependencyKey;
    pub use crate::lifecycle::Lifecycle;
    pub use crate::provider::Provider;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::Constructor;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    trait Existent: Send + Sync {
        fn marker(&self) -> usize;
    }

    struct ExistentImpl {
        marker: usize,
    }

    impl Existent for ExistentImpl {
        fn marker(&self) -> usize {
            self.marker
        }
    }

    impl Injectable for ExistentImpl {
        fn constructors() -> Vec<Constructor<Self>> {
            static NEXT: AtomicUsize = AtomicUsize::new(1);
            vec![Constructor::new(|| ExistentImpl {
                marker: NEXT.fetch_add(1, Ordering::SeqCst),
            })]
        }
    }

    crate::implements!(ExistentImpl => dyn Existent);

    trait ExistentWithDeps: Send + Sync {
        fn dependency(&self) -> &Arc<dyn Existent>;
    }

    struct ExistentWithDepsImpl {
        dependency: Arc<dyn Existent>,
    }

    impl ExistentWithDeps for ExistentWithDepsImpl {
        fn dependency(&self) -> &Arc<dyn Existent> {
            &self.dependency
        }
    }

    impl Injectable for ExistentWithDepsImpl {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new(|dependency: Arc<dyn Existent>| {
                ExistentWithDepsImpl { dependency }
            })]
        }
    }

    crate::implements!(ExistentWithDepsImpl => dyn ExistentWithDeps);

    /// Consumes both identities above, for diamond-shaped graphs.
    struct Auditor {
        existent: Arc<dyn Existent>,
        with_deps: Arc<dyn ExistentWithDeps>,
    }

    impl Injectable for Auditor {
        fn constructors() -> Vec<Constructor<Self>> {
            vec![Constructor::new(
                |existent: Arc<dyn Existent>, with_deps: Arc<dyn ExistentWithDeps>| Auditor {
                    existent,
                    with_deps,
                },
            )]
        }
    }

    #[test]
    fn registered_types_exist() {
        let mut container = Container::new();
        assert!(!container.exists::<dyn Existent>());

        container.register::<dyn Existent, ExistentImpl>().unwrap();

        assert!(container.exists::<dyn Existent>());
        assert!(!container.exists::<dyn ExistentWithDeps>());
        assert!(!container.exists::<ExistentImpl>());
    }

    #[test]
    fn resolve_registered_type_without_dependencies() {
        let mut container = Container::new();
        container.register::<dyn Existent, ExistentImpl>().unwrap();

        let resolved = container.resolve::<dyn Existent>().unwrap();
        assert!(resolved.marker() > 0);
    }

    #[test]
    fn resolve_registered_type_with_dependencies() {
        let mut container = Container::new();
        container.register_singleton::<dyn Existent, ExistentImpl>().unwrap();
        container
            .register::<dyn ExistentWithDeps, ExistentWithDepsImpl>()
            .unwrap();

        let resolved = container.resolve::<dyn ExistentWithDeps>().unwrap();
        let direct = container.resolve::<dyn Existent>().unwrap();

        // The injected value came from the same container.
        assert_eq!(resolved.dependency().marker(), direct.marker());
        assert!(Arc::ptr_eq(resolved.dependency(), &direct));
    }

    #[test]
    fn unregistered_type_fails() {
        let container = Container::new();

        match container.resolve::<dyn Existent>() {
            Err(MiniocError::UnregisteredType(e)) => {
                assert_eq!(e.requested, DependencyKey::of::<dyn Existent>());
                assert!(e.required_by.is_none());
            }
            Err(other) => panic!("Expected UnregisteredType, got: {other:?}"),
            Ok(_) => panic!("Expected UnregisteredType, got an instance"),
        }
    }

    #[test]
    fn missing_nested_dependency_aborts_root() {
        let mut container = Container::new();
        container
            .register::<dyn ExistentWithDeps, ExistentWithDepsImpl>()
            .unwrap();

        match container.resolve::<dyn ExistentWithDeps>() {
            Err(MiniocError::UnregisteredType(e)) => {
                assert_eq!(e.requested, DependencyKey::of::<dyn Existent>());
                assert_eq!(e.required_by, Some(DependencyKey::of::<dyn ExistentWithDeps>()));
            }
            Err(other) => panic!("Expected UnregisteredType, got: {other:?}"),
            Ok(_) => panic!("Expected UnregisteredType, got an instance"),
        }
    }

    #[test]
    fn transient_is_default_and_yields_distinct_instances() {
        let mut container = Container::new();
        container.register::<dyn Existent, ExistentImpl>().unwrap();

        assert_eq!(container.lifecycle_of::<dyn Existent>(), Some(Lifecycle::Transient));

        let a = container.resolve::<dyn Existent>().unwrap();
        let b = container.resolve::<dyn Existent>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.marker(), b.marker());
    }

    #[test]
    fn singleton_yields_same_instance() {
        let mut container = Container::new();
        container.register_singleton::<dyn Existent, ExistentImpl>().unwrap();

        let a = container.resolve::<dyn Existent>().unwrap();
        let b = container.resolve::<dyn Existent>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn singleton_shared_across_paths() {
        let mut container = Container::new();
        container.register_singleton::<dyn Existent, ExistentImpl>().unwrap();
        container
            .register::<dyn ExistentWithDeps, ExistentWithDepsImpl>()
            .unwrap();
        container.register::<Auditor, Auditor>().unwrap();

        let auditor = container.resolve::<Auditor>().unwrap();
        assert!(Arc::ptr_eq(&auditor.existent, auditor.with_deps.dependency()));
    }

    #[test]
    fn transient_dependency_is_fresh_per_consumer() {
        let mut container = Container::new();
        container.register::<dyn Existent, ExistentImpl>().unwrap();
        container
            .register::<dyn ExistentWithDeps, ExistentWithDepsImpl>()
            .unwrap();
        container.register::<Auditor, Auditor>().unwrap();

        let auditor = container.resolve::<Auditor>().unwrap();
        assert!(!Arc::ptr_eq(&auditor.existent, auditor.with_deps.dependency()));
    }

    #[test]
    fn concurrent_first_access_constructs_once() {
        static BUILT: AtomicUsize = AtomicUsize::new(0);
        const THREADS: usize = 16;

        struct SlowService;

        impl Injectable for SlowService {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![Constructor::new(|| {
                    BUILT.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    SlowService
                })]
            }
        }

        let mut container = Container::new();
        container.register_singleton::<SlowService, SlowService>().unwrap();

        let barrier = Barrier::new(THREADS);
        let resolved: Vec<Arc<SlowService>> = thread::scope(|s| {
            let mut handles = Vec::with_capacity(THREADS);
            for _ in 0..THREADS {
                handles.push(s.spawn(|| {
                    barrier.wait();
                    container.resolve::<SlowService>().unwrap()
                }));
            }
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(BUILT.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|r| Arc::ptr_eq(r, &resolved[0])));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut container = Container::new();
        container.register::<dyn Existent, ExistentImpl>().unwrap();

        let err = container
            .register_singleton::<dyn Existent, ExistentImpl>()
            .unwrap_err();
        assert!(matches!(err, MiniocError::DuplicateRegistration(_)));
        assert_eq!(container.lifecycle_of::<dyn Existent>(), Some(Lifecycle::Transient));
    }

    #[test]
    fn override_allowed_by_settings() {
        let settings = ContainerSettings::default().with_override(true);
        let mut container = Container::with_settings(settings);
        container.register::<dyn Existent, ExistentImpl>().unwrap();
        container.register_singleton::<dyn Existent, ExistentImpl>().unwrap();

        assert_eq!(container.lifecycle_of::<dyn Existent>(), Some(Lifecycle::Singleton));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn no_constructor_fails_at_resolution() {
        struct Opaque;

        impl Injectable for Opaque {
            fn constructors() -> Vec<Constructor<Self>> {
                Vec::new()
            }
        }

        let mut container = Container::new();
        container.register::<Opaque, Opaque>().unwrap();

        match container.resolve::<Opaque>() {
            Err(MiniocError::NoConstructor { key, implementation }) => {
                assert_eq!(key, DependencyKey::of::<Opaque>());
                assert!(implementation.ends_with("Opaque"));
            }
            Err(other) => panic!("Expected NoConstructor, got: {other:?}"),
            Ok(_) => panic!("Expected NoConstructor, got an instance"),
        }
    }

    #[test]
    fn cycle_reported_when_detection_enabled() {
        struct Chicken(#[allow(dead_code)] Arc<Egg>);
        struct Egg(#[allow(dead_code)] Arc<Chicken>);

        impl Injectable for Chicken {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![Constructor::new(Chicken)]
            }
        }

        impl Injectable for Egg {
            fn constructors() -> Vec<Constructor<Self>> {
                vec![Constructor::new(Egg)]
            }
        }

        let settings = ContainerSettings::default().with_cycle_detection(true);
        let mut container = Container::with_settings(settings);
        container.register_singleton::<Chicken, Chicken>().unwrap();
        container.register::<Egg, Egg>().unwrap();

        match container.resolve::<Chicken>() {
            Err(MiniocError::CyclicDependency(e)) => {
                assert_eq!(
                    e.chain(),
                    &[
                        DependencyKey::of::<Chicken>(),
                        DependencyKey::of::<Egg>(),
                        DependencyKey::of::<Chicken>(),
                    ]
                );
            }
            Err(other) => panic!("Expected CyclicDependency, got: {other:?}"),
            Ok(_) => panic!("Expected CyclicDependency, got an instance"),
        }

        // The failed singleton stays unbuilt and still reports the cycle.
        assert!(container.resolve::<Chicken>().is_err());
    }

    #[test]
    fn containers_do_not_share_singletons() {
        let mut first = Container::new();
        let mut second = Container::new();
        first.register_singleton::<dyn Existent, ExistentImpl>().unwrap();
        second.register_singleton::<dyn Existent, ExistentImpl>().unwrap();

        let a = first.resolve::<dyn Existent>().unwrap();
        let b = second.resolve::<dyn Existent>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unregistered_error_suggests_similar_identity() {
        struct ExistentImplV2;

        let mut container = Container::new();
        container.register::<ExistentImpl, ExistentImpl>().unwrap();

        let err = container.resolve_key(&DependencyKey::of::<ExistentImplV2>()).unwrap_err();
        match err {
            MiniocError::UnregisteredType(e) => {
                assert_eq!(e.suggestions.len(), 1);
                assert!(e.suggestions[0].ends_with("ExistentImpl"));
            }
            other => panic!("Expected UnregisteredType, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_key_returns_shared_arc() {
        let mut container = Container::new();
        container.register_singleton::<dyn Existent, ExistentImpl>().unwrap();

        let instance = container.resolve_key(&DependencyKey::of::<dyn Existent>()).unwrap();
        let erased = <Arc<dyn Existent>>::from_instance(instance).unwrap();
        let typed = container.resolve::<dyn Existent>().unwrap();
        assert!(Arc::ptr_eq(&erased, &typed));
    }

    #[test]
    fn container_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Container>();
    }

    #[test]
    fn debug_display() {
        let mut container = Container::new();
        container.register::<dyn Existent, ExistentImpl>().unwrap();
        container.register::<Auditor, Auditor>().unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("registered: 2"));
        assert_eq!(container.registered_keys().len(), 2);
    }
}
