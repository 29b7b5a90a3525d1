use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use minioc::prelude::*;

trait Locator: Send + Sync {
    fn location(&self) -> String;
}

trait Named: Send + Sync {
    fn name(&self) -> &'static str;
}

#[derive(Injectable)]
#[injectable(implements = "dyn Locator", implements = "dyn Named")]
struct LdapLocator;

impl Locator for LdapLocator {
    fn location(&self) -> String {
        "ldap://default".into()
    }
}

impl Named for LdapLocator {
    fn name(&self) -> &'static str {
        "ldap"
    }
}

#[derive(Injectable)]
struct Realm {
    locator: Arc<dyn Locator>,
    #[inject(default)]
    lookups: AtomicU64,
}

impl Realm {
    fn lookup(&self) -> String {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.locator.location()
    }
}

#[derive(Injectable)]
struct Pair(Arc<Realm>, Arc<dyn Named>);

#[test]
fn unit_struct_has_empty_constructor() {
    let constructors = LdapLocator::constructors();
    assert_eq!(constructors.len(), 1);
    assert!(constructors[0].parameters().is_empty());
}

#[test]
fn named_fields_become_parameters() {
    let constructors = Realm::constructors();
    let parameters = constructors[0].parameters();

    assert_eq!(parameters.len(), 1);
    assert_eq!(*parameters[0].key(), DependencyKey::of::<dyn Locator>());
}

#[test]
fn default_fields_are_not_resolved() {
    let mut container = Container::new();
    container.register::<dyn Locator, LdapLocator>().unwrap();
    container.register::<Realm, Realm>().unwrap();

    let realm = container.resolve::<Realm>().unwrap();
    assert_eq!(realm.lookup(), "ldap://default");
    assert_eq!(realm.lookups.load(Ordering::Relaxed), 1);
}

#[test]
fn one_type_implements_several_identities() {
    let mut container = Container::new();
    container.register::<dyn Locator, LdapLocator>().unwrap();
    container.register::<dyn Named, LdapLocator>().unwrap();

    assert_eq!(container.resolve::<dyn Named>().unwrap().name(), "ldap");
    assert_eq!(
        container.resolve::<dyn Locator>().unwrap().location(),
        "ldap://default"
    );
}

#[test]
fn tuple_struct_fields_resolve_in_order() {
    let mut container = Container::new();
    container.register::<dyn Locator, LdapLocator>().unwrap();
    container.register::<dyn Named, LdapLocator>().unwrap();
    container.register::<Realm, Realm>().unwrap();
    container.register::<Pair, Pair>().unwrap();

    let pair = container.resolve::<Pair>().unwrap();
    assert_eq!(pair.0.lookup(), "ldap://default");
    assert_eq!(pair.1.name(), "ldap");
}

#[test]
fn generic_struct_derives() {
    #[derive(Injectable)]
    struct Wrapper<T: Send + Sync + 'static> {
        inner: Arc<T>,
    }

    let mut container = Container::new();
    container.register_singleton::<Realm, Realm>().unwrap();
    container.register::<dyn Locator, LdapLocator>().unwrap();
    container.register::<Wrapper<Realm>, Wrapper<Realm>>().unwrap();

    let wrapper = container.resolve::<Wrapper<Realm>>().unwrap();
    let realm = container.resolve::<Realm>().unwrap();
    assert!(Arc::ptr_eq(&wrapper.inner, &realm));
}
