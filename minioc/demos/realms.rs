//! A directory-backed web front end wired through minioc.
//!
//! Run with `RUST_LOG=minioc_container=debug` to watch the container work.

use std::sync::Arc;

use minioc::prelude::*;
use tracing_subscriber::EnvFilter;

// === Services ===

trait Locator: Send + Sync {
    fn location(&self) -> &str;
}

trait Realm: Send + Sync {
    fn realm_type(&self) -> &str;
    fn locator(&self) -> &dyn Locator;
}

#[derive(Injectable)]
#[injectable(implements = "dyn Locator")]
struct LdapLocator {
    #[inject(default)]
    location: LdapUrl,
}

struct LdapUrl(String);

impl Default for LdapUrl {
    fn default() -> Self {
        Self("ldap://default".to_string())
    }
}

impl Locator for LdapLocator {
    fn location(&self) -> &str {
        &self.location.0
    }
}

#[derive(Injectable)]
#[injectable(implements = "dyn Realm")]
struct LdapRealm {
    locator: Arc<dyn Locator>,
}

impl Realm for LdapRealm {
    fn realm_type(&self) -> &str {
        "LDAP"
    }

    fn locator(&self) -> &dyn Locator {
        self.locator.as_ref()
    }
}

// === Handlers ===

#[derive(Injectable)]
struct HomeHandler {
    realm: Arc<dyn Realm>,
}

impl HomeHandler {
    fn index(&self) -> String {
        format!(
            "realm: {} at {}",
            self.realm.realm_type(),
            self.realm.locator().location()
        )
    }
}

struct DirectoryProvider;

impl Provider for DirectoryProvider {
    fn register(&self, container: &mut Container) -> Result<()> {
        container.register_singleton::<dyn Locator, LdapLocator>()?;
        container.register::<dyn Realm, LdapRealm>()
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings = ContainerSettings::default().with_cycle_detection(true);
    let mut container = Container::with_settings(settings);
    container.add_provider(&DirectoryProvider)?;
    container.validate()?;

    let mut handlers = HandlerFactory::new(container);
    handlers.register_handler::<HomeHandler>("home")?;

    for request in ["home", "home", "about"] {
        match handlers.create::<HomeHandler>(request) {
            Ok(handler) => println!("GET /{request} -> {}", handler.index()),
            Err(err) => println!("GET /{request} -> 404 ({err})"),
        }
    }

    let first = handlers.container().resolve::<dyn Locator>()?;
    let second = handlers.container().resolve::<dyn Locator>()?;
    println!("Locator shared: {}", Arc::ptr_eq(&first, &second));

    Ok(())
}
