//! # minioc: a minimal IoC container for Rust
//!
//! Constructor injection without a framework: bind implementation types to
//! service identities, pick a lifecycle, and resolve.
//!
//! ```rust
//! use std::sync::Arc;
//! use minioc::prelude::*;
//!
//! trait Locator: Send + Sync {
//!     fn location(&self) -> &str;
//! }
//!
//! #[derive(Injectable)]
//! #[injectable(implements = "dyn Locator")]
//! struct LdapLocator;
//!
//! impl Locator for LdapLocator {
//!     fn location(&self) -> &str {
//!         "ldap://default"
//!     }
//! }
//!
//! #[derive(Injectable)]
//! struct Directory {
//!     locator: Arc<dyn Locator>,
//! }
//!
//! let mut container = Container::new();
//! container.register_singleton::<dyn Locator, LdapLocator>()?;
//! container.register::<Directory, Directory>()?;
//!
//! let directory = container.resolve::<Directory>()?;
//! assert_eq!(directory.locator.location(), "ldap://default");
//! # Ok::<(), MiniocError>(())
//! ```

pub mod handler;

pub use minioc_container::*;
pub use minioc_macros::Injectable;
pub use minioc_support::rendering;

pub use handler::{HandlerError, HandlerFactory};

/// Everything needed to declare, register and resolve services.
pub mod prelude {
    pub use crate::handler::{HandlerError, HandlerFactory};
    pub use minioc_container::prelude::*;
    pub use minioc_container::implements;
    pub use minioc_macros::Injectable;
}
