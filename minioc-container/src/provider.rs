//! Provider trait: a bootstrap module of related registrations.
//!
//! Providers keep startup wiring split by concern instead of one long
//! registration block:
//!
//! ```rust,ignore
//! container.add_provider(&DirectoryProvider)?;
//! container.add_provider(&HandlerProvider)?;
//! ```

use crate::container::Container;
use crate::error::Result;

/// A group of registrations performed together at startup.
pub trait Provider: Send + Sync {
    /// Registers this provider's services.
    ///
    /// Any registration error aborts the provider and is returned as is.
    fn register(&self, container: &mut Container) -> Result<()>;

    /// Human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
