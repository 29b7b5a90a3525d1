//! Constructor-graph validation.
//!
//! [`Container::validate`](crate::Container::validate) walks every
//! registration's designated constructor without building anything and
//! reports:
//! - dependencies that were never registered
//! - implementations that declare no constructor
//! - cycles, which resolution itself only catches when
//!   `detect_cycles` is on

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::error::{CircularDependencyError, MiniocError, NotRegisteredError, Result};
use crate::key::DependencyKey;
use crate::registry::Registry;

/// Depth-first walk over the registered constructor graph.
///
/// `visiting` holds the keys on the current path; meeting one again closes
/// a cycle. `validated` caches subgraphs already known to be sound.
pub(crate) struct GraphValidator<'a> {
    registry: &'a Registry,
    visiting: HashSet<DependencyKey>,
    validated: HashSet<DependencyKey>,
    path: Vec<DependencyKey>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates every registration, stopping at the first problem.
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<()> {
        let mut keys: Vec<DependencyKey> = self
            .registry
            .registrations()
            .map(|registration| registration.key)
            .collect();
        // Deterministic error reporting regardless of map order.
        keys.sort_by_key(DependencyKey::type_name);

        debug!(registrations = keys.len(), "Starting constructor graph validation");

        for key in keys {
            self.validate_key(&key)?;
        }

        debug!("Constructor graph validation passed");
        Ok(())
    }

    fn validate_key(&mut self, key: &DependencyKey) -> Result<()> {
        if self.validated.contains(key) {
            return Ok(());
        }

        if self.visiting.contains(key) {
            let start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let cycle = CircularDependencyError::new(&self.path[start..], *key);
            warn!(cycle = %cycle.render(), "Circular dependency detected");

            return Err(MiniocError::CyclicDependency(cycle));
        }

        let registration = self.registry.get(key).ok_or_else(|| {
            MiniocError::UnregisteredType(NotRegisteredError {
                requested: *key,
                required_by: self.path.last().copied(),
                suggestions: self.registry.similar_to(key),
            })
        })?;

        let parameters = (registration.describe)().ok_or(MiniocError::NoConstructor {
            key: *key,
            implementation: registration.implementation,
        })?;

        self.visiting.insert(*key);
        self.path.push(*key);

        for parameter in &parameters {
            self.validate_key(parameter.key())?;
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(*key);

        Ok(())
    }
}
