//! Container configuration.

use serde::{Deserialize, Serialize};

/// Policies a host can toggle when creating a [`Container`](crate::Container).
///
/// Deserializable so it can live in the host's own configuration file:
///
/// ```
/// use minioc_container::ContainerSettings;
///
/// let settings = ContainerSettings::default().with_cycle_detection(true);
/// assert!(settings.detect_cycles);
/// assert!(!settings.allow_override);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Let a second registration of an identity replace the first instead of
    /// failing with `DuplicateRegistration`.
    pub allow_override: bool,

    /// Track the resolution path and fail with `CyclicDependency` on a cycle.
    /// Off by default: a cyclic graph then recurses until the stack runs out.
    pub detect_cycles: bool,
}

impl ContainerSettings {
    pub fn with_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    pub fn with_cycle_detection(mut self, detect: bool) -> Self {
        self.detect_cycles = detect;
        self
    }
}
