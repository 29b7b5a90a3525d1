//! Error types for container operations.
//!
//! Every failure surfaces synchronously to the caller of `register` or
//! `resolve`. Nothing is retried and a single missing dependency anywhere in
//! the graph aborts the whole resolution.

use std::fmt;

use minioc_support::rendering::render_chain;

use crate::key::DependencyKey;

/// Main error type for all minioc operations.
#[derive(Debug, thiserror::Error)]
pub enum MiniocError {
    /// The identity already has a registration and overriding is disabled.
    #[error("{}", .0)]
    DuplicateRegistration(AlreadyRegisteredError),

    /// The identity (root or nested dependency) was never registered.
    #[error("{}", .0)]
    UnregisteredType(NotRegisteredError),

    /// The implementation type declares no constructor.
    #[error("Registered type {implementation} doesn't present a constructor for use (bound to {key})")]
    NoConstructor {
        key: DependencyKey,
        implementation: &'static str,
    },

    /// A cycle was found while cycle detection was enabled.
    #[error("{}", .0)]
    CyclicDependency(CircularDependencyError),

    /// A resolved argument could not be bound to its constructor parameter.
    #[error("Failed to construct {key}: {reason}")]
    ConstructionFailed { key: DependencyKey, reason: String },
}

impl MiniocError {
    /// Returns the identity the error is about.
    pub fn key(&self) -> &DependencyKey {
        match self {
            MiniocError::DuplicateRegistration(e) => &e.key,
            MiniocError::UnregisteredType(e) => &e.requested,
            MiniocError::NoConstructor { key, .. } => key,
            MiniocError::CyclicDependency(e) => e.key(),
            MiniocError::ConstructionFailed { key, .. } => key,
        }
    }
}

/// The identity was registered twice.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub key: DependencyKey,
    /// Implementation bound by the first registration.
    pub existing: &'static str,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type already registered: {} (bound to {})",
            self.key, self.existing
        )?;
        write!(
            f,
            "\n  Hint: register each identity once, or enable allow_override in ContainerSettings"
        )
    }
}

/// The requested identity has no registration.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The identity that was requested
    pub requested: DependencyKey,
    /// The consumer whose constructor asked for it, for nested misses
    pub required_by: Option<DependencyKey>,
    /// Registered identities with similar names
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The type {} could not be resolved by the container",
            self.requested
        )?;

        if let Some(consumer) = &self.required_by {
            write!(f, "\n  Required by: {consumer}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: did you forget to call .register::<{}, _>()?",
            self.requested.short_name()
        )
    }
}

/// A cycle in the constructor graph.
#[derive(Debug)]
pub struct CircularDependencyError {
    chain: Vec<DependencyKey>,
    closing: DependencyKey,
}

impl CircularDependencyError {
    /// A cycle that walked `path` and then met `closing` again.
    pub fn new(path: &[DependencyKey], closing: DependencyKey) -> Self {
        let mut chain = Vec::with_capacity(path.len() + 1);
        chain.extend_from_slice(path);
        chain.push(closing);
        Self { chain, closing }
    }

    /// Identities along the cycle, ending with the repeated one.
    pub fn chain(&self) -> &[DependencyKey] {
        &self.chain
    }

    /// The identity that closed the cycle.
    pub fn key(&self) -> &DependencyKey {
        &self.closing
    }

    /// The cycle as `A → B → A`.
    pub fn render(&self) -> String {
        let names: Vec<String> = self.chain.iter().map(DependencyKey::short_name).collect();
        render_chain(&names)
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", self.render())
    }
}

/// Result alias for minioc operations.
pub type Result<T> = std::result::Result<T, MiniocError>;
