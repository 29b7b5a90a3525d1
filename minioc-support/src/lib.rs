//! # minioc support
//!
//! Diagnostics helpers shared by the minioc crates:
//! - shortening of `std::any::type_name` output for humans
//! - rendering of resolution chains
//! - "did you mean" suggestions for unregistered identities

pub mod rendering;
