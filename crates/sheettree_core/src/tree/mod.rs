//! Hierarchy reconstruction over flat record sets.
//!
//! # Responsibility
//! - Turn decoded rows into the ordered forest held by the snapshot root.
//!
//! # Invariants
//! - Organizing is pure: no store access, no shared state.

pub mod organizer;

pub use organizer::{organize, OrganizeError};
