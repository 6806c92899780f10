//! Record tree domain model.
//!
//! # Responsibility
//! - Define the node and ordering types shared by codec, organizer and engine.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Sibling order is derived from `Position`, never from insertion order.

pub mod position;
pub mod record;
