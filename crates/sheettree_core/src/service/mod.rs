//! Engine-level services.
//!
//! # Responsibility
//! - Own the published record tree and drive mutations through the row store.
//! - Keep front ends decoupled from codec, organizer and storage details.

pub mod alert;
pub mod state_cell;
pub mod sync_engine;
