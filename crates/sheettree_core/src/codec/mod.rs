//! Row codec between the flat store layout and records.
//!
//! # Responsibility
//! - Map four-column string rows to records and back.
//! - Keep the row layout in one place.

pub mod rows;
