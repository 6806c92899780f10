//! Core of sheettree: a record tree kept in a flat row sheet.
//! This crate is the single source of truth for tree invariants.

pub mod auth;
pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod tree;

pub use auth::{AuthProvider, SignInError, StaticTokenProvider};
pub use codec::rows::{decode, encode, encode_one, DecodeError, Row};
pub use config::{ConfigError, SheetConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogOptions};
pub use model::position::Position;
pub use model::record::{Record, RecordError, RecordId, RecordKind, ROOT_RECORD_ID};
pub use service::alert::{ErrorAlert, SheetError};
pub use service::sync_engine::SyncEngine;
pub use store::{RowStore, SqliteRowStore, StoreError, StoreResult};
pub use tree::{organize, OrganizeError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
