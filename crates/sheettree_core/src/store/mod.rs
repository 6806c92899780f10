//! Row store contract consumed by the sync engine.
//!
//! # Responsibility
//! - Define the read/append/clear operations over a flat row store.
//! - Keep transport and persistence details behind one trait object seam.
//!
//! # Invariants
//! - Writes carry an optional bearer token; `None` means the request goes out
//!   unauthenticated and the store decides whether to accept it.
//! - Store errors never cross the engine boundary unmapped.

use crate::codec::rows::Row;
use crate::db::DbError;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite_store;
pub mod wire;

pub use sqlite_store::SqliteRowStore;
pub use wire::{
    AppendValuesResponse, BatchClearRequest, BatchClearResponse, UpdateData, ValueRange,
};

/// Result type used by row store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from row store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Write rejected for a missing or wrong bearer token.
    Unauthorized,
    /// Range notation could not be interpreted.
    InvalidRange(String),
    /// Request or stored payload is malformed.
    InvalidData(String),
    /// Network/transport failure reported by a remote adapter.
    Transport(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unauthorized => write!(f, "row store rejected the request as unauthorized"),
            Self::InvalidRange(range) => write!(f, "invalid range `{range}`"),
            Self::InvalidData(message) => write!(f, "invalid row data: {message}"),
            Self::Transport(message) => write!(f, "row store transport failed: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Flat row store holding one record per row.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Reads every row in `range`, in store order, possibly with blank rows.
    async fn get_rows(&self, range: &str) -> StoreResult<ValueRange>;

    /// Appends one row after the last used row of `range`.
    ///
    /// The response's `updates.updated_range` names the row that was written.
    async fn append_row(
        &self,
        range: &str,
        row: Row,
        bearer_token: Option<&str>,
    ) -> StoreResult<AppendValuesResponse>;

    /// Clears every range in `request` in one batch.
    async fn clear_rows(
        &self,
        request: BatchClearRequest,
        bearer_token: Option<&str>,
    ) -> StoreResult<BatchClearResponse>;
}
