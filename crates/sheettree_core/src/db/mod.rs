//! SQLite bootstrap for the local sheet store.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing `SqliteRowStore`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No sheet row is read or written before migrations succeed.
//! - Bootstrap failures name the sheet location or migration that failed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Location label used for in-memory sheets in errors and log events.
pub const IN_MEMORY_SHEET: &str = ":memory:";

pub type DbResult<T> = Result<T, DbError>;

/// Failures of the local sheet database.
#[derive(Debug)]
pub enum DbError {
    /// The sheet database at `location` could not be opened or configured.
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// Migration `version` failed; the sheet keeps its previous schema.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The sheet was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A row query failed after bootstrap.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "failed to open sheet database `{location}`: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "sheet schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "sheet database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "sheet row query failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
