//! Connection bootstrap for the local sheet database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas and run migrations before handing a connection out.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, IN_MEMORY_SHEET};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a sheet database file and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(&path.display().to_string(), || Connection::open(path))
}

/// Opens a throwaway in-memory sheet database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(IN_MEMORY_SHEET, Connection::open_in_memory)
}

fn open_with<F>(location: &str, connect: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start location={location}");

    let result = connect()
        .map_err(|source| DbError::Open {
            location: location.to_string(),
            source,
        })
        .and_then(|mut conn| bootstrap_connection(&mut conn, location).map(|()| conn));

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok location={location} duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error location={location} duration_ms={} error={err}",
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn bootstrap_connection(conn: &mut Connection, location: &str) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|source| DbError::Open {
            location: location.to_string(),
            source,
        })?;
    apply_migrations(conn)?;
    Ok(())
}
