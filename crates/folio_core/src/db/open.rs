//! Connection bootstrap for the portfolio database.
//!
//! Returned connections have `foreign_keys=ON`, a 5s busy timeout, and every
//! migration applied.

use super::migrations::{apply_migrations, latest_version};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const IN_MEMORY_LOCATION: &str = ":memory:";

/// Opens (creating if needed) the database file at `path`.
///
/// Parent directories are not created; callers own the filesystem layout.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with(&path.display().to_string(), || Connection::open(path))
}

/// Opens a private in-memory database, used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with(IN_MEMORY_LOCATION, Connection::open_in_memory)
}

fn open_with<F>(location: &str, open: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    let opened = open()
        .map_err(|source| DbError::Open {
            location: location.to_string(),
            source,
        })
        .and_then(|mut conn| {
            configure(&mut conn)?;
            Ok(conn)
        });

    match &opened {
        Ok(_) => info!(
            "event=db_open module=db status=ok location={} schema_version={} duration_ms={}",
            location,
            latest_version(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error location={} duration_ms={} error={}",
            location,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    opened
}

fn configure(conn: &mut Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
