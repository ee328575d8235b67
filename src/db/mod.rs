pub mod migrations;
pub mod pool;
pub mod retry;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::error::StoreError;

/// Busy timeout applied when the caller has no preference.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply the tuning every connection gets: WAL journal, relaxed
/// `synchronous`, a larger page cache, in-memory temp tables and a busy
/// timeout. Does not touch the schema.
pub fn tune_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    // Enable WAL mode for concurrent readers alongside one writer
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "cache_size", 10_000)?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(())
}

/// Open one tuned connection.
pub fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    tune_connection(&conn, DEFAULT_BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Open (or create) the database at the given path with schema and
/// migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut conn = open_connection(path)?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied. Each call
/// gets its own private database.
pub fn open_memory_database() -> rusqlite::Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&mut conn)?;
    Ok(conn)
}
