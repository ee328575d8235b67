//! Bounded pool of reusable SQLite connections.
//!
//! A thin layer over [`r2d2`] with [`SqliteConnectionManager`]: r2d2 caps
//! the number of open connections at `max_size`, parks released ones for
//! reuse and makes callers over the limit wait (bounded by
//! `acquire_timeout`). Every new connection gets the same pragmas through
//! a [`r2d2::CustomizeConnection`] hook. `get` blocks, so callers run it
//! inside `spawn_blocking`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::StoreError;

pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Wait used when the acquire timeout is disabled. r2d2 needs a finite one.
const UNBOUNDED_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_size: usize,
    /// `None` waits (practically) forever.
    pub acquire_timeout: Option<Duration>,
    /// How long one statement waits on another connection's write lock.
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 10,
            acquire_timeout: Some(Duration::from_secs(30)),
            busy_timeout: super::DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Apply connection tuning to every connection r2d2 opens.
#[derive(Debug)]
struct ConnectionTuning {
    busy_timeout: Duration,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionTuning {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        super::tune_connection(conn, self.busy_timeout)
    }
}

/// Cheap to clone; clones share the same connections.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Pool<SqliteConnectionManager>,
    path: PathBuf,
    acquire_timeout: Duration,
    closed: Arc<AtomicBool>,
}

impl ConnectionPool {
    /// Create an empty pool for the database at `path`. Connections are opened lazily.
    pub fn new(path: impl AsRef<Path>, options: PoolOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        let max_size = u32::try_from(options.max_size.max(1)).unwrap_or(u32::MAX);
        let acquire_timeout = options
            .acquire_timeout
            .filter(|t| !t.is_zero())
            .unwrap_or(UNBOUNDED_WAIT);

        let pool = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(0))
            .connection_timeout(acquire_timeout)
            .connection_customizer(Box::new(ConnectionTuning {
                busy_timeout: options.busy_timeout,
            }))
            .build_unchecked(SqliteConnectionManager::file(&path));

        Self {
            pool,
            path,
            acquire_timeout,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_size(&self) -> usize {
        self.pool.max_size() as usize
    }

    /// Open connections currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.pool.state().idle_connections as usize
    }

    /// Connections currently checked out.
    pub fn in_use(&self) -> usize {
        let state = self.pool.state();
        (state.connections - state.idle_connections) as usize
    }

    /// Check out a connection, waiting for a free slot if the pool is exhausted.
    ///
    /// Blocks the calling thread.
    pub fn get(&self) -> Result<PooledConnection, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::PoolClosed);
        }
        self.pool.get().map_err(|err| {
            tracing::warn!(
                timeout_ms = self.acquire_timeout.as_millis() as u64,
                in_use = self.in_use(),
                error = %err,
                "no database connection available"
            );
            StoreError::PoolTimeout(self.acquire_timeout)
        })
    }

    /// Refuse further checkouts. Connections already checked out finish normally.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
