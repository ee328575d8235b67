//! SQL DDL for the corpus tables.
//!
//! `peers` holds one settings row per tenant, `textbase` holds the corpus
//! fragments keyed by an autoincrement id (insertion order), and
//! `schema_meta` tracks the schema version. All DDL uses `IF NOT EXISTS`
//! for idempotent initialization. This is the version-1 layout; later
//! columns are added by [`super::migrations`].

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Per-tenant settings
CREATE TABLE IF NOT EXISTS peers (
    peer_id TEXT PRIMARY KEY,
    talk INTEGER NOT NULL DEFAULT 1 CHECK(talk IN (0, 1)),
    gen INTEGER NOT NULL DEFAULT 0 CHECK(gen IN (0, 1)),
    speed INTEGER NOT NULL DEFAULT 3 CHECK(speed BETWEEN 1 AND 10)
);

-- Corpus fragments, oldest first by id
CREATE TABLE IF NOT EXISTS textbase (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    peer_id TEXT NOT NULL,
    textbase TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_textbase_peer ON textbase(peer_id, id);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
