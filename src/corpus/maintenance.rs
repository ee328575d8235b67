//! Whole-database housekeeping: tenant listing and bulk corpus trimming.
//!
//! [`trim_all`] is the offline counterpart of per-append eviction: after the
//! configured bound is lowered (or after a burst of concurrent appends), it
//! cuts every corpus back to its newest `max` fragments in one transaction.

use rusqlite::{params, Connection};
use serde::Serialize;

use super::types::TenantId;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct TrimReport {
    pub tenants_trimmed: usize,
    pub fragments_deleted: usize,
}

/// All tenants with a settings row, in numeric order.
pub fn list_peers(conn: &Connection) -> rusqlite::Result<Vec<TenantId>> {
    let mut stmt = conn.prepare("SELECT peer_id FROM peers ORDER BY length(peer_id), peer_id")?;
    let raw = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(raw
        .into_iter()
        .filter_map(|peer_id| match TenantId::parse(&peer_id) {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(peer_id = %peer_id, "skipping malformed tenant id in peers table");
                None
            }
        })
        .collect())
}

/// Delete the oldest fragments of every tenant holding more than `max`.
pub fn trim_all(conn: &Connection, max: usize) -> rusqlite::Result<TrimReport> {
    let max = i64::try_from(max).unwrap_or(i64::MAX);
    let tx = conn.unchecked_transaction()?;

    let oversized: Vec<(String, i64)> = {
        let mut stmt = tx.prepare(
            "SELECT peer_id, COUNT(*) FROM textbase GROUP BY peer_id HAVING COUNT(*) > ?1",
        )?;
        let rows = stmt
            .query_map(params![max], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let mut report = TrimReport::default();
    for (peer_id, count) in oversized {
        let surplus = count - max;
        let deleted = tx.execute(
            "DELETE FROM textbase WHERE id IN (
                 SELECT id FROM textbase WHERE peer_id = ?1 ORDER BY id ASC LIMIT ?2
             )",
            params![peer_id, surplus],
        )?;
        tracing::info!(tenant = %peer_id, deleted, kept = max, "trimmed corpus");
        report.tenants_trimmed += 1;
        report.fragments_deleted += deleted;
    }

    tx.commit()?;
    Ok(report)
}
