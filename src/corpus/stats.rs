use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::types::Lang;

#[derive(Debug, Serialize)]
pub struct LargestCorpus {
    pub tenant: String,
    pub fragments: u64,
}

/// Response from corpus_stats.
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub tenants: u64,
    pub talking_tenants: u64,
    pub fragments: u64,
    pub by_lang: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub largest: Option<LargestCorpus>,
    pub db_size_bytes: u64,
}

/// Compute store-wide statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn corpus_stats(conn: &Connection, db_path: Option<&Path>) -> rusqlite::Result<StatsReport> {
    let (tenants, talking_tenants): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(talk), 0) FROM peers",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let fragments: i64 = conn.query_row("SELECT COUNT(*) FROM textbase", [], |row| row.get(0))?;

    let largest = conn
        .query_row(
            "SELECT peer_id, COUNT(*) AS n FROM textbase GROUP BY peer_id ORDER BY n DESC, peer_id LIMIT 1",
            [],
            |row| {
                Ok(LargestCorpus {
                    tenant: row.get(0)?,
                    fragments: row.get::<_, i64>(1)? as u64,
                })
            },
        )
        .optional()?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsReport {
        tenants: tenants as u64,
        talking_tenants: talking_tenants as u64,
        fragments: fragments as u64,
        by_lang: count_by_lang(conn)?,
        largest,
        db_size_bytes,
    })
}

/// Tenants per language, after normalization. Every supported language is present.
fn count_by_lang(conn: &Connection) -> rusqlite::Result<BTreeMap<String, u64>> {
    let mut counts: BTreeMap<String, u64> = Lang::ALL
        .iter()
        .map(|lang| (lang.as_str().to_string(), 0))
        .collect();

    let mut stmt = conn.prepare("SELECT lang, COUNT(*) FROM peers GROUP BY lang")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
    })?;
    for row in rows {
        let (lang, count) = row?;
        let lang = Lang::normalize(lang.as_deref());
        *counts.entry(lang.as_str().to_string()).or_insert(0) += count as u64;
    }
    Ok(counts)
}
