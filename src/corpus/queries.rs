//! Synchronous SQL for one tenant at a time.
//!
//! Every function takes a plain [`Connection`] so it can run inside
//! `spawn_blocking` on a pooled connection, or directly against an
//! in-memory database in tests. Tenant ids arrive already validated.

use rusqlite::{params, Connection, OptionalExtension};

use super::types::{GenMode, Lang, SettingValue, Settings, Tenant, TenantId};

/// Insert a settings row with defaults unless one exists. Returns `true` if it was created.
pub fn insert_peer_if_absent(conn: &Connection, id: &TenantId) -> rusqlite::Result<bool> {
    let defaults = Settings::default();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO peers (peer_id, talk, gen, speed, lang) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id.as_str(),
            defaults.talk,
            defaults.gen_mode.as_i64(),
            defaults.speed,
            defaults.lang.as_str(),
        ],
    )?;
    Ok(inserted > 0)
}

pub fn peer_exists(conn: &Connection, id: &TenantId) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM peers WHERE peer_id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )
}

pub fn load_settings(conn: &Connection, id: &TenantId) -> rusqlite::Result<Option<Settings>> {
    conn.query_row(
        "SELECT talk, gen, speed, lang FROM peers WHERE peer_id = ?1",
        params![id.as_str()],
        |row| {
            let speed: i64 = row.get(2)?;
            let lang: Option<String> = row.get(3)?;
            Ok(Settings {
                talk: row.get::<_, i64>(0)? != 0,
                gen_mode: GenMode::from_i64(row.get(1)?),
                speed: speed.clamp(1, 10) as u8,
                lang: Lang::normalize(lang.as_deref()),
            })
        },
    )
    .optional()
}

/// The newest `cap` non-empty fragments, returned oldest first.
pub fn load_fragments(conn: &Connection, id: &TenantId, cap: usize) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT textbase FROM (
             SELECT id, textbase FROM textbase
             WHERE peer_id = ?1 AND textbase != ''
             ORDER BY id DESC
             LIMIT ?2
         ) ORDER BY id ASC",
    )?;
    let cap = i64::try_from(cap).unwrap_or(i64::MAX);
    let fragments = stmt
        .query_map(params![id.as_str(), cap], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(fragments)
}

/// Settings and capped corpus read under one snapshot. `None` if the tenant has no settings row.
pub fn load_tenant(conn: &Connection, id: &TenantId, cap: usize) -> rusqlite::Result<Option<Tenant>> {
    let tx = conn.unchecked_transaction()?;
    let Some(settings) = load_settings(&tx, id)? else {
        return Ok(None);
    };
    let corpus = load_fragments(&tx, id, cap)?;
    tx.commit()?;
    Ok(Some(Tenant {
        id: id.clone(),
        settings,
        corpus,
    }))
}

/// Like [`load_tenant`], but a tenant seen for the first time gets a settings row
/// with defaults. The flag is `true` when the row was created here.
pub fn load_or_create_tenant(
    conn: &Connection,
    id: &TenantId,
    cap: usize,
) -> rusqlite::Result<(Tenant, bool)> {
    if let Some(tenant) = load_tenant(conn, id, cap)? {
        return Ok((tenant, false));
    }
    // autocommit insert; a read snapshot upgraded to a write can fail with SQLITE_BUSY
    let created = insert_peer_if_absent(conn, id)?;
    let tenant = load_tenant(conn, id, cap)?.unwrap_or_else(|| Tenant {
        id: id.clone(),
        settings: Settings::default(),
        corpus: Vec::new(),
    });
    Ok((tenant, created))
}

pub fn count_fragments(conn: &Connection, id: &TenantId) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM textbase WHERE peer_id = ?1",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Append one fragment. Returns its surrogate id.
pub fn insert_fragment(conn: &Connection, id: &TenantId, text: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO textbase (peer_id, textbase) VALUES (?1, ?2)",
        params![id.as_str(), text],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Append one fragment for a tenant, creating its settings row first if needed.
/// Both writes commit together. Returns `true` if the tenant was created.
pub fn append_fragment(conn: &Connection, id: &TenantId, text: &str) -> rusqlite::Result<bool> {
    let tx = conn.unchecked_transaction()?;
    let created = insert_peer_if_absent(&tx, id)?;
    insert_fragment(&tx, id, text)?;
    tx.commit()?;
    Ok(created)
}

/// Delete the single oldest fragment. Returns `false` if the corpus was empty.
pub fn delete_oldest_fragment(conn: &Connection, id: &TenantId) -> rusqlite::Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM textbase WHERE id = (
             SELECT id FROM textbase WHERE peer_id = ?1 ORDER BY id ASC LIMIT 1
         )",
        params![id.as_str()],
    )?;
    Ok(deleted > 0)
}

pub fn delete_all_fragments(conn: &Connection, id: &TenantId) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM textbase WHERE peer_id = ?1", params![id.as_str()])
}

/// Delete every fragment containing `pattern` (case-sensitive, no wildcards).
pub fn delete_matching(conn: &Connection, id: &TenantId, pattern: &str) -> rusqlite::Result<usize> {
    if pattern.is_empty() {
        return Ok(0);
    }
    conn.execute(
        "DELETE FROM textbase WHERE peer_id = ?1 AND instr(textbase, ?2) > 0",
        params![id.as_str(), pattern],
    )
}

/// Update one setting; insert a settings row carrying just that value if none exists.
pub fn update_setting(conn: &Connection, id: &TenantId, value: &SettingValue) -> rusqlite::Result<()> {
    let column = value.field().column();
    let updated = conn.execute(
        &format!("UPDATE peers SET {column} = ?1 WHERE peer_id = ?2"),
        params![value.to_sql(), id.as_str()],
    )?;
    if updated == 0 {
        tracing::debug!(tenant = %id, column, "no settings row, inserting one");
        conn.execute(
            &format!(
                "INSERT INTO peers (peer_id, {column}) VALUES (?1, ?2) \
                 ON CONFLICT(peer_id) DO UPDATE SET {column} = excluded.{column}"
            ),
            params![id.as_str(), value.to_sql()],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn id(raw: &str) -> TenantId {
        TenantId::parse(raw).unwrap()
    }

    #[test]
    fn insert_peer_is_idempotent() {
        let conn = db::open_memory_database().unwrap();
        assert!(insert_peer_if_absent(&conn, &id("1")).unwrap());
        assert!(!insert_peer_if_absent(&conn, &id("1")).unwrap());
        assert_eq!(load_settings(&conn, &id("1")).unwrap(), Some(Settings::default()));
    }

    #[test]
    fn missing_tenant_loads_as_none() {
        let conn = db::open_memory_database().unwrap();
        assert!(load_tenant(&conn, &id("9"), 100).unwrap().is_none());
        assert!(!peer_exists(&conn, &id("9")).unwrap());
    }

    #[test]
    fn first_read_creates_tenant_with_defaults() {
        let conn = db::open_memory_database().unwrap();
        let (tenant, created) = load_or_create_tenant(&conn, &id("9"), 100).unwrap();
        assert!(created);
        assert_eq!(tenant.settings, Settings::default());
        assert!(tenant.corpus.is_empty());
        assert!(peer_exists(&conn, &id("9")).unwrap());

        let (_, created) = load_or_create_tenant(&conn, &id("9"), 100).unwrap();
        assert!(!created);
    }

    #[test]
    fn append_creates_settings_row_once() {
        let conn = db::open_memory_database().unwrap();
        let t = id("12");
        assert!(append_fragment(&conn, &t, "hello").unwrap());
        assert!(!append_fragment(&conn, &t, "again").unwrap());
        assert_eq!(load_settings(&conn, &t).unwrap(), Some(Settings::default()));
        assert_eq!(load_fragments(&conn, &t, 10).unwrap(), vec!["hello", "again"]);
    }

    #[test]
    fn fragments_are_capped_to_newest() {
        let conn = db::open_memory_database().unwrap();
        let t = id("1");
        for text in ["a", "b", "", "c", "d"] {
            insert_fragment(&conn, &t, text).unwrap();
        }
        assert_eq!(load_fragments(&conn, &t, 10).unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(load_fragments(&conn, &t, 2).unwrap(), vec!["c", "d"]);
        assert_eq!(count_fragments(&conn, &t).unwrap(), 5);
    }

    #[test]
    fn tenants_do_not_see_each_other() {
        let conn = db::open_memory_database().unwrap();
        insert_fragment(&conn, &id("1"), "one").unwrap();
        insert_fragment(&conn, &id("2"), "two").unwrap();
        delete_all_fragments(&conn, &id("1")).unwrap();
        assert!(load_fragments(&conn, &id("1"), 10).unwrap().is_empty());
        assert_eq!(load_fragments(&conn, &id("2"), 10).unwrap(), vec!["two"]);
    }

    #[test]
    fn delete_oldest_is_fifo_and_noop_when_empty() {
        let conn = db::open_memory_database().unwrap();
        let t = id("1");
        assert!(!delete_oldest_fragment(&conn, &t).unwrap());
        insert_fragment(&conn, &t, "first").unwrap();
        insert_fragment(&conn, &id("2"), "other tenant").unwrap();
        insert_fragment(&conn, &t, "second").unwrap();

        assert!(delete_oldest_fragment(&conn, &t).unwrap());
        assert_eq!(load_fragments(&conn, &t, 10).unwrap(), vec!["second"]);
        assert_eq!(load_fragments(&conn, &id("2"), 10).unwrap(), vec!["other tenant"]);
    }

    #[test]
    fn delete_matching_uses_plain_substrings() {
        let conn = db::open_memory_database().unwrap();
        let t = id("1");
        for text in ["hello <@123>", "100% sure", "Hello there", "nothing"] {
            insert_fragment(&conn, &t, text).unwrap();
        }
        assert_eq!(delete_matching(&conn, &t, "<@123>").unwrap(), 1);
        // % is literal, not a wildcard
        assert_eq!(delete_matching(&conn, &t, "0%").unwrap(), 1);
        // case-sensitive
        assert_eq!(delete_matching(&conn, &t, "hello").unwrap(), 0);
        assert_eq!(delete_matching(&conn, &t, "").unwrap(), 0);
        assert_eq!(load_fragments(&conn, &t, 10).unwrap(), vec!["Hello there", "nothing"]);
    }

    #[test]
    fn update_setting_inserts_missing_row() {
        let conn = db::open_memory_database().unwrap();
        let t = id("5");
        update_setting(&conn, &t, &SettingValue::Speed(9)).unwrap();
        let settings = load_settings(&conn, &t).unwrap().unwrap();
        assert_eq!(settings.speed, 9);
        assert!(settings.talk);
        assert_eq!(settings.lang, Lang::En);

        update_setting(&conn, &t, &SettingValue::Lang(Lang::Uk)).unwrap();
        update_setting(&conn, &t, &SettingValue::GenMode(GenMode::Literate)).unwrap();
        let settings = load_settings(&conn, &t).unwrap().unwrap();
        assert_eq!(settings.lang, Lang::Uk);
        assert_eq!(settings.gen_mode, GenMode::Literate);
        assert_eq!(settings.speed, 9);
    }

    #[test]
    fn stored_garbage_lang_reads_as_en() {
        let conn = db::open_memory_database().unwrap();
        conn.execute("INSERT INTO peers (peer_id, lang) VALUES ('3', 'klingon')", [])
            .unwrap();
        assert_eq!(load_settings(&conn, &id("3")).unwrap().unwrap().lang, Lang::En);
    }
}
