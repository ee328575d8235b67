mod helpers;

use babble::db;
use babble::db::migrations::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
use rusqlite::Connection;

#[test]
fn fresh_db_migrates_to_current_version() {
    let conn = helpers::test_db();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let mut conn = helpers::test_db();
    // Running again should be a no-op
    run_migrations(&mut conn).unwrap();
    run_migrations(&mut conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}

#[test]
fn v1_database_gains_lang_column() {
    // Simulate a v1 database that hasn't been migrated
    let mut conn = Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 1);

    conn.execute(
        "INSERT INTO peers (peer_id, talk, gen, speed) VALUES ('10', 0, 1, 4)",
        [],
    )
    .unwrap();

    run_migrations(&mut conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);

    // existing rows keep their values and pick up the default language
    let (speed, lang): (i64, String) = conn
        .query_row(
            "SELECT speed, lang FROM peers WHERE peer_id = '10'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(speed, 4);
    assert_eq!(lang, "en");
}

#[test]
fn on_disk_database_reopens_at_current_version() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("nested").join("babble.db");

    let conn = db::open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    drop(conn);

    let conn = db::open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
}
