use folio_core::db::migrations::latest_version;
use folio_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in ["personal_details", "about", "notification_settings"] {
        assert_table_exists(&conn, table);
        assert_column_exists(&conn, table, "revision");
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute("INSERT INTO about (id, summary) VALUES (1, 'kept');", [])
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let summary: String = conn_second
        .query_row("SELECT summary FROM about WHERE id = 1;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(summary, "kept");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::SchemaTooNew { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn open_failure_names_the_database_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing-dir").join("portfolio.db");

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Open { location, .. } => assert!(location.ends_with("portfolio.db")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("cannot open portfolio database"));
}

#[test]
fn singleton_tables_refuse_a_second_row() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO personal_details (id, name) VALUES (1, 'Ann');", [])
        .unwrap();

    assert!(conn
        .execute("INSERT INTO personal_details (id, name) VALUES (2, 'Bob');", [])
        .is_err());
    assert!(conn
        .execute("INSERT INTO personal_details (name) VALUES ('Bob');", [])
        .is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert!(
        columns.iter().any(|name| name == column),
        "column {table_name}.{column} does not exist"
    );
}
