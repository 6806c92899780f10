use sheettree_core::db::migrations::latest_version;
use sheettree_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn fresh_database_has_sheet_rows_table() {
    let conn = open_db_in_memory().unwrap();

    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());

    let mut stmt = conn.prepare("PRAGMA table_info(sheet_rows);").unwrap();
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    for expected in ["row_number", "col_a", "col_b", "col_c", "col_d"] {
        assert!(columns.iter().any(|column| column == expected), "{expected}");
    }
}

#[test]
fn row_numbers_must_be_positive() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO sheet_rows (row_number, col_a) VALUES (0, 'id');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn reopening_a_file_does_not_rerun_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO sheet_rows (row_number, col_a, col_c) VALUES (1, 'id', 'f');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sheet_rows;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn open_failure_names_the_sheet_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("sheet.sqlite3");

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Open { .. }), "{err:?}");
    assert!(err.to_string().contains("sheet.sqlite3"));
}

#[test]
fn newer_schema_is_rejected_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.sqlite3");
    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version: 42, .. }
    ));
}
