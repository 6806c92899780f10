use sheettree_core::store::BatchClearRequest;
use sheettree_core::{Row, RowStore, SqliteRowStore, StoreError};

const RANGE: &str = "A:D";

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn clear(ranges: &[&str]) -> BatchClearRequest {
    BatchClearRequest {
        ranges: ranges.iter().map(|range| range.to_string()).collect(),
    }
}

#[tokio::test]
async fn appends_are_numbered_from_one() {
    let store = SqliteRowStore::open_in_memory("sheet-a").unwrap();

    let mut assigned = Vec::new();
    for id in ["r1", "r2", "r3"] {
        let response = store
            .append_row(RANGE, row(&[id, "", "f", id]), None)
            .await
            .unwrap();
        assert_eq!(response.updates.updated_rows, 1);
        assigned.push(response.updates.updated_range);
    }
    assert_eq!(
        assigned,
        vec!["Sheet1!A1:D1", "Sheet1!A2:D2", "Sheet1!A3:D3"]
    );

    let values = store.get_rows(RANGE).await.unwrap();
    assert_eq!(values.range, "Sheet1!A1:D3");
    assert_eq!(values.major_dimension.as_deref(), Some("ROWS"));
    assert_eq!(values.values.len(), 3);
}

#[tokio::test]
async fn reads_trim_trailing_empty_cells() {
    let store = SqliteRowStore::open_in_memory("sheet-a").unwrap();
    store
        .append_row(RANGE, row(&["r1", "", "d", ""]), None)
        .await
        .unwrap();

    let values = store.get_rows(RANGE).await.unwrap();
    assert_eq!(values.values, vec![row(&["r1", "", "d"])]);
}

#[tokio::test]
async fn cleared_middle_rows_read_back_blank_and_keep_numbering() {
    let store = SqliteRowStore::open_in_memory("sheet-a").unwrap();
    for id in ["r1", "r2", "r3"] {
        store
            .append_row(RANGE, row(&[id, "", "f", id]), None)
            .await
            .unwrap();
    }

    let response = store
        .clear_rows(clear(&["A2:D2"]), None)
        .await
        .unwrap();
    assert_eq!(response.spreadsheet_id, "sheet-a");
    assert_eq!(response.cleared_ranges, vec!["Sheet1!A2:D2"]);

    let values = store.get_rows(RANGE).await.unwrap().values;
    assert_eq!(values.len(), 3);
    assert!(values[1].is_empty());
    assert_eq!(values[2][0], "r3");

    let next = store
        .append_row(RANGE, row(&["r4", "", "f", "r4"]), None)
        .await
        .unwrap();
    assert_eq!(next.updates.updated_range, "Sheet1!A4:D4");
}

#[tokio::test]
async fn clearing_the_tail_shortens_reads_and_frees_the_row() {
    let store = SqliteRowStore::open_in_memory("sheet-a").unwrap();
    for id in ["r1", "r2"] {
        store
            .append_row(RANGE, row(&[id, "", "f", id]), None)
            .await
            .unwrap();
    }

    store
        .clear_rows(clear(&["Sheet1!A2:D2"]), None)
        .await
        .unwrap();
    assert_eq!(store.get_rows(RANGE).await.unwrap().values.len(), 1);

    let reused = store
        .append_row(RANGE, row(&["r3", "", "f", "r3"]), None)
        .await
        .unwrap();
    assert_eq!(reused.updates.updated_range, "Sheet1!A2:D2");
}

#[tokio::test]
async fn required_token_gates_writes_only() {
    let store = SqliteRowStore::open_in_memory("sheet-a")
        .unwrap()
        .with_required_token("secret");

    let err = store
        .append_row(RANGE, row(&["r1", "", "f", "a"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));
    let err = store
        .append_row(RANGE, row(&["r1", "", "f", "a"]), Some("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));

    store
        .append_row(RANGE, row(&["r1", "", "f", "a"]), Some("secret"))
        .await
        .unwrap();
    assert_eq!(store.get_rows(RANGE).await.unwrap().values.len(), 1);

    let err = store.clear_rows(clear(&["A1:D1"]), None).await.unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let store = SqliteRowStore::open_in_memory("sheet-a").unwrap();

    let err = store.get_rows("???").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidRange(_)));

    let err = store
        .append_row(RANGE, row(&["", "", "f", "no id"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));

    let err = store
        .append_row(RANGE, row(&["r1", "", "f", "a", "extra"]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));

    let err = store.clear_rows(clear(&["A:D"]), None).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidRange(_)));
}

#[tokio::test]
async fn file_backed_sheet_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.sqlite3");

    {
        let store = SqliteRowStore::open(&path, "disk").unwrap();
        store
            .append_row(RANGE, row(&["r1", "", "d", "kept"]), None)
            .await
            .unwrap();
    }

    let reopened = SqliteRowStore::open(&path, "disk").unwrap();
    let values = reopened.get_rows(RANGE).await.unwrap().values;
    assert_eq!(values, vec![row(&["r1", "", "d", "kept"])]);
    assert_eq!(reopened.spreadsheet_id(), "disk");
}
