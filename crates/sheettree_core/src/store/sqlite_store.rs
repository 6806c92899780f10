//! SQLite-backed local sheet implementing [`RowStore`].
//!
//! # Responsibility
//! - Emulate the flat store's row semantics on a local database.
//! - Keep SQL details and row numbering inside the store boundary.
//!
//! # Invariants
//! - Row numbers start at 1 and name physical rows; clearing blanks a row in
//!   place instead of shifting later rows.
//! - Reads stop at the last non-blank row; blank rows before it are returned
//!   as empty rows, and trailing empty cells are trimmed.
//! - Appends land on the row after the last non-blank row.
//! - All SQLite work runs on the blocking pool.

use crate::codec::rows::{Row, ROW_WIDTH};
use crate::db::{open_db, open_db_in_memory};
use crate::model::position::{Position, FIRST_COLUMN, LAST_COLUMN};
use crate::store::wire::{
    AppendValuesResponse, BatchClearRequest, BatchClearResponse, UpdateData, ValueRange,
    MAJOR_DIMENSION_ROWS,
};
use crate::store::{RowStore, StoreError, StoreResult};
use async_trait::async_trait;
use log::{debug, warn};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const DEFAULT_SHEET_NAME: &str = "Sheet1";

const NON_BLANK_ROW_FILTER: &str =
    "(col_a <> '' OR col_b <> '' OR col_c <> '' OR col_d <> '')";

/// Local sheet stored in one SQLite table.
#[derive(Clone)]
pub struct SqliteRowStore {
    conn: Arc<Mutex<Connection>>,
    spreadsheet_id: String,
    sheet_name: String,
    required_token: Option<String>,
}

impl SqliteRowStore {
    /// Opens (or creates) a sheet database file.
    pub fn open(path: impl AsRef<Path>, spreadsheet_id: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db(path)?, spreadsheet_id))
    }

    /// Opens an empty in-memory sheet.
    pub fn open_in_memory(spreadsheet_id: impl Into<String>) -> StoreResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, spreadsheet_id))
    }

    fn from_connection(conn: Connection, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            required_token: None,
        }
    }

    /// Rejects writes whose bearer token differs from `token`.
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn authorize(&self, bearer_token: Option<&str>) -> StoreResult<()> {
        match self.required_token.as_deref() {
            Some(required) if bearer_token != Some(required) => {
                warn!("event=store_write module=store status=rejected reason=unauthorized");
                Err(StoreError::Unauthorized)
            }
            _ => Ok(()),
        }
    }

    fn qualified(&self, a1_notation: &str) -> String {
        format!("{}!{}", self.sheet_name, a1_notation)
    }

    async fn with_conn<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Transport("sheet connection lock poisoned".to_string()))?;
            work(&mut *guard)
        })
        .await
        .map_err(|err| StoreError::Transport(format!("sheet task failed: {err}")))?
    }
}

#[async_trait]
impl RowStore for SqliteRowStore {
    async fn get_rows(&self, range: &str) -> StoreResult<ValueRange> {
        // The table holds exactly the four record columns, so `range` is
        // validated but always read in full.
        ensure_column_range(range)?;
        let rows = self.with_conn(load_rows).await?;
        debug!("event=store_read module=store status=ok rows={}", rows.len());

        let last_row = rows.len().max(1);
        Ok(ValueRange {
            range: self.qualified(&format!("{FIRST_COLUMN}1:{LAST_COLUMN}{last_row}")),
            major_dimension: Some(MAJOR_DIMENSION_ROWS.to_string()),
            values: rows,
        })
    }

    async fn append_row(
        &self,
        range: &str,
        row: Row,
        bearer_token: Option<&str>,
    ) -> StoreResult<AppendValuesResponse> {
        self.authorize(bearer_token)?;
        ensure_column_range(range)?;
        if row.len() > ROW_WIDTH {
            return Err(StoreError::InvalidData(format!(
                "row has {} cells, expected at most {ROW_WIDTH}",
                row.len()
            )));
        }
        if row.first().map_or(true, |id| id.is_empty()) {
            return Err(StoreError::InvalidData(
                "row must start with a non-empty id".to_string(),
            ));
        }

        let row_number = self.with_conn(move |conn| insert_after_last(conn, row)).await?;
        let written = Position::for_row(row_number);
        Ok(AppendValuesResponse {
            spreadsheet_id: Some(self.spreadsheet_id.clone()),
            updates: UpdateData {
                updated_range: self.qualified(&written.a1_notation()),
                updated_rows: 1,
            },
        })
    }

    async fn clear_rows(
        &self,
        request: BatchClearRequest,
        bearer_token: Option<&str>,
    ) -> StoreResult<BatchClearResponse> {
        self.authorize(bearer_token)?;

        let mut targets = Vec::with_capacity(request.ranges.len());
        for range in &request.ranges {
            let position = Position::parse(range);
            let row_number = position
                .index()
                .ok_or_else(|| StoreError::InvalidRange(range.clone()))?;
            targets.push((row_number, position.a1_notation()));
        }

        let row_numbers: Vec<u32> = targets.iter().map(|(row, _)| *row).collect();
        self.with_conn(move |conn| blank_rows(conn, &row_numbers)).await?;

        Ok(BatchClearResponse {
            spreadsheet_id: self.spreadsheet_id.clone(),
            cleared_ranges: targets
                .iter()
                .map(|(_, a1_notation)| self.qualified(a1_notation))
                .collect(),
        })
    }
}

fn ensure_column_range(range: &str) -> StoreResult<()> {
    let position = Position::parse(range);
    if position.row().is_none() || position.column().is_none() {
        return Err(StoreError::InvalidRange(range.to_string()));
    }
    Ok(())
}

fn load_rows(conn: &mut Connection) -> StoreResult<Vec<Row>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT row_number, col_a, col_b, col_c, col_d
         FROM sheet_rows
         WHERE {NON_BLANK_ROW_FILTER}
         ORDER BY row_number ASC;"
    ))?;
    let mut query = stmt.query([])?;

    let mut rows: Vec<Row> = Vec::new();
    while let Some(db_row) = query.next()? {
        let row_number: i64 = db_row.get(0)?;
        let row_number = usize::try_from(row_number).map_err(|_| {
            StoreError::InvalidData(format!("invalid row number `{row_number}`"))
        })?;
        while rows.len() + 1 < row_number {
            rows.push(Vec::new());
        }

        let mut cells: Row = Vec::with_capacity(ROW_WIDTH);
        for column in 1..=ROW_WIDTH {
            cells.push(db_row.get(column)?);
        }
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }
    Ok(rows)
}

fn insert_after_last(conn: &mut Connection, row: Row) -> StoreResult<u32> {
    let tx = conn.transaction()?;
    let row_number: u32 = tx.query_row(
        &format!(
            "SELECT COALESCE(MAX(row_number), 0) + 1
             FROM sheet_rows
             WHERE {NON_BLANK_ROW_FILTER};"
        ),
        [],
        |db_row| db_row.get(0),
    )?;

    let cell = |index: usize| row.get(index).map(String::as_str).unwrap_or("");
    tx.execute(
        "INSERT OR REPLACE INTO sheet_rows (row_number, col_a, col_b, col_c, col_d)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![row_number, cell(0), cell(1), cell(2), cell(3)],
    )?;
    tx.commit()?;
    Ok(row_number)
}

fn blank_rows(conn: &mut Connection, row_numbers: &[u32]) -> StoreResult<()> {
    let tx = conn.transaction()?;
    for row_number in row_numbers {
        tx.execute(
            "UPDATE sheet_rows
             SET col_a = '', col_b = '', col_c = '', col_d = '',
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE row_number = ?1;",
            [row_number],
        )?;
    }
    tx.commit()?;
    Ok(())
}
