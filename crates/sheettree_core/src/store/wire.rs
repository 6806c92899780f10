//! Request/response shapes of the row store.
//!
//! Field names follow the store's camelCase JSON so a transport layer can
//! deserialize responses straight into these types.

use crate::codec::rows::Row;
use serde::{Deserialize, Serialize};

/// Major dimension reported by the store for value reads.
pub const MAJOR_DIMENSION_ROWS: &str = "ROWS";

/// Rows read from a range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    /// Absent in the JSON when the range holds no values.
    #[serde(default)]
    pub values: Vec<Row>,
}

/// Response to an append request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendValuesResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    pub updates: UpdateData,
}

/// Range written by an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateData {
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u32,
}

/// Batch clear request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchClearRequest {
    pub ranges: Vec<String>,
}

/// Batch clear response; an empty `cleared_ranges` means nothing was cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchClearResponse {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default)]
    pub cleared_ranges: Vec<String>,
}
