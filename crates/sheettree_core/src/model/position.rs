//! Row-range position model.
//!
//! # Responsibility
//! - Parse the store's A1 range notation (`Sheet1!A2:D2`) into an ordering key.
//! - Provide the partial ordering used to keep siblings sorted.
//!
//! # Invariants
//! - Positions compare only by numeric row index.
//! - A position without index is unordered: it is never less than anything.
//! - Parsing never fails; unrecognized input yields an unindexed position.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Sheet-name prefix the store prepends to ranges it reports back.
pub const SHEET_NAME_PREFIX: &str = "Sheet1!";

/// Separator between the start and end cell of a range.
pub const RANGE_SEPARATOR: char = ':';

/// First column of a record row.
pub const FIRST_COLUMN: &str = "A";

/// Last column of a record row.
pub const LAST_COLUMN: &str = "D";

static CELL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)(\d*)$").expect("cell pattern is a valid regex")
});

/// Ordering key derived from a row-range notation.
#[derive(Debug, Clone, Default, Eq, Serialize)]
pub struct Position {
    row: Option<String>,
    column: Option<String>,
    index: Option<u32>,
    notation: String,
}

impl Position {
    /// Position of a record that has not been persisted yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Canonical position of the record stored in row `row_number`.
    pub fn for_row(row_number: u32) -> Self {
        Self::parse(&format!(
            "{FIRST_COLUMN}{row_number}{RANGE_SEPARATOR}{LAST_COLUMN}{row_number}"
        ))
    }

    /// Parses a range such as `A2:D2` or `Sheet1!A2:D2`.
    pub fn parse(notation: &str) -> Self {
        let raw = notation.trim();
        if raw.is_empty() {
            return Self::empty();
        }

        let unprefixed = match raw.rfind('!') {
            Some(split) => &raw[split + 1..],
            None => raw,
        };
        let (start, end) = match unprefixed.split_once(RANGE_SEPARATOR) {
            Some((start, end)) => (start, end),
            None => (unprefixed, unprefixed),
        };

        let Some(start_cell) = CELL_PATTERN.captures(start) else {
            return Self::unrecognized(raw);
        };
        let Some(end_cell) = CELL_PATTERN.captures(end) else {
            return Self::unrecognized(raw);
        };

        let index = start_cell
            .get(2)
            .map(|digits| digits.as_str())
            .filter(|digits| !digits.is_empty())
            .and_then(|digits| digits.parse::<u32>().ok());

        Self {
            row: Some(start_cell[1].to_ascii_uppercase()),
            column: Some(end_cell[1].to_ascii_uppercase()),
            index,
            notation: raw.to_string(),
        }
    }

    fn unrecognized(raw: &str) -> Self {
        Self {
            row: None,
            column: None,
            index: None,
            notation: raw.to_string(),
        }
    }

    /// Compares two positions by row index; `None` when either is unindexed.
    pub fn compare(a: &Position, b: &Position) -> Option<Ordering> {
        match (a.index, b.index) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => None,
        }
    }

    /// Total sort key: indexed positions ascend, unindexed ones go last.
    pub fn sort_key(&self) -> (bool, u32) {
        match self.index {
            Some(index) => (false, index),
            None => (true, 0),
        }
    }

    /// Start-cell column letters (`A` in `A2:D2`).
    pub fn row(&self) -> Option<&str> {
        self.row.as_deref()
    }

    /// End-cell column letters (`D` in `A2:D2`).
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    /// Numeric row index used for ordering.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Notation exactly as it was handed to [`Position::parse`].
    pub fn notation(&self) -> &str {
        &self.notation
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_none() && self.column.is_none() && self.index.is_none()
    }

    /// Range notation without sheet prefix, or `""` for an empty position.
    pub fn a1_notation(&self) -> String {
        match (&self.row, &self.column) {
            (Some(row), Some(column)) => {
                let number = self.index.map(|n| n.to_string()).unwrap_or_default();
                format!("{row}{number}{RANGE_SEPARATOR}{column}{number}")
            }
            _ => String::new(),
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.a1_notation() == other.a1_notation()
    }
}

// Same index with different columns is incomparable, keeping
// `partial_cmp == Some(Equal)` in step with `==`.
impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match Position::compare(self, other) {
            Some(Ordering::Equal) if self != other => None,
            ordering => ordering,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.a1_notation())
    }
}
