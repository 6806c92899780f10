//! Conversion between sheet rows and records.
//!
//! # Responsibility
//! - Decode raw string rows into flat, parentless-in-structure records.
//! - Encode records back into the four-column row layout.
//!
//! # Invariants
//! - Row layout is `[id, parent_id, kind_tag, name]`.
//! - Blank rows (empty first cell) are skipped, never fatal.
//! - An unparsable parent id reads as no parent; only a bad record id or kind
//!   tag fails the batch.
//! - Synthesized positions name the physical row the record came from.
//! - Encoding is shallow: children are not emitted.

use crate::model::position::Position;
use crate::model::record::{Record, RecordId, RecordKind};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Number of columns in one record row.
pub const ROW_WIDTH: usize = 4;

/// Raw row as exchanged with the store.
pub type Row = Vec<String>;

/// Fatal decode failures. Any of these aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Kind column holds something other than `f` or `d`.
    UnknownKind { row_number: u32, tag: String },
    /// Id or parent id column is not a UUID.
    InvalidId { row_number: u32, value: String },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind { row_number, tag } => {
                write!(f, "unknown record kind `{tag}` in row {row_number}")
            }
            Self::InvalidId { row_number, value } => {
                write!(f, "invalid record id `{value}` in row {row_number}")
            }
        }
    }
}

impl Error for DecodeError {}

/// Decodes rows into flat records in row order.
///
/// Each record's position is `A{n}:D{n}` where `n` is its 1-based row number.
/// Rows with an empty first cell are skipped but still occupy a row number,
/// so positions keep pointing at the row the store holds.
///
/// # Errors
/// - `DecodeError::UnknownKind` for an unrecognized kind tag.
/// - `DecodeError::InvalidId` for a malformed record id.
pub fn decode<R: AsRef<[String]>>(rows: &[R]) -> Result<Vec<Record>, DecodeError> {
    let mut records = Vec::with_capacity(rows.len());
    for (offset, row) in rows.iter().enumerate() {
        let row_number = offset as u32 + 1;
        let fields = row.as_ref();
        let id_text = field(fields, 0);
        if id_text.is_empty() {
            continue;
        }

        let id = parse_id(id_text, row_number)?;
        let parent_id = match field(fields, 1) {
            "" => None,
            value => match Uuid::parse_str(value) {
                Ok(parent_id) => Some(parent_id),
                Err(_) => {
                    warn!(
                        "event=decode module=codec status=orphan row={row_number} id={id} reason=invalid_parent_id"
                    );
                    None
                }
            },
        };
        let tag = field(fields, 2);
        let kind = RecordKind::from_tag(tag).ok_or_else(|| DecodeError::UnknownKind {
            row_number,
            tag: tag.to_string(),
        })?;

        records.push(Record::new(
            id,
            parent_id,
            field(fields, 3),
            kind,
            Position::for_row(row_number),
        ));
    }
    Ok(records)
}

/// Encodes records into rows, one row per given record.
pub fn encode<'a, I>(records: I) -> Vec<Row>
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().map(encode_one).collect()
}

/// Encodes a single record into its row.
pub fn encode_one(record: &Record) -> Row {
    vec![
        record.id().to_string(),
        record
            .parent_id()
            .map(|parent| parent.to_string())
            .unwrap_or_default(),
        record.kind().tag().to_string(),
        record.name().to_string(),
    ]
}

// Stores drop trailing empty cells, so a short row reads as empty fields.
fn field(fields: &[String], index: usize) -> &str {
    fields.get(index).map(String::as_str).unwrap_or("")
}

fn parse_id(value: &str, row_number: u32) -> Result<RecordId, DecodeError> {
    Uuid::parse_str(value).map_err(|_| DecodeError::InvalidId {
        row_number,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, DecodeError, Row};
    use crate::model::position::Position;
    use crate::model::record::{Record, RecordKind};
    use uuid::Uuid;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn decodes_fields_and_positions() {
        let parent = Uuid::new_v4();
        let child = Uuid::new_v4();
        let rows = vec![
            row(&[&parent.to_string(), "", "d", "Files"]),
            row(&[&child.to_string(), &parent.to_string(), "f", "a.txt"]),
        ];

        let records = decode(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), parent);
        assert_eq!(records[0].parent_id(), None);
        assert_eq!(records[0].kind(), RecordKind::Container);
        assert_eq!(records[0].position().a1_notation(), "A1:D1");
        assert_eq!(records[1].parent_id(), Some(parent));
        assert_eq!(records[1].name(), "a.txt");
        assert_eq!(records[1].position().index(), Some(2));
    }

    #[test]
    fn skips_blank_rows_without_failing() {
        let id = Uuid::new_v4();
        let rows = vec![
            row(&[&id.to_string(), "", "f", "kept"]),
            row(&[]),
            row(&["", "", "", ""]),
        ];

        let records = decode(&rows).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "kept");
    }

    #[test]
    fn blank_middle_row_keeps_following_rows_on_their_own_row_number() {
        let first = Uuid::new_v4();
        let third = Uuid::new_v4();
        let rows = vec![
            row(&[&first.to_string(), "", "f", "one"]),
            row(&[]),
            row(&[&third.to_string(), "", "f", "three"]),
        ];

        let records = decode(&rows).unwrap();
        assert_eq!(records[1].position().index(), Some(3));
    }

    #[test]
    fn short_row_reads_missing_name_as_empty() {
        let id = Uuid::new_v4();
        let records = decode(&[row(&[&id.to_string(), "", "d"])]).unwrap();
        assert_eq!(records[0].name(), "");
        assert!(records[0].is_container());
    }

    #[test]
    fn unknown_kind_fails_the_batch() {
        let rows = vec![
            row(&[&Uuid::new_v4().to_string(), "", "f", "ok"]),
            row(&[&Uuid::new_v4().to_string(), "", "x", "bad"]),
        ];
        let err = decode(&rows).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownKind {
                row_number: 2,
                tag: "x".to_string()
            }
        );
    }

    #[test]
    fn malformed_record_id_fails_the_batch() {
        let err = decode(&[row(&["not-a-uuid", "", "f", "bad"])]).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidId { row_number: 1, .. }));
    }

    #[test]
    fn malformed_parent_id_reads_as_no_parent() {
        let kept = Uuid::new_v4();
        let stray = Uuid::new_v4();
        let rows = vec![
            row(&[&kept.to_string(), "", "f", "fine.txt"]),
            row(&[&stray.to_string(), "not-a-uuid", "f", "lost.txt"]),
        ];

        let records = decode(&rows).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id(), stray);
        assert_eq!(records[1].parent_id(), None);
        assert_eq!(records[1].position().index(), Some(2));
    }

    #[test]
    fn encode_is_shallow_and_round_trips_identity_fields() {
        let parent_id = Uuid::new_v4();
        let mut folder = Record::new(
            parent_id,
            None,
            "Files",
            RecordKind::Container,
            Position::for_row(1),
        );
        let file = Record::new(
            Uuid::new_v4(),
            Some(parent_id),
            "a.txt",
            RecordKind::Leaf,
            Position::empty(),
        );
        folder.add_child(file.clone()).unwrap();

        let rows = encode([&folder, &file]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], row(&[&parent_id.to_string(), "", "d", "Files"]));

        let decoded = decode(&rows).unwrap();
        let identity = |record: &Record| {
            (
                record.id(),
                record.parent_id(),
                record.kind(),
                record.name().to_string(),
            )
        };
        assert_eq!(identity(&decoded[0]), identity(&folder));
        assert_eq!(identity(&decoded[1]), identity(&file));
        assert!(decoded[0].children().is_empty());
    }
}
