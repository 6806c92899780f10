//! Record tree model.
//!
//! # Responsibility
//! - Define the file/container node shared by codec, organizer and engine.
//! - Provide structural operations over an owned record tree.
//!
//! # Invariants
//! - `id` is stable for the record lifetime.
//! - Leaves never carry children (`children == None`).
//! - A record is owned by exactly one parent; subtrees are never aliased.
//! - Container children are kept ordered by `Position` ascending.

use crate::model::position::Position;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable record identifier.
pub type RecordId = Uuid;

/// Identifier of the synthetic root container wrapping a snapshot.
pub const ROOT_RECORD_ID: RecordId = Uuid::nil();

/// Display name of the synthetic root container.
pub const ROOT_RECORD_NAME: &str = "Files";

/// Errors raised by structural record operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Children can only be added to containers.
    InvalidOperation(RecordId),
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOperation(id) => {
                write!(f, "cannot add a child to leaf record {id}")
            }
        }
    }
}

impl Error for RecordError {}

/// Record kind, stored as a one-letter tag in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// A file. Never has children.
    Leaf,
    /// A folder. Holds an ordered, possibly empty list of children.
    Container,
}

impl RecordKind {
    /// Tag written to the kind column.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Leaf => "f",
            Self::Container => "d",
        }
    }

    /// Parses a kind column tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "f" => Some(Self::Leaf),
            "d" => Some(Self::Container),
            _ => None,
        }
    }
}

/// One node of the record tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    parent_id: Option<RecordId>,
    name: String,
    kind: RecordKind,
    position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Record>>,
}

impl Record {
    /// Creates a childless record; containers start with an empty child list.
    pub fn new(
        id: RecordId,
        parent_id: Option<RecordId>,
        name: impl Into<String>,
        kind: RecordKind,
        position: Position,
    ) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            kind,
            position,
            children: match kind {
                RecordKind::Leaf => None,
                RecordKind::Container => Some(Vec::new()),
            },
        }
    }

    /// Creates the synthetic root container wrapping top-level records.
    pub fn root(children: Vec<Record>) -> Self {
        Self {
            id: ROOT_RECORD_ID,
            parent_id: None,
            name: ROOT_RECORD_NAME.to_string(),
            kind: RecordKind::Container,
            position: Position::empty(),
            children: Some(children),
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn parent_id(&self) -> Option<RecordId> {
        self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn is_container(&self) -> bool {
        self.kind == RecordKind::Container
    }

    /// Children in position order; empty for leaves.
    pub fn children(&self) -> &[Record] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Returns a copy carrying the position assigned by the store.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Renames in place. Identity and position are preserved.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends one child.
    ///
    /// # Errors
    /// - `RecordError::InvalidOperation` when `self` is a leaf.
    pub fn add_child(&mut self, child: Record) -> Result<(), RecordError> {
        match self.children.as_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(RecordError::InvalidOperation(self.id)),
        }
    }

    /// Inserts one child at its position-ordered place.
    ///
    /// Children with an equal or missing index go after existing ones, so a
    /// freshly appended row lands last.
    ///
    /// # Errors
    /// - `RecordError::InvalidOperation` when `self` is a leaf.
    pub fn insert_child(&mut self, child: Record) -> Result<(), RecordError> {
        let Some(children) = self.children.as_mut() else {
            return Err(RecordError::InvalidOperation(self.id));
        };
        let key = child.position.sort_key();
        let index = children.partition_point(|sibling| sibling.position.sort_key() <= key);
        children.insert(index, child);
        Ok(())
    }

    /// Finds a container below `self` by id.
    ///
    /// Direct children are checked before descending, so a match closer to
    /// `self` wins over a deeper one.
    pub fn find_container(&self, id: RecordId) -> Option<&Record> {
        let children = self.children.as_ref()?;
        if let Some(found) = children
            .iter()
            .find(|child| child.id == id && child.is_container())
        {
            return Some(found);
        }
        children.iter().find_map(|child| child.find_container(id))
    }

    /// Mutable variant of [`Record::find_container`].
    pub fn find_container_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        let children = self.children.as_mut()?;
        if let Some(index) = children
            .iter()
            .position(|child| child.id == id && child.is_container())
        {
            return children.get_mut(index);
        }
        children
            .iter_mut()
            .find_map(|child| child.find_container_mut(id))
    }

    /// Finds `self` or any descendant by id, regardless of kind.
    pub fn find(&self, id: RecordId) -> Option<&Record> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }

    /// Mutable variant of [`Record::find`].
    pub fn find_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .as_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    /// Detaches the descendant with `id`, returning it with its subtree.
    pub fn remove_descendant(&mut self, id: RecordId) -> Option<Record> {
        let children = self.children.as_mut()?;
        if let Some(index) = children.iter().position(|child| child.id == id) {
            return Some(children.remove(index));
        }
        children
            .iter_mut()
            .find_map(|child| child.remove_descendant(id))
    }

    /// Preorder iterator over all descendants, excluding `self`.
    pub fn flatten(&self) -> Flatten<'_> {
        let mut stack: Vec<&Record> = self.children().iter().collect();
        stack.reverse();
        Flatten { stack }
    }

    /// Number of records in this subtree, `self` included.
    pub fn node_count(&self) -> usize {
        1 + self.flatten().count()
    }

    /// Sorts children by position, recursively.
    pub fn sort_children_recursive(&mut self) {
        if let Some(children) = self.children.as_mut() {
            sort_by_position(children);
            for child in children.iter_mut() {
                child.sort_children_recursive();
            }
        }
    }
}

/// Stable sort by position; unindexed records keep their order at the end.
pub fn sort_by_position(records: &mut [Record]) {
    records.sort_by_key(|record| record.position.sort_key());
}

/// Lazy preorder walk produced by [`Record::flatten`].
pub struct Flatten<'a> {
    stack: Vec<&'a Record>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().iter().rev());
        Some(next)
    }
}
