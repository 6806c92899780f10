//! Reconstructs the record hierarchy from flat, order-independent records.
//!
//! # Responsibility
//! - Attach leaves and containers to their declared parent containers.
//! - Produce the position-ordered top-level list wrapped by the root.
//!
//! # Invariants
//! - Every input record appears exactly once in the output forest.
//! - A parent id that names no container leaves the record top-level.
//! - Container folding runs at most one pass per container; a cyclic parent
//!   graph is reported, never looped on.
//! - Output siblings are ordered by `Position` at every level.

use crate::model::record::{sort_by_position, Record, RecordId};
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from hierarchy reconstruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeError {
    /// These containers' parent chains loop back on themselves.
    CycleDetected { ids: Vec<RecordId> },
}

impl Display for OrganizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { ids } => {
                let joined = ids
                    .iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "container parent graph contains a cycle: {joined}")
            }
        }
    }
}

impl Error for OrganizeError {}

/// Organizes flat records into an ordered forest of top-level records.
///
/// Already-organized input is accepted: containers keep their children and
/// the result is unchanged.
///
/// # Errors
/// - `OrganizeError::CycleDetected` when container parents form a cycle.
pub fn organize(records: Vec<Record>) -> Result<Vec<Record>, OrganizeError> {
    let total = records.len();
    let (mut containers, leaves): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(Record::is_container);

    let mut top_level_leaves = Vec::new();
    for leaf in leaves {
        match leaf.parent_id() {
            Some(parent_id) => {
                if let Some(parent) = find_in_forest_mut(&mut containers, parent_id) {
                    push_child(parent, leaf);
                } else {
                    warn!(
                        "event=organize module=tree status=orphan kind=leaf id={} parent_id={}",
                        leaf.id(),
                        parent_id
                    );
                    top_level_leaves.push(leaf);
                }
            }
            None => top_level_leaves.push(leaf),
        }
    }

    let mut forest = fold_containers(containers)?;
    forest.extend(top_level_leaves);
    sort_by_position(&mut forest);
    for record in forest.iter_mut() {
        record.sort_children_recursive();
    }

    debug!(
        "event=organize module=tree status=ok input={} top_level={}",
        total,
        forest.len()
    );
    Ok(forest)
}

fn fold_containers(containers: Vec<Record>) -> Result<Vec<Record>, OrganizeError> {
    let known_ids: HashSet<RecordId> = containers
        .iter()
        .flat_map(|container| {
            std::iter::once(container)
                .chain(container.flatten().filter(|record| record.is_container()))
        })
        .map(Record::id)
        .collect();

    let mut forest = Vec::new();
    let mut pending = Vec::new();
    for container in containers {
        match container.parent_id() {
            Some(parent_id) if known_ids.contains(&parent_id) => pending.push(container),
            Some(parent_id) => {
                warn!(
                    "event=organize module=tree status=orphan kind=container id={} parent_id={}",
                    container.id(),
                    parent_id
                );
                forest.push(container);
            }
            None => forest.push(container),
        }
    }

    // Each productive pass places at least one more tree level, so the number
    // of passes never exceeds the number of containers.
    let max_passes = pending.len();
    let mut passes = 0;
    while !pending.is_empty() {
        if passes == max_passes {
            return Err(cycle_error(&pending));
        }
        passes += 1;

        let before = pending.len();
        let mut unresolved = Vec::with_capacity(pending.len());
        for container in pending {
            let Some(parent_id) = container.parent_id() else {
                forest.push(container);
                continue;
            };
            match find_in_forest_mut(&mut forest, parent_id) {
                Some(parent) => push_child(parent, container),
                None => unresolved.push(container),
            }
        }

        if unresolved.len() == before {
            return Err(cycle_error(&unresolved));
        }
        pending = unresolved;
    }

    Ok(forest)
}

fn find_in_forest_mut(forest: &mut [Record], id: RecordId) -> Option<&mut Record> {
    if let Some(index) = forest
        .iter()
        .position(|record| record.id() == id && record.is_container())
    {
        return forest.get_mut(index);
    }
    forest
        .iter_mut()
        .find_map(|record| record.find_container_mut(id))
}

fn push_child(parent: &mut Record, child: Record) {
    // Lookups only return containers.
    if let Err(err) = parent.add_child(child) {
        warn!("event=organize module=tree status=error error={err}");
    }
}

fn cycle_error(records: &[Record]) -> OrganizeError {
    OrganizeError::CycleDetected {
        ids: records.iter().map(Record::id).collect(),
    }
}
