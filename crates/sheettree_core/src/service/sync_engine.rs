//! Sync engine: the authoritative record tree and its mutation protocol.
//!
//! # Responsibility
//! - Fetch, decode and organize store rows into the published snapshot.
//! - Mirror create/delete intents to the row store, then to the snapshot.
//! - Track and publish the authentication flag.
//!
//! # Invariants
//! - The snapshot is replaced only after a successful store round-trip; a
//!   failed operation leaves the previous snapshot authoritative.
//! - Every store, decode or organize failure surfaces as exactly one
//!   `SheetError`, both returned and broadcast on the error channel.
//! - Mutations are serialized: one fetch/add/delete runs at a time.

use crate::auth::{AuthProvider, SignInError};
use crate::codec::rows::{decode, encode_one};
use crate::model::position::Position;
use crate::model::record::{Record, RecordId, RecordKind, ROOT_RECORD_ID};
use crate::service::alert::SheetError;
use crate::service::state_cell::StateCell;
use crate::store::{BatchClearRequest, RowStore};
use crate::tree::organize;
use log::{error, info, warn};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;
use uuid::Uuid;

const ERROR_CHANNEL_CAPACITY: usize = 32;

/// Owner of the record tree snapshot and the authentication flag.
pub struct SyncEngine {
    store: Arc<dyn RowStore>,
    auth: Arc<dyn AuthProvider>,
    range: String,
    snapshot: StateCell<Arc<Record>>,
    signed_in: StateCell<bool>,
    errors: broadcast::Sender<SheetError>,
    mutation_lock: Mutex<()>,
}

impl SyncEngine {
    /// Creates an engine over `store` reading and appending within `range`.
    ///
    /// The initial snapshot is an empty root and the user is signed out.
    pub fn new(
        store: Arc<dyn RowStore>,
        auth: Arc<dyn AuthProvider>,
        range: impl Into<String>,
    ) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self {
            store,
            auth,
            range: range.into(),
            snapshot: StateCell::new(Arc::new(Record::root(Vec::new()))),
            signed_in: StateCell::new(false),
            errors,
            mutation_lock: Mutex::new(()),
        }
    }

    /// Current snapshot root.
    pub fn snapshot(&self) -> Arc<Record> {
        self.snapshot.get()
    }

    /// Current snapshot, then every replacement in order.
    pub fn subscribe_snapshot(&self) -> UnboundedReceiver<Arc<Record>> {
        self.snapshot.subscribe()
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.get()
    }

    /// Current authentication flag, then every change in order.
    pub fn subscribe_signed_in(&self) -> UnboundedReceiver<bool> {
        self.signed_in.subscribe()
    }

    /// Errors raised after subscribing.
    pub fn subscribe_errors(&self) -> broadcast::Receiver<SheetError> {
        self.errors.subscribe()
    }

    /// Replaces the snapshot with the organized contents of the store.
    ///
    /// # Errors
    /// - `SheetError::FailedToFetch` on transport, decode or organize failure.
    pub async fn fetch(&self) -> Result<Arc<Record>, SheetError> {
        const EVENT: &str = "sheet_fetch";
        let _guard = self.mutation_lock.lock().await;
        let started_at = Instant::now();
        info!("event={EVENT} module=sync status=start range={}", self.range);

        let response = self
            .store
            .get_rows(&self.range)
            .await
            .map_err(|err| self.raise(EVENT, SheetError::FailedToFetch, err))?;
        let records =
            decode(&response.values).map_err(|err| self.raise(EVENT, SheetError::FailedToFetch, err))?;
        let record_count = records.len();
        let top_level =
            organize(records).map_err(|err| self.raise(EVENT, SheetError::FailedToFetch, err))?;

        let root = Arc::new(Record::root(top_level));
        self.snapshot.publish(Arc::clone(&root));
        info!(
            "event={EVENT} module=sync status=ok rows={} records={} duration_ms={}",
            response.values.len(),
            record_count,
            started_at.elapsed().as_millis()
        );
        Ok(root)
    }

    /// Creates a record under `parent_id` (use `ROOT_RECORD_ID` for top level).
    ///
    /// The row is appended first; the record joins the snapshot with the
    /// position the store reports for it.
    ///
    /// # Errors
    /// - `SheetError::FailedToAddItem` when the name is blank, the parent is
    ///   not a container in the snapshot, or the append fails.
    pub async fn add_item(
        &self,
        name: &str,
        kind: RecordKind,
        parent_id: RecordId,
    ) -> Result<Arc<Record>, SheetError> {
        const EVENT: &str = "sheet_add";
        let _guard = self.mutation_lock.lock().await;
        let started_at = Instant::now();
        info!(
            "event={EVENT} module=sync status=start kind={} parent_id={parent_id}",
            kind.tag()
        );

        let name = name.trim();
        if name.is_empty() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToAddItem,
                "display name must not be blank",
            ));
        }

        let current = self.snapshot.get();
        if container(&current, parent_id).is_none() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToAddItem,
                format!("parent {parent_id} is not a container in the snapshot"),
            ));
        }

        let stored_parent = (parent_id != ROOT_RECORD_ID).then_some(parent_id);
        let provisional = Record::new(Uuid::new_v4(), stored_parent, name, kind, Position::empty());
        let token = self.bearer_token().await;
        let response = self
            .store
            .append_row(&self.range, encode_one(&provisional), token.as_deref())
            .await
            .map_err(|err| self.raise(EVENT, SheetError::FailedToAddItem, err))?;

        let assigned = Position::parse(&response.updates.updated_range);
        if assigned.index().is_none() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToAddItem,
                format!(
                    "store assigned unusable range `{}`",
                    response.updates.updated_range
                ),
            ));
        }

        let record = provisional.with_position(assigned);
        let record_id = record.id();
        let mut next = Record::clone(&current);
        let Some(target) = container_mut(&mut next, parent_id) else {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToAddItem,
                format!("parent {parent_id} disappeared from the snapshot"),
            ));
        };
        target
            .insert_child(record)
            .map_err(|err| self.raise(EVENT, SheetError::FailedToAddItem, err))?;

        let root = Arc::new(next);
        self.snapshot.publish(Arc::clone(&root));
        info!(
            "event={EVENT} module=sync status=ok id={record_id} range={} duration_ms={}",
            response.updates.updated_range,
            started_at.elapsed().as_millis()
        );
        Ok(root)
    }

    /// Deletes `record` and all of its descendants.
    ///
    /// Every row of the subtree is cleared in one batch before the subtree
    /// leaves the snapshot.
    ///
    /// # Errors
    /// - `SheetError::FailedToDeleteItem` when the record is not in the
    ///   snapshot, the clear fails, or the store reports nothing cleared.
    pub async fn delete_item(&self, record: &Record) -> Result<Arc<Record>, SheetError> {
        const EVENT: &str = "sheet_delete";
        let _guard = self.mutation_lock.lock().await;
        let started_at = Instant::now();
        let record_id = record.id();
        info!("event={EVENT} module=sync status=start id={record_id}");

        let current = self.snapshot.get();
        let Some(target) = current.find(record_id).filter(|found| found.id() != ROOT_RECORD_ID)
        else {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToDeleteItem,
                format!("record {record_id} is not in the snapshot"),
            ));
        };

        let ranges: Vec<String> = std::iter::once(target)
            .chain(target.flatten())
            .map(|node| node.position().a1_notation())
            .filter(|range| !range.is_empty())
            .collect();
        if ranges.is_empty() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToDeleteItem,
                format!("record {record_id} has no stored rows"),
            ));
        }
        let range_count = ranges.len();

        let token = self.bearer_token().await;
        let response = self
            .store
            .clear_rows(BatchClearRequest { ranges }, token.as_deref())
            .await
            .map_err(|err| self.raise(EVENT, SheetError::FailedToDeleteItem, err))?;
        if response.cleared_ranges.is_empty() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToDeleteItem,
                "store reported no cleared ranges",
            ));
        }

        let mut next = Record::clone(&current);
        if next.remove_descendant(record_id).is_none() {
            return Err(self.raise(
                EVENT,
                SheetError::FailedToDeleteItem,
                format!("record {record_id} disappeared from the snapshot"),
            ));
        }

        let root = Arc::new(next);
        self.snapshot.publish(Arc::clone(&root));
        info!(
            "event={EVENT} module=sync status=ok id={record_id} cleared={} requested={} duration_ms={}",
            response.cleared_ranges.len(),
            range_count,
            started_at.elapsed().as_millis()
        );
        Ok(root)
    }

    /// Restores an earlier session and publishes the resulting flag.
    pub async fn validate_sign_in_state(&self) -> bool {
        let active = self.auth.restore_previous_session().await;
        self.signed_in.publish(active);
        info!("event=sign_in_restore module=sync status=ok signed_in={active}");
        active
    }

    /// Signs in through the auth provider and publishes the flag.
    pub async fn sign_in(&self) -> Result<(), SignInError> {
        match self.auth.sign_in().await {
            Ok(()) => {
                self.signed_in.publish(true);
                Ok(())
            }
            Err(err) => {
                warn!("event=sign_in module=sync status=error error={err}");
                self.signed_in.publish(false);
                Err(err)
            }
        }
    }

    /// Signs out and publishes the flag.
    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
        self.signed_in.publish(false);
    }

    async fn bearer_token(&self) -> Option<String> {
        let token = self.auth.access_token().await;
        if token.is_none() {
            warn!("event=bearer_token module=sync status=missing action=send_unauthenticated");
        }
        token
    }

    fn raise(&self, event: &str, error: SheetError, cause: impl Display) -> SheetError {
        error!(
            "event={event} module=sync status=error error_code={} error={cause}",
            error.code()
        );
        // No subscriber is not a failure.
        let _ = self.errors.send(error);
        error
    }
}

fn container(root: &Record, id: RecordId) -> Option<&Record> {
    if root.id() == id {
        return root.is_container().then_some(root);
    }
    root.find_container(id)
}

fn container_mut(root: &mut Record, id: RecordId) -> Option<&mut Record> {
    if root.id() == id {
        return root.is_container().then_some(root);
    }
    root.find_container_mut(id)
}
