//! Optimistic mutate-then-reconcile over one remote collection.
//!
//! Every mutation is applied to the local list first, then sent to the store.
//! The store's answer either commits the change (the authoritative row replaces
//! the optimistic one) or rolls it back to the snapshot taken before the call.
//! State is only touched while holding the lock, and the lock is never held
//! across the remote call.

use std::{future::Future, sync::Arc, time::Duration};

use serde_json::Value;
use thiserror::Error;
use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;

use crate::{
    log_debug, log_warn,
    models::ReservationStatus,
    store::{Collection, Record, RecordStore, Row, StoreError, StoreResult},
};

use super::state::{AdminListState, ItemPhase};

const ENABLE_LOGS: bool = true;

pub const DEFAULT_MUTATION_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not add {collection} row: {source}")]
    AddFailed {
        collection: Collection,
        source: StoreError,
    },
    #[error("could not update {collection} row {id}: {source}")]
    UpdateFailed {
        collection: Collection,
        id: i64,
        source: StoreError,
    },
    #[error("could not remove {collection} row {id}: {source}")]
    RemoveFailed {
        collection: Collection,
        id: i64,
        source: StoreError,
    },
    #[error("row {0} has a change in flight")]
    ItemBusy(i64),
    #[error("row {0} not found")]
    NotFound(i64),
    #[error("field '{0}' cannot be toggled")]
    NotToggleable(String),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("collection has changes in flight")]
    CollectionBusy,
    #[error("could not load collection: {0}")]
    LoadFailed(#[source] StoreError),
    #[error("the admin view was closed")]
    Detached,
    #[error("reservation cannot move from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    #[error("{0}")]
    Rejected(String),
}

fn merge_patch(row: &mut Row, patch: &Row) {
    for (key, value) in patch {
        if key != "id" {
            row.insert(key.clone(), value.clone());
        }
    }
}

#[derive(Clone)]
pub struct AdminSynchronizer<T: Record> {
    state: Arc<Mutex<AdminListState<T>>>,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<T: Record> AdminSynchronizer<T> {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self::with_token(store, timeout, CancellationToken::new())
    }

    /// Share `cancel` with sibling synchronizers so one detach closes them all.
    pub fn with_token(
        store: Arc<dyn RecordStore>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(AdminListState::new())),
            store,
            timeout,
            cancel,
        }
    }

    pub fn collection(&self) -> Collection {
        T::COLLECTION
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.lock().await.items()
    }

    /// Rows as the store last confirmed them, without optimistic changes.
    pub async fn committed_items(&self) -> Vec<T> {
        self.state.lock().await.committed_items()
    }

    pub async fn get(&self, id: i64) -> Option<T> {
        self.state.lock().await.get(id).cloned()
    }

    pub async fn phase(&self, id: i64) -> Option<ItemPhase> {
        self.state.lock().await.phase(id)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.is_empty()
    }

    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn ensure_attached(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Detached);
        }
        Ok(())
    }

    /// Run one remote call bounded by the timeout. Detaching wins over a
    /// completion that arrives at the same time.
    async fn call<R, F>(&self, request: F) -> Result<StoreResult<R>, SyncError>
    where
        F: Future<Output = StoreResult<R>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SyncError::Detached),
            outcome = time::timeout(self.timeout, request) => Ok(match outcome {
                Ok(result) => result,
                Err(_) => Err(StoreError::Unavailable(format!(
                    "no response within {}s",
                    self.timeout.as_secs_f64()
                ))),
            }),
        }
    }

    /// Replace the local list with the store's contents. Rows that do not
    /// convert are skipped.
    pub async fn load(&self) -> Result<usize, SyncError> {
        self.ensure_attached()?;
        if self.state.lock().await.any_pending() {
            return Err(SyncError::CollectionBusy);
        }

        let rows = self
            .call(self.store.list(T::COLLECTION))
            .await?
            .map_err(SyncError::LoadFailed)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            match T::from_row(row) {
                Ok(item) => items.push(item),
                Err(err) => log_warn!("Skipping {} row {:?}: {err}", T::COLLECTION, row.get("id")),
            }
        }

        let mut state = self.state.lock().await;
        self.ensure_attached()?;
        if state.any_pending() {
            return Err(SyncError::CollectionBusy);
        }
        let count = items.len();
        state.replace_all(items);
        log_debug!("Loaded {count} {} rows", T::COLLECTION);
        Ok(count)
    }

    pub async fn add(&self, item: T) -> Result<T, SyncError> {
        self.ensure_attached()?;
        let placeholder = self.state.lock().await.push_pending(item.clone());

        let mut row = item.to_row();
        row.remove("id");
        let outcome = self.call(self.store.create(T::COLLECTION, row)).await?;
        let authoritative = outcome.and_then(|row| T::from_row(&row));

        let mut state = self.state.lock().await;
        self.ensure_attached()?;
        match authoritative {
            Ok(created) => {
                state.settle(placeholder, created.clone());
                log_debug!("Added {} row {}", T::COLLECTION, created.id());
                Ok(created)
            }
            Err(source) => {
                state.discard(placeholder);
                log_warn!("Rolled back add to {}: {source}", T::COLLECTION);
                Err(SyncError::AddFailed {
                    collection: T::COLLECTION,
                    source,
                })
            }
        }
    }

    /// Merge a snake_case `patch` into the row. A patch that would not
    /// convert back into `T` is rejected before anything is sent.
    pub async fn update(&self, id: i64, patch: Row) -> Result<T, SyncError> {
        self.update_with(id, move |_| Ok(patch)).await
    }

    /// Flip one of `T::TOGGLE_FIELDS`.
    pub async fn toggle(&self, id: i64, field: &str) -> Result<T, SyncError> {
        if !T::TOGGLE_FIELDS.contains(&field) {
            return Err(SyncError::NotToggleable(field.to_owned()));
        }
        let field = field.to_owned();
        self.update_with(id, move |current| {
            let value = current
                .to_row()
                .get(&field)
                .and_then(Value::as_bool)
                .ok_or_else(|| SyncError::NotToggleable(field.clone()))?;
            let mut patch = Row::new();
            patch.insert(field, Value::Bool(!value));
            Ok(patch)
        })
        .await
    }

    /// Build the patch from the current item while the lock is held, so
    /// checks against the current value and the optimistic write are atomic.
    pub(crate) async fn update_with<F>(&self, id: i64, build_patch: F) -> Result<T, SyncError>
    where
        F: FnOnce(&T) -> Result<Row, SyncError> + Send,
    {
        self.ensure_attached()?;
        let (snapshot, patch) = {
            let mut state = self.state.lock().await;
            let snapshot = match state.phase(id) {
                None => return Err(SyncError::NotFound(id)),
                Some(ItemPhase::Pending) => return Err(SyncError::ItemBusy(id)),
                Some(ItemPhase::Stable) => state.get(id).cloned().ok_or(SyncError::NotFound(id))?,
            };

            let patch = build_patch(&snapshot)?;
            let mut merged = snapshot.to_row();
            merge_patch(&mut merged, &patch);
            let optimistic =
                T::from_row(&merged).map_err(|err| SyncError::InvalidPatch(err.to_string()))?;
            state.apply_pending(id, optimistic);
            (snapshot, patch)
        };

        let outcome = self.call(self.store.update(T::COLLECTION, id, patch)).await?;
        let authoritative = outcome.and_then(|row| T::from_row(&row));

        let mut state = self.state.lock().await;
        self.ensure_attached()?;
        match authoritative {
            Ok(updated) => {
                state.settle(id, updated.clone());
                log_debug!("Updated {} row {id}", T::COLLECTION);
                Ok(updated)
            }
            Err(source) => {
                state.settle(id, snapshot);
                log_warn!("Rolled back update of {} row {id}: {source}", T::COLLECTION);
                Err(SyncError::UpdateFailed {
                    collection: T::COLLECTION,
                    id,
                    source,
                })
            }
        }
    }

    /// A row the store no longer has counts as removed.
    pub async fn remove(&self, id: i64) -> Result<T, SyncError> {
        self.ensure_attached()?;
        {
            let mut state = self.state.lock().await;
            match state.phase(id) {
                None => return Err(SyncError::NotFound(id)),
                Some(ItemPhase::Pending) => return Err(SyncError::ItemBusy(id)),
                Some(ItemPhase::Stable) => {
                    state.take_for_removal(id).ok_or(SyncError::NotFound(id))?;
                }
            }
        }

        let outcome = self.call(self.store.delete(T::COLLECTION, id)).await?;

        let mut state = self.state.lock().await;
        self.ensure_attached()?;
        match outcome {
            Ok(_) | Err(StoreError::NotFound { .. }) => {
                log_debug!("Removed {} row {id}", T::COLLECTION);
                state.forget_removed(id).ok_or(SyncError::NotFound(id))
            }
            Err(source) => {
                state.restore_removed(id);
                log_warn!("Rolled back removal of {} row {id}: {source}", T::COLLECTION);
                Err(SyncError::RemoveFailed {
                    collection: T::COLLECTION,
                    id,
                    source,
                })
            }
        }
    }
}
