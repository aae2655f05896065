#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use hotel_admin_lib::{
    models::{Money, PriceEntry},
    store::{Collection, MemoryStore, Record, RecordStore, Row, StoreError, StoreResult},
};
use tokio::sync::Semaphore;

/// `MemoryStore` wrapper whose calls can be held open, slowed down or failed.
pub struct ScriptedStore {
    inner: MemoryStore,
    hold: AtomicBool,
    gate: Semaphore,
    entered: Semaphore,
    delay_ms: AtomicU64,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
    fail_list: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            hold: AtomicBool::new(false),
            gate: Semaphore::new(0),
            entered: Semaphore::new(0),
            delay_ms: AtomicU64::new(0),
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    /// Park every subsequent call until `release` is called.
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    /// Wait until a held call has reached the store.
    pub async fn wait_entered(&self) {
        self.entered
            .acquire()
            .await
            .expect("entered semaphore closed")
            .forget();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    async fn before_call(&self, failing: &AtomicBool) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.entered.add_permits(1);
            self.gate
                .acquire()
                .await
                .map_err(|_| StoreError::Unavailable("gate closed".into()))?
                .forget();
        }
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("scripted failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for ScriptedStore {
    async fn create(&self, collection: Collection, row: Row) -> StoreResult<Row> {
        self.before_call(&self.fail_create).await?;
        self.inner.create(collection, row).await
    }

    async fn update(&self, collection: Collection, id: i64, patch: Row) -> StoreResult<Row> {
        self.before_call(&self.fail_update).await?;
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<i64> {
        self.before_call(&self.fail_delete).await?;
        self.inner.delete(collection, id).await
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Row>> {
        self.before_call(&self.fail_list).await?;
        self.inner.list(collection).await
    }
}

pub const ROOM_TYPES: [&str; 7] = [
    "single",
    "double",
    "twin",
    "family",
    "deluxe",
    "suite",
    "presidential",
];

/// Seed one price row per entry of `ROOM_TYPES` straight into the memory
/// store; on a fresh store the ids are 1 through 7.
pub async fn seed_prices(store: &ScriptedStore) -> Vec<PriceEntry> {
    let mut seeded = Vec::new();
    for (index, room_type) in ROOM_TYPES.iter().enumerate() {
        let entry = PriceEntry::new(*room_type, Money::from_minor(100_000 * (index as i64 + 1)));
        let mut row = entry.to_row();
        row.remove("id");
        let created = store
            .memory()
            .create(Collection::Prices, row)
            .await
            .expect("seed price");
        seeded.push(PriceEntry::from_row(&created).expect("seeded row converts"));
    }
    seeded
}

pub fn as_dyn(store: &Arc<ScriptedStore>) -> Arc<dyn RecordStore> {
    store.clone()
}
