//! Room price table. Its rows feed the public quoter through `catalog()`.

use serde_json::Value;

use crate::{
    booking::Catalog,
    models::{Money, PriceEntry},
    store::Row,
};

use super::sync::{AdminSynchronizer, SyncError};

#[derive(Clone)]
pub struct PricesTab {
    sync: AdminSynchronizer<PriceEntry>,
}

impl PricesTab {
    pub fn new(sync: AdminSynchronizer<PriceEntry>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &AdminSynchronizer<PriceEntry> {
        &self.sync
    }

    pub async fn load(&self) -> Result<usize, SyncError> {
        self.sync.load().await
    }

    pub async fn list(&self) -> Vec<PriceEntry> {
        self.sync.items().await
    }

    /// Built from confirmed rows only, so a pending edit never reaches a quote.
    pub async fn catalog(&self) -> Catalog {
        Catalog::from_entries(self.sync.committed_items().await)
    }

    /// New room types start active and without a promotion. `price_input`
    /// takes admin formats such as `8.500,00MZN`.
    pub async fn add_room_type(
        &self,
        room_type: &str,
        price_input: &str,
    ) -> Result<PriceEntry, SyncError> {
        let room_type = room_type.trim();
        if room_type.is_empty() {
            return Err(SyncError::Rejected("room type is required".into()));
        }

        let price = Money::parse(price_input)
            .map_err(|err| SyncError::Rejected(format!("invalid price '{price_input}': {err}")))?;

        let key = room_type.to_lowercase();
        let duplicate = self
            .sync
            .items()
            .await
            .iter()
            .any(|entry| entry.room_type.trim().to_lowercase() == key);
        if duplicate {
            return Err(SyncError::Rejected(format!(
                "room type '{room_type}' already exists"
            )));
        }

        self.sync.add(PriceEntry::new(room_type, price)).await
    }

    pub async fn update_price(&self, id: i64, price: Money) -> Result<PriceEntry, SyncError> {
        let mut patch = Row::new();
        patch.insert("price".into(), price.to_json());
        self.sync.update(id, patch).await
    }

    /// `Some` sets the promotional rate and flags the entry; `None` clears both.
    pub async fn set_promotion(
        &self,
        id: i64,
        promotion_price: Option<Money>,
    ) -> Result<PriceEntry, SyncError> {
        let mut patch = Row::new();
        patch.insert("is_promotion".into(), Value::Bool(promotion_price.is_some()));
        patch.insert(
            "promotion_price".into(),
            promotion_price.map(Money::to_json).unwrap_or(Value::Null),
        );
        self.sync.update(id, patch).await
    }

    pub async fn toggle_active(&self, id: i64) -> Result<PriceEntry, SyncError> {
        self.sync.toggle(id, "active").await
    }

    pub async fn toggle_promotion(&self, id: i64) -> Result<PriceEntry, SyncError> {
        self.sync.toggle(id, "is_promotion").await
    }

    pub async fn remove(&self, id: i64) -> Result<PriceEntry, SyncError> {
        self.sync.remove(id).await
    }
}
