use crate::models::Promotion;

use super::sync::{AdminSynchronizer, SyncError};

#[derive(Clone)]
pub struct PromotionsTab {
    sync: AdminSynchronizer<Promotion>,
}

impl PromotionsTab {
    pub fn new(sync: AdminSynchronizer<Promotion>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &AdminSynchronizer<Promotion> {
        &self.sync
    }

    pub async fn load(&self) -> Result<usize, SyncError> {
        self.sync.load().await
    }

    pub async fn list(&self) -> Vec<Promotion> {
        self.sync.items().await
    }

    pub async fn add(&self, title: &str, room_type: &str) -> Result<Promotion, SyncError> {
        let (title, room_type) = (title.trim(), room_type.trim());
        if title.is_empty() || room_type.is_empty() {
            return Err(SyncError::Rejected(
                "promotion title and room type are required".into(),
            ));
        }

        self.sync
            .add(Promotion {
                id: 0,
                title: title.to_owned(),
                room_type: room_type.to_owned(),
                active: true,
            })
            .await
    }

    pub async fn toggle_active(&self, id: i64) -> Result<Promotion, SyncError> {
        self.sync.toggle(id, "active").await
    }

    pub async fn remove(&self, id: i64) -> Result<Promotion, SyncError> {
        self.sync.remove(id).await
    }
}
