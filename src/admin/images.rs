use crate::models::RoomImage;

use super::sync::{AdminSynchronizer, SyncError};

#[derive(Clone)]
pub struct ImagesTab {
    sync: AdminSynchronizer<RoomImage>,
}

impl ImagesTab {
    pub fn new(sync: AdminSynchronizer<RoomImage>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &AdminSynchronizer<RoomImage> {
        &self.sync
    }

    pub async fn load(&self) -> Result<usize, SyncError> {
        self.sync.load().await
    }

    pub async fn list(&self) -> Vec<RoomImage> {
        self.sync.items().await
    }

    pub async fn for_room(&self, room: &str) -> Vec<RoomImage> {
        let room = room.trim();
        self.sync
            .items()
            .await
            .into_iter()
            .filter(|image| image.room.eq_ignore_ascii_case(room))
            .collect()
    }

    pub async fn add(&self, room: &str, url: &str, alt: &str) -> Result<RoomImage, SyncError> {
        let (room, url, alt) = (room.trim(), url.trim(), alt.trim());
        if room.is_empty() || url.is_empty() || alt.is_empty() {
            return Err(SyncError::Rejected(
                "room, url and alt text are required".into(),
            ));
        }

        self.sync
            .add(RoomImage {
                id: 0,
                room: room.to_owned(),
                url: url.to_owned(),
                alt: alt.to_owned(),
            })
            .await
    }

    pub async fn remove(&self, id: i64) -> Result<RoomImage, SyncError> {
        self.sync.remove(id).await
    }
}
