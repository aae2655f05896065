use serde::{Deserialize, Serialize};

use crate::{
    models::{ServiceEntry, ServiceImage},
    store::Row,
};

use super::sync::{AdminSynchronizer, SyncError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub detailed_info: String,
    pub images: Vec<ServiceImage>,
}

/// Fields left `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ServiceImage>>,
}

impl ServicePatch {
    fn into_row(self) -> Result<Row, SyncError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(row)) => Ok(row),
            Ok(other) => Err(SyncError::InvalidPatch(format!("expected an object, got {other}"))),
            Err(err) => Err(SyncError::InvalidPatch(err.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct ServicesTab {
    sync: AdminSynchronizer<ServiceEntry>,
}

impl ServicesTab {
    pub fn new(sync: AdminSynchronizer<ServiceEntry>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &AdminSynchronizer<ServiceEntry> {
        &self.sync
    }

    pub async fn load(&self) -> Result<usize, SyncError> {
        self.sync.load().await
    }

    pub async fn list(&self) -> Vec<ServiceEntry> {
        let mut services = self.sync.items().await;
        services.sort_by_key(|service| service.id);
        services
    }

    pub async fn add(&self, service: NewService) -> Result<ServiceEntry, SyncError> {
        if service.title.trim().is_empty() || service.description.trim().is_empty() {
            return Err(SyncError::Rejected(
                "service title and description are required".into(),
            ));
        }

        self.sync
            .add(ServiceEntry {
                id: 0,
                title: service.title.trim().to_owned(),
                description: service.description.trim().to_owned(),
                detailed_info: service.detailed_info,
                images: service.images,
            })
            .await
    }

    pub async fn update(&self, id: i64, patch: ServicePatch) -> Result<ServiceEntry, SyncError> {
        if patch.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(SyncError::Rejected("service title cannot be blank".into()));
        }
        self.sync.update(id, patch.into_row()?).await
    }

    pub async fn remove(&self, id: i64) -> Result<ServiceEntry, SyncError> {
        self.sync.remove(id).await
    }
}
