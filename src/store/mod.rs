//! Persistence collaborator.
//!
//! The hosted backend is modelled as row-oriented CRUD over named
//! collections. Rows are loosely typed JSON objects in the store's snake_case
//! schema; `Record` converts them to and from the typed models so nothing past
//! this module sees raw rows.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
mod schema;
pub mod records;
pub mod sqlite;

pub use memory::MemoryStore;
pub use records::Record;
pub use sqlite::SqliteStore;

pub type Row = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Reservations,
    Prices,
    Promotions,
    Images,
    Services,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Reservations,
        Collection::Prices,
        Collection::Promotions,
        Collection::Images,
        Collection::Services,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Reservations => "reservations",
            Collection::Prices => "prices",
            Collection::Promotions => "promotions",
            Collection::Images => "images",
            Collection::Services => "services",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} row {id} not found")]
    NotFound { collection: Collection, id: i64 },
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("malformed row: {0}")]
    Malformed(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a row; the store assigns the id and returns the stored row.
    async fn create(&self, collection: Collection, row: Row) -> StoreResult<Row>;
    /// Merge `patch` into the row and return the stored result.
    async fn update(&self, collection: Collection, id: i64, patch: Row) -> StoreResult<Row>;
    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<i64>;
    /// All rows of a collection, ordered by id.
    async fn list(&self, collection: Collection) -> StoreResult<Vec<Row>>;
}
