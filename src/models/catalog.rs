//! Back-office catalog models: room prices, promotions, room images and
//! hotel services.

use serde::{Deserialize, Serialize};

use super::Money;

/// Nightly price of a room type, with an optional promotional rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub id: i64,
    pub room_type: String,
    pub price: Money,
    pub is_promotion: bool,
    pub promotion_price: Option<Money>,
    pub active: bool,
}

impl PriceEntry {
    pub fn new(room_type: impl Into<String>, price: Money) -> Self {
        Self {
            id: 0,
            room_type: room_type.into(),
            price,
            is_promotion: false,
            promotion_price: None,
            active: true,
        }
    }

    /// The promotional rate counts only on an active entry flagged as a promotion.
    pub fn promotion_applies(&self) -> bool {
        self.is_promotion && self.active && self.promotion_price.is_some()
    }

    pub fn nightly_rate(&self) -> Money {
        match self.promotion_price {
            Some(promo) if self.promotion_applies() => promo,
            _ => self.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: i64,
    pub title: String,
    pub room_type: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomImage {
    pub id: i64,
    pub room: String,
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub detailed_info: String,
    pub images: Vec<ServiceImage>,
}
