//! Reservation data models.
//!
//! - `DateRange`: validated check-in/check-out pair
//! - `ReservationRequest`: validated public booking submission
//! - `Reservation`, `ReservationStatus`: admin-side persisted reservation

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{nights, BookingError, Quote};

use super::Money;

/// Check-in/check-out pair with `check_out > check_in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDateRange")]
pub struct DateRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = BookingError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.check_in, raw.check_out)
    }
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Result<Self, BookingError> {
        nights(check_in, check_out)?;
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> u32 {
        // Construction already rejected empty and inverted ranges.
        nights(self.check_in, self.check_out).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Pending)
    }

    /// Only an admin decision on a pending reservation moves it, and only once.
    pub fn can_transition_to(&self, target: ReservationStatus) -> bool {
        matches!(
            (self, target),
            (ReservationStatus::Pending, ReservationStatus::Confirmed)
                | (ReservationStatus::Pending, ReservationStatus::Cancelled)
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status '{other}'")),
        }
    }
}

/// A booking form submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub room_type: String,
    pub date_range: DateRange,
    pub adults: u8,
    pub children: u8,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub room_type: String,
    pub date_range: DateRange,
    pub adults: u8,
    pub children: u8,
    pub nights: u32,
    pub total_price: Money,
    pub message: Option<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// New pending reservation for a quoted request; the store assigns the id.
    pub fn pending(request: &ReservationRequest, quote: &Quote, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            room_type: request.room_type.clone(),
            date_range: request.date_range,
            adults: request.adults,
            children: request.children,
            nights: quote.nights,
            total_price: quote.total,
            message: request.message.clone(),
            status: ReservationStatus::Pending,
            created_at,
            updated_at: None,
        }
    }

    pub fn party_size(&self) -> u16 {
        u16::from(self.adults) + u16::from(self.children)
    }
}
