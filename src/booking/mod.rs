//! Public booking path: night counting, quoting, request validation and the
//! hand-off to the notification collaborator.

pub mod nights;
pub mod notifier;
pub mod quote;
pub mod validation;

use chrono::NaiveDate;
use log::warn;
use serde::Serialize;
use thiserror::Error;

use crate::{models::ReservationRequest, store::StoreError};

pub use nights::nights;
pub use notifier::{LogNotifier, ReservationNotifier};
pub use quote::{Catalog, PriceQuoter, Quote};
pub use validation::{
    validate_reservation, validate_reservation_now, Field, ReservationForm, ValidationErrors,
};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("check-out must be after check-in")]
    InvalidDateRange,
    #[error("unknown room type '{0}'")]
    UnknownRoomType(String),
    #[error("room type '{0}' is not available for booking")]
    RoomUnavailable(String),
    #[error("invalid reservation request: {0}")]
    Validation(ValidationErrors),
    #[error("reservation total is out of range")]
    AmountOverflow,
    #[error("reservation notification failed: {0}")]
    NotificationFailed(String),
    #[error("could not record reservation: {0}")]
    Persistence(#[from] StoreError),
}

impl From<ValidationErrors> for BookingError {
    fn from(errors: ValidationErrors) -> Self {
        BookingError::Validation(errors)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub request: ReservationRequest,
    pub quote: Quote,
}

/// Validate, quote, then notify. The notifier is called once; nothing retries it.
pub async fn submit_reservation(
    form: &ReservationForm,
    today: NaiveDate,
    quoter: &PriceQuoter,
    notifier: &dyn ReservationNotifier,
) -> Result<Submission, BookingError> {
    let request = validate_reservation(form, today)?;
    let quote = quoter.quote_range(&request.room_type, &request.date_range)?;

    match notifier.send_reservation_request(&request, &quote).await {
        Ok(true) => Ok(Submission { request, quote }),
        Ok(false) => {
            warn!("Notifier declined reservation request from {}", request.email);
            Err(BookingError::NotificationFailed("notifier declined the request".into()))
        }
        Err(err) => {
            warn!("Failed to send reservation request from {}: {err:#}", request.email);
            Err(BookingError::NotificationFailed(err.to_string()))
        }
    }
}
