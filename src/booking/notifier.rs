use anyhow::Result;
use async_trait::async_trait;
use log::info;
use uuid::Uuid;

use crate::models::ReservationRequest;

use super::Quote;

/// Hands a validated, quoted request to whoever confirms bookings.
#[async_trait]
pub trait ReservationNotifier: Send + Sync {
    async fn send_reservation_request(&self, request: &ReservationRequest, quote: &Quote)
        -> Result<bool>;
}

/// Writes the request to the log instead of sending mail.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    recipient: String,
}

impl LogNotifier {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }
}

#[async_trait]
impl ReservationNotifier for LogNotifier {
    async fn send_reservation_request(
        &self,
        request: &ReservationRequest,
        quote: &Quote,
    ) -> Result<bool> {
        let correlation_id = Uuid::new_v4();
        info!(
            "[{correlation_id}] reservation request for {} -> {}: {} {}..{} ({} nights, {} adults, {} children) total {}",
            request.name,
            self.recipient,
            quote.room_type,
            request.date_range.check_in(),
            request.date_range.check_out(),
            quote.nights,
            request.adults,
            request.children,
            quote.total,
        );
        Ok(true)
    }
}
