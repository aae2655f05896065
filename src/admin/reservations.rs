use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    models::{Reservation, ReservationStatus},
    store::Row,
};

use super::sync::{AdminSynchronizer, SyncError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateView {
    #[default]
    All,
    /// Check-in is today.
    Today,
    /// Check-in is after today.
    Upcoming,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilter {
    /// Matches name or email ignoring case, or a phone substring.
    pub search: String,
    /// `None` shows every status.
    pub status: Option<ReservationStatus>,
    pub view: DateView,
}

impl ReservationFilter {
    pub fn matches(&self, reservation: &Reservation, today: NaiveDate) -> bool {
        let term = self.search.trim();
        let needle = term.to_lowercase();
        let matches_search = term.is_empty()
            || reservation.name.to_lowercase().contains(&needle)
            || reservation.email.to_lowercase().contains(&needle)
            || reservation.phone.contains(term);

        let matches_status = self
            .status
            .map_or(true, |status| reservation.status == status);

        let check_in = reservation.date_range.check_in();
        let matches_view = match self.view {
            DateView::All => true,
            DateView::Today => check_in == today,
            DateView::Upcoming => check_in > today,
        };

        matches_search && matches_status && matches_view
    }
}

#[derive(Clone)]
pub struct ReservationsTab {
    sync: AdminSynchronizer<Reservation>,
}

impl ReservationsTab {
    pub fn new(sync: AdminSynchronizer<Reservation>) -> Self {
        Self { sync }
    }

    pub fn synchronizer(&self) -> &AdminSynchronizer<Reservation> {
        &self.sync
    }

    pub async fn load(&self) -> Result<usize, SyncError> {
        self.sync.load().await
    }

    pub async fn list(&self) -> Vec<Reservation> {
        self.sync.items().await
    }

    pub async fn filter(&self, filter: &ReservationFilter, today: NaiveDate) -> Vec<Reservation> {
        self.sync
            .items()
            .await
            .into_iter()
            .filter(|reservation| filter.matches(reservation, today))
            .collect()
    }

    pub async fn confirm(&self, id: i64) -> Result<Reservation, SyncError> {
        self.transition(id, ReservationStatus::Confirmed).await
    }

    pub async fn cancel(&self, id: i64) -> Result<Reservation, SyncError> {
        self.transition(id, ReservationStatus::Cancelled).await
    }

    async fn transition(&self, id: i64, to: ReservationStatus) -> Result<Reservation, SyncError> {
        self.sync
            .update_with(id, move |current| {
                if !current.status.can_transition_to(to) {
                    return Err(SyncError::InvalidTransition {
                        from: current.status,
                        to,
                    });
                }
                let mut patch = Row::new();
                patch.insert("status".into(), Value::from(to.as_str()));
                patch.insert("updated_at".into(), Value::from(Utc::now().to_rfc3339()));
                Ok(patch)
            })
            .await
    }

    pub async fn remove(&self, id: i64) -> Result<Reservation, SyncError> {
        self.sync.remove(id).await
    }
}
