//! Back-office tabs. Each tab is a typed facade over one
//! `AdminSynchronizer`; all of them share the injected store and one
//! cancellation token, so closing the panel detaches every tab at once.

mod images;
mod prices;
mod promotions;
mod reservations;
mod services;
pub mod state;
pub mod sync;

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::store::RecordStore;

pub use images::ImagesTab;
pub use prices::PricesTab;
pub use promotions::PromotionsTab;
pub use reservations::{DateView, ReservationFilter, ReservationsTab};
pub use services::{NewService, ServicePatch, ServicesTab};
pub use state::{AdminListState, ItemPhase};
pub use sync::{AdminSynchronizer, SyncError, DEFAULT_MUTATION_TIMEOUT};

#[derive(Clone)]
pub struct AdminPanel {
    pub reservations: ReservationsTab,
    pub prices: PricesTab,
    pub promotions: PromotionsTab,
    pub images: ImagesTab,
    pub services: ServicesTab,
    cancel: CancellationToken,
}

impl AdminPanel {
    pub fn new(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        let cancel = CancellationToken::new();
        Self {
            reservations: ReservationsTab::new(AdminSynchronizer::with_token(
                store.clone(),
                timeout,
                cancel.clone(),
            )),
            prices: PricesTab::new(AdminSynchronizer::with_token(
                store.clone(),
                timeout,
                cancel.clone(),
            )),
            promotions: PromotionsTab::new(AdminSynchronizer::with_token(
                store.clone(),
                timeout,
                cancel.clone(),
            )),
            images: ImagesTab::new(AdminSynchronizer::with_token(
                store.clone(),
                timeout,
                cancel.clone(),
            )),
            services: ServicesTab::new(AdminSynchronizer::with_token(store, timeout, cancel.clone())),
            cancel,
        }
    }

    /// Load every tab; stops at the first failure.
    pub async fn load_all(&self) -> Result<(), SyncError> {
        self.reservations.load().await?;
        self.prices.load().await?;
        self.promotions.load().await?;
        self.images.load().await?;
        self.services.load().await?;
        Ok(())
    }

    pub fn detach(&self) {
        self.cancel.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
