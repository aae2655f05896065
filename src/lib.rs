pub mod admin;
pub mod booking;
pub mod models;
pub mod settings;
pub mod store;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use log::{info, warn};

use admin::AdminPanel;
use booking::{
    BookingError, LogNotifier, PriceQuoter, ReservationForm, ReservationNotifier, Submission,
};
use models::{Money, Reservation};
use settings::{AppConfig, SettingsStore};
use store::{MemoryStore, Record, RecordStore, SqliteStore};

const ENABLE_LOGS: bool = true;

pub struct AppState {
    config: AppConfig,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn ReservationNotifier>,
    pub admin: AdminPanel,
}

impl AppState {
    /// Open the configured store and load every admin tab.
    pub async fn bootstrap(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn RecordStore> = match &config.database_path {
            Some(path) => Arc::new(SqliteStore::open(path.clone())?),
            None => {
                warn!("No database path configured; data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };
        let notifier = Arc::new(LogNotifier::new(config.notification_recipient.clone()));
        Self::with_collaborators(config, store, notifier).await
    }

    pub async fn with_collaborators(
        config: AppConfig,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn ReservationNotifier>,
    ) -> Result<Self> {
        let admin = AdminPanel::new(store.clone(), config.mutation_timeout());
        admin
            .load_all()
            .await
            .context("failed to load admin collections")?;

        if config.seed_default_catalog && admin.prices.list().await.is_empty() {
            for entry in booking::Catalog::default_entries() {
                crate::log_info!("Seeding default price for {}", entry.room_type);
                admin
                    .prices
                    .synchronizer()
                    .add(entry)
                    .await
                    .context("failed to seed default catalog")?;
            }
        }

        Ok(Self {
            config,
            store,
            notifier,
            admin,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    pub fn format_money(&self, amount: Money) -> String {
        amount.format_with(&self.config.currency_suffix)
    }

    /// Quoter over the admin price table as currently loaded.
    pub async fn quoter(&self) -> PriceQuoter {
        PriceQuoter::new(self.admin.prices.catalog().await)
    }

    /// Public booking path: validate, quote, notify, then record the request
    /// as a pending reservation.
    pub async fn submit_reservation(
        &self,
        form: &ReservationForm,
        today: NaiveDate,
    ) -> Result<Reservation, BookingError> {
        let quoter = self.quoter().await;
        let Submission { request, quote } =
            booking::submit_reservation(form, today, &quoter, self.notifier.as_ref()).await?;

        let mut row = Reservation::pending(&request, &quote, Utc::now()).to_row();
        row.remove("id");
        let stored = self.store.create(Reservation::COLLECTION, row).await?;
        let reservation = Reservation::from_row(&stored)?;
        info!(
            "Recorded reservation {} for {} ({})",
            reservation.id,
            reservation.name,
            self.format_money(reservation.total_price)
        );
        Ok(reservation)
    }

    pub fn shutdown(&self) {
        self.admin.detach();
    }
}

pub async fn run() -> Result<()> {
    let settings = SettingsStore::new(settings::config_path())?;
    let mut config = settings.config();
    config.apply_env_overrides();

    // Initialize logging (reads RUST_LOG env var)
    let _ = env_logger::Builder::from_default_env()
        .filter_level(if config.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .try_init();

    info!(
        "Hotel admin starting up (settings from {})...",
        settings.path().display()
    );

    let state = AppState::bootstrap(config).await?;
    let catalog = state.admin.prices.catalog().await;
    for room_type in catalog.room_types() {
        if let Some(entry) = catalog.get(&room_type) {
            info!(
                "{room_type}: {} per night{}",
                state.format_money(entry.nightly_rate()),
                if entry.promotion_applies() { " (promotion)" } else { "" }
            );
        }
    }
    info!(
        "Loaded {} reservations, {} promotions, {} images, {} services",
        state.admin.reservations.list().await.len(),
        state.admin.promotions.list().await.len(),
        state.admin.images.list().await.len(),
        state.admin.services.list().await.len(),
    );

    state.shutdown();
    Ok(())
}
