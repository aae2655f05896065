use std::collections::HashMap;

use serde::Serialize;

use crate::models::{DateRange, Money, PriceEntry};

use super::BookingError;

/// Room types and their current pricing, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, PriceEntry>,
}

fn catalog_key(room_type: &str) -> String {
    room_type.trim().to_lowercase()
}

impl Catalog {
    /// Build from admin price rows. When a room type appears twice the active
    /// row wins.
    pub fn from_entries(entries: impl IntoIterator<Item = PriceEntry>) -> Self {
        let mut map: HashMap<String, PriceEntry> = HashMap::new();
        for entry in entries {
            let key = catalog_key(&entry.room_type);
            let replace = match map.get(&key) {
                Some(existing) => !existing.active && entry.active,
                None => true,
            };
            if replace {
                map.insert(key, entry);
            }
        }
        Self { entries: map }
    }

    /// Rates the booking form shipped with before the price table existed.
    pub fn default_entries() -> Vec<PriceEntry> {
        vec![
            PriceEntry::new("suite", Money::from_minor(500_000)),
            PriceEntry::new("presidential", Money::from_minor(800_000)),
        ]
    }

    pub fn with_defaults() -> Self {
        Self::from_entries(Self::default_entries())
    }

    pub fn get(&self, room_type: &str) -> Option<&PriceEntry> {
        self.entries.get(&catalog_key(room_type))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn room_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.entries.values().map(|e| e.room_type.clone()).collect();
        types.sort();
        types
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub room_type: String,
    pub nights: u32,
    pub nightly_rate: Money,
    pub total: Money,
    pub promotional: bool,
}

#[derive(Debug, Clone)]
pub struct PriceQuoter {
    catalog: Catalog,
}

impl PriceQuoter {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn quote(&self, room_type: &str, nights: u32) -> Result<Quote, BookingError> {
        if nights == 0 {
            return Err(BookingError::InvalidDateRange);
        }
        let entry = self
            .catalog
            .get(room_type)
            .ok_or_else(|| BookingError::UnknownRoomType(room_type.to_string()))?;
        if !entry.active {
            return Err(BookingError::RoomUnavailable(entry.room_type.clone()));
        }

        let nightly_rate = entry.nightly_rate();
        let total = nightly_rate
            .checked_mul(nights)
            .ok_or(BookingError::AmountOverflow)?;

        Ok(Quote {
            room_type: entry.room_type.clone(),
            nights,
            nightly_rate,
            total,
            promotional: entry.promotion_applies(),
        })
    }

    pub fn quote_range(&self, room_type: &str, range: &DateRange) -> Result<Quote, BookingError> {
        self.quote(room_type, range.nights())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn promo_entry(active: bool, is_promotion: bool) -> PriceEntry {
        PriceEntry {
            id: 1,
            room_type: "suite".into(),
            price: Money::from_minor(500_000),
            is_promotion,
            promotion_price: Some(Money::from_minor(420_000)),
            active,
        }
    }

    #[test]
    fn suite_for_three_nights() {
        let quoter = PriceQuoter::new(Catalog::with_defaults());
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
        )
        .unwrap();

        let quote = quoter.quote_range("suite", &range).unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.total, Money::from_minor(1_500_000));
        assert!(!quote.promotional);
    }

    #[test]
    fn base_rate_times_nights_is_exact_and_stable() {
        let quoter = PriceQuoter::new(Catalog::from_entries([PriceEntry::new(
            "garden",
            Money::from_minor(333_333),
        )]));
        for nights in 1..=30 {
            let first = quoter.quote("garden", nights).unwrap();
            let again = quoter.quote("garden", nights).unwrap();
            assert_eq!(first.total.minor(), 333_333 * i64::from(nights));
            assert_eq!(first, again);
        }
    }

    #[test]
    fn active_promotion_uses_promotional_rate() {
        let quoter = PriceQuoter::new(Catalog::from_entries([promo_entry(true, true)]));
        let quote = quoter.quote("Suite", 2).unwrap();
        assert!(quote.promotional);
        assert_eq!(quote.nightly_rate, Money::from_minor(420_000));
        assert_eq!(quote.total, Money::from_minor(840_000));
    }

    #[test]
    fn unflagged_promotion_falls_back_to_base_rate() {
        let quoter = PriceQuoter::new(Catalog::from_entries([promo_entry(true, false)]));
        let quote = quoter.quote("suite", 2).unwrap();
        assert!(!quote.promotional);
        assert_eq!(quote.total, Money::from_minor(1_000_000));
    }

    #[test]
    fn inactive_room_type_is_not_bookable() {
        let quoter = PriceQuoter::new(Catalog::from_entries([promo_entry(false, true)]));
        assert!(matches!(
            quoter.quote("suite", 2),
            Err(BookingError::RoomUnavailable(room)) if room == "suite"
        ));
    }

    #[test]
    fn unknown_room_type_and_zero_nights_fail() {
        let quoter = PriceQuoter::new(Catalog::with_defaults());
        assert!(matches!(
            quoter.quote("penthouse", 1),
            Err(BookingError::UnknownRoomType(room)) if room == "penthouse"
        ));
        assert!(matches!(quoter.quote("suite", 0), Err(BookingError::InvalidDateRange)));
    }

    #[test]
    fn overflow_is_reported() {
        let quoter = PriceQuoter::new(Catalog::from_entries([PriceEntry::new(
            "vault",
            Money::from_minor(i64::MAX / 2),
        )]));
        assert!(matches!(quoter.quote("vault", 3), Err(BookingError::AmountOverflow)));
    }

    #[test]
    fn default_catalog_is_empty_and_defaults_are_explicit() {
        assert!(Catalog::default().is_empty());
        assert_eq!(Catalog::with_defaults().room_types(), vec!["presidential", "suite"]);
    }

    #[test]
    fn active_row_wins_duplicate_room_types() {
        let mut stale = PriceEntry::new("Suite", Money::from_minor(1));
        stale.active = false;
        let catalog = Catalog::from_entries([stale, PriceEntry::new("suite", Money::from_minor(2))]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("SUITE").unwrap().price, Money::from_minor(2));
    }
}
