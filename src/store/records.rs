//! Row <-> model conversion at the store boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::models::{
    DateRange, Money, PriceEntry, Promotion, Reservation, ReservationStatus, RoomImage,
    ServiceEntry, ServiceImage,
};

use super::{Collection, Row, StoreError, StoreResult};

/// A typed entity stored as one row of a collection.
pub trait Record: Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    /// Boolean columns that may be flipped with a toggle.
    const TOGGLE_FIELDS: &'static [&'static str] = &[];

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    /// Every column, with `null` for absent optionals.
    fn to_row(&self) -> Row;
    fn from_row(row: &Row) -> StoreResult<Self>;
}

fn malformed(field: &str, detail: impl std::fmt::Display) -> StoreError {
    StoreError::Malformed(format!("{field}: {detail}"))
}

fn value<'a>(row: &'a Row, field: &str) -> StoreResult<&'a Value> {
    match row.get(field) {
        Some(Value::Null) | None => Err(malformed(field, "missing")),
        Some(value) => Ok(value),
    }
}

fn optional<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    row.get(field).filter(|v| !v.is_null())
}

pub fn get_i64(row: &Row, field: &str) -> StoreResult<i64> {
    value(row, field)?
        .as_i64()
        .ok_or_else(|| malformed(field, "expected an integer"))
}

pub fn get_count<T: TryFrom<i64>>(row: &Row, field: &str) -> StoreResult<T> {
    let raw = get_i64(row, field)?;
    T::try_from(raw).map_err(|_| malformed(field, format!("{raw} is out of range")))
}

pub fn get_str(row: &Row, field: &str) -> StoreResult<String> {
    value(row, field)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| malformed(field, "expected a string"))
}

pub fn get_opt_str(row: &Row, field: &str) -> StoreResult<Option<String>> {
    optional(row, field)
        .map(|v| {
            v.as_str()
                .map(str::to_owned)
                .ok_or_else(|| malformed(field, "expected a string"))
        })
        .transpose()
}

pub fn get_bool(row: &Row, field: &str) -> StoreResult<bool> {
    value(row, field)?
        .as_bool()
        .ok_or_else(|| malformed(field, "expected a boolean"))
}

fn money_from(field: &str, value: &Value) -> StoreResult<Money> {
    match value {
        Value::Number(number) => Money::from_json_number(number).map_err(|err| malformed(field, err)),
        Value::String(text) => Money::parse(text).map_err(|err| malformed(field, err)),
        _ => Err(malformed(field, "expected an amount")),
    }
}

pub fn get_money(row: &Row, field: &str) -> StoreResult<Money> {
    money_from(field, value(row, field)?)
}

pub fn get_opt_money(row: &Row, field: &str) -> StoreResult<Option<Money>> {
    optional(row, field).map(|v| money_from(field, v)).transpose()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn get_date(row: &Row, field: &str) -> StoreResult<NaiveDate> {
    let raw = get_str(row, field)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(&raw).map(|dt| dt.date_naive()))
        .map_err(|err| malformed(field, format!("invalid date '{raw}': {err}")))
}

pub fn parse_datetime(value: &str, field: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| malformed(field, format!("invalid datetime '{value}': {err}")))
}

pub fn get_datetime(row: &Row, field: &str) -> StoreResult<DateTime<Utc>> {
    parse_datetime(&get_str(row, field)?, field)
}

pub fn get_opt_datetime(row: &Row, field: &str) -> StoreResult<Option<DateTime<Utc>>> {
    match get_opt_str(row, field)? {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

fn opt<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

impl Record for Reservation {
    const COLLECTION: Collection = Collection::Reservations;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.into());
        row.insert("name".into(), self.name.clone().into());
        row.insert("email".into(), self.email.clone().into());
        row.insert("phone".into(), self.phone.clone().into());
        row.insert("room_type".into(), self.room_type.clone().into());
        row.insert("check_in".into(), self.date_range.check_in().to_string().into());
        row.insert("check_out".into(), self.date_range.check_out().to_string().into());
        row.insert("adults".into(), self.adults.into());
        row.insert("children".into(), self.children.into());
        row.insert("nights".into(), self.nights.into());
        row.insert("total_price".into(), self.total_price.to_json());
        row.insert("message".into(), opt(self.message.clone()));
        row.insert("status".into(), self.status.as_str().into());
        row.insert("created_at".into(), self.created_at.to_rfc3339().into());
        row.insert("updated_at".into(), opt(self.updated_at.map(|dt| dt.to_rfc3339())));
        row
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        let date_range = DateRange::new(get_date(row, "check_in")?, get_date(row, "check_out")?)
            .map_err(|err| malformed("check_out", err))?;
        let status = get_str(row, "status")?
            .parse::<ReservationStatus>()
            .map_err(|err| malformed("status", err))?;

        Ok(Reservation {
            id: get_i64(row, "id")?,
            name: get_str(row, "name")?,
            email: get_str(row, "email")?,
            phone: get_str(row, "phone")?,
            room_type: get_str(row, "room_type")?,
            date_range,
            adults: get_count(row, "adults")?,
            children: get_count(row, "children")?,
            nights: get_count(row, "nights")?,
            total_price: get_money(row, "total_price")?,
            message: get_opt_str(row, "message")?,
            status,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_opt_datetime(row, "updated_at")?,
        })
    }
}

impl Record for PriceEntry {
    const COLLECTION: Collection = Collection::Prices;
    const TOGGLE_FIELDS: &'static [&'static str] = &["active", "is_promotion"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.into());
        row.insert("room_type".into(), self.room_type.clone().into());
        row.insert("price".into(), self.price.to_json());
        row.insert("is_promotion".into(), self.is_promotion.into());
        row.insert(
            "promotion_price".into(),
            self.promotion_price.map(Money::to_json).unwrap_or(Value::Null),
        );
        row.insert("active".into(), self.active.into());
        row
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(PriceEntry {
            id: get_i64(row, "id")?,
            room_type: get_str(row, "room_type")?,
            price: get_money(row, "price")?,
            is_promotion: get_bool(row, "is_promotion")?,
            promotion_price: get_opt_money(row, "promotion_price")?,
            active: get_bool(row, "active")?,
        })
    }
}

impl Record for Promotion {
    const COLLECTION: Collection = Collection::Promotions;
    const TOGGLE_FIELDS: &'static [&'static str] = &["active"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.into());
        row.insert("title".into(), self.title.clone().into());
        row.insert("room_type".into(), self.room_type.clone().into());
        row.insert("active".into(), self.active.into());
        row
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(Promotion {
            id: get_i64(row, "id")?,
            title: get_str(row, "title")?,
            room_type: get_str(row, "room_type")?,
            active: get_bool(row, "active")?,
        })
    }
}

impl Record for RoomImage {
    const COLLECTION: Collection = Collection::Images;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.into());
        row.insert("room".into(), self.room.clone().into());
        row.insert("url".into(), self.url.clone().into());
        row.insert("alt".into(), self.alt.clone().into());
        row
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        Ok(RoomImage {
            id: get_i64(row, "id")?,
            room: get_str(row, "room")?,
            url: get_str(row, "url")?,
            alt: get_str(row, "alt")?,
        })
    }
}

impl Record for ServiceEntry {
    const COLLECTION: Collection = Collection::Services;

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".into(), self.id.into());
        row.insert("title".into(), self.title.clone().into());
        row.insert("description".into(), self.description.clone().into());
        row.insert("detailed_info".into(), self.detailed_info.clone().into());
        row.insert(
            "images".into(),
            serde_json::to_value(&self.images).unwrap_or(Value::Array(Vec::new())),
        );
        row
    }

    fn from_row(row: &Row) -> StoreResult<Self> {
        let images: Vec<ServiceImage> = match optional(row, "images") {
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|err| malformed("images", err))?,
            None => Vec::new(),
        };

        Ok(ServiceEntry {
            id: get_i64(row, "id")?,
            title: get_str(row, "title")?,
            description: get_str(row, "description")?,
            detailed_info: get_opt_str(row, "detailed_info")?.unwrap_or_default(),
            images,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn as_row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn reservation_survives_the_boundary() {
        let reservation = Reservation {
            id: 7,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "841234567".into(),
            room_type: "suite".into(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
            )
            .unwrap(),
            adults: 2,
            children: 0,
            nights: 3,
            total_price: Money::from_minor(1_500_000),
            message: None,
            status: ReservationStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            updated_at: None,
        };

        let row = reservation.to_row();
        assert_eq!(row["total_price"], json!(15000));
        assert_eq!(row["check_in"], json!("2024-06-01"));
        assert_eq!(Reservation::from_row(&row).unwrap(), reservation);
    }

    #[test]
    fn loosely_typed_price_rows_are_converted() {
        let row = as_row(json!({
            "id": 3,
            "room_type": "suite",
            "price": 5000.5,
            "is_promotion": true,
            "promotion_price": "4.200,00",
            "active": true,
            "created_at": "2024-01-01T00:00:00Z"
        }));
        let entry = PriceEntry::from_row(&row).unwrap();
        assert_eq!(entry.price, Money::from_minor(500_050));
        assert_eq!(entry.promotion_price, Some(Money::from_minor(420_000)));
    }

    #[test]
    fn missing_or_mistyped_columns_are_malformed() {
        let row = as_row(json!({ "id": 1, "title": "Summer", "room_type": "suite" }));
        assert!(matches!(Promotion::from_row(&row), Err(StoreError::Malformed(msg)) if msg.starts_with("active")));

        let row = as_row(json!({ "id": "one", "room": "suite", "url": "u", "alt": "a" }));
        assert!(matches!(RoomImage::from_row(&row), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn reservation_dates_accept_timestamps() {
        let row = as_row(json!({ "check_in": "2024-06-01T14:00:00+02:00" }));
        assert_eq!(
            get_date(&row, "check_in").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
    }

    #[test]
    fn service_images_default_to_empty() {
        let row = as_row(json!({
            "id": 4, "title": "Spa", "description": "Massages", "detailed_info": null
        }));
        let service = ServiceEntry::from_row(&row).unwrap();
        assert!(service.images.is_empty());
        assert_eq!(service.detailed_info, "");
    }
}
