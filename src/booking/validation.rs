//! Reservation request validation.
//!
//! Shape rules are declared on `ReservationForm` with `garde`; the date rules
//! need today's date and are checked alongside. Every rule runs on every call
//! so the form can show all problems at once.

use std::{collections::BTreeMap, fmt};

use chrono::{Local, NaiveDate};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::{DateRange, ReservationRequest};

pub const MIN_NAME_CHARS: usize = 3;
pub const MIN_PHONE_DIGITS: usize = 9;

/// Raw values as submitted by the booking form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    #[garde(custom(name_long_enough))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(custom(enough_phone_digits))]
    pub phone: String,
    #[garde(custom(not_blank))]
    pub room_type: String,
    #[garde(skip)]
    pub check_in: Option<NaiveDate>,
    #[garde(skip)]
    pub check_out: Option<NaiveDate>,
    #[garde(range(min = 1, max = 6))]
    pub adults: i64,
    #[garde(range(min = 0, max = 4))]
    pub children: i64,
    #[garde(skip)]
    pub message: Option<String>,
}

fn name_long_enough(value: &String, _: &()) -> garde::Result {
    if value.trim().chars().count() < MIN_NAME_CHARS {
        return Err(garde::Error::new(format!(
            "name must have at least {MIN_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn enough_phone_digits(value: &String, _: &()) -> garde::Result {
    if value.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        return Err(garde::Error::new(format!(
            "phone must have at least {MIN_PHONE_DIGITS} digits"
        )));
    }
    Ok(())
}

fn not_blank(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        return Err(garde::Error::new("room type is required"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Name,
    Email,
    Phone,
    RoomType,
    CheckIn,
    CheckOut,
    Adults,
    Children,
    Message,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::RoomType => "roomType",
            Field::CheckIn => "checkIn",
            Field::CheckOut => "checkOut",
            Field::Adults => "adults",
            Field::Children => "children",
            Field::Message => "message",
        }
    }

    fn from_path(path: &str) -> Option<Field> {
        match path {
            "name" => Some(Field::Name),
            "email" => Some(Field::Email),
            "phone" => Some(Field::Phone),
            "room_type" => Some(Field::RoomType),
            "check_in" => Some(Field::CheckIn),
            "check_out" => Some(Field::CheckOut),
            "adults" => Some(Field::Adults),
            "children" => Some(Field::Children),
            "message" => Some(Field::Message),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-indexed set of validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<Field, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn messages(&self, field: Field) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_reservation(
    form: &ReservationForm,
    today: NaiveDate,
) -> Result<ReservationRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if let Err(report) = form.validate() {
        for (path, error) in report.iter() {
            let field = Field::from_path(&path.to_string()).unwrap_or(Field::Message);
            errors.add(field, error.message());
        }
    }

    match form.check_in {
        None => errors.add(Field::CheckIn, "check-in date is required"),
        Some(check_in) if check_in < today => {
            errors.add(Field::CheckIn, "check-in date cannot be in the past")
        }
        Some(_) => {}
    }
    match (form.check_in, form.check_out) {
        (_, None) => errors.add(Field::CheckOut, "check-out date is required"),
        (Some(check_in), Some(check_out)) if check_out <= check_in => {
            errors.add(Field::CheckOut, "check-out date must be after check-in")
        }
        _ => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let (Some(check_in), Some(check_out)) = (form.check_in, form.check_out) else {
        errors.add(Field::CheckIn, "check-in date is required");
        return Err(errors);
    };
    let date_range = DateRange::new(check_in, check_out).map_err(|err| {
        let mut errors = ValidationErrors::default();
        errors.add(Field::CheckOut, err.to_string());
        errors
    })?;

    let message = form
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_owned);

    Ok(ReservationRequest {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        room_type: form.room_type.trim().to_string(),
        date_range,
        // Range rules above bound both counts to small non-negative values.
        adults: u8::try_from(form.adults).unwrap_or(u8::MAX),
        children: u8::try_from(form.children).unwrap_or(u8::MAX),
        message,
    })
}

pub fn validate_reservation_now(form: &ReservationForm) -> Result<ReservationRequest, ValidationErrors> {
    validate_reservation(form, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        date(2024, 5, 20)
    }

    fn valid_form() -> ReservationForm {
        ReservationForm {
            name: "Ana Machava".into(),
            email: "ana@example.com".into(),
            phone: "+258 84 123 4567".into(),
            room_type: "suite".into(),
            check_in: Some(date(2024, 6, 1)),
            check_out: Some(date(2024, 6, 4)),
            adults: 2,
            children: 1,
            message: Some("  Late arrival  ".into()),
        }
    }

    fn only_error(form: ReservationForm) -> Field {
        let errors = validate_reservation(&form, today()).unwrap_err();
        let fields: Vec<Field> = errors.fields().collect();
        assert_eq!(fields.len(), 1, "unexpected errors: {errors}");
        fields[0]
    }

    #[test]
    fn accepts_valid_form() {
        let request = validate_reservation(&valid_form(), today()).unwrap();
        assert_eq!(request.date_range.nights(), 3);
        assert_eq!(request.adults, 2);
        assert_eq!(request.message.as_deref(), Some("Late arrival"));
    }

    #[test]
    fn rejects_each_rule_independently() {
        assert_eq!(only_error(ReservationForm { adults: 0, ..valid_form() }), Field::Adults);
        assert_eq!(only_error(ReservationForm { adults: 7, ..valid_form() }), Field::Adults);
        assert_eq!(only_error(ReservationForm { children: 5, ..valid_form() }), Field::Children);
        assert_eq!(
            only_error(ReservationForm { email: "ana-at-example".into(), ..valid_form() }),
            Field::Email
        );
        assert_eq!(only_error(ReservationForm { phone: "84123".into(), ..valid_form() }), Field::Phone);
        assert_eq!(only_error(ReservationForm { name: "Al".into(), ..valid_form() }), Field::Name);
        assert_eq!(
            only_error(ReservationForm { room_type: "  ".into(), ..valid_form() }),
            Field::RoomType
        );
        assert_eq!(
            only_error(ReservationForm {
                check_out: Some(date(2024, 6, 1)),
                ..valid_form()
            }),
            Field::CheckOut
        );
    }

    #[test]
    fn reports_all_violations_at_once() {
        let form = ReservationForm {
            name: "Jo".into(),
            email: "nope".into(),
            phone: "12345".into(),
            adults: 0,
            children: 5,
            check_in: Some(date(2024, 6, 4)),
            check_out: Some(date(2024, 6, 4)),
            ..valid_form()
        };
        let errors = validate_reservation(&form, today()).unwrap_err();
        for field in [
            Field::Name,
            Field::Email,
            Field::Phone,
            Field::Adults,
            Field::Children,
            Field::CheckOut,
        ] {
            assert!(errors.contains(field), "missing {field} in {errors}");
        }
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn check_in_today_is_allowed_but_yesterday_is_not() {
        let same_day = ReservationForm {
            check_in: Some(today()),
            check_out: Some(date(2024, 5, 21)),
            ..valid_form()
        };
        assert!(validate_reservation(&same_day, today()).is_ok());

        let yesterday = ReservationForm {
            check_in: Some(date(2024, 5, 19)),
            check_out: Some(date(2024, 5, 21)),
            ..valid_form()
        };
        assert_eq!(only_error(yesterday), Field::CheckIn);
    }

    #[test]
    fn missing_dates_are_required() {
        let form = ReservationForm {
            check_in: None,
            check_out: None,
            ..valid_form()
        };
        let errors = validate_reservation(&form, today()).unwrap_err();
        assert!(errors.contains(Field::CheckIn));
        assert!(errors.contains(Field::CheckOut));
    }

    #[test]
    fn deserializes_camel_case_form() {
        let form: ReservationForm = serde_json::from_str(
            r#"{"name":"Ana","email":"a@b.co","phone":"841234567","roomType":"suite",
                "checkIn":"2024-06-01","checkOut":"2024-06-02","adults":1,"children":0}"#,
        )
        .unwrap();
        assert_eq!(form.room_type, "suite");
        assert!(validate_reservation(&form, today()).is_ok());
    }
}
