use chrono::NaiveDate;

use super::BookingError;

/// Whole nights between check-in and check-out.
pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> Result<u32, BookingError> {
    let days = (check_out - check_in).num_days();
    if days <= 0 {
        return Err(BookingError::InvalidDateRange);
    }
    u32::try_from(days).map_err(|_| BookingError::InvalidDateRange)
}
