pub mod catalog;
pub mod money;
pub mod reservation;

pub use catalog::{PriceEntry, Promotion, RoomImage, ServiceEntry, ServiceImage};
pub use money::{Money, MoneyParseError};
pub use reservation::{DateRange, Reservation, ReservationRequest, ReservationStatus};
