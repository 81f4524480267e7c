use uuid::Uuid;

pub const BOOKING_CONFIRMED_TOPIC: &str = "booking.confirmed";
pub const BOOKING_CANCELLED_TOPIC: &str = "booking.cancelled";

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingConfirmedEvent {
    pub pnr: String,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub train_number: String,
    pub travel_date: chrono::NaiveDate,
    pub class: String,
    pub seats: u32,
    pub total_fare: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingCancelledEvent {
    pub pnr: String,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub travel_date: chrono::NaiveDate,
    pub class: String,
    /// Seats returned to the (train, date, class) inventory.
    pub seats_released: u32,
    pub timestamp: i64,
}
