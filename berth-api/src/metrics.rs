use axum::{extract::State, http::header, response::IntoResponse};
use berth_core::ErrorKind;
use prometheus::{opts, Encoder, IntCounter, IntCounterVec, Registry, TextEncoder};

use crate::{error::AppError, state::AppState};

/// Booking counters exported on `/metrics`.
pub struct BookingMetrics {
    registry: Registry,
    bookings_created: IntCounter,
    bookings_cancelled: IntCounter,
    seats_booked: IntCounter,
    rejections: IntCounterVec,
}

impl BookingMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let bookings_created = IntCounter::new("berth_bookings_created_total", "Bookings committed to the ledger")?;
        let bookings_cancelled = IntCounter::new("berth_bookings_cancelled_total", "Bookings cancelled by their owner")?;
        let seats_booked = IntCounter::new("berth_seats_booked_total", "Passenger seats across committed bookings")?;
        let rejections = IntCounterVec::new(
            opts!("berth_booking_rejections_total", "Booking requests rejected, by error kind"),
            &["kind"],
        )?;

        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(bookings_cancelled.clone()))?;
        registry.register(Box::new(seats_booked.clone()))?;
        registry.register(Box::new(rejections.clone()))?;

        Ok(Self {
            registry,
            bookings_created,
            bookings_cancelled,
            seats_booked,
            rejections,
        })
    }

    pub fn record_created(&self, seats: u32) {
        self.bookings_created.inc();
        self.seats_booked.inc_by(u64::from(seats));
    }

    pub fn record_cancelled(&self) {
        self.bookings_cancelled.inc();
    }

    pub fn record_rejection(&self, kind: ErrorKind) {
        self.rejections.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .export()
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("metrics export failed: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
