use async_trait::async_trait;
use berth_catalog::{FareClass, InventoryKey, RunningDay, Train};
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use crate::booking::{Booking, Pnr};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("PNR {0} already exists")]
    DuplicatePnr(String),

    #[error("Only {available} seats available for {key}")]
    CapacityExceeded { key: String, available: i64 },

    #[error("Booking {0} not found")]
    NotFound(String),

    #[error("Booking {0} is already cancelled")]
    AlreadyCancelled(String),

    #[error("Train {0} already exists")]
    DuplicateTrain(String),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Read side of the train catalog, plus the admin insert path.
#[async_trait]
pub trait TrainRepository: Send + Sync {
    async fn get_train(&self, id: Uuid) -> Result<Option<Train>, LedgerError>;

    async fn list_trains(&self) -> Result<Vec<Train>, LedgerError>;

    /// Trains running on `day` whose route serves both queries.
    async fn find_matching(
        &self,
        source: &str,
        destination: &str,
        day: RunningDay,
    ) -> Result<Vec<Train>, LedgerError>;

    async fn insert_train(&self, train: &Train) -> Result<(), LedgerError>;
}

/// Durable record of bookings. PNR is unique across the whole ledger.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// Seats held by non-cancelled bookings for one (train, date, class).
    async fn booked_seats(&self, key: &InventoryKey) -> Result<i64, LedgerError>;

    /// Seats held by non-cancelled bookings for every class of a train on a date.
    async fn booked_by_class(
        &self,
        train_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<HashMap<FareClass, i64>, LedgerError>;

    /// Recounts the booking's inventory key and inserts it in one critical
    /// section, failing with `CapacityExceeded` if the seats no longer fit
    /// within `capacity`, or `DuplicatePnr` if the code is taken.
    async fn insert_within_capacity(&self, booking: &Booking, capacity: u32) -> Result<(), LedgerError>;

    async fn find_by_pnr(&self, pnr: &Pnr) -> Result<Option<Booking>, LedgerError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, LedgerError>;

    /// Conditional transition to `Cancelled`; `AlreadyCancelled` when another
    /// caller got there first.
    async fn mark_cancelled(&self, pnr: &Pnr) -> Result<Booking, LedgerError>;
}
