use async_trait::async_trait;
use berth_catalog::{inventory, FareClass, InventoryKey, RunningDay, Train};
use berth_core::booking::{Booking, Pnr};
use berth_core::repository::{BookingLedger, LedgerError, TrainRepository};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Train catalog held in process memory, used when no database is configured.
#[derive(Default)]
pub struct MemoryTrainRepository {
    trains: RwLock<HashMap<Uuid, Train>>,
}

impl MemoryTrainRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trains(trains: Vec<Train>) -> Self {
        Self {
            trains: RwLock::new(trains.into_iter().map(|t| (t.id, t)).collect()),
        }
    }

    /// Loads a JSON array of trains, e.g. the seed catalog.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LedgerError::Backend(format!("{}: {}", path.as_ref().display(), e)))?;
        let trains: Vec<Train> = serde_json::from_str(&raw).map_err(|e| LedgerError::Corrupt(e.to_string()))?;
        Ok(Self::with_trains(trains))
    }

    /// Overwrites the stored definition for `train.id`.
    pub async fn replace(&self, train: Train) {
        self.trains.write().await.insert(train.id, train);
    }
}

#[async_trait]
impl TrainRepository for MemoryTrainRepository {
    async fn get_train(&self, id: Uuid) -> Result<Option<Train>, LedgerError> {
        Ok(self.trains.read().await.get(&id).cloned())
    }

    async fn list_trains(&self) -> Result<Vec<Train>, LedgerError> {
        let mut trains: Vec<Train> = self.trains.read().await.values().cloned().collect();
        trains.sort_by(|a, b| a.train_number.cmp(&b.train_number));
        Ok(trains)
    }

    async fn find_matching(
        &self,
        source: &str,
        destination: &str,
        day: RunningDay,
    ) -> Result<Vec<Train>, LedgerError> {
        let mut trains: Vec<Train> = self
            .trains
            .read()
            .await
            .values()
            .filter(|t| t.runs_on(day))
            .filter(|t| t.matches_origin(source) && t.matches_destination(destination))
            .cloned()
            .collect();
        trains.sort_by(|a, b| a.train_number.cmp(&b.train_number));
        Ok(trains)
    }

    async fn insert_train(&self, train: &Train) -> Result<(), LedgerError> {
        let mut trains = self.trains.write().await;
        if trains.contains_key(&train.id) {
            return Err(LedgerError::DuplicateTrain(train.id.to_string()));
        }
        if trains.values().any(|t| t.train_number == train.train_number) {
            return Err(LedgerError::DuplicateTrain(train.train_number.clone()));
        }
        trains.insert(train.id, train.clone());
        Ok(())
    }
}

/// Booking ledger held in process memory.
///
/// A single write lock covers the capacity recount and the insert, so
/// concurrent bookings on the same key are serialized.
#[derive(Default)]
pub struct MemoryBookingLedger {
    bookings: RwLock<BTreeMap<Pnr, Booking>>,
}

impl MemoryBookingLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

fn seats_held<'a>(bookings: impl Iterator<Item = &'a Booking>, key: &InventoryKey) -> i64 {
    bookings
        .filter(|b| b.holds_seats() && b.inventory_key() == *key)
        .map(|b| i64::from(b.seat_count()))
        .sum()
}

#[async_trait]
impl BookingLedger for MemoryBookingLedger {
    async fn booked_seats(&self, key: &InventoryKey) -> Result<i64, LedgerError> {
        Ok(seats_held(self.bookings.read().await.values(), key))
    }

    async fn booked_by_class(
        &self,
        train_id: Uuid,
        travel_date: NaiveDate,
    ) -> Result<HashMap<FareClass, i64>, LedgerError> {
        let bookings = self.bookings.read().await;
        Ok(inventory::tally(
            bookings
                .values()
                .filter(|b| b.holds_seats() && b.train_id == train_id && b.travel_date == travel_date)
                .map(|b| (b.class, b.seat_count())),
        ))
    }

    async fn insert_within_capacity(&self, booking: &Booking, capacity: u32) -> Result<(), LedgerError> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.pnr) {
            return Err(LedgerError::DuplicatePnr(booking.pnr.to_string()));
        }

        let key = booking.inventory_key();
        let available = i64::from(capacity) - seats_held(bookings.values(), &key);
        if i64::from(booking.seat_count()) > available {
            return Err(LedgerError::CapacityExceeded {
                key: key.to_string(),
                available,
            });
        }

        bookings.insert(booking.pnr.clone(), booking.clone());
        Ok(())
    }

    async fn find_by_pnr(&self, pnr: &Pnr) -> Result<Option<Booking>, LedgerError> {
        Ok(self.bookings.read().await.get(pnr).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, LedgerError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .await
            .values()
            .filter(|b| b.is_owned_by(user_id))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn mark_cancelled(&self, pnr: &Pnr) -> Result<Booking, LedgerError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .get_mut(pnr)
            .ok_or_else(|| LedgerError::NotFound(pnr.to_string()))?;
        booking
            .cancel(Utc::now())
            .map_err(|_| LedgerError::AlreadyCancelled(pnr.to_string()))?;
        Ok(booking.clone())
    }
}
