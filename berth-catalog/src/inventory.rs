use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use uuid::Uuid;

use crate::train::{ClassConfig, FareClass, Train};

/// The unit of seat inventory: one class on one train on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InventoryKey {
    pub train_id: Uuid,
    pub travel_date: NaiveDate,
    pub class: FareClass,
}

impl InventoryKey {
    pub fn new(train_id: Uuid, travel_date: NaiveDate, class: FareClass) -> Self {
        Self { train_id, travel_date, class }
    }
}

impl fmt::Display for InventoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.train_id, self.travel_date, self.class)
    }
}

/// Remaining seats for a class on a date, derived from committed bookings.
///
/// `available_seats` is deliberately signed and never clamped: a negative
/// value means the ledger already holds more seats than the class has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAvailability {
    pub total_seats: u32,
    pub available_seats: i64,
    pub fare: Option<i64>,
}

impl SeatAvailability {
    /// `None` when the class has no seat count configured.
    pub fn compute(config: &ClassConfig, booked_seats: i64) -> Option<Self> {
        let total_seats = config.total_seats?;
        Some(Self {
            total_seats,
            available_seats: i64::from(total_seats) - booked_seats,
            fare: config.fare,
        })
    }

    pub fn booked_seats(&self) -> i64 {
        i64::from(self.total_seats) - self.available_seats
    }

    pub fn is_overbooked(&self) -> bool {
        self.available_seats < 0
    }

    pub fn ensure_room_for(&self, requested: usize) -> Result<(), InventoryError> {
        let requested = i64::try_from(requested).unwrap_or(i64::MAX);
        if requested > self.available_seats {
            return Err(InventoryError::InsufficientSeats {
                requested,
                available: self.available_seats,
            });
        }
        Ok(())
    }
}

/// Sums seat counts per class, e.g. over the non-cancelled bookings of one train and day.
pub fn tally<I>(commitments: I) -> HashMap<FareClass, i64>
where
    I: IntoIterator<Item = (FareClass, u32)>,
{
    commitments.into_iter().fold(HashMap::new(), |mut acc, (class, seats)| {
        *acc.entry(class).or_insert(0) += i64::from(seats);
        acc
    })
}

/// Availability of every configured class on a train given per-class booked counts.
pub fn breakdown(train: &Train, booked: &HashMap<FareClass, i64>) -> BTreeMap<FareClass, SeatAvailability> {
    train
        .classes
        .iter()
        .filter_map(|(class, config)| {
            let taken = booked.get(class).copied().unwrap_or(0);
            SeatAvailability::compute(config, taken).map(|availability| (*class, availability))
        })
        .collect()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Only {available} seats available, requested {requested}")]
    InsufficientSeats {
        requested: i64,
        available: i64,
    },
}
