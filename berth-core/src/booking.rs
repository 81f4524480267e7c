use berth_catalog::{FareClass, InventoryKey, Train};
use berth_shared::Masked;
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

const PNR_MIN: u64 = 1_000_000_000;
const PNR_MAX: u64 = 9_999_999_999;

/// Passenger Name Record: a 10-digit numeric booking code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pnr(String);

impl Pnr {
    /// Draws a fresh code from `rng`. Uniqueness is the ledger's job.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(PNR_MIN..=PNR_MAX).to_string())
    }

    /// Accepts exactly ten ASCII digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (raw.len() == 10 && raw.bytes().all(|b| b.is_ascii_digit())).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pnr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            "Other" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub name: Masked<String>,
    pub age: u8,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    /// Part of the data model; no code path currently produces it.
    Waiting,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Waiting => "Waiting",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Confirmed" => Some(BookingStatus::Confirmed),
            "Waiting" => Some(BookingStatus::Waiting),
            "Cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
            PaymentStatus::Failed => "Failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Pending" => Some(PaymentStatus::Pending),
            "Completed" => Some(PaymentStatus::Completed),
            "Failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// A committed reservation of N seats in one class on one train and date.
///
/// Train number, name and route are copied from the train at booking time so
/// the record stays meaningful if the catalog entry changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "PNR")]
    pub pnr: Pnr,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub train_number: String,
    pub train_name: String,
    pub source: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub class: FareClass,
    pub passengers: Vec<Passenger>,
    pub total_fare: i64,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn confirmed(
        pnr: Pnr,
        user_id: Uuid,
        train: &Train,
        travel_date: NaiveDate,
        class: FareClass,
        passengers: Vec<Passenger>,
        total_fare: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            pnr,
            user_id,
            train_id: train.id,
            train_number: train.train_number.clone(),
            train_name: train.train_name.clone(),
            source: train.source.clone(),
            destination: train.destination.clone(),
            travel_date,
            class,
            passengers,
            total_fare,
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn seat_count(&self) -> u32 {
        self.passengers.len() as u32
    }

    pub fn inventory_key(&self) -> InventoryKey {
        InventoryKey::new(self.train_id, self.travel_date, self.class)
    }

    /// Seats count against inventory unless the booking is cancelled.
    pub fn holds_seats(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Status-only transition; passengers, fare and PNR are untouched.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status == BookingStatus::Cancelled {
            return Err(CoreError::InvalidState("Booking already cancelled".to_string()));
        }
        self.status = BookingStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_pnr_is_ten_digits() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let pnr = Pnr::generate(&mut rng);
            assert_eq!(pnr.as_str().len(), 10);
            assert!(Pnr::parse(pnr.as_str()).is_some());
        }
    }

    #[test]
    fn test_pnr_parse_rejects_malformed_codes() {
        assert!(Pnr::parse("123456789").is_none());
        assert!(Pnr::parse("12345678901").is_none());
        assert!(Pnr::parse("12345abc90").is_none());
        assert_eq!(Pnr::parse(" 1234567890 ").unwrap().as_str(), "1234567890");
    }

    #[test]
    fn test_gender_is_case_sensitive() {
        assert_eq!(Gender::parse("Female"), Some(Gender::Female));
        assert_eq!(Gender::parse("female"), None);
        assert_eq!(Gender::parse("Unknown"), None);
    }

    #[test]
    fn test_passenger_name_is_masked_in_debug() {
        let passenger = Passenger {
            name: Masked::new("Sunita Kumar".to_string()),
            age: 32,
            gender: Gender::Female,
            seat_number: Some("S1-26".to_string()),
        };
        let debug = format!("{:?}", passenger);
        assert!(!debug.contains("Sunita"));

        let json = serde_json::to_value(&passenger).unwrap();
        assert_eq!(json["name"], "Sunita Kumar");
        assert_eq!(json["seatNumber"], "S1-26");
    }
}
