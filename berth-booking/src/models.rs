use berth_catalog::FareClass;
use berth_core::booking::{Booking, BookingStatus, Passenger, Pnr};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Booking request as received from the client.
///
/// Fields stay loosely typed so that every problem is reported through the
/// validation sequence instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub train_id: Option<String>,
    pub travel_date: Option<String>,
    pub class: Option<String>,
    pub passengers: Option<Vec<serde_json::Value>>,
}

/// The fields of a request once presence has been checked.
#[derive(Debug, Clone)]
pub(crate) struct RequiredFields<'a> {
    pub train_id: &'a str,
    pub travel_date: &'a str,
    pub class: &'a str,
    pub passengers: &'a [serde_json::Value],
}

impl BookingRequest {
    pub(crate) fn required(&self) -> Option<RequiredFields<'_>> {
        fn non_blank(field: &Option<String>) -> Option<&str> {
            field.as_deref().filter(|v| !v.trim().is_empty())
        }

        let passengers = self.passengers.as_deref().filter(|p| !p.is_empty())?;
        Some(RequiredFields {
            train_id: non_blank(&self.train_id)?,
            travel_date: non_blank(&self.travel_date)?,
            class: non_blank(&self.class)?,
            passengers,
        })
    }
}

/// Client-facing view of a booking.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    #[serde(rename = "PNR")]
    pub pnr: Pnr,
    pub train_number: String,
    pub train_name: String,
    pub source: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub class: FareClass,
    pub passengers: Vec<Passenger>,
    pub total_fare: i64,
    pub status: BookingStatus,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            pnr: booking.pnr.clone(),
            train_number: booking.train_number.clone(),
            train_name: booking.train_name.clone(),
            source: booking.source.clone(),
            destination: booking.destination.clone(),
            travel_date: booking.travel_date,
            class: booking.class,
            passengers: booking.passengers.clone(),
            total_fare: booking.total_fare,
            status: booking.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_reject_blank_and_empty_values() {
        let full: BookingRequest = serde_json::from_value(serde_json::json!({
            "trainId": "9f0c1f9e-0000-0000-0000-000000000000",
            "travelDate": "2025-03-01",
            "class": "SL",
            "passengers": [{ "name": "A", "age": 30, "gender": "Male" }]
        }))
        .unwrap();
        assert!(full.required().is_some());

        let mut blank_class = full.clone();
        blank_class.class = Some("  ".to_string());
        assert!(blank_class.required().is_none());

        let mut no_passengers = full.clone();
        no_passengers.passengers = Some(vec![]);
        assert!(no_passengers.required().is_none());

        assert!(BookingRequest::default().required().is_none());
    }
}
