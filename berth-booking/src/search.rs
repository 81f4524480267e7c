use berth_catalog::RunningDay;
use berth_core::clock::Clock;
use berth_core::repository::TrainRepository;
use berth_core::search::{TrainAvailability, TrainSearchRequest, TrainSearchResponse};
use berth_core::{CoreError, CoreResult};
use std::sync::Arc;

use crate::availability::AvailabilityCalculator;
use crate::validation;

/// Read-only projection of trains plus live availability for a route and day.
pub struct SearchProjector {
    trains: Arc<dyn TrainRepository>,
    calculator: AvailabilityCalculator,
    clock: Arc<dyn Clock>,
}

impl SearchProjector {
    pub fn new(trains: Arc<dyn TrainRepository>, calculator: AvailabilityCalculator, clock: Arc<dyn Clock>) -> Self {
        Self { trains, calculator, clock }
    }

    pub async fn search(&self, request: &TrainSearchRequest) -> CoreResult<TrainSearchResponse> {
        let present = |field: &Option<String>| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let (Some(source), Some(destination), Some(raw_date)) =
            (present(&request.source), present(&request.destination), present(&request.date))
        else {
            return Err(CoreError::invalid("Source, destination, and date are required"));
        };

        let date = validation::parse_calendar_date(&raw_date, self.clock.offset())
            .ok_or_else(|| CoreError::invalid("Invalid travel date"))?;

        let matches = self
            .trains
            .find_matching(&source, &destination, RunningDay::of(date))
            .await?;

        let mut trains = Vec::with_capacity(matches.len());
        for train in matches {
            let availability = self.calculator.breakdown(&train, date).await?;
            trains.push(TrainAvailability { train, availability });
        }

        tracing::debug!(%source, %destination, %date, results = trains.len(), "Train search");
        Ok(TrainSearchResponse { trains })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_catalog::{ClassConfig, FareClass, Station, Train};
    use berth_core::booking::{Booking, Gender, Passenger, Pnr};
    use berth_core::clock::FixedClock;
    use berth_core::repository::BookingLedger;
    use berth_shared::Masked;
    use berth_store::memory::{MemoryBookingLedger, MemoryTrainRepository};
    use chrono::{NaiveDate, NaiveTime, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn station(code: &str, name: &str) -> Station {
        Station {
            station_code: code.to_string(),
            station_name: name.to_string(),
            arrival_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            departure_time: NaiveTime::from_hms_opt(6, 10, 0).unwrap(),
            distance: 120,
        }
    }

    fn weekday_train() -> Train {
        let mut classes = BTreeMap::new();
        classes.insert(FareClass::Sleeper, ClassConfig { total_seats: Some(72), fare: Some(485) });
        classes.insert(FareClass::ThreeTierAc, ClassConfig { total_seats: Some(64), fare: Some(1255) });
        Train {
            id: Uuid::new_v4(),
            train_number: "16235".to_string(),
            train_name: "Tuticorin Express".to_string(),
            source: "MYS".to_string(),
            destination: "TN".to_string(),
            stations: vec![station("SBC", "KSR Bengaluru"), station("MDU", "Madurai Junction")],
            classes,
            running_days: vec![RunningDay::Monday, RunningDay::Wednesday, RunningDay::Friday],
            duration: "16h 05m".to_string(),
        }
    }

    fn projector(train: Train, ledger: Arc<MemoryBookingLedger>) -> SearchProjector {
        let trains = Arc::new(MemoryTrainRepository::with_trains(vec![train]));
        SearchProjector::new(
            trains,
            AvailabilityCalculator::new(ledger),
            Arc::new(FixedClock::on(date(1))),
        )
    }

    fn query(source: &str, destination: &str, day: &str) -> TrainSearchRequest {
        TrainSearchRequest {
            source: Some(source.to_string()),
            destination: Some(destination.to_string()),
            date: Some(day.to_string()),
        }
    }

    #[tokio::test]
    async fn test_train_not_running_that_weekday_is_excluded() {
        let search = projector(weekday_train(), Arc::new(MemoryBookingLedger::new()));

        // 2025-03-04 is a Tuesday
        let response = search.search(&query("MYS", "TN", "2025-03-04")).await.unwrap();
        assert!(response.trains.is_empty());

        // 2025-03-03 is a Monday
        let response = search.search(&query("MYS", "TN", "2025-03-03")).await.unwrap();
        assert_eq!(response.trains.len(), 1);
    }

    #[tokio::test]
    async fn test_intermediate_stations_match_by_code_or_name() {
        let search = projector(weekday_train(), Arc::new(MemoryBookingLedger::new()));

        let response = search.search(&query("bengaluru", "mdu", "2025-03-05")).await.unwrap();
        assert_eq!(response.trains.len(), 1);
        assert_eq!(response.trains[0].train.train_number, "16235");

        let response = search.search(&query("Chennai", "MDU", "2025-03-05")).await.unwrap();
        assert!(response.trains.is_empty());
    }

    #[tokio::test]
    async fn test_availability_reflects_committed_bookings() {
        let train = weekday_train();
        let ledger = Arc::new(MemoryBookingLedger::new());
        let passenger = Passenger {
            name: Masked::new("Anita Rao".to_string()),
            age: 41,
            gender: Gender::Female,
            seat_number: None,
        };
        let booking = Booking::confirmed(
            Pnr::parse("4821937560").unwrap(),
            Uuid::new_v4(),
            &train,
            date(3),
            FareClass::Sleeper,
            vec![passenger.clone(), passenger],
            970,
            Utc::now(),
        );
        ledger.insert_within_capacity(&booking, 72).await.unwrap();

        let search = projector(train, ledger);
        let response = search.search(&query("MYS", "TN", "2025-03-03")).await.unwrap();
        let availability = &response.trains[0].availability;
        assert_eq!(availability[&FareClass::Sleeper].available_seats, 70);
        assert_eq!(availability[&FareClass::Sleeper].fare, Some(485));
        assert_eq!(availability[&FareClass::ThreeTierAc].available_seats, 64);

        // other days are unaffected
        let response = search.search(&query("MYS", "TN", "2025-03-05")).await.unwrap();
        assert_eq!(response.trains[0].availability[&FareClass::Sleeper].available_seats, 72);
    }

    #[tokio::test]
    async fn test_missing_fields_and_bad_dates_are_rejected() {
        let search = projector(weekday_train(), Arc::new(MemoryBookingLedger::new()));

        let err = search.search(&TrainSearchRequest::default()).await.unwrap_err();
        assert_eq!(err, CoreError::invalid("Source, destination, and date are required"));

        let err = search.search(&query("MYS", " ", "2025-03-03")).await.unwrap_err();
        assert_eq!(err, CoreError::invalid("Source, destination, and date are required"));

        let err = search.search(&query("MYS", "TN", "March 3rd")).await.unwrap_err();
        assert_eq!(err, CoreError::invalid("Invalid travel date"));
    }
}
