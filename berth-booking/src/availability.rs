use berth_catalog::{inventory, FareClass, InventoryKey, SeatAvailability, Train};
use berth_core::repository::BookingLedger;
use berth_core::{CoreError, CoreResult};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Derives remaining seats from the ledger on every call; nothing is cached.
#[derive(Clone)]
pub struct AvailabilityCalculator {
    ledger: Arc<dyn BookingLedger>,
}

impl AvailabilityCalculator {
    pub fn new(ledger: Arc<dyn BookingLedger>) -> Self {
        Self { ledger }
    }

    /// Seats left for one class. Negative results are returned as-is.
    pub async fn availability(
        &self,
        train: &Train,
        travel_date: NaiveDate,
        class: FareClass,
    ) -> CoreResult<SeatAvailability> {
        let config = train
            .classes
            .get(&class)
            .ok_or_else(|| CoreError::invalid(format!("Selected class '{}' is not available on this train", class)))?;

        let key = InventoryKey::new(train.id, travel_date, class);
        let booked = self.ledger.booked_seats(&key).await?;

        let availability = SeatAvailability::compute(config, booked)
            .ok_or_else(|| CoreError::invalid(format!("Selected class '{}' is not available on this train", class)))?;
        report_overbooking(&key, &availability);
        Ok(availability)
    }

    /// Availability for every configured class of `train` on `travel_date`.
    pub async fn breakdown(
        &self,
        train: &Train,
        travel_date: NaiveDate,
    ) -> CoreResult<BTreeMap<FareClass, SeatAvailability>> {
        let booked = self.ledger.booked_by_class(train.id, travel_date).await?;
        let classes = inventory::breakdown(train, &booked);
        for (class, availability) in &classes {
            report_overbooking(&InventoryKey::new(train.id, travel_date, *class), availability);
        }
        Ok(classes)
    }
}

fn report_overbooking(key: &InventoryKey, availability: &SeatAvailability) {
    if availability.is_overbooked() {
        tracing::error!(
            inventory = %key,
            total_seats = availability.total_seats,
            booked_seats = availability.booked_seats(),
            available_seats = availability.available_seats,
            "Inventory is overbooked"
        );
    }
}
