use berth_catalog::{ClassLookup, FareClass, FareQuote, Train};
use berth_core::booking::{Booking, Pnr};
use berth_core::clock::Clock;
use berth_core::events::EventPublisher;
use berth_core::identity::{AccessPolicy, Actor, OwnershipPolicy};
use berth_core::repository::{BookingLedger, LedgerError, TrainRepository};
use berth_core::{CoreError, CoreResult};
use berth_shared::models::events::{BookingCancelledEvent, BookingConfirmedEvent};
use std::sync::Arc;
use uuid::Uuid;

use crate::availability::AvailabilityCalculator;
use crate::models::BookingRequest;
use crate::pnr::{MintError, PnrMinter};
use crate::validation;

const MISSING_FIELDS: &str = "Missing or invalid booking data";
const ACCESS_DENIED: &str = "Access denied";

/// Creates and cancels bookings against the shared ledger.
///
/// Every validation step runs before the single ledger write, so a rejected
/// request never leaves a partial booking behind.
pub struct BookingOrchestrator {
    trains: Arc<dyn TrainRepository>,
    ledger: Arc<dyn BookingLedger>,
    calculator: AvailabilityCalculator,
    policy: Arc<dyn AccessPolicy>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    minter: PnrMinter,
}

impl BookingOrchestrator {
    pub fn new(
        trains: Arc<dyn TrainRepository>,
        ledger: Arc<dyn BookingLedger>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        minter: PnrMinter,
    ) -> Self {
        Self {
            trains,
            calculator: AvailabilityCalculator::new(ledger.clone()),
            ledger,
            policy: Arc::new(OwnershipPolicy),
            clock,
            events,
            minter,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn calculator(&self) -> &AvailabilityCalculator {
        &self.calculator
    }

    pub async fn create_booking(&self, actor: &Actor, request: &BookingRequest) -> CoreResult<Booking> {
        if !self.policy.can_book(actor) {
            return Err(CoreError::Forbidden(ACCESS_DENIED.to_string()));
        }

        let fields = request.required().ok_or_else(|| CoreError::invalid(MISSING_FIELDS))?;

        let train = self.load_train(fields.train_id).await?;

        let unavailable = || {
            CoreError::invalid(format!(
                "Selected class '{}' is not available on this train",
                fields.class.trim()
            ))
        };
        let class: FareClass = fields.class.trim().parse().map_err(|_| unavailable())?;
        let (total_seats, fare) = match train.lookup_class(class) {
            ClassLookup::Bookable { total_seats, fare } => (total_seats, fare),
            ClassLookup::FareMissing { .. } => {
                tracing::error!(train_number = %train.train_number, %class, "Class has seats but no fare");
                return Err(CoreError::InternalConfig(format!("Fare not configured for class {}", class)));
            }
            ClassLookup::Unavailable => return Err(unavailable()),
        };

        let travel_date =
            validation::validate_travel_date(fields.travel_date, self.clock.today(), self.clock.offset())?;

        let passengers = validation::validate_passengers(fields.passengers)?;
        let requested = passengers.len();

        // Fail fast on the snapshot; the ledger repeats the check atomically on insert.
        let availability = self.calculator.availability(&train, travel_date, class).await?;
        if availability.ensure_room_for(requested).is_err() {
            return Err(capacity_exceeded(class, requested, availability.available_seats));
        }

        let quote = FareQuote::new(fare, requested).map_err(|e| {
            tracing::error!(train_number = %train.train_number, %class, error = %e, "Fare computation failed");
            CoreError::InternalConfig(e.to_string())
        })?;

        let now = self.clock.now();
        let owner = actor.user_id;
        let booking = self
            .minter
            .mint(|pnr| {
                let booking = Booking::confirmed(
                    pnr,
                    owner,
                    &train,
                    travel_date,
                    class,
                    passengers.clone(),
                    quote.total_fare,
                    now,
                );
                let ledger = self.ledger.clone();
                async move {
                    ledger
                        .insert_within_capacity(&booking, total_seats)
                        .await
                        .map(|()| booking)
                }
            })
            .await
            .map_err(|err| match err {
                MintError::Exhausted { attempts } => {
                    tracing::error!(attempts, "PNR space exhausted for this request");
                    CoreError::InternalConfig(format!("Unable to allocate a unique PNR after {} attempts", attempts))
                }
                MintError::Ledger(LedgerError::CapacityExceeded { available, .. }) => {
                    capacity_exceeded(class, requested, available)
                }
                MintError::Ledger(other) => other.into(),
            })?;

        tracing::info!(
            pnr = %booking.pnr,
            user_id = %booking.user_id,
            train_number = %booking.train_number,
            %class,
            seats = booking.seat_count(),
            total_fare = booking.total_fare,
            "Booking confirmed"
        );

        let event = BookingConfirmedEvent {
            pnr: booking.pnr.to_string(),
            user_id: booking.user_id,
            train_id: booking.train_id,
            train_number: booking.train_number.clone(),
            travel_date: booking.travel_date,
            class: class.code().to_string(),
            seats: booking.seat_count(),
            total_fare: booking.total_fare,
            timestamp: now.timestamp(),
        };
        if let Err(e) = self.events.booking_confirmed(&event).await {
            tracing::warn!(pnr = %booking.pnr, error = %e, "Failed to publish booking confirmation");
        }

        Ok(booking)
    }

    /// Status-only transition to `Cancelled`, restricted to the owner.
    pub async fn cancel_booking(&self, actor: &Actor, raw_pnr: &str) -> CoreResult<Booking> {
        let booking = self.load_booking(raw_pnr).await?;

        if !self.policy.can_cancel(actor, &booking) {
            tracing::warn!(pnr = %booking.pnr, actor = %actor.user_id, "Cancellation denied");
            return Err(CoreError::Forbidden(ACCESS_DENIED.to_string()));
        }
        if !booking.holds_seats() {
            return Err(CoreError::InvalidState("Booking already cancelled".to_string()));
        }

        let cancelled = self.ledger.mark_cancelled(&booking.pnr).await?;

        tracing::info!(
            pnr = %cancelled.pnr,
            seats_released = cancelled.seat_count(),
            "Booking cancelled"
        );

        let event = BookingCancelledEvent {
            pnr: cancelled.pnr.to_string(),
            user_id: cancelled.user_id,
            train_id: cancelled.train_id,
            travel_date: cancelled.travel_date,
            class: cancelled.class.code().to_string(),
            seats_released: cancelled.seat_count(),
            timestamp: self.clock.now().timestamp(),
        };
        if let Err(e) = self.events.booking_cancelled(&event).await {
            tracing::warn!(pnr = %cancelled.pnr, error = %e, "Failed to publish booking cancellation");
        }

        Ok(cancelled)
    }

    pub async fn get_booking(&self, actor: &Actor, raw_pnr: &str) -> CoreResult<Booking> {
        let booking = self.load_booking(raw_pnr).await?;
        if !self.policy.can_view(actor, &booking) {
            return Err(CoreError::Forbidden(ACCESS_DENIED.to_string()));
        }
        Ok(booking)
    }

    /// The caller's own bookings, newest first.
    pub async fn list_bookings(&self, actor: &Actor) -> CoreResult<Vec<Booking>> {
        Ok(self.ledger.list_for_user(actor.user_id).await?)
    }

    async fn load_train(&self, raw_id: &str) -> CoreResult<Train> {
        let not_found = || CoreError::NotFound("Train".to_string());
        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| not_found())?;
        self.trains.get_train(id).await?.ok_or_else(not_found)
    }

    async fn load_booking(&self, raw_pnr: &str) -> CoreResult<Booking> {
        let not_found = || CoreError::NotFound("Booking".to_string());
        let pnr = Pnr::parse(raw_pnr).ok_or_else(not_found)?;
        self.ledger.find_by_pnr(&pnr).await?.ok_or_else(not_found)
    }
}

fn capacity_exceeded(class: FareClass, requested: usize, available: i64) -> CoreError {
    tracing::warn!(%class, requested, available, "Booking rejected: not enough seats");
    CoreError::CapacityExceeded {
        class: class.code().to_string(),
        requested: i64::try_from(requested).unwrap_or(i64::MAX),
        available,
    }
}
