use async_trait::async_trait;
use berth_shared::models::events::{
    BookingCancelledEvent, BookingConfirmedEvent, BOOKING_CANCELLED_TOPIC, BOOKING_CONFIRMED_TOPIC,
};

/// Outbound booking notifications. Delivery is best effort; the ledger is the source of truth.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn booking_confirmed(
        &self,
        event: &BookingConfirmedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let payload = serde_json::to_string(event)?;
        self.publish(BOOKING_CONFIRMED_TOPIC, &event.pnr, &payload).await
    }

    async fn booking_cancelled(
        &self,
        event: &BookingCancelledEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let payload = serde_json::to_string(event)?;
        self.publish(BOOKING_CANCELLED_TOPIC, &event.pnr, &payload).await
    }
}

/// Default publisher when no broker is configured: events go to the log.
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(topic, key, payload, "Booking event");
        Ok(())
    }
}
