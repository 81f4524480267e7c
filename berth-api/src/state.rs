use berth_booking::{BookingOrchestrator, SearchProjector};
use berth_core::repository::TrainRepository;
use berth_store::RedisClient;
use std::sync::Arc;

use crate::metrics::BookingMetrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingOrchestrator>,
    pub search: Arc<SearchProjector>,
    pub trains: Arc<dyn TrainRepository>,
    /// Rate limiting is skipped when no Redis is configured.
    pub redis: Option<Arc<RedisClient>>,
    pub metrics: Arc<BookingMetrics>,
    pub auth: AuthConfig,
    pub rate_limit_per_minute: i64,
}
