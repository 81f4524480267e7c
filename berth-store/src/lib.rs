pub mod app_config;
pub mod database;
pub mod memory;
pub mod train_repo;
pub mod booking_repo;
pub mod redis_repo;
pub mod events;

pub use app_config::Config;
pub use database::DbClient;
pub use memory::{MemoryBookingLedger, MemoryTrainRepository};
pub use train_repo::PgTrainRepository;
pub use booking_repo::PgBookingLedger;
pub use redis_repo::RedisClient;
#[cfg(feature = "kafka")]
pub use events::KafkaEventProducer;

use berth_core::repository::LedgerError;

pub(crate) fn backend_error(err: sqlx::Error) -> LedgerError {
    tracing::error!(error = %err, "Database error");
    LedgerError::Backend(err.to_string())
}
