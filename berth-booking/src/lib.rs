pub mod models;
pub mod validation;
pub mod availability;
pub mod pnr;
pub mod orchestrator;
pub mod search;

pub use models::{BookingRequest, BookingSummary};
pub use availability::AvailabilityCalculator;
pub use pnr::PnrMinter;
pub use orchestrator::BookingOrchestrator;
pub use search::SearchProjector;
