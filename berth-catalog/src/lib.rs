pub mod train;
pub mod pricing;
pub mod inventory;

pub use train::{ClassConfig, ClassLookup, FareClass, RunningDay, Station, Train, CatalogError};
pub use pricing::{FareQuote, PricingError};
pub use inventory::{InventoryKey, SeatAvailability, InventoryError};
