use berth_catalog::{FareClass, SeatAvailability, Train};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw search query; every field is required but checked by the projector so
/// that a missing one surfaces as `InvalidRequest` rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainSearchRequest {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
}

/// A matching train with its derived per-class availability for the searched date.
#[derive(Debug, Clone, Serialize)]
pub struct TrainAvailability {
    #[serde(flatten)]
    pub train: Train,
    pub availability: BTreeMap<FareClass, SeatAvailability>,
}

#[derive(Debug, Serialize)]
pub struct TrainSearchResponse {
    pub trains: Vec<TrainAvailability>,
}
