pub mod severity;

use std::sync::Arc;

use crate::services::health_service::Aggregator;

pub type SharedState = Arc<AppState>;

/// Central application state holding the registered checks.
pub struct AppState {
    aggregator: Aggregator,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(aggregator: Aggregator) -> SharedState {
        Arc::new(Self { aggregator })
    }

    /// Aggregator answering health requests.
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}
