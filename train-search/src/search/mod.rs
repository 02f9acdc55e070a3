//! Train search between two stations.
//!
//! Both endpoints are widened to every station geographically equivalent
//! to them, then candidate trains are narrowed by ticket class and by
//! departure/arrival time slots.

mod config;
mod engine;
mod proximity;
mod slots;

use std::future::Future;
use std::time::Duration;

use crate::catalog::CatalogError;

pub use config::{
    DEFAULT_ACCEPTABLE_DISTANCE_KM, DEFAULT_AUTOCOMPLETE_LIMIT, DEFAULT_BOX_HALF_DEGREES,
    SearchConfig,
};
pub use engine::{Endpoint, SearchError, SearchQuery, SearchResult, TrainSearchEngine};
pub use proximity::{ProximityResolver, ProximityRule, ResolveError, StationSet};
pub use slots::{InvalidSlot, InvalidSlotTable, SlotTable, TimeSlot, parse_slots};

/// Run a catalog call with an upper bound on its duration.
///
/// Failures and expiry both come back as a message for the caller to wrap.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, CatalogError>>,
) -> Result<T, String> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("catalog call timed out after {}ms", limit.as_millis())),
    }
}
