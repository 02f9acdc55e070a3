//! Read-only station and train catalog.
//!
//! The search engine only ever sees the catalog through the
//! [`StationCatalog`] and [`TrainCatalog`] traits, so tests can swap in
//! doubles and production can swap snapshots without the engine noticing.
//!
//! Data is loaded once from a JSON document (local file or URL), indexed
//! into an immutable [`CatalogSnapshot`], and served through a
//! [`SharedCatalog`] that can replace the whole snapshot atomically.
//! Callers that need several queries to agree pin a snapshot first.

mod cache;
mod error;
mod shared;
mod snapshot;
mod source;

use std::collections::HashSet;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::domain::{ScheduleStop, Station, StationCode, StationSummary, Train};

pub use cache::{CacheLookup, CatalogCache, CatalogCacheConfig};
pub use error::CatalogError;
pub use shared::{CatalogStats, SharedCatalog};
pub use snapshot::{CatalogDocument, CatalogSnapshot};
pub use source::{CatalogLoader, CatalogLoaderConfig, CatalogSource};

#[cfg(test)]
pub(crate) use snapshot::fixtures;

/// Identifies which data a catalog is serving.
pub trait Versioned: Send + Sync {
    /// Changes whenever the data does, so derived caches can key on it.
    fn generation(&self) -> u64 {
        0
    }
}

/// Read access to station reference data.
pub trait StationCatalog: Versioned {
    /// A view that keeps answering from the data current when it was taken.
    type Pinned: StationCatalog;

    /// Pin the data currently served. Every query against the returned view
    /// sees the same generation, whatever refreshes happen meanwhile.
    fn pin(&self) -> impl Future<Output = Result<Self::Pinned, CatalogError>> + Send;

    /// Exact lookup by code.
    fn find_by_code(
        &self,
        code: StationCode,
    ) -> impl Future<Output = Result<Option<Arc<Station>>, CatalogError>> + Send;

    /// Stations whose latitude and longitude both fall inside the inclusive
    /// ranges, in catalog order.
    fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> impl Future<Output = Result<Vec<Arc<Station>>, CatalogError>> + Send;

    /// Autocomplete: case-insensitive code prefix or name substring match,
    /// at most `limit` entries. Blank text matches nothing.
    fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StationSummary>, CatalogError>> + Send;
}

/// Read access to train reference data.
pub trait TrainCatalog: Versioned {
    type Pinned: TrainCatalog;

    fn pin(&self) -> impl Future<Output = Result<Self::Pinned, CatalogError>> + Send;

    /// Every train starting at one of `from` and ending at one of `to`,
    /// in catalog order.
    fn find_between(
        &self,
        from: &HashSet<StationCode>,
        to: &HashSet<StationCode>,
    ) -> impl Future<Output = Result<Vec<Arc<Train>>, CatalogError>> + Send;

    fn find_by_number(
        &self,
        number: &str,
    ) -> impl Future<Output = Result<Option<Arc<Train>>, CatalogError>> + Send;

    /// Stops of a train in running order; empty if the catalog has none.
    fn schedule(
        &self,
        number: &str,
    ) -> impl Future<Output = Result<Vec<ScheduleStop>, CatalogError>> + Send;
}
