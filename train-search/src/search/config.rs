//! Tuning parameters for the search engine.

use std::time::Duration;

use super::slots::SlotTable;

/// Stations closer than this (in km) count as the same place.
pub const DEFAULT_ACCEPTABLE_DISTANCE_KM: f64 = 600.0;

/// Half-width, in degrees, of the bounding box used to prefilter nearby stations.
pub const DEFAULT_BOX_HALF_DEGREES: f64 = 0.5;

/// Maximum autocomplete suggestions.
pub const DEFAULT_AUTOCOMPLETE_LIMIT: usize = 10;

/// Configuration parameters for train search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Candidates must be strictly closer than this to the origin (km).
    pub acceptable_distance_km: f64,

    /// Prefilter box half-width in degrees, applied to latitude and
    /// longitude alike. At the default 0.5° this box, not the distance
    /// threshold, bounds which stations can be equivalent.
    pub box_half_degrees: f64,

    /// Maximum number of autocomplete suggestions.
    pub autocomplete_limit: usize,

    /// Upper bound on any single catalog call.
    pub catalog_timeout: Duration,

    /// Where each departure/arrival slot begins.
    pub slots: SlotTable,

    /// Maximum number of memoised station equivalence sets.
    pub resolver_cache_capacity: u64,

    /// How long a memoised equivalence set stays valid.
    pub resolver_cache_ttl: Duration,
}

impl SearchConfig {
    pub fn with_acceptable_distance_km(mut self, km: f64) -> Self {
        self.acceptable_distance_km = km;
        self
    }

    pub fn with_box_half_degrees(mut self, degrees: f64) -> Self {
        self.box_half_degrees = degrees;
        self
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn with_slots(mut self, slots: SlotTable) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_autocomplete_limit(mut self, limit: usize) -> Self {
        self.autocomplete_limit = limit;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            acceptable_distance_km: DEFAULT_ACCEPTABLE_DISTANCE_KM,
            box_half_degrees: DEFAULT_BOX_HALF_DEGREES,
            autocomplete_limit: DEFAULT_AUTOCOMPLETE_LIMIT,
            catalog_timeout: Duration::from_secs(2),
            slots: SlotTable::legacy(),
            resolver_cache_capacity: 10_000,
            resolver_cache_ttl: Duration::from_secs(60 * 60),
        }
    }
}
