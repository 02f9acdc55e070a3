//! Station equivalence by geographic proximity.
//!
//! A traveller asking for trains from one station is usually happy with a
//! train from a station next door. [`ProximityResolver`] expands a station
//! code into the set of codes treated as the same place.
//!
//! Candidates come from a cheap bounding-box query on the catalog, then
//! [`ProximityRule`] decides. The box is a heuristic: at the default
//! settings it is much tighter than the distance threshold and is what
//! actually limits the set. Longitudes are not wrapped at the antimeridian.
//!
//! The rule is symmetric (`b` is near `a` exactly when `a` is near `b`).
//! It is not transitive.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::catalog::StationCatalog;
use crate::domain::{Station, StationCode};
use crate::geo::distance_km;

use super::bounded;
use super::config::SearchConfig;

/// Widening applied to the catalog box query so that rounding at the box
/// edge never hides a station the rule would accept.
const BOX_SLACK_DEGREES: f64 = 1e-9;

/// A set of interchangeable station codes.
pub type StationSet = Arc<HashSet<StationCode>>;

/// Error from station resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("station not found: {0}")]
    NotFound(StationCode),

    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// Decides whether two stations are close enough to be interchangeable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityRule {
    pub box_half_degrees: f64,
    pub acceptable_distance_km: f64,
}

impl ProximityRule {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            box_half_degrees: config.box_half_degrees,
            acceptable_distance_km: config.acceptable_distance_km,
        }
    }

    /// Inside each other's box and strictly under the distance threshold.
    pub fn accepts(&self, a: &Station, b: &Station) -> bool {
        (a.latitude - b.latitude).abs() <= self.box_half_degrees
            && (a.longitude - b.longitude).abs() <= self.box_half_degrees
            && distance_km(a.latitude, a.longitude, b.latitude, b.longitude)
                < self.acceptable_distance_km
    }
}

/// Resolves station codes to equivalence sets, memoising results per
/// catalog generation.
///
/// The resolver does not own a catalog: callers pass the (usually pinned)
/// view to resolve against, so both endpoints of a search can share one.
pub struct ProximityResolver {
    rule: ProximityRule,
    timeout: Duration,
    cache: MokaCache<(u64, StationCode), StationSet>,
}

impl ProximityResolver {
    pub fn new(config: &SearchConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.resolver_cache_capacity)
            .time_to_live(config.resolver_cache_ttl)
            .build();

        Self {
            rule: ProximityRule::from_config(config),
            timeout: config.catalog_timeout,
            cache,
        }
    }

    /// Every station interchangeable with `code`, `code` included.
    pub async fn resolve<C: StationCatalog>(
        &self,
        stations: &C,
        code: StationCode,
    ) -> Result<StationSet, ResolveError> {
        let key = (stations.generation(), code);
        self.cache
            .try_get_with(key, self.compute(stations, code))
            .await
            .map_err(|e| (*e).clone())
    }

    async fn compute<C: StationCatalog>(
        &self,
        stations: &C,
        code: StationCode,
    ) -> Result<StationSet, ResolveError> {
        let origin = bounded(self.timeout, stations.find_by_code(code))
            .await
            .map_err(ResolveError::CatalogUnavailable)?
            .ok_or(ResolveError::NotFound(code))?;

        let reach = self.rule.box_half_degrees + BOX_SLACK_DEGREES;
        let candidates = bounded(
            self.timeout,
            stations.find_nearby_box(
                (origin.latitude - reach)..=(origin.latitude + reach),
                (origin.longitude - reach)..=(origin.longitude + reach),
            ),
        )
        .await
        .map_err(ResolveError::CatalogUnavailable)?;

        let mut set = HashSet::with_capacity(candidates.len() + 1);
        set.insert(origin.code);
        set.extend(
            candidates
                .iter()
                .filter(|candidate| self.rule.accepts(&origin, candidate))
                .map(|candidate| candidate.code),
        );

        debug!(
            station = %code,
            candidates = candidates.len(),
            equivalent = set.len(),
            "resolved station equivalence set"
        );

        Ok(Arc::new(set))
    }
}
