//! Atomically replaceable catalog snapshot.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::domain::{ScheduleStop, Station, StationCode, StationSummary, Train};

use super::error::CatalogError;
use super::snapshot::{CatalogDocument, CatalogSnapshot};
use super::source::CatalogLoader;
use super::{StationCatalog, TrainCatalog, Versioned};

/// Counts reported after a load or refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogStats {
    pub stations: usize,
    pub trains: usize,
    pub generation: u64,
}

/// Thread-safe handle to the current catalog snapshot.
///
/// Readers take a clone of the current `Arc<CatalogSnapshot>` and release
/// the lock straight away, so a refresh never waits on a running search.
///
/// Each query method reads whatever snapshot is current at the time. A
/// caller that makes several queries and needs them to agree should `pin`
/// first and query the returned snapshot.
#[derive(Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Arc<CatalogSnapshot>>>,
    /// Generation of the snapshot in `inner`, readable without the lock.
    generation: Arc<AtomicU64>,
    loader: Option<CatalogLoader>,
}

impl SharedCatalog {
    /// Load the initial snapshot from `loader`.
    ///
    /// This will fail if the source is unreachable or invalid.
    pub async fn load(loader: CatalogLoader) -> Result<Self, CatalogError> {
        let document = loader.load().await?;
        let snapshot = CatalogSnapshot::build(document, 1)?;

        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
            generation: Arc::new(AtomicU64::new(1)),
            loader: Some(loader),
        })
    }

    /// Wrap an already-built snapshot. Such a catalog cannot `refresh`.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        let generation = snapshot.generation();
        Self {
            inner: Arc::new(RwLock::new(Arc::new(snapshot))),
            generation: Arc::new(AtomicU64::new(generation)),
            loader: None,
        }
    }

    /// The snapshot currently being served.
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.read().await.clone()
    }

    pub async fn stats(&self) -> CatalogStats {
        let snapshot = self.snapshot().await;
        CatalogStats {
            stations: snapshot.station_count(),
            trains: snapshot.train_count(),
            generation: snapshot.generation(),
        }
    }

    /// Reload from the source, bypassing any disk cache.
    ///
    /// On success, replaces the current snapshot. On failure, the existing
    /// snapshot is preserved and the error is returned.
    pub async fn refresh(&self) -> Result<CatalogStats, CatalogError> {
        let loader = self.loader.as_ref().ok_or(CatalogError::NoSource)?;
        let document = loader.fetch().await?;
        self.replace(document).await
    }

    /// Build a snapshot from `document` and swap it in.
    ///
    /// The snapshot is built before the write lock is taken, so readers only
    /// wait for the pointer swap. Generations are assigned under the lock and
    /// always increase.
    pub async fn replace(&self, document: CatalogDocument) -> Result<CatalogStats, CatalogError> {
        let mut snapshot = CatalogSnapshot::build(document, 0)?;

        let mut guard = self.inner.write().await;
        let generation = guard.generation() + 1;
        snapshot.set_generation(generation);
        let stats = CatalogStats {
            stations: snapshot.station_count(),
            trains: snapshot.train_count(),
            generation,
        };
        *guard = Arc::new(snapshot);
        self.generation.store(generation, Ordering::Release);

        Ok(stats)
    }
}

impl Versioned for SharedCatalog {
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl StationCatalog for SharedCatalog {
    type Pinned = Arc<CatalogSnapshot>;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.snapshot().await)
    }

    async fn find_by_code(&self, code: StationCode) -> Result<Option<Arc<Station>>, CatalogError> {
        Ok(self.snapshot().await.station(code))
    }

    async fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> Result<Vec<Arc<Station>>, CatalogError> {
        Ok(self.snapshot().await.stations_in_box(&latitude, &longitude))
    }

    async fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<StationSummary>, CatalogError> {
        Ok(self.snapshot().await.search_stations(text, limit))
    }
}

impl TrainCatalog for SharedCatalog {
    type Pinned = Arc<CatalogSnapshot>;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.snapshot().await)
    }

    async fn find_between(
        &self,
        from: &HashSet<StationCode>,
        to: &HashSet<StationCode>,
    ) -> Result<Vec<Arc<Train>>, CatalogError> {
        Ok(self.snapshot().await.trains_between(from, to))
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Arc<Train>>, CatalogError> {
        Ok(self.snapshot().await.train(number))
    }

    async fn schedule(&self, number: &str) -> Result<Vec<ScheduleStop>, CatalogError> {
        Ok(self.snapshot().await.schedule_for(number))
    }
}
