//! Immutable in-memory catalog indexes.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{ScheduleStop, Station, StationCode, StationSummary, Train};

use super::error::CatalogError;
use super::{StationCatalog, TrainCatalog, Versioned};

/// The catalog as stored on disk or served over HTTP.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub stations: Vec<Station>,
    pub trains: Vec<Train>,
    #[serde(default)]
    pub schedules: Vec<ScheduleStop>,
}

impl CatalogDocument {
    /// Parse a JSON catalog document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::Json {
            message: e.to_string(),
        })
    }

    /// Check the invariants a snapshot relies on: coordinates in range,
    /// unique station codes and unique train numbers.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut codes = HashSet::with_capacity(self.stations.len());
        for station in &self.stations {
            validate_coordinates(station)?;
            if !codes.insert(station.code) {
                return Err(CatalogError::invalid(format!(
                    "duplicate station code {}",
                    station.code
                )));
            }
        }

        let mut numbers = HashSet::with_capacity(self.trains.len());
        for train in &self.trains {
            if !numbers.insert(train.number.as_str()) {
                return Err(CatalogError::invalid(format!(
                    "duplicate train number {}",
                    train.number
                )));
            }
        }
        Ok(())
    }
}

/// One consistent, indexed view of the catalog.
///
/// Built once and never mutated; a refresh builds a new snapshot.
#[derive(Debug)]
pub struct CatalogSnapshot {
    generation: u64,

    /// Stations in document order.
    stations: Vec<Arc<Station>>,
    /// Upper-cased station names, parallel to `stations`.
    name_keys: Vec<String>,
    by_code: HashMap<StationCode, usize>,
    /// Station indices sorted by latitude, for the bounding-box scan.
    by_latitude: Vec<usize>,

    /// Trains in document order.
    trains: Vec<Arc<Train>>,
    by_route: HashMap<(StationCode, StationCode), Vec<usize>>,
    by_number: HashMap<String, usize>,

    schedules: HashMap<String, Vec<ScheduleStop>>,
}

impl CatalogSnapshot {
    /// Validate a document and build its indexes.
    pub fn build(document: CatalogDocument, generation: u64) -> Result<Self, CatalogError> {
        document.validate()?;

        let by_code = document
            .stations
            .iter()
            .enumerate()
            .map(|(idx, station)| (station.code, idx))
            .collect();

        let mut by_latitude: Vec<usize> = (0..document.stations.len()).collect();
        by_latitude.sort_by(|&a, &b| {
            document.stations[a]
                .latitude
                .total_cmp(&document.stations[b].latitude)
        });

        let name_keys = document
            .stations
            .iter()
            .map(|s| s.name.to_uppercase())
            .collect();

        let mut by_route: HashMap<(StationCode, StationCode), Vec<usize>> = HashMap::new();
        let mut by_number = HashMap::with_capacity(document.trains.len());
        for (idx, train) in document.trains.iter().enumerate() {
            by_number.insert(train.number.clone(), idx);
            by_route
                .entry((train.from_station_code, train.to_station_code))
                .or_default()
                .push(idx);
        }

        let mut schedules: HashMap<String, Vec<ScheduleStop>> = HashMap::new();
        for stop in document.schedules {
            schedules
                .entry(stop.train_number.clone())
                .or_default()
                .push(stop);
        }

        Ok(Self {
            generation,
            stations: document.stations.into_iter().map(Arc::new).collect(),
            name_keys,
            by_code,
            by_latitude,
            trains: document.trains.into_iter().map(Arc::new).collect(),
            by_route,
            by_number,
            schedules,
        })
    }

    /// An empty catalog.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            stations: Vec::new(),
            name_keys: Vec::new(),
            by_code: HashMap::new(),
            by_latitude: Vec::new(),
            trains: Vec::new(),
            by_route: HashMap::new(),
            by_number: HashMap::new(),
            schedules: HashMap::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn train_count(&self) -> usize {
        self.trains.len()
    }

    pub fn station(&self, code: StationCode) -> Option<Arc<Station>> {
        self.by_code.get(&code).map(|&idx| self.stations[idx].clone())
    }

    pub fn stations_in_box(
        &self,
        latitude: &RangeInclusive<f64>,
        longitude: &RangeInclusive<f64>,
    ) -> Vec<Arc<Station>> {
        let start = self
            .by_latitude
            .partition_point(|&idx| self.stations[idx].latitude < *latitude.start());

        let mut hits: Vec<usize> = self.by_latitude[start..]
            .iter()
            .copied()
            .take_while(|&idx| self.stations[idx].latitude <= *latitude.end())
            .filter(|&idx| longitude.contains(&self.stations[idx].longitude))
            .collect();

        hits.sort_unstable();
        hits.into_iter()
            .map(|idx| self.stations[idx].clone())
            .collect()
    }

    pub fn search_stations(&self, text: &str, limit: usize) -> Vec<StationSummary> {
        let needle = text.trim().to_uppercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut picked: Vec<usize> = Vec::with_capacity(limit.min(self.stations.len()));
        let mut seen: HashSet<usize> = HashSet::new();
        let mut take = |idx: usize, picked: &mut Vec<usize>| {
            if picked.len() < limit && seen.insert(idx) {
                picked.push(idx);
            }
        };

        // Exact code, then code prefix, then name substring.
        if let Some(&idx) = StationCode::parse(&needle)
            .ok()
            .and_then(|code| self.by_code.get(&code))
        {
            take(idx, &mut picked);
        }
        for (idx, station) in self.stations.iter().enumerate() {
            if station.code.as_str().starts_with(&needle) {
                take(idx, &mut picked);
            }
        }
        for (idx, key) in self.name_keys.iter().enumerate() {
            if key.contains(&needle) {
                take(idx, &mut picked);
            }
        }

        picked
            .into_iter()
            .map(|idx| StationSummary::from(self.stations[idx].as_ref()))
            .collect()
    }

    pub fn trains_between(
        &self,
        from: &HashSet<StationCode>,
        to: &HashSet<StationCode>,
    ) -> Vec<Arc<Train>> {
        let mut hits: Vec<usize> = Vec::new();
        for origin in from {
            for destination in to {
                if let Some(indices) = self.by_route.get(&(*origin, *destination)) {
                    hits.extend_from_slice(indices);
                }
            }
        }

        hits.sort_unstable();
        hits.into_iter()
            .map(|idx| self.trains[idx].clone())
            .collect()
    }

    pub fn train(&self, number: &str) -> Option<Arc<Train>> {
        self.by_number
            .get(number.trim())
            .map(|&idx| self.trains[idx].clone())
    }

    pub fn schedule_for(&self, number: &str) -> Vec<ScheduleStop> {
        self.schedules
            .get(number.trim())
            .cloned()
            .unwrap_or_default()
    }
}

fn validate_coordinates(station: &Station) -> Result<(), CatalogError> {
    let lat_ok = station.latitude.is_finite() && (-90.0..=90.0).contains(&station.latitude);
    let lon_ok = station.longitude.is_finite() && (-180.0..=180.0).contains(&station.longitude);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(CatalogError::invalid(format!(
            "station {} has coordinates out of range ({}, {})",
            station.code, station.latitude, station.longitude
        )))
    }
}

impl Versioned for Arc<CatalogSnapshot> {
    fn generation(&self) -> u64 {
        self.generation
    }
}

impl StationCatalog for Arc<CatalogSnapshot> {
    type Pinned = Arc<CatalogSnapshot>;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.clone())
    }

    async fn find_by_code(&self, code: StationCode) -> Result<Option<Arc<Station>>, CatalogError> {
        Ok(self.station(code))
    }

    async fn find_nearby_box(
        &self,
        latitude: RangeInclusive<f64>,
        longitude: RangeInclusive<f64>,
    ) -> Result<Vec<Arc<Station>>, CatalogError> {
        Ok(self.stations_in_box(&latitude, &longitude))
    }

    async fn search_by_prefix_or_name(
        &self,
        text: &str,
        limit: usize,
    ) -> Result<Vec<StationSummary>, CatalogError> {
        Ok(self.search_stations(text, limit))
    }
}

impl TrainCatalog for Arc<CatalogSnapshot> {
    type Pinned = Arc<CatalogSnapshot>;

    async fn pin(&self) -> Result<Self::Pinned, CatalogError> {
        Ok(self.clone())
    }

    async fn find_between(
        &self,
        from: &HashSet<StationCode>,
        to: &HashSet<StationCode>,
    ) -> Result<Vec<Arc<Train>>, CatalogError> {
        Ok(self.trains_between(from, to))
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Arc<Train>>, CatalogError> {
        Ok(self.train(number))
    }

    async fn schedule(&self, number: &str) -> Result<Vec<ScheduleStop>, CatalogError> {
        Ok(self.schedule_for(number))
    }
}
