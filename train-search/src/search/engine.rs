//! Train search orchestration.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join;
use tracing::{debug, info};

use crate::catalog::{StationCatalog, TrainCatalog, Versioned};
use crate::domain::{
    InvalidTicketClass, ScheduleStop, StationCode, StationSummary, TicketClass, Train,
};

use super::bounded;
use super::config::SearchConfig;
use super::proximity::{ProximityResolver, ResolveError, StationSet};
use super::slots::{InvalidSlot, TimeSlot, parse_slots};

/// How many times a search re-pins its catalogs when they report different
/// generations (a refresh landed between the two pins).
const PIN_ATTEMPTS: usize = 3;

/// Which end of the journey a station code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    From,
    To,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::From => "from",
            Endpoint::To => "to",
        })
    }
}

/// Error from train search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Missing or malformed request field
    #[error("invalid search request: {0}")]
    InvalidQuery(String),

    /// Endpoint code absent from the catalog
    #[error("{endpoint} station not found: {code}")]
    StationNotFound { endpoint: Endpoint, code: String },

    #[error(transparent)]
    InvalidTicketClass(#[from] InvalidTicketClass),

    #[error(transparent)]
    InvalidSlot(#[from] InvalidSlot),

    #[error("train not found: {0}")]
    TrainNotFound(String),

    /// Catalog failed or did not answer in time
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

impl SearchError {
    /// Whether retrying the same request later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::CatalogUnavailable(_))
    }
}

/// A train search request as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub from_station_code: String,
    pub to_station_code: String,
    /// Class code such as `3A`; blank means any class.
    pub ticket_class: Option<String>,
    pub departure_slots: Vec<String>,
    pub arrival_slots: Vec<String>,
    /// Travel date. Accepted for API compatibility; trains run daily.
    pub date: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from_station_code: from.into(),
            to_station_code: to.into(),
            ..Self::default()
        }
    }

    pub fn with_ticket_class(mut self, class: impl Into<String>) -> Self {
        self.ticket_class = Some(class.into());
        self
    }

    pub fn with_departure_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.departure_slots = slots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_arrival_slots<I, S>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arrival_slots = slots.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Check and parse every field without touching any catalog.
    fn parse(&self) -> Result<ParsedQuery, SearchError> {
        let from = endpoint_code(Endpoint::From, &self.from_station_code)?;
        let to = endpoint_code(Endpoint::To, &self.to_station_code)?;

        let class = match self.ticket_class.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(code) => Some(TicketClass::parse(code)?),
        };

        Ok(ParsedQuery {
            from,
            to,
            class,
            departure: parse_slots(&self.departure_slots)?,
            arrival: parse_slots(&self.arrival_slots)?,
        })
    }
}

#[derive(Debug)]
struct ParsedQuery {
    from: StationCode,
    to: StationCode,
    class: Option<TicketClass>,
    departure: Vec<TimeSlot>,
    arrival: Vec<TimeSlot>,
}

fn endpoint_code(endpoint: Endpoint, raw: &str) -> Result<StationCode, SearchError> {
    if raw.trim().is_empty() {
        return Err(SearchError::InvalidQuery(format!(
            "{endpoint} station code is required"
        )));
    }
    // A code that cannot be parsed cannot be in any catalog either.
    StationCode::parse_normalized(raw).map_err(|_| SearchError::StationNotFound {
        endpoint,
        code: raw.trim().to_string(),
    })
}

fn train_number(raw: &str) -> Result<&str, SearchError> {
    let number = raw.trim();
    if number.is_empty() {
        return Err(SearchError::InvalidQuery("train number is required".to_string()));
    }
    Ok(number)
}

/// Trains matching a query, with the station sets each end was widened to.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Matching trains in catalog order.
    pub trains: Vec<Arc<Train>>,
    pub from_stations: StationSet,
    pub to_stations: StationSet,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.trains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trains.is_empty()
    }
}

/// Searches trains between geographically widened endpoints.
///
/// Every search pins both catalogs first and runs all of its queries against
/// the pinned views, so a refresh in the middle of a search cannot mix two
/// generations of data. The two catalogs must report the same generation
/// when they serve the same data.
pub struct TrainSearchEngine<S, T> {
    stations: S,
    trains: T,
    resolver: ProximityResolver,
    config: SearchConfig,
}

impl<S: StationCatalog, T: TrainCatalog> TrainSearchEngine<S, T> {
    pub fn new(stations: S, trains: T, config: SearchConfig) -> Self {
        Self {
            stations,
            trains,
            resolver: ProximityResolver::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find trains from anywhere near `from` to anywhere near `to`.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, SearchError> {
        let parsed = query.parse()?;
        let (stations, timetable) = self.pin().await?;

        let (from_stations, to_stations) = try_join(
            self.resolve_endpoint(&stations, Endpoint::From, parsed.from),
            self.resolve_endpoint(&stations, Endpoint::To, parsed.to),
        )
        .await?;

        let candidates = bounded(
            self.config.catalog_timeout,
            timetable.find_between(&from_stations, &to_stations),
        )
        .await
        .map_err(SearchError::CatalogUnavailable)?;
        let candidate_count = candidates.len();

        let slots = &self.config.slots;
        let trains: Vec<Arc<Train>> = candidates
            .into_iter()
            .filter(|train| parsed.class.is_none_or(|class| train.availability.has(class)))
            .filter(|train| slots.matches(train.departure, &parsed.departure))
            .filter(|train| slots.matches(train.arrival, &parsed.arrival))
            .collect();

        info!(
            from = %parsed.from,
            to = %parsed.to,
            generation = stations.generation(),
            from_stations = from_stations.len(),
            to_stations = to_stations.len(),
            candidates = candidate_count,
            results = trains.len(),
            "train search complete"
        );

        Ok(SearchResult {
            trains,
            from_stations,
            to_stations,
        })
    }

    /// Stations equivalent to `code`, `code` included.
    pub async fn resolve(&self, code: &str) -> Result<StationSet, SearchError> {
        let code = endpoint_code(Endpoint::From, code)?;
        let stations = bounded(self.config.catalog_timeout, self.stations.pin())
            .await
            .map_err(SearchError::CatalogUnavailable)?;
        self.resolve_endpoint(&stations, Endpoint::From, code).await
    }

    /// Station suggestions for partially typed text.
    pub async fn autocomplete(&self, text: &str) -> Result<Vec<StationSummary>, SearchError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let suggestions = bounded(
            self.config.catalog_timeout,
            self.stations
                .search_by_prefix_or_name(text, self.config.autocomplete_limit),
        )
        .await
        .map_err(SearchError::CatalogUnavailable)?;

        debug!(text, suggestions = suggestions.len(), "autocomplete");
        Ok(suggestions)
    }

    /// The stops of a train in running order.
    pub async fn schedule(&self, number: &str) -> Result<Vec<ScheduleStop>, SearchError> {
        let number = train_number(number)?;
        let trains = bounded(self.config.catalog_timeout, self.trains.pin())
            .await
            .map_err(SearchError::CatalogUnavailable)?;
        let train = self.find_train(&trains, number).await?;
        bounded(self.config.catalog_timeout, trains.schedule(&train.number))
            .await
            .map_err(SearchError::CatalogUnavailable)
    }

    /// Look up a single train by number.
    pub async fn train(&self, number: &str) -> Result<Arc<Train>, SearchError> {
        self.find_train(&self.trains, train_number(number)?).await
    }

    async fn find_train<C: TrainCatalog>(
        &self,
        trains: &C,
        number: &str,
    ) -> Result<Arc<Train>, SearchError> {
        bounded(self.config.catalog_timeout, trains.find_by_number(number))
            .await
            .map_err(SearchError::CatalogUnavailable)?
            .ok_or_else(|| SearchError::TrainNotFound(number.to_string()))
    }

    /// Pin both catalogs at the same generation.
    async fn pin(&self) -> Result<(S::Pinned, T::Pinned), SearchError> {
        let limit = self.config.catalog_timeout;
        for attempt in 1..=PIN_ATTEMPTS {
            let (stations, trains) = try_join(
                bounded(limit, self.stations.pin()),
                bounded(limit, self.trains.pin()),
            )
            .await
            .map_err(SearchError::CatalogUnavailable)?;

            if stations.generation() == trains.generation() {
                return Ok((stations, trains));
            }
            debug!(
                attempt,
                stations = stations.generation(),
                trains = trains.generation(),
                "catalog generations differ, pinning again"
            );
        }
        Err(SearchError::CatalogUnavailable(
            "catalog changed during search".to_string(),
        ))
    }

    async fn resolve_endpoint<C: StationCatalog>(
        &self,
        stations: &C,
        endpoint: Endpoint,
        code: StationCode,
    ) -> Result<StationSet, SearchError> {
        self.resolver.resolve(stations, code).await.map_err(|e| match e {
            ResolveError::NotFound(code) => SearchError::StationNotFound {
                endpoint,
                code: code.to_string(),
            },
            ResolveError::CatalogUnavailable(message) => SearchError::CatalogUnavailable(message),
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
