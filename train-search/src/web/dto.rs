//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{ScheduleStop, Train};
use crate::search::{SearchError, SearchQuery};

/// Query for station autocomplete.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    /// Partial station code or name
    #[serde(default)]
    pub q: String,
}

/// Query for train search.
///
/// Slot parameters may repeat (`departure_time=slot1&departure_time=slot5`),
/// which the derived `Deserialize` for `Query` cannot express, so the request
/// is assembled from raw key/value pairs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrainSearchRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub class: Option<String>,
    /// Travel date, YYYY-MM-DD
    pub date: Option<String>,
    pub departure_time: Vec<String>,
    pub arrival_time: Vec<String>,
}

impl TrainSearchRequest {
    /// Collect recognised parameters; for single-valued ones the last wins.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut request = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "from" => request.from = Some(value),
                "to" => request.to = Some(value),
                "class" => request.class = Some(value),
                "date" => request.date = Some(value),
                "departure_time" => request.departure_time.push(value),
                "arrival_time" => request.arrival_time.push(value),
                _ => {}
            }
        }
        request
    }

    /// Convert into an engine query. Only the date is checked here.
    pub fn into_query(self) -> Result<SearchQuery, SearchError> {
        let mut query = SearchQuery::new(
            self.from.unwrap_or_default(),
            self.to.unwrap_or_default(),
        )
        .with_departure_slots(self.departure_time)
        .with_arrival_slots(self.arrival_time);

        if let Some(class) = self.class {
            query = query.with_ticket_class(class);
        }

        if let Some(date) = self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                SearchError::InvalidQuery(format!("date must be YYYY-MM-DD, got {date:?}"))
            })?;
            query = query.with_date(date);
        }

        Ok(query)
    }
}

/// A train in search results.
#[derive(Debug, Serialize)]
pub struct TrainResult {
    pub number: String,
    pub name: String,
    pub from_station_code: String,
    pub from_station_name: String,
    pub to_station_code: String,
    pub to_station_name: String,
    /// Departure from origin, HH:MM
    pub departure: String,
    /// Arrival at destination, HH:MM
    pub arrival: String,
    pub duration_h: u32,
    pub duration_m: u32,
}

impl From<&Train> for TrainResult {
    fn from(train: &Train) -> Self {
        Self {
            number: train.number.clone(),
            name: train.name.clone(),
            from_station_code: train.from_station_code.to_string(),
            from_station_name: train.from_station_name.clone(),
            to_station_code: train.to_station_code.to_string(),
            to_station_name: train.to_station_name.clone(),
            departure: train.departure.to_string(),
            arrival: train.arrival.to_string(),
            duration_h: train.duration_h,
            duration_m: train.duration_m,
        }
    }
}

/// One stop in a train schedule.
#[derive(Debug, Serialize)]
pub struct ScheduleStopResult {
    pub station_code: String,
    pub station_name: String,
    /// Day of the journey, starting at 1
    pub day: u32,
    /// Absent at the origin
    pub arrival: Option<String>,
    /// Absent at the terminus
    pub departure: Option<String>,
}

impl From<&ScheduleStop> for ScheduleStopResult {
    fn from(stop: &ScheduleStop) -> Self {
        Self {
            station_code: stop.station_code.to_string(),
            station_name: stop.station_name.clone(),
            day: stop.day,
            arrival: stop.arrival.map(|t| t.to_string()),
            departure: stop.departure.map(|t| t.to_string()),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::domain::ClassAvailability;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_repeated_slots() {
        let request = TrainSearchRequest::from_pairs(pairs(&[
            ("from", "SBC"),
            ("to", "MAS"),
            ("departure_time", "slot1"),
            ("departure_time", "slot5"),
            ("arrival_time", "slot2"),
            ("utm_source", "ignored"),
        ]));

        assert_eq!(request.from.as_deref(), Some("SBC"));
        assert_eq!(request.departure_time, vec!["slot1", "slot5"]);
        assert_eq!(request.arrival_time, vec!["slot2"]);
        assert_eq!(request.class, None);
    }

    #[test]
    fn into_query_parses_date() {
        let query = TrainSearchRequest::from_pairs(pairs(&[
            ("from", "SBC"),
            ("to", "MAS"),
            ("class", "3A"),
            ("date", "2024-03-15"),
        ]))
        .into_query()
        .unwrap();

        assert_eq!(query.from_station_code, "SBC");
        assert_eq!(query.ticket_class.as_deref(), Some("3A"));
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn blank_date_is_absent() {
        let query = TrainSearchRequest::from_pairs(pairs(&[("date", " ")]))
            .into_query()
            .unwrap();
        assert_eq!(query.date, None);
    }

    #[test]
    fn malformed_date_is_invalid_query() {
        let err = TrainSearchRequest::from_pairs(pairs(&[("date", "15/03/2024")]))
            .into_query()
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[test]
    fn train_result_omits_availability() {
        let train = fixtures::train("12028", "SBC", "MAS", "06:00", "11:00", ClassAvailability::all());
        let json = serde_json::to_value(TrainResult::from(&train)).unwrap();

        assert_eq!(json["number"], "12028");
        assert_eq!(json["from_station_code"], "SBC");
        assert_eq!(json["departure"], "06:00");
        assert_eq!(json["duration_h"], 5);
        assert!(json.get("first_ac").is_none());
        assert!(json.get("sleeper").is_none());
    }

    #[test]
    fn schedule_stop_result_keeps_missing_times() {
        let stops = fixtures::document().schedules;
        let origin = ScheduleStopResult::from(&stops[0]);
        assert_eq!(origin.arrival, None);
        assert_eq!(origin.departure.as_deref(), Some("06:00"));
    }
}
