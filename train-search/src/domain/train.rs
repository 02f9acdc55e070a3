//! Train and schedule records.

use serde::{Deserialize, Serialize};

use super::station::StationCode;
use super::ticket_class::ClassAvailability;
use super::time::ClockTime;

/// A train in the catalog: one origin, one terminus, fixed daily timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Unique train number, e.g. "12028".
    pub number: String,
    pub name: String,
    pub from_station_code: StationCode,
    pub from_station_name: String,
    pub to_station_code: StationCode,
    pub to_station_name: String,
    pub departure: ClockTime,
    /// Arrival at the terminus. May be earlier than `departure` when the run
    /// crosses midnight.
    pub arrival: ClockTime,
    pub duration_h: u32,
    pub duration_m: u32,
    #[serde(flatten)]
    pub availability: ClassAvailability,
}

impl Train {
    /// Total running time in minutes.
    pub fn duration_minutes(&self) -> u32 {
        self.duration_h * 60 + self.duration_m
    }

    /// Whether the train starts and ends at the same station.
    pub fn is_loop(&self) -> bool {
        self.from_station_code == self.to_station_code
    }
}

/// One stop in a train's schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleStop {
    pub train_number: String,
    pub station_code: StationCode,
    pub station_name: String,
    /// Running day, 1 for the day the train leaves its origin.
    pub day: u32,
    /// None at the origin.
    #[serde(default)]
    pub arrival: Option<ClockTime>,
    /// None at the terminus.
    #[serde(default)]
    pub departure: Option<ClockTime>,
}
