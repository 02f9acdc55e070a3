//! Domain types for the train search engine.
//!
//! This module contains validated reference data types. All types enforce
//! their invariants at construction time, so code that receives these types
//! can trust their validity.

mod station;
mod ticket_class;
mod time;
mod train;

pub use station::{InvalidStationCode, Station, StationCode, StationSummary};
pub use ticket_class::{ClassAvailability, InvalidTicketClass, TicketClass};
pub use time::{ClockTime, TimeError};
pub use train::{ScheduleStop, Train};
