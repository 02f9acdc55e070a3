//! Ticket classes and per-train class availability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned for an unrecognized ticket class code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ticket class: {0:?}")]
pub struct InvalidTicketClass(pub String);

/// A fare category with its own availability flag on every train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketClass {
    /// `SL`
    Sleeper,
    /// `3A`
    ThirdAc,
    /// `2A`
    SecondAc,
    /// `1A`
    FirstAc,
    /// `CC`
    ChairCar,
    /// `1FC`
    FirstClass,
}

impl TicketClass {
    pub const ALL: [TicketClass; 6] = [
        TicketClass::Sleeper,
        TicketClass::ThirdAc,
        TicketClass::SecondAc,
        TicketClass::FirstAc,
        TicketClass::ChairCar,
        TicketClass::FirstClass,
    ];

    /// The code travellers and request parameters use.
    pub fn code(&self) -> &'static str {
        match self {
            TicketClass::Sleeper => "SL",
            TicketClass::ThirdAc => "3A",
            TicketClass::SecondAc => "2A",
            TicketClass::FirstAc => "1A",
            TicketClass::ChairCar => "CC",
            TicketClass::FirstClass => "1FC",
        }
    }

    /// Parse a class code, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, InvalidTicketClass> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|class| class.code() == normalized)
            .ok_or_else(|| InvalidTicketClass(s.to_string()))
    }
}

impl FromStr for TicketClass {
    type Err = InvalidTicketClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TicketClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which ticket classes a train carries.
///
/// Field names follow the catalog's column names, so a catalog row
/// deserializes straight into this struct. Missing columns mean the class
/// is not offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassAvailability {
    pub sleeper: bool,
    pub third_ac: bool,
    pub second_ac: bool,
    pub first_ac: bool,
    pub chair_car: bool,
    pub first_class: bool,
}

impl ClassAvailability {
    /// Availability with every class offered.
    pub fn all() -> Self {
        Self {
            sleeper: true,
            third_ac: true,
            second_ac: true,
            first_ac: true,
            chair_car: true,
            first_class: true,
        }
    }

    /// Whether the train offers `class`.
    pub fn has(&self, class: TicketClass) -> bool {
        match class {
            TicketClass::Sleeper => self.sleeper,
            TicketClass::ThirdAc => self.third_ac,
            TicketClass::SecondAc => self.second_ac,
            TicketClass::FirstAc => self.first_ac,
            TicketClass::ChairCar => self.chair_car,
            TicketClass::FirstClass => self.first_class,
        }
    }

    /// Builder-style setter, mostly for fixtures.
    pub fn with(mut self, class: TicketClass, available: bool) -> Self {
        let flag = match class {
            TicketClass::Sleeper => &mut self.sleeper,
            TicketClass::ThirdAc => &mut self.third_ac,
            TicketClass::SecondAc => &mut self.second_ac,
            TicketClass::FirstAc => &mut self.first_ac,
            TicketClass::ChairCar => &mut self.chair_car,
            TicketClass::FirstClass => &mut self.first_class,
        };
        *flag = available;
        self
    }

    /// Classes offered, in canonical order.
    pub fn classes(&self) -> Vec<TicketClass> {
        TicketClass::ALL
            .into_iter()
            .filter(|class| self.has(*class))
            .collect()
    }
}
