//! Time-of-day slot filtering.
//!
//! A day is split into five slots (`slot1`..`slot5`). Where the slots begin
//! is configuration: a [`SlotTable`] holds five strictly increasing start
//! times, slot *i* runs up to the start of slot *i+1*, and `slot5` runs to
//! midnight. Times before the first start belong to no slot.

use std::fmt;
use std::str::FromStr;

use crate::domain::{ClockTime, TimeError};

/// Error returned for an unrecognized slot identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time slot: {0:?}")]
pub struct InvalidSlot(pub String);

/// Error returned when a slot table is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSlotTable {
    #[error("expected 5 slot start times, got {0}")]
    WrongCount(usize),

    #[error("slot start times must be strictly increasing")]
    NotIncreasing,

    #[error("bad slot start time: {0}")]
    Time(#[from] TimeError),
}

/// One of the five slots of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSlot {
    Slot1,
    Slot2,
    Slot3,
    Slot4,
    Slot5,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::Slot1,
        TimeSlot::Slot2,
        TimeSlot::Slot3,
        TimeSlot::Slot4,
        TimeSlot::Slot5,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            TimeSlot::Slot1 => "slot1",
            TimeSlot::Slot2 => "slot2",
            TimeSlot::Slot3 => "slot3",
            TimeSlot::Slot4 => "slot4",
            TimeSlot::Slot5 => "slot5",
        }
    }

    fn index(&self) -> usize {
        match self {
            TimeSlot::Slot1 => 0,
            TimeSlot::Slot2 => 1,
            TimeSlot::Slot3 => 2,
            TimeSlot::Slot4 => 3,
            TimeSlot::Slot5 => 4,
        }
    }

    /// Parse a slot identifier. Only the exact ids `slot1` to `slot5` are
    /// accepted.
    pub fn parse(s: &str) -> Result<Self, InvalidSlot> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.id() == s)
            .ok_or_else(|| InvalidSlot(s.to_string()))
    }
}

impl FromStr for TimeSlot {
    type Err = InvalidSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parse every identifier, failing on the first unknown one.
pub fn parse_slots<S: AsRef<str>>(ids: &[S]) -> Result<Vec<TimeSlot>, InvalidSlot> {
    ids.iter().map(|id| TimeSlot::parse(id.as_ref())).collect()
}

/// Start times of the five slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTable {
    starts: [ClockTime; 5],
}

impl SlotTable {
    pub fn new(starts: [ClockTime; 5]) -> Result<Self, InvalidSlotTable> {
        if starts.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvalidSlotTable::NotIncreasing);
        }
        Ok(Self { starts })
    }

    /// The historical table: an eight-hour night slot, then four-hour slots.
    ///
    /// | slot  | window        |
    /// |-------|---------------|
    /// | slot1 | 00:00 – 08:00 |
    /// | slot2 | 08:00 – 12:00 |
    /// | slot3 | 12:00 – 16:00 |
    /// | slot4 | 16:00 – 20:00 |
    /// | slot5 | 20:00 – 24:00 |
    pub fn legacy() -> Self {
        let at = |hour| ClockTime::from_hm(hour, 0).unwrap_or(ClockTime::MIDNIGHT);
        Self {
            starts: [at(0), at(8), at(12), at(16), at(20)],
        }
    }

    /// Parse a comma-separated list of five "HH:MM" start times.
    pub fn parse(s: &str) -> Result<Self, InvalidSlotTable> {
        let times = s
            .split(',')
            .map(|part| ClockTime::parse_hhmm(part.trim()))
            .collect::<Result<Vec<_>, _>>()?;

        let starts: [ClockTime; 5] = times
            .try_into()
            .map_err(|times: Vec<ClockTime>| InvalidSlotTable::WrongCount(times.len()))?;

        Self::new(starts)
    }

    /// Start of `slot` and the start of the next one (`None` means midnight).
    pub fn window(&self, slot: TimeSlot) -> (ClockTime, Option<ClockTime>) {
        let idx = slot.index();
        (self.starts[idx], self.starts.get(idx + 1).copied())
    }

    /// The slot containing `time`, if any.
    pub fn slot_of(&self, time: ClockTime) -> Option<TimeSlot> {
        TimeSlot::ALL
            .into_iter()
            .rev()
            .find(|slot| self.starts[slot.index()] <= time)
    }

    /// True when no slots are requested or `time` lies in one of them.
    pub fn matches(&self, time: ClockTime, slots: &[TimeSlot]) -> bool {
        if slots.is_empty() {
            return true;
        }
        self.slot_of(time).is_some_and(|slot| slots.contains(&slot))
    }
}

impl Default for SlotTable {
    fn default() -> Self {
        Self::legacy()
    }
}

impl fmt::Display for SlotTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, start) in self.starts.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{start}")?;
        }
        Ok(())
    }
}
