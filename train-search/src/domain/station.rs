//! Station codes and station records.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Longest station code we accept (e.g. `NDLS`, `MMCT`, `SRR`).
const MAX_CODE_LEN: usize = 5;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A valid station code: 1 to 5 uppercase ASCII letters or digits.
///
/// Any `StationCode` value is valid by construction, so code that receives
/// one never has to re-check it.
///
/// # Examples
///
/// ```
/// use train_search::domain::StationCode;
///
/// let sbc = StationCode::parse("SBC").unwrap();
/// assert_eq!(sbc.as_str(), "SBC");
///
/// // Lowercase is rejected by `parse`, but accepted by `parse_normalized`
/// assert!(StationCode::parse("sbc").is_err());
/// assert_eq!(StationCode::parse_normalized(" sbc ").unwrap(), sbc);
///
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("TOOLONG").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StationCode {
    len: u8,
    bytes: [u8; MAX_CODE_LEN],
}

impl StationCode {
    /// Parse a station code from a string.
    ///
    /// The input must be 1 to 5 uppercase ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let raw = s.as_bytes();

        if raw.is_empty() || raw.len() > MAX_CODE_LEN {
            return Err(InvalidStationCode {
                reason: "must be 1 to 5 characters",
            });
        }

        if !raw
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidStationCode {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        let mut bytes = [0u8; MAX_CODE_LEN];
        bytes[..raw.len()].copy_from_slice(raw);

        Ok(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// Parse user input: surrounding whitespace is trimmed and letters are upper-cased.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever stored, so this cannot fail.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StationCode::parse_normalized(&s).map_err(serde::de::Error::custom)
    }
}

/// A station in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: StationCode,
    pub name: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Station {
    pub fn new(code: StationCode, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            code,
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Autocomplete entry: just the code and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSummary {
    pub code: StationCode,
    pub name: String,
}

impl From<&Station> for StationSummary {
    fn from(station: &Station) -> Self {
        Self {
            code: station.code,
            name: station.name.clone(),
        }
    }
}
