//! Deterministic identifiers for METAR observations.
//!
//! Observations are never stored, so their primary key has to be derivable from the
//! observation itself and reversible back into something the upstream API can be
//! queried with. The identifier is the UTF-8 text `"{station}{YYYYMMDDHHmm}"`,
//! zero padded to 16 bytes and carried around as a [`Uuid`].

use crate::identifier::error::IdentifierError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const ID_LEN: usize = 16;
const MIN_STATION_LEN: usize = 4;
const MAX_STATION_LEN: usize = 5;
/// Station codes are assumed to be this long when decoding (see `MetarId::decode`).
const DECODED_STATION_LEN: usize = 4;
const TIME_FORMAT: &str = "%Y%m%d%H%M";

/// The composite identifier of a single METAR observation.
///
/// # Examples
///
/// ```
/// use metar_provider::MetarId;
/// use chrono::{TimeZone, Utc};
///
/// let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 53, 0).unwrap();
/// let id = MetarId::encode("KATL", time).unwrap();
/// assert_eq!(id.decode().unwrap(), ("KATL".to_string(), time));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetarId(Uuid);

impl MetarId {
    /// Packs a station code and an observation time into an identifier.
    ///
    /// The timestamp is truncated to the minute.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidArgument`] when the station code is not 4 or 5
    /// characters long, or when station code and formatted timestamp together need more
    /// than 16 bytes. With a four digit year the timestamp alone takes 12 bytes, so in
    /// practice only 4 character station codes fit.
    pub fn encode(station: &str, time: DateTime<Utc>) -> Result<Self, IdentifierError> {
        let station_len = station.chars().count();
        if !(MIN_STATION_LEN..=MAX_STATION_LEN).contains(&station_len) {
            return Err(IdentifierError::InvalidArgument(format!(
                "station code '{}' must be {} or {} characters long, got {}",
                station, MIN_STATION_LEN, MAX_STATION_LEN, station_len
            )));
        }

        let combined = format!("{}{}", station, time.format(TIME_FORMAT));
        let text = combined.as_bytes();
        if text.len() > ID_LEN {
            return Err(IdentifierError::InvalidArgument(format!(
                "combined text '{}' is {} bytes, an identifier holds at most {}",
                combined,
                text.len(),
                ID_LEN
            )));
        }

        let mut bytes = [0u8; ID_LEN];
        bytes[..text.len()].copy_from_slice(text);
        Ok(MetarId(Uuid::from_bytes(bytes)))
    }

    /// Recovers the station code and minute-resolution observation time.
    ///
    /// The station code is always read as the first 4 characters. Identifiers encoded
    /// from 5 character codes would not decode correctly, which is why `encode` only
    /// accepts them when they fit (and they never do with a 12 digit timestamp).
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidFormat`] if the bytes are not UTF-8, are too
    /// short, or the part after the station code is not a `YYYYMMDDHHmm` timestamp.
    pub fn decode(&self) -> Result<(String, DateTime<Utc>), IdentifierError> {
        let bytes = self.0.as_bytes();
        let end = bytes
            .iter()
            .rposition(|b| *b != 0)
            .map(|pos| pos + 1)
            .unwrap_or(0);
        let text = std::str::from_utf8(&bytes[..end]).map_err(|e| self.invalid(e.to_string()))?;

        let Some((split, _)) = text.char_indices().nth(DECODED_STATION_LEN) else {
            return Err(self.invalid(format!("'{}' is too short", text)));
        };
        let (station, time_part) = text.split_at(split);

        let naive = NaiveDateTime::parse_from_str(time_part, TIME_FORMAT)
            .map_err(|e| self.invalid(format!("'{}' is not a timestamp: {}", time_part, e)))?;
        Ok((station.to_string(), Utc.from_utc_datetime(&naive)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        self.0.as_bytes()
    }

    fn invalid(&self, reason: String) -> IdentifierError {
        IdentifierError::InvalidFormat {
            id: self.to_string(),
            reason,
        }
    }
}

/// Truncates a timestamp to the resolution an identifier keeps.
pub(crate) fn truncate_to_minute(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

impl From<Uuid> for MetarId {
    fn from(value: Uuid) -> Self {
        MetarId(value)
    }
}

impl From<[u8; ID_LEN]> for MetarId {
    fn from(value: [u8; ID_LEN]) -> Self {
        MetarId(Uuid::from_bytes(value))
    }
}

impl fmt::Display for MetarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for MetarId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(MetarId)
            .map_err(|e| IdentifierError::InvalidFormat {
                id: s.to_string(),
                reason: e.to_string(),
            })
    }
}
