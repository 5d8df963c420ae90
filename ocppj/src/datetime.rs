//! OCPP timestamps
//!
//! Marshaling uses a process-wide format (RFC 3339 by default). Unmarshaling
//! accepts RFC 3339 with or without fractional seconds, with or without an
//! offset (absent means UTC) and with or without a colon in the offset.
//! A JSON `null` decodes to the zero time.

use chrono::{NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Marker for the default RFC 3339 format (seconds precision, `Z` for UTC)
pub const RFC3339: &str = "RFC3339";

static FORMAT: Lazy<RwLock<String>> = Lazy::new(|| RwLock::new(RFC3339.to_string()));

/// Set the process-wide marshaling format.
///
/// - [`RFC3339`]: `2023-01-01T00:00:00Z` (default)
/// - `""`: RFC 3339 with as many fractional digits as needed
/// - anything else: a `chrono` strftime pattern
pub fn set_format(format: &str) {
    *FORMAT.write() = format.to_string();
}

/// Current process-wide marshaling format
pub fn format() -> String {
    FORMAT.read().clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timestamp: {0:?}")]
pub struct DateTimeError(pub String);

/// Timestamp as carried in OCPP payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub chrono::DateTime<Utc>);

impl DateTime {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// `0001-01-01T00:00:00Z`
    pub fn zero() -> Self {
        let naive = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self(Utc.from_utc_datetime(&naive))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn inner(&self) -> chrono::DateTime<Utc> {
        self.0
    }

    /// Parse an OCPP timestamp string
    pub fn parse(s: &str) -> Result<Self, DateTimeError> {
        let bytes = s.as_bytes();
        if bytes.len() < 19 || bytes[10] != b'T' {
            return Err(DateTimeError(s.to_string()));
        }

        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        // Offset without colon, e.g. +0200
        if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Ok(Self(dt.with_timezone(&Utc)));
        }
        // No offset at all
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self(Utc.from_utc_datetime(&naive)));
        }

        Err(DateTimeError(s.to_string()))
    }

    /// Render with the process-wide format
    pub fn format(&self) -> String {
        let format = FORMAT.read();
        match format.as_str() {
            RFC3339 => self.0.to_rfc3339_opts(SecondsFormat::Secs, true),
            "" => self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            pattern => self.0.format(pattern).to_string(),
        }
    }
}

impl Default for DateTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

impl std::str::FromStr for DateTime {
    type Err = DateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}

struct DateTimeVisitor;

impl<'de> Visitor<'de> for DateTimeVisitor {
    type Value = DateTime;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an RFC 3339 timestamp")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        DateTime::parse(v).map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(DateTime::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(DateTime::zero())
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DateTimeVisitor)
    }
}
