//! Active date filter applied to every tile fetch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// TIME value sent when no date has been selected; the server resolves it to
/// the layer's default date.
pub const DEFAULT_TIME: &str = "default";

/// Wire format of a selected date.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// The optional timestamp used for the TIME dimension of tile requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateFilter {
    value: Option<String>,
}

impl DateFilter {
    /// No date selected.
    pub fn unset() -> Self {
        Self { value: None }
    }

    /// Stamp wall-clock fields as `YYYY-MM-DDTHH:MM:SSZ`.
    ///
    /// The fields are written as-is with a literal `Z`; no timezone offset is
    /// applied.
    pub fn from_wall_clock(dt: NaiveDateTime) -> Self {
        Self {
            value: Some(dt.format(TIME_FORMAT).to_string()),
        }
    }

    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::from_wall_clock(dt.naive_utc())
    }

    /// Parse a date picker value.
    ///
    /// Supports:
    /// - "2021-03-05 14:30" (picker format)
    /// - "2021-03-05 14:30:00"
    /// - "2021-03-05T14:30:00" and "2021-03-05T14:30:00Z"
    /// - "2021-03-05" (midnight)
    pub fn parse_picker(s: &str) -> Result<Self, TimeParseError> {
        let trimmed = s.trim();
        let stripped = trimmed.strip_suffix('Z').unwrap_or(trimmed);

        for format in ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(stripped, format) {
                return Ok(Self::from_wall_clock(ndt));
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(stripped, "%Y-%m-%d") {
            if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self::from_wall_clock(ndt));
            }
        }

        Err(TimeParseError::InvalidFormat(s.to_string()))
    }

    /// The selected date, if any.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Value for the TIME query parameter.
    pub fn as_param(&self) -> &str {
        self.value.as_deref().unwrap_or(DEFAULT_TIME)
    }
}

impl fmt::Display for DateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
