// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Duration;
use chrono::FixedOffset;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::SubsecRound;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::types::date::Date;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Alternative zone-less shapes accepted when parsing. Some stored rows also
/// only carry a date.
const LENIENT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// A timestamp without a timezone and millisecond precision.
///
/// The string form is fixed-width, so comparing two serialized timestamps
/// lexicographically gives the same answer as comparing the values.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(ndt: NaiveDateTime) -> Self {
        Self(ndt.trunc_subsecs(3))
    }

    /// Midnight at the start of the given date.
    pub fn from_date(date: Date) -> Self {
        Self(date.into_inner().and_time(NaiveTime::MIN))
    }

    /// Converts a timestamp into a `NaiveDateTime`.
    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }

    /// The current timestamp in the user's local time.
    #[cfg(feature = "clock")]
    pub fn now() -> Self {
        Self(chrono::Local::now().naive_local().trunc_subsecs(3))
    }

    /// The date component of this timestamp.
    pub fn date(self) -> Date {
        Date::new(self.0.date())
    }

    pub fn start_of_day(self) -> Self {
        Self::from_date(self.date())
    }

    /// The midnight immediately following this timestamp's calendar day.
    pub fn start_of_next_day(self) -> Self {
        match self.0.date().succ_opt() {
            Some(next) => Self(next.and_time(NaiveTime::MIN)),
            None => Self(NaiveDateTime::MAX),
        }
    }

    /// Moves forward by whole days, keeping the time of day. Saturates at the
    /// last representable instant.
    pub fn plus_days(self, days: u32) -> Self {
        let shifted = self
            .0
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDateTime::MAX);
        Self(shifted)
    }
}

impl Timestamp {
    /// Converts an instant with a UTC offset into local wall-clock time.
    #[cfg(feature = "clock")]
    fn from_offset(dt: DateTime<FixedOffset>) -> Result<Self, ErrorReport> {
        Ok(Timestamp::new(dt.with_timezone(&chrono::Local).naive_local()))
    }

    /// Without a clock there is no local zone to convert into, and reading
    /// UTC wall-clock time as local would shift due dates.
    #[cfg(not(feature = "clock"))]
    fn from_offset(dt: DateTime<FixedOffset>) -> Result<Self, ErrorReport> {
        Err(ErrorReport::new(format!(
            "timestamp '{}' carries a UTC offset: send local time without an offset",
            dt.to_rfc3339()
        )))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, FORMAT) {
            return Ok(Timestamp::new(ndt));
        }
        for format in LENIENT_FORMATS {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Timestamp::new(ndt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Timestamp::from_date(Date::new(date)));
        }
        // RFC 3339 with `Z` or an offset, as emitted by `toISOString`.
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Timestamp::from_offset(dt);
        }
        Err(ErrorReport::new(format!(
            "Failed to parse timestamp: '{value}'."
        )))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> String {
        ts.to_string()
    }
}
