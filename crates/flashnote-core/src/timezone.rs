//! Timezone resolution and local/UTC conversion.
//!
//! Accounts carry an IANA timezone name. Temporal fields extracted from
//! messages ("tomorrow 20:00") are meaningful in that local zone and must
//! resolve to absolute UTC instants. Unknown or malformed names fall back
//! to a fixed offset rather than failing the pipeline.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::defaults::FALLBACK_UTC_OFFSET_HOURS;

/// A resolved local zone: a named IANA zone, or the fallback fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl LocalZone {
    /// Resolve a timezone name, falling back to the default fixed offset
    /// for anything that does not parse as an IANA name.
    pub fn resolve(name: &str) -> Self {
        match name.parse::<Tz>() {
            Ok(tz) => LocalZone::Named(tz),
            Err(_) => {
                debug!(timezone = name, "unknown timezone, using fallback offset");
                LocalZone::Fixed(fallback_offset())
            }
        }
    }

    /// The wall-clock date and time at `instant` in this zone.
    pub fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            LocalZone::Named(tz) => instant.with_timezone(tz).naive_local(),
            LocalZone::Fixed(off) => instant.with_timezone(off).naive_local(),
        }
    }

    /// The wall-clock date at `instant` in this zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local_datetime(instant).date()
    }

    /// Convert a local wall-clock datetime in this zone to epoch
    /// milliseconds.
    ///
    /// Ambiguous local times (DST overlap) resolve to the earlier
    /// instant; nonexistent local times (DST gap) resolve an hour later
    /// and shift back.
    pub fn to_utc_ms(&self, local: NaiveDateTime) -> i64 {
        match self {
            LocalZone::Fixed(off) => match off.from_local_datetime(&local).earliest() {
                Some(dt) => dt.timestamp_millis(),
                None => Utc.from_utc_datetime(&local).timestamp_millis(),
            },
            LocalZone::Named(tz) => match tz.from_local_datetime(&local).earliest() {
                Some(dt) => dt.timestamp_millis(),
                None => {
                    let shifted = local + Duration::hours(1);
                    tz.from_local_datetime(&shifted)
                        .earliest()
                        .map(|dt| dt.timestamp_millis() - 3_600_000)
                        .unwrap_or_else(|| Utc.from_utc_datetime(&local).timestamp_millis())
                }
            },
        }
    }

    /// The zone's UTC offset at `instant`, in seconds.
    pub fn offset_seconds(&self, instant: DateTime<Utc>) -> i32 {
        match self {
            LocalZone::Named(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix().local_minus_utc(),
            LocalZone::Fixed(off) => off.local_minus_utc(),
        }
    }
}

fn fallback_offset() -> FixedOffset {
    // Offset bounds guarantee this constructor cannot fail for the
    // configured default.
    FixedOffset::east_opt(FALLBACK_UTC_OFFSET_HOURS * 3600)
        .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
}
