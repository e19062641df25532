//! Wall-clock time for the time page.

use core::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};

/// Time line, then date line, as shown on the time page.
pub const TIME_PAGE_FORMAT: &str = "%H:%M:%SH\n%d/%m/%Y\n";

/// Local time at a fixed UTC offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LocalTime(DateTime<FixedOffset>);

impl LocalTime {
    /// `None` when the timestamp or the offset is out of range.
    pub fn from_unix(unix_secs: i64, offset_secs: i32) -> Option<Self> {
        let utc = DateTime::from_timestamp(unix_secs, 0)?;
        Self::from_utc(utc.naive_utc(), offset_secs)
    }

    pub fn from_utc(utc: NaiveDateTime, offset_secs: i32) -> Option<Self> {
        let offset = FixedOffset::east_opt(offset_secs)?;
        Some(Self(offset.from_utc_datetime(&utc)))
    }

    pub const fn datetime(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

impl fmt::Display for LocalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_PAGE_FORMAT))
    }
}

/// UTC time taken at a sync point and advanced by monotonic uptime since.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WallClock {
    synced: NaiveDateTime,
    synced_at_ms: u64,
}

impl WallClock {
    pub fn from_unix(unix_secs: i64, synced_at_ms: u64) -> Option<Self> {
        let synced = DateTime::from_timestamp(unix_secs, 0)?.naive_utc();
        Some(Self {
            synced,
            synced_at_ms,
        })
    }

    /// Uptime, in milliseconds, at which the clock was set.
    pub const fn synced_at_ms(&self) -> u64 {
        self.synced_at_ms
    }

    pub fn now(&self, uptime_ms: u64) -> NaiveDateTime {
        let elapsed = uptime_ms.saturating_sub(self.synced_at_ms);
        self.synced + Duration::milliseconds(elapsed as i64)
    }

    pub fn local(&self, uptime_ms: u64, offset_secs: i32) -> Option<LocalTime> {
        LocalTime::from_utc(self.now(uptime_ms), offset_secs)
    }
}
