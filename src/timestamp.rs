//! MS-DOS timestamp handling.
//!
//! ZIP headers store the last-modification time as a packed MS-DOS date and
//! time pair:
//! - date: bits 9-15 year since 1980, bits 5-8 month, bits 0-4 day
//! - time: bits 11-15 hour, bits 5-10 minute, bits 0-4 second / 2
//!
//! The representation has two-second granularity and covers 1980 to 2107.
//! Values outside that range are clamped.
//!
//! # Example
//!
//! ```rust
//! use chunkzip::DosDateTime;
//!
//! let ts = DosDateTime::from_unix_secs(1_700_000_000);
//! assert_eq!(ts.year(), 2023);
//! assert_eq!(ts.month(), 11);
//! assert_eq!(ts.day(), 14);
//! ```

use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};

/// Earliest representable instant: 1980-01-01 00:00:00.
const DOS_EPOCH: DosDateTime = DosDateTime::from_parts(0x0021, 0x0000);

/// Latest representable instant: 2107-12-31 23:59:58.
const DOS_MAX: DosDateTime = DosDateTime::from_parts(0xFF9F, 0xBF7D);

/// A date and time stored as per the MS-DOS representation used by ZIP files.
///
/// DOS timestamps carry no time zone; by convention they hold local time.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct DosDateTime {
    pub(crate) date: u16,
    pub(crate) time: u16,
}

impl DosDateTime {
    /// Creates a timestamp from the raw packed date and time words.
    pub const fn from_parts(date: u16, time: u16) -> Self {
        Self { date, time }
    }

    /// Returns the current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    /// Converts a [`SystemTime`] to local time, clamping to the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_datetime(&DateTime::<Local>::from(time))
    }

    /// Converts seconds since the Unix epoch, read as UTC, clamping to 1980..=2107.
    pub fn from_unix_secs(secs: i64) -> Self {
        match DateTime::<Utc>::from_timestamp(secs, 0) {
            Some(dt) => Self::from_datetime(&dt),
            None if secs < 0 => DOS_EPOCH,
            None => DOS_MAX,
        }
    }

    /// Packs the wall-clock fields of `dt`, clamping to 1980..=2107.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        let year = dt.year();
        if year < 1980 {
            return DOS_EPOCH;
        }
        if year > 2107 {
            return DOS_MAX;
        }

        let (month, day) = (dt.month() as u16, dt.day() as u16);
        let (hour, minute, second) = (dt.hour() as u16, dt.minute() as u16, dt.second() as u16);
        Self {
            date: (((year - 1980) as u16) << 9) | (month << 5) | day,
            time: (hour << 11) | (minute << 5) | (second / 2),
        }
    }

    /// Returns the packed date word.
    pub fn date(&self) -> u16 {
        self.date
    }

    /// Returns the packed time word.
    pub fn time(&self) -> u16 {
        self.time
    }

    /// Returns the year of this date & time.
    pub fn year(&self) -> i32 {
        (((self.date & 0xFE00) >> 9) + 1980).into()
    }

    /// Returns the month of this date & time.
    pub fn month(&self) -> u32 {
        ((self.date & 0x1E0) >> 5).into()
    }

    /// Returns the day of this date & time.
    pub fn day(&self) -> u32 {
        (self.date & 0x1F).into()
    }

    /// Returns the hour of this date & time.
    pub fn hour(&self) -> u32 {
        ((self.time & 0xF800) >> 11).into()
    }

    /// Returns the minute of this date & time.
    pub fn minute(&self) -> u32 {
        ((self.time & 0x7E0) >> 5).into()
    }

    /// Returns the second of this date & time.
    ///
    /// Note that MS-DOS has a maximum granularity of two seconds.
    pub fn second(&self) -> u32 {
        ((self.time & 0x1F) << 1).into()
    }
}
