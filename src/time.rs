//! Calendar and GPS time algebra
//!
//! Every remote path and filename in the archive catalog is parametrised by
//! fields computed here (4- and 2-digit year, day of year, GPS week, day of
//! week, hour). The representation used for arithmetic is [`Epoch`]: a
//! modified Julian day count plus seconds of day.
//!
//! The Julian-day formulas floor at every step exactly as the classic
//! reference formula does. An off-by-one here corrupts every downstream
//! filename, so the conversions are covered by round-trip property tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds in one GPS week
pub const SECONDS_PER_WEEK: f64 = 604_800.0;

/// Modified Julian day of the GPS epoch (1980-01-06 00:00:00)
pub const GPS_EPOCH_DAY: i32 = 44_244;

/// Offset between the Julian-day sum and the modified Julian day
const MJD_OFFSET: i64 = 679_019;

/// Small bias added before each `floor`, as the reference formula does
const FLOOR_BIAS: f64 = 1.0e-9;

/// Errors raised when building calendar values
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeError {
    /// A calendar field is out of range
    #[error("invalid calendar field: {0}")]
    InvalidField(String),
}

/// Continuous time representation: day count plus seconds of day.
///
/// Invariant: `0 <= seconds_of_day < 86400`. Every constructor and every
/// arithmetic operation re-normalises, carrying into `day_count`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Epoch {
    day_count: i32,
    seconds_of_day: f64,
}

impl Epoch {
    /// Create an epoch, normalising `seconds_of_day` into `[0, 86400)`
    pub fn new(day_count: i32, seconds_of_day: f64) -> Self {
        Self {
            day_count,
            seconds_of_day: 0.0,
        }
        .add_seconds(seconds_of_day)
    }

    /// The GPS time origin, 1980-01-06 00:00:00
    pub fn gps_epoch() -> Self {
        Self {
            day_count: GPS_EPOCH_DAY,
            seconds_of_day: 0.0,
        }
    }

    /// Modified Julian day count
    pub fn day_count(&self) -> i32 {
        self.day_count
    }

    /// Seconds elapsed since midnight
    pub fn seconds_of_day(&self) -> f64 {
        self.seconds_of_day
    }

    /// Hour of day (0-23)
    pub fn hour(&self) -> u32 {
        (self.seconds_of_day / 3600.0).floor() as u32
    }

    /// Minute of hour (0-59)
    pub fn minute(&self) -> u32 {
        ((self.seconds_of_day - f64::from(self.hour()) * 3600.0) / 60.0).floor() as u32
    }

    /// Shift by a signed number of seconds.
    ///
    /// Normalisation is loop-free, so arbitrarily large offsets cost the same.
    pub fn add_seconds(&self, dt: f64) -> Self {
        let total = self.seconds_of_day + dt;
        let carry = (total / SECONDS_PER_DAY).floor();
        let mut day_count = self.day_count + carry as i32;
        let mut seconds_of_day = total - carry * SECONDS_PER_DAY;

        // floating residue can land exactly on either boundary
        if seconds_of_day >= SECONDS_PER_DAY {
            seconds_of_day -= SECONDS_PER_DAY;
            day_count += 1;
        } else if seconds_of_day < 0.0 {
            seconds_of_day += SECONDS_PER_DAY;
            day_count -= 1;
        }

        Self {
            day_count,
            seconds_of_day,
        }
    }

    /// Shift by whole days
    pub fn add_days(&self, days: i32) -> Self {
        Self {
            day_count: self.day_count + days,
            seconds_of_day: self.seconds_of_day,
        }
    }

    /// `self - other` in seconds
    pub fn diff_seconds(&self, other: &Epoch) -> f64 {
        f64::from(self.day_count - other.day_count) * SECONDS_PER_DAY
            + (self.seconds_of_day - other.seconds_of_day)
    }

    /// Midnight of the same day
    pub fn start_of_day(&self) -> Self {
        Self {
            day_count: self.day_count,
            seconds_of_day: 0.0,
        }
    }

    /// Midnight of the Sunday that opens this epoch's GPS week
    pub fn start_of_gps_week(&self) -> Self {
        let gps = self.to_gps_time();
        Self::from_gps_time(gps.week, 0.0)
    }

    /// Convert to calendar fields (inverse Julian-day formula)
    pub fn to_calendar_date(&self) -> CalendarDate {
        let mut day_count = self.day_count;
        let sod = self.seconds_of_day;

        let mut hour = (sod / 3600.0).floor() as u32;
        let remainder = sod - f64::from(hour) * 3600.0;
        let mut minute = (remainder / 60.0).floor() as u32;
        let mut second = remainder - f64::from(minute) * 60.0;

        // rounding rule: 59.999+ seconds carry into the minute, 60 minutes into the hour
        if second > 59.999 {
            second = 0.0;
            minute += 1;
        }
        if minute >= 60 {
            minute -= 60;
            hour += 1;
        }
        if hour >= 24 {
            hour -= 24;
            day_count += 1;
        }

        let (year, month, day) = civil_from_day_count(day_count);
        CalendarDate {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Year and 1-based day of year
    pub fn day_of_year(&self) -> (i32, u32) {
        let year = self.to_calendar_date().year;
        let jan1 = CalendarDate::jan1(year).to_epoch();
        // whole-day difference: intra-day seconds never bump the day number
        let days = self.start_of_day().diff_seconds(&jan1) / SECONDS_PER_DAY;
        (year, days.round() as u32 + 1)
    }

    /// Build an epoch from a year and 1-based day of year
    pub fn from_year_doy(year: i32, doy: u32) -> Self {
        let jan1 = CalendarDate::jan1(normalize_year(year)).to_epoch();
        jan1.add_days(doy as i32 - 1)
    }

    /// GPS week, seconds of week and day of week
    pub fn to_gps_time(&self) -> GpsTime {
        let days = self.day_count - GPS_EPOCH_DAY;
        let week = days.div_euclid(7);
        let day_of_week = days.rem_euclid(7) as u32;
        GpsTime {
            week,
            seconds_of_week: f64::from(day_of_week) * SECONDS_PER_DAY + self.seconds_of_day,
            day_of_week,
        }
    }

    /// Inverse of [`Epoch::to_gps_time`]
    pub fn from_gps_time(week: i32, seconds_of_week: f64) -> Self {
        Self::gps_epoch().add_seconds(f64::from(week) * SECONDS_PER_WEEK + seconds_of_week)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_calendar_date())
    }
}

/// Broken-down Gregorian calendar time with a 4-digit year
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarDate {
    /// 4-digit year
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Hour (0-23)
    pub hour: u32,
    /// Minute (0-59)
    pub minute: u32,
    /// Seconds, fractional
    pub second: f64,
}

impl CalendarDate {
    /// Validate and build a calendar date.
    ///
    /// Two-digit years are normalised: `yy <= 50` maps to `20yy`, otherwise `19yy`.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    ) -> Result<Self, TimeError> {
        let year = normalize_year(year);

        if !(1..=12).contains(&month) {
            return Err(TimeError::InvalidField(format!("month {month}")));
        }
        if day == 0 || day > days_in_month(year, month) {
            return Err(TimeError::InvalidField(format!(
                "day {day} in {year:04}-{month:02}"
            )));
        }
        if hour > 23 {
            return Err(TimeError::InvalidField(format!("hour {hour}")));
        }
        if minute > 59 {
            return Err(TimeError::InvalidField(format!("minute {minute}")));
        }
        if !(0.0..60.0).contains(&second) {
            return Err(TimeError::InvalidField(format!("second {second}")));
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Midnight of a calendar day
    pub fn ymd(year: i32, month: u32, day: u32) -> Result<Self, TimeError> {
        Self::new(year, month, day, 0, 0, 0.0)
    }

    fn jan1(year: i32) -> Self {
        Self {
            year,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0.0,
        }
    }

    /// Convert to an [`Epoch`] with the Julian-day formula.
    ///
    /// January and February count as months 13 and 14 of the previous year.
    pub fn to_epoch(&self) -> Epoch {
        let (mut year, mut month) = (i64::from(self.year), i64::from(self.month));
        if month <= 2 {
            year -= 1;
            month += 12;
        }

        let year_days = (365.25 * year as f64 + FLOOR_BIAS).floor() as i64;
        let month_days = (30.6001 * (month + 1) as f64 + FLOOR_BIAS).floor() as i64;
        let day_count = year_days + month_days + i64::from(self.day) - MJD_OFFSET;

        Epoch::new(
            day_count as i32,
            f64::from(self.hour) * 3600.0 + f64::from(self.minute) * 60.0 + self.second,
        )
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:06.3}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// GPS week representation of an epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsTime {
    /// Weeks since 1980-01-06
    pub week: i32,
    /// Seconds since the start of the week
    pub seconds_of_week: f64,
    /// Day of week, Sunday = 0
    pub day_of_week: u32,
}

/// Normalise a possibly 2-digit year to four digits
pub fn normalize_year(year: i32) -> i32 {
    match year {
        0..=50 => year + 2000,
        51..=99 => year + 1900,
        _ => year,
    }
}

/// Render a 4-digit year, zero padded
pub fn format_year4(year: i32) -> String {
    format!("{:04}", year)
}

/// Render the 2-digit year used by short filenames ("2023" -> "23")
pub fn format_year2(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}

/// Render a day of year as exactly three digits ("1" -> "001")
pub fn format_day_of_year(doy: u32) -> String {
    format!("{:03}", doy)
}

/// Render a GPS week as at least four digits
pub fn format_gps_week(week: i32) -> String {
    format!("{:04}", week)
}

/// Hour letter used by hourly short filenames (0 -> 'a', 23 -> 'x')
pub fn hour_letter(hour: u32) -> char {
    char::from(b'a' + (hour.min(23) as u8))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Inverse Julian-day formula on a whole day count
fn civil_from_day_count(day_count: i32) -> (i32, u32, u32) {
    let a = f64::from(day_count) + 2_400_001.0;
    let b = a + 1537.0;
    let c = ((b - 122.1) / 365.25 + FLOOR_BIAS).floor();
    let d = (365.25 * c + FLOOR_BIAS).floor();
    let e = ((b - d) / 30.6001 + FLOOR_BIAS).floor();
    let day = b - d - (30.6001 * e).floor();
    let month = e - 1.0 - 12.0 * (e / 14.0 + FLOOR_BIAS).floor();
    let year = c - 4715.0 - ((7.0 + month) / 10.0 + FLOOR_BIAS).floor();

    (year as i32, month as u32, day as u32)
}
