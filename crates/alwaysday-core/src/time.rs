//! Time primitives for the AlwaysDay engine
//!
//! Two notions of time are used:
//! - TimeOfDay: an offset within a 24-hour day, as configured by operators
//! - SimulatedMoment: the host's in-simulation date-time

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::AlwaysDayError;

const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_MINUTE: u64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: u64 = 60 * MICROS_PER_MINUTE;

/// Microseconds in one simulated day. Host clocks are assumed to run 24-hour days.
pub const MICROS_PER_DAY: u64 = 24 * MICROS_PER_HOUR;

/// Length of one simulated day
pub const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Wall-clock offset within a simulated day
/// INVARIANT: 0 <= value < 24h
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeOfDay(u64);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Build from a raw microsecond offset; `None` if it reaches 24h
    #[inline]
    pub fn from_micros(micros: u64) -> Option<Self> {
        (micros < MICROS_PER_DAY).then_some(TimeOfDay(micros))
    }

    #[inline]
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Option<Self> {
        if hours >= 24 || minutes >= 60 || seconds >= 60 {
            return None;
        }
        Some(TimeOfDay(
            hours as u64 * MICROS_PER_HOUR
                + minutes as u64 * MICROS_PER_MINUTE
                + seconds as u64 * MICROS_PER_SECOND,
        ))
    }

    /// Time of day of a chrono time, truncated to microseconds.
    /// A leap second is folded into the last microsecond of its minute.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        let secs = time.num_seconds_from_midnight() as u64;
        let micros = (time.nanosecond() as u64 / 1_000).min(MICROS_PER_SECOND - 1);
        TimeOfDay(secs * MICROS_PER_SECOND + micros)
    }

    #[inline]
    pub fn as_micros(self) -> u64 {
        self.0
    }

    /// Offset from midnight
    #[inline]
    pub fn as_duration(self) -> Duration {
        Duration::from_micros(self.0)
    }

    #[inline]
    pub fn hours(self) -> u32 {
        (self.0 / MICROS_PER_HOUR) as u32
    }

    #[inline]
    pub fn minutes(self) -> u32 {
        (self.0 % MICROS_PER_HOUR / MICROS_PER_MINUTE) as u32
    }

    #[inline]
    pub fn seconds(self) -> u32 {
        (self.0 % MICROS_PER_MINUTE / MICROS_PER_SECOND) as u32
    }

    #[inline]
    pub fn subsec_micros(self) -> u32 {
        (self.0 % MICROS_PER_SECOND) as u32
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())?;
        if self.seconds() != 0 || self.subsec_micros() != 0 {
            write!(f, ":{:02}", self.seconds())?;
        }
        if self.subsec_micros() != 0 {
            write!(f, ".{:06}", self.subsec_micros())?;
        }
        Ok(())
    }
}

impl fmt::Debug for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeOfDay({})", self)
    }
}

impl FromStr for TimeOfDay {
    type Err = AlwaysDayError;

    /// Accepts `H:MM`, `HH:MM`, `HH:MM:SS` and `HH:MM:SS.ffffff`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| AlwaysDayError::InvalidTimeOfDay {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let mut parts = trimmed.split(':');
        let hours = parts.next().ok_or_else(|| invalid("empty value"))?;
        let minutes = parts.next().ok_or_else(|| invalid("expected HH:MM"))?;
        let seconds = parts.next();
        if parts.next().is_some() {
            return Err(invalid("too many ':' separators"));
        }

        let hours = parse_field(hours, 1, 2).ok_or_else(|| invalid("hours must be 1-2 digits"))?;
        let minutes = parse_field(minutes, 2, 2).ok_or_else(|| invalid("minutes must be 2 digits"))?;

        let (seconds, micros) = match seconds {
            None => (0, 0),
            Some(raw) => {
                let (whole, frac) = match raw.split_once('.') {
                    Some((whole, frac)) => (whole, Some(frac)),
                    None => (raw, None),
                };
                let seconds =
                    parse_field(whole, 2, 2).ok_or_else(|| invalid("seconds must be 2 digits"))?;
                let micros = match frac {
                    None => 0,
                    Some(frac) => parse_fraction(frac)
                        .ok_or_else(|| invalid("fraction must be 1-6 digits"))?,
                };
                (seconds, micros)
            }
        };

        let whole = TimeOfDay::from_hms(hours, minutes, seconds)
            .ok_or_else(|| invalid("out of range for a 24-hour day"))?;
        Ok(TimeOfDay(whole.0 + micros))
    }
}

fn parse_field(raw: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if raw.len() < min_len || raw.len() > max_len || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_fraction(raw: &str) -> Option<u64> {
    if raw.is_empty() || raw.len() > 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = raw.parse().ok()?;
    Some(value * 10u64.pow(6 - raw.len() as u32))
}

/// Host-reported simulated date-time
/// Read-only to the engine; only the host advances it
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimulatedMoment(NaiveDateTime);

impl SimulatedMoment {
    #[inline]
    pub fn new(value: NaiveDateTime) -> Self {
        SimulatedMoment(value)
    }

    /// Convenience constructor; `None` for an invalid calendar date or time
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(hour, min, sec)
            .map(SimulatedMoment)
    }

    /// Moment at `time` on `date`
    pub fn at(date: NaiveDate, time: TimeOfDay) -> Option<Self> {
        SimulatedMoment(date.and_time(NaiveTime::MIN)).checked_add(time.as_duration())
    }

    #[inline]
    pub fn as_datetime(self) -> NaiveDateTime {
        self.0
    }

    #[inline]
    pub fn date(self) -> NaiveDate {
        self.0.date()
    }

    #[inline]
    pub fn time_of_day(self) -> TimeOfDay {
        TimeOfDay::from_naive_time(self.0.time())
    }

    /// Start of this moment's simulated day
    #[inline]
    pub fn midnight(self) -> Self {
        SimulatedMoment(self.0.date().and_time(NaiveTime::MIN))
    }

    /// Move forward by `delta`; `None` on calendar overflow
    pub fn checked_add(self, delta: Duration) -> Option<Self> {
        let delta = TimeDelta::from_std(delta).ok()?;
        self.0.checked_add_signed(delta).map(SimulatedMoment)
    }

    /// Forward distance to `later`; `None` if `later` is before `self`
    pub fn duration_until(self, later: SimulatedMoment) -> Option<Duration> {
        (later.0 - self.0).to_std().ok()
    }
}

impl From<NaiveDateTime> for SimulatedMoment {
    fn from(value: NaiveDateTime) -> Self {
        SimulatedMoment(value)
    }
}

impl fmt::Display for SimulatedMoment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S%.f"))
    }
}

impl fmt::Debug for SimulatedMoment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimulatedMoment({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_hours_minutes() {
        assert_eq!(tod("20:50"), TimeOfDay::from_hms(20, 50, 0).unwrap());
        assert_eq!(tod("7:00"), TimeOfDay::from_hms(7, 0, 0).unwrap());
        assert_eq!(tod(" 07:00 "), TimeOfDay::from_hms(7, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_seconds_and_fraction() {
        assert_eq!(tod("06:30:15"), TimeOfDay::from_hms(6, 30, 15).unwrap());
        let t = tod("06:30:15.25");
        assert_eq!(t.seconds(), 15);
        assert_eq!(t.subsec_micros(), 250_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "7", "24:00", "12:60", "12:5", "ab:cd", "12:00:00:00", "12:00:61", "1:00:00.1234567", "-1:00"] {
            let err = bad.parse::<TimeOfDay>().unwrap_err();
            assert!(
                matches!(err, AlwaysDayError::InvalidTimeOfDay { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(tod("07:00").to_string(), "07:00");
        assert_eq!(tod("23:59:30").to_string(), "23:59:30");
        assert_eq!(tod("00:00:00.5").to_string(), "00:00:00.500000");
    }

    #[test]
    fn test_from_micros_bounds() {
        assert!(TimeOfDay::from_micros(MICROS_PER_DAY - 1).is_some());
        assert!(TimeOfDay::from_micros(MICROS_PER_DAY).is_none());
        assert_eq!(TimeOfDay::MIDNIGHT.as_micros(), 0);
        assert_eq!(tod("00:00:01.5").as_micros(), 1_500_000);
        assert_eq!(tod("23:59:59.999999").as_micros(), MICROS_PER_DAY - 1);
    }

    #[test]
    fn test_moment_time_of_day_and_midnight() {
        let m = SimulatedMoment::from_ymd_hms(2024, 1, 1, 20, 55, 0).unwrap();
        assert_eq!(m.time_of_day(), tod("20:55"));
        assert_eq!(m.midnight(), SimulatedMoment::from_ymd_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_moment_arithmetic() {
        let a = SimulatedMoment::from_ymd_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let b = a.checked_add(Duration::from_secs(2 * 3600)).unwrap();
        assert_eq!(b, SimulatedMoment::from_ymd_hms(2025, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(a.duration_until(b), Some(Duration::from_secs(7200)));
        assert_eq!(b.duration_until(a), None);
    }

    #[test]
    fn test_moment_at() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let m = SimulatedMoment::at(date, tod("07:00")).unwrap();
        assert_eq!(m.to_string(), "2024-02-29 07:00:00");
    }
}
