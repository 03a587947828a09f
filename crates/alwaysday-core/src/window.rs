//! Skip window - the half-open time-of-day range forced forward to a target

use crate::{AlwaysDayResult, TimeOfDay};

pub const DEFAULT_START: TimeOfDay = hm(20, 50);
pub const DEFAULT_END: TimeOfDay = hm(21, 0);
pub const DEFAULT_TARGET: TimeOfDay = hm(7, 0);

const fn hm(hours: u32, minutes: u32) -> TimeOfDay {
    match TimeOfDay::from_hms(hours, minutes, 0) {
        Some(t) => t,
        None => TimeOfDay::MIDNIGHT,
    }
}

/// Skip window configuration
///
/// `[start, end)` has no midnight wraparound: `start >= end` is an empty
/// window that never matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SkipWindow {
    /// First time of day that triggers a skip
    pub start: TimeOfDay,
    /// First time of day past the window
    pub end: TimeOfDay,
    /// Time of day the clock lands on after a skip
    pub target: TimeOfDay,
}

impl Default for SkipWindow {
    fn default() -> Self {
        SkipWindow {
            start: DEFAULT_START,
            end: DEFAULT_END,
            target: DEFAULT_TARGET,
        }
    }
}

impl SkipWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay, target: TimeOfDay) -> Self {
        SkipWindow { start, end, target }
    }

    /// Parse all three values; the first failure is returned
    pub fn parse(start: &str, end: &str, target: &str) -> AlwaysDayResult<Self> {
        Ok(SkipWindow {
            start: start.parse()?,
            end: end.parse()?,
            target: target.parse()?,
        })
    }

    /// `start <= t < end`
    #[inline]
    pub fn contains(&self, t: TimeOfDay) -> bool {
        self.start <= t && t < self.end
    }

    /// True for `start == end` and for inverted windows
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// A target inside the window would re-trigger on the next tick
    #[inline]
    pub fn target_in_window(&self) -> bool {
        self.contains(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let w = SkipWindow::default();
        assert_eq!(w.start, tod("20:50"));
        assert_eq!(w.end, tod("21:00"));
        assert_eq!(w.target, tod("07:00"));
        assert!(!w.is_empty());
        assert!(!w.target_in_window());
    }

    #[test]
    fn test_half_open() {
        let w = SkipWindow::default();
        assert!(!w.contains(tod("20:49:59")));
        assert!(w.contains(tod("20:50")));
        assert!(w.contains(tod("20:59:59")));
        assert!(!w.contains(tod("21:00")));
    }

    #[test]
    fn test_empty_and_inverted_never_match() {
        let same = SkipWindow::new(tod("21:00"), tod("21:00"), tod("07:00"));
        let crossing = SkipWindow::new(tod("23:00"), tod("01:00"), tod("07:00"));
        assert!(same.is_empty());
        assert!(crossing.is_empty());
        for minute in 0..24 * 60 {
            let t = TimeOfDay::from_hms(minute / 60, minute % 60, 0).unwrap();
            assert!(!same.contains(t));
            assert!(!crossing.contains(t));
        }
    }

    #[test]
    fn test_parse_reports_first_failure() {
        let err = SkipWindow::parse("20:50", "nope", "07:00").unwrap_err();
        assert!(err.to_string().contains("'nope'"));
        assert_eq!(
            SkipWindow::parse("20:50", "21:00", "07:00").unwrap(),
            SkipWindow::default()
        );
    }
}
