//! Skip planning - the forward jump that lands the clock on the target time

use std::time::Duration;

use alwaysday_core::{SimulatedMoment, TimeOfDay, ONE_DAY};

/// A computed forward jump
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkipPlan {
    /// Moment the skip was computed at
    pub from: SimulatedMoment,
    /// Moment the clock lands on
    pub to: SimulatedMoment,
    /// `to - from`, never negative
    pub delta: Duration,
}

impl SkipPlan {
    /// Delta in the unit the host's advance call takes
    #[inline]
    pub fn delta_secs(&self) -> f64 {
        self.delta.as_secs_f64()
    }

    /// True if the jump crosses into the next simulated day
    #[inline]
    pub fn rolls_over(&self) -> bool {
        self.to.date() > self.from.date()
    }
}

/// Plan the jump from `now` to the next occurrence of `target`.
///
/// The target on `now`'s date is used unless `now` is already past it, in
/// which case the following day's target is used. Returns `None` only if the
/// landing moment falls outside the calendar range.
pub fn plan_skip(now: SimulatedMoment, target: TimeOfDay) -> Option<SkipPlan> {
    let target_today = now.midnight().checked_add(target.as_duration())?;
    let to = if now > target_today {
        target_today.checked_add(ONE_DAY)?
    } else {
        target_today
    };
    let delta = now.duration_until(to)?;
    Some(SkipPlan { from: now, to, delta })
}
