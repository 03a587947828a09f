//! Simulated host clock
//!
//! Behaves like a server's day/night clock: time moves one minute per tick,
//! listeners hear about it after the move, and relative advances apply
//! instantly with microsecond precision.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alwaysday_core::SimulatedMoment;
use alwaysday_time::{MinuteListener, SubscriptionId, TimeControl};
use parking_lot::Mutex;
use tracing::warn;

/// One advance request received from the engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdvanceRecord {
    /// Clock value when the request arrived
    pub at: SimulatedMoment,
    pub seconds: f64,
    pub animated: bool,
}

/// In-memory [`TimeControl`]
pub struct SimulatedClock {
    now: Mutex<SimulatedMoment>,
    listeners: Mutex<BTreeMap<SubscriptionId, MinuteListener>>,
    next_subscription: AtomicU64,
    advances: Mutex<Vec<AdvanceRecord>>,
    ticks: AtomicU64,
}

impl SimulatedClock {
    pub fn starting_at(now: SimulatedMoment) -> Arc<Self> {
        Arc::new(SimulatedClock {
            now: Mutex::new(now),
            listeners: Mutex::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(1),
            advances: Mutex::new(Vec::new()),
            ticks: AtomicU64::new(0),
        })
    }

    /// Jump the clock without going through the engine
    pub fn set_moment(&self, now: SimulatedMoment) {
        *self.now.lock() = now;
    }

    /// Move one minute forward, then notify listeners
    pub fn tick_minute(&self) {
        {
            let mut now = self.now.lock();
            if let Some(next) = now.checked_add(Duration::from_secs(60)) {
                *now = next;
            }
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.notify();
    }

    pub fn tick_minutes(&self, minutes: u32) {
        for _ in 0..minutes {
            self.tick_minute();
        }
    }

    /// Notify listeners without moving time
    pub fn notify(&self) {
        // Snapshot first: listeners call back into the clock.
        let listeners: Vec<MinuteListener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn advances(&self) -> Vec<AdvanceRecord> {
        self.advances.lock().clone()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl TimeControl for SimulatedClock {
    fn current_moment(&self) -> SimulatedMoment {
        *self.now.lock()
    }

    fn advance_by_seconds(&self, seconds: f64, animated: bool) {
        let mut now = self.now.lock();
        self.advances.lock().push(AdvanceRecord {
            at: *now,
            seconds,
            animated,
        });

        if !seconds.is_finite() || seconds < 0.0 {
            warn!(seconds, "rejecting advance that is not a forward duration");
            return;
        }
        let delta = Duration::from_micros((seconds * 1_000_000.0).round() as u64);
        if let Some(next) = now.checked_add(delta) {
            *now = next;
        }
    }

    fn subscribe_minute(&self, listener: MinuteListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(id, listener);
        id
    }

    fn unsubscribe_minute(&self, id: SubscriptionId) -> bool {
        self.listeners.lock().remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment(h: u32, mi: u32) -> SimulatedMoment {
        SimulatedMoment::from_ymd_hms(2024, 1, 1, h, mi, 0).unwrap()
    }

    #[test]
    fn test_tick_moves_then_notifies() {
        let clock = SimulatedClock::starting_at(moment(10, 0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (c, s) = (Arc::clone(&clock), Arc::clone(&seen));
        clock.subscribe_minute(Arc::new(move || s.lock().push(c.current_moment())));

        clock.tick_minutes(2);
        assert_eq!(*seen.lock(), vec![moment(10, 1), moment(10, 2)]);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn test_advance_is_recorded_and_applied() {
        let clock = SimulatedClock::starting_at(moment(20, 55));
        clock.advance_by_seconds(36_300.0, false);
        assert_eq!(
            clock.current_moment(),
            SimulatedMoment::from_ymd_hms(2024, 1, 2, 7, 0, 0).unwrap()
        );
        assert_eq!(
            clock.advances(),
            vec![AdvanceRecord {
                at: moment(20, 55),
                seconds: 36_300.0,
                animated: false,
            }]
        );
    }

    #[test]
    fn test_negative_advance_is_ignored() {
        let clock = SimulatedClock::starting_at(moment(8, 0));
        clock.advance_by_seconds(-60.0, false);
        clock.advance_by_seconds(f64::NAN, false);
        assert_eq!(clock.current_moment(), moment(8, 0));
        assert_eq!(clock.advances().len(), 2);
    }

    #[test]
    fn test_set_moment_jumps_without_notifying() {
        let clock = SimulatedClock::starting_at(moment(8, 0));
        let calls = Arc::new(Mutex::new(0u32));
        let c = Arc::clone(&calls);
        clock.subscribe_minute(Arc::new(move || *c.lock() += 1));

        clock.set_moment(moment(20, 55));
        assert_eq!(clock.current_moment(), moment(20, 55));
        assert_eq!(*calls.lock(), 0);
        assert!(clock.advances().is_empty());

        clock.notify();
        assert_eq!(*calls.lock(), 1);
        assert_eq!(clock.ticks(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let clock = SimulatedClock::starting_at(moment(8, 0));
        let id = clock.subscribe_minute(Arc::new(|| {}));
        assert!(clock.unsubscribe_minute(id));
        assert!(!clock.unsubscribe_minute(id));
        assert_eq!(clock.listener_count(), 0);
    }
}
