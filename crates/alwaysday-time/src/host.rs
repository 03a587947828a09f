//! Host boundary - what the engine consumes from the server process
//!
//! The host owns the simulated clock. The engine only ever reads the current
//! moment, asks for relative advances and listens for minute ticks.
//! Implementations use interior mutability; every method takes `&self`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alwaysday_core::SimulatedMoment;

/// Callback fired by the host once per simulated minute
pub type MinuteListener = Arc<dyn Fn() + Send + Sync>;

/// Deferred work handed to a [`RetryScheduler`]
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle returned by [`TimeControl::subscribe_minute`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Handle returned by [`RetryScheduler::schedule`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Lookup of the host's clock service singleton.
/// The singleton may appear some time after the host starts.
pub trait ClockHost: Send + Sync {
    fn clock_service(&self) -> Option<Arc<dyn ClockService>>;
}

/// The clock service singleton
pub trait ClockService: Send + Sync {
    /// Time-control sub-component; `None` means the host is broken
    fn time_control(&self) -> Option<Arc<dyn TimeControl>>;
}

/// Read/advance access to the simulated clock
pub trait TimeControl: Send + Sync {
    /// Current simulated date-time
    fn current_moment(&self) -> SimulatedMoment;

    /// Move the clock forward by `seconds`.
    /// `animated = false` applies the jump instantly.
    fn advance_by_seconds(&self, seconds: f64, animated: bool);

    /// Register a minute listener.
    /// MUST NOT invoke the listener before returning.
    fn subscribe_minute(&self, listener: MinuteListener) -> SubscriptionId;

    /// Remove a listener; returns false if it was not registered
    fn unsubscribe_minute(&self, id: SubscriptionId) -> bool;
}

/// Deferred re-invocation on the host's update loop
pub trait RetryScheduler: Send + Sync {
    /// Run `task` once after `delay`.
    /// MUST NOT run the task before returning.
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerId;

    /// Cancel a pending task. Unknown or already-fired timers are ignored.
    fn cancel(&self, timer: TimerId);
}

impl fmt::Debug for dyn TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeControl")
            .field("now", &self.current_moment())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Minimal in-crate host doubles

    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

    use parking_lot::Mutex;

    use super::*;

    pub struct FakeClock {
        now: Mutex<SimulatedMoment>,
        listeners: Mutex<BTreeMap<SubscriptionId, MinuteListener>>,
        next_id: AtomicU64,
        pub advances: Mutex<Vec<(f64, bool)>>,
    }

    impl FakeClock {
        pub fn at(now: SimulatedMoment) -> Arc<Self> {
            Arc::new(FakeClock {
                now: Mutex::new(now),
                listeners: Mutex::new(BTreeMap::new()),
                next_id: AtomicU64::new(1),
                advances: Mutex::new(Vec::new()),
            })
        }

        pub fn set(&self, now: SimulatedMoment) {
            *self.now.lock() = now;
        }

        pub fn listener_count(&self) -> usize {
            self.listeners.lock().len()
        }

        pub fn fire_minute(&self) {
            let listeners: Vec<_> = self.listeners.lock().values().cloned().collect();
            for listener in listeners {
                listener();
            }
        }
    }

    impl TimeControl for FakeClock {
        fn current_moment(&self) -> SimulatedMoment {
            *self.now.lock()
        }

        fn advance_by_seconds(&self, seconds: f64, animated: bool) {
            self.advances.lock().push((seconds, animated));
            let mut now = self.now.lock();
            if let Some(next) = now.checked_add(Duration::from_secs_f64(seconds)) {
                *now = next;
            }
        }

        fn subscribe_minute(&self, listener: MinuteListener) -> SubscriptionId {
            let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.listeners.lock().insert(id, listener);
            id
        }

        fn unsubscribe_minute(&self, id: SubscriptionId) -> bool {
            self.listeners.lock().remove(&id).is_some()
        }
    }

    /// Service that shows up after `appears_after` failed lookups
    pub struct FakeHost {
        pub clock: Arc<FakeClock>,
        pub with_time_control: bool,
        pub appears_after: u32,
        pub lookups: AtomicU32,
    }

    struct FakeService {
        clock: Option<Arc<FakeClock>>,
    }

    impl ClockService for FakeService {
        fn time_control(&self) -> Option<Arc<dyn TimeControl>> {
            self.clock.clone().map(|c| c as Arc<dyn TimeControl>)
        }
    }

    impl ClockHost for FakeHost {
        fn clock_service(&self) -> Option<Arc<dyn ClockService>> {
            let lookup = self.lookups.fetch_add(1, Ordering::Relaxed);
            if lookup < self.appears_after {
                return None;
            }
            let clock = self.with_time_control.then(|| self.clock.clone());
            Some(Arc::new(FakeService { clock }))
        }
    }

    #[derive(Default)]
    pub struct FakeScheduler {
        next_id: AtomicU64,
        pub pending: Mutex<Vec<(TimerId, Duration, ScheduledTask)>>,
        pub cancelled: Mutex<Vec<TimerId>>,
    }

    impl FakeScheduler {
        /// Run every pending task once, in scheduling order
        pub fn run_pending(&self) -> usize {
            let tasks: Vec<_> = std::mem::take(&mut *self.pending.lock());
            let count = tasks.len();
            for (_, _, task) in tasks {
                task();
            }
            count
        }
    }

    impl RetryScheduler for FakeScheduler {
        fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerId {
            let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.pending.lock().push((id, delay, task));
            id
        }

        fn cancel(&self, timer: TimerId) {
            self.cancelled.lock().push(timer);
            self.pending.lock().retain(|(id, _, _)| *id != timer);
        }
    }
}
