//! Simulated host - clock service lookup with controllable availability

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;

use alwaysday_core::SimulatedMoment;
use alwaysday_time::{ClockHost, ClockService, TimeControl};

use crate::SimulatedClock;

/// When the clock service singleton becomes visible
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    /// Present after this many failed lookups
    After(u32),
    /// Never present
    Never,
}

/// In-memory [`ClockHost`]
pub struct SimulatedHost {
    clock: Arc<SimulatedClock>,
    availability: Availability,
    time_control_present: bool,
    lookups: AtomicU32,
}

struct SimulatedService {
    clock: Option<Arc<SimulatedClock>>,
}

impl ClockService for SimulatedService {
    fn time_control(&self) -> Option<Arc<dyn TimeControl>> {
        self.clock.clone().map(|clock| clock as Arc<dyn TimeControl>)
    }
}

impl SimulatedHost {
    /// Service and time control available from the first lookup
    pub fn ready(clock: Arc<SimulatedClock>) -> Self {
        Self::delayed(clock, 0)
    }

    /// Service appears after `failed_lookups` misses
    pub fn delayed(clock: Arc<SimulatedClock>, failed_lookups: u32) -> Self {
        SimulatedHost {
            clock,
            availability: Availability::After(failed_lookups),
            time_control_present: true,
            lookups: AtomicU32::new(0),
        }
    }

    /// Service present but its time control component is missing
    pub fn without_time_control(clock: Arc<SimulatedClock>) -> Self {
        SimulatedHost {
            time_control_present: false,
            ..Self::ready(clock)
        }
    }

    /// Service never appears
    pub fn never() -> Self {
        let epoch = SimulatedMoment::new(NaiveDateTime::default());
        SimulatedHost {
            clock: SimulatedClock::starting_at(epoch),
            availability: Availability::Never,
            time_control_present: true,
            lookups: AtomicU32::new(0),
        }
    }

    /// Lookups seen so far, successful or not
    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn clock(&self) -> &Arc<SimulatedClock> {
        &self.clock
    }
}

impl ClockHost for SimulatedHost {
    fn clock_service(&self) -> Option<Arc<dyn ClockService>> {
        let previous = self.lookups.fetch_add(1, Ordering::Relaxed);
        match self.availability {
            Availability::Never => None,
            Availability::After(misses) if previous < misses => None,
            Availability::After(_) => Some(Arc::new(SimulatedService {
                clock: self.time_control_present.then(|| Arc::clone(&self.clock)),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> Arc<SimulatedClock> {
        SimulatedClock::starting_at(SimulatedMoment::from_ymd_hms(2024, 1, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_delayed_service() {
        let host = SimulatedHost::delayed(clock(), 2);
        assert!(host.clock_service().is_none());
        assert!(host.clock_service().is_none());
        let service = host.clock_service().unwrap();
        assert!(service.time_control().is_some());
        assert_eq!(host.lookups(), 3);
    }

    #[test]
    fn test_without_time_control() {
        let host = SimulatedHost::without_time_control(clock());
        assert!(host.clock_service().unwrap().time_control().is_none());
    }

    #[test]
    fn test_never() {
        let host = SimulatedHost::never();
        for _ in 0..100 {
            assert!(host.clock_service().is_none());
        }
        assert_eq!(host.lookups(), 100);
    }
}
