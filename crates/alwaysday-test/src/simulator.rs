//! Day Simulator - drives a host clock minute by minute with an engine attached
//!
//! Simulates:
//! - A host whose clock service may show up late (or never)
//! - Minute ticks across several simulated days
//! - Randomised start moments from a seeded RNG

use std::sync::Arc;
use std::time::Duration;

use alwaysday_core::{SimulatedMoment, SkipWindow, TimeOfDay};
use alwaysday_time::{AcquirePolicy, AlwaysDayEngine, TimeControl};
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{ManualScheduler, SimulatedClock, SimulatedHost};

/// What happened during a run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationReport {
    /// Minute ticks delivered
    pub ticks: u64,
    /// Advances issued by the engine
    pub skips: usize,
    /// Ticks after which the clock was still inside the window
    pub ticks_left_in_window: u64,
    /// Where each skip landed
    pub landings: Vec<SimulatedMoment>,
}

/// Engine wired to a simulated host
pub struct DaySimulator {
    clock: Arc<SimulatedClock>,
    host: Arc<SimulatedHost>,
    scheduler: Arc<ManualScheduler>,
    engine: AlwaysDayEngine,
    window: SkipWindow,
}

impl DaySimulator {
    /// Host ready from the start, default acquisition policy
    pub fn new(start: SimulatedMoment, window: SkipWindow) -> Self {
        let clock = SimulatedClock::starting_at(start);
        let host = SimulatedHost::ready(Arc::clone(&clock));
        Self::with_host(clock, host, window, AcquirePolicy::default())
    }

    pub fn with_host(
        clock: Arc<SimulatedClock>,
        host: SimulatedHost,
        window: SkipWindow,
        policy: AcquirePolicy,
    ) -> Self {
        let host = Arc::new(host);
        let scheduler = Arc::new(ManualScheduler::new());
        let engine = AlwaysDayEngine::new(host.clone(), scheduler.clone(), window, policy);
        DaySimulator {
            clock,
            host,
            scheduler,
            engine,
            window,
        }
    }

    /// Start the engine and let retries run out (or succeed)
    pub fn start(&self) {
        self.engine.start();
        while self.scheduler.run_next() {}
    }

    /// Tick the clock `minutes` times
    pub fn run_minutes(&self, minutes: u32) -> SimulationReport {
        let mut report = SimulationReport::default();
        for _ in 0..minutes {
            let before = self.clock.advances().len();
            self.clock.tick_minute();
            report.ticks += 1;

            let advances = self.clock.advances();
            if advances.len() > before {
                report.skips += advances.len() - before;
                report.landings.push(self.clock.current_moment());
            }
            if self.window.contains(self.clock.current_moment().time_of_day()) {
                report.ticks_left_in_window += 1;
            }
        }
        report
    }

    pub fn run_days(&self, days: u32) -> SimulationReport {
        self.run_minutes(days * MINUTES_PER_DAY)
    }

    pub fn clock(&self) -> &Arc<SimulatedClock> {
        &self.clock
    }

    pub fn host(&self) -> &Arc<SimulatedHost> {
        &self.host
    }

    pub fn scheduler(&self) -> &Arc<ManualScheduler> {
        &self.scheduler
    }

    pub fn engine(&self) -> &AlwaysDayEngine {
        &self.engine
    }
}

/// Random whole-minute moments between 2000 and 2099
pub fn random_moments(seed: u64, count: usize) -> Vec<SimulatedMoment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    (0..count)
        .filter_map(|_| {
            let day = rng.gen_range(0..36_500i64);
            let minute = rng.gen_range(0..24 * 60u32);
            let date = base.checked_add_signed(ChronoDuration::days(day))?;
            let time = TimeOfDay::from_hms(minute / 60, minute % 60, 0)?;
            SimulatedMoment::at(date, time)
        })
        .collect()
}

/// Minutes per simulated day
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Retry wall time a policy can spend before giving up
pub fn acquisition_budget(policy: &AcquirePolicy) -> Duration {
    policy
        .retry_interval
        .checked_mul(policy.max_attempts)
        .unwrap_or(Duration::MAX)
}
