//! Clock handle acquisition - bounded polling for the host clock service

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alwaysday_core::AlwaysDayError;

use crate::{ClockHost, TimeControl};

/// Acquisition retry policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquirePolicy {
    /// Failed service lookups tolerated before giving up
    pub max_attempts: u32,
    /// Delay between lookups
    pub retry_interval: Duration,
}

impl Default for AcquirePolicy {
    fn default() -> Self {
        AcquirePolicy {
            max_attempts: 50,
            retry_interval: Duration::from_secs(3),
        }
    }
}

/// Outcome of a single lookup
pub enum AcquireStep {
    /// Time control is live; hand it to the controller
    Acquired(Arc<dyn TimeControl>),
    /// Service not there yet; look again after `delay`
    RetryAfter { attempt: u32, delay: Duration },
    /// Give up for this session
    Unavailable(AlwaysDayError),
}

impl fmt::Debug for AcquireStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireStep::Acquired(_) => write!(f, "Acquired"),
            AcquireStep::RetryAfter { attempt, delay } => f
                .debug_struct("RetryAfter")
                .field("attempt", attempt)
                .field("delay", delay)
                .finish(),
            AcquireStep::Unavailable(err) => f.debug_tuple("Unavailable").field(err).finish(),
        }
    }
}

/// Bounded-retry state machine for the host clock.
///
/// Only a missing service singleton is retried. A service without its time
/// control component is a broken host and fails at once.
#[derive(Clone, Debug)]
pub struct ClockAcquirer {
    policy: AcquirePolicy,
    failed_attempts: u32,
}

impl ClockAcquirer {
    pub fn new(policy: AcquirePolicy) -> Self {
        ClockAcquirer {
            policy,
            failed_attempts: 0,
        }
    }

    /// Failed lookups so far
    pub fn attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn policy(&self) -> AcquirePolicy {
        self.policy
    }

    /// Query the host once and decide what happens next
    pub fn attempt(&mut self, host: &dyn ClockHost) -> AcquireStep {
        let Some(service) = host.clock_service() else {
            self.failed_attempts += 1;
            if self.failed_attempts < self.policy.max_attempts {
                return AcquireStep::RetryAfter {
                    attempt: self.failed_attempts,
                    delay: self.policy.retry_interval,
                };
            }
            return AcquireStep::Unavailable(AlwaysDayError::AcquisitionExhausted {
                attempts: self.failed_attempts,
                waited: self
                    .policy
                    .retry_interval
                    .checked_mul(self.failed_attempts)
                    .unwrap_or(Duration::MAX),
            });
        };

        match service.time_control() {
            Some(time) => AcquireStep::Acquired(time),
            None => AcquireStep::Unavailable(AlwaysDayError::TimeControlMissing),
        }
    }
}
