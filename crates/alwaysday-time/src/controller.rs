//! Window Controller - evaluates the skip window on every simulated minute

use std::sync::Arc;

use alwaysday_core::SkipWindow;
use tracing::{debug, info, trace, warn};

use crate::{plan_skip, MinuteListener, SkipPlan, SubscriptionId, TimeControl};

/// Owns the minute subscription and issues skips.
///
/// Subscription state: `Unsubscribed -> Subscribed -> Unsubscribed`. The
/// second transition only happens on shutdown.
#[derive(Clone)]
pub struct WindowController {
    time: Arc<dyn TimeControl>,
    window: SkipWindow,
    subscription: Option<SubscriptionId>,
}

impl WindowController {
    pub fn new(time: Arc<dyn TimeControl>, window: SkipWindow) -> Self {
        WindowController {
            time,
            window,
            subscription: None,
        }
    }

    pub fn window(&self) -> SkipWindow {
        self.window
    }

    /// Replace the window wholesale (config reload)
    pub fn set_window(&mut self, window: SkipWindow) {
        self.window = window;
    }

    pub fn time_control(&self) -> &Arc<dyn TimeControl> {
        &self.time
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Register `listener` for minute ticks. A second call is ignored.
    pub fn subscribe(&mut self, listener: MinuteListener) -> SubscriptionId {
        if let Some(id) = self.subscription {
            return id;
        }
        let id = self.time.subscribe_minute(listener);
        self.subscription = Some(id);
        id
    }

    /// Drop the minute subscription, if any
    pub fn unsubscribe(&mut self) {
        if let Some(id) = self.subscription.take() {
            if !self.time.unsubscribe_minute(id) {
                debug!(subscription = id.0, "minute listener was already gone");
            }
        }
    }

    /// Minute tick handler. Returns the skip issued, if any.
    pub fn on_minute_tick(&self) -> Option<SkipPlan> {
        let current = self.time.current_moment().time_of_day();
        if !self.window.contains(current) {
            trace!(time = %current, "outside skip window");
            return None;
        }
        self.force_skip()
    }

    /// Jump the host clock to the next occurrence of the target time.
    ///
    /// A zero-length plan (clock already exactly on target) issues no advance.
    pub fn force_skip(&self) -> Option<SkipPlan> {
        let now = self.time.current_moment();
        let Some(plan) = plan_skip(now, self.window.target) else {
            warn!(%now, target = %self.window.target, "skip target outside calendar range");
            return None;
        };
        if plan.delta.is_zero() {
            debug!(%now, "clock already on target");
            return None;
        }

        self.time.advance_by_seconds(plan.delta_secs(), false);
        info!(
            from = %plan.from,
            to = %plan.to,
            delta_secs = plan.delta_secs(),
            "Night skipped - time set to {}",
            self.window.target
        );
        Some(plan)
    }
}

/// Log configurations that are legal but will not behave as operators expect
pub fn audit_window(window: &SkipWindow) {
    if window.is_empty() {
        warn!(
            start = %window.start,
            end = %window.end,
            "skip window is empty (start >= end, midnight-crossing windows are not supported); night will never be skipped"
        );
    } else if window.target_in_window() {
        warn!(
            target = %window.target,
            start = %window.start,
            end = %window.end,
            "skip target lies inside the skip window; every tick in the window will skip again"
        );
    }
}
