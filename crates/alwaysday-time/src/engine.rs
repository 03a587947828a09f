//! AlwaysDay Engine - acquisition, subscription and shutdown for one session

use std::sync::{Arc, Weak};

use alwaysday_core::{AlwaysDayError, SkipWindow};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::{
    audit_window, AcquirePolicy, AcquireStep, ClockAcquirer, ClockHost, MinuteListener,
    RetryScheduler, SkipPlan, TimerId, WindowController,
};

/// Engine lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineStatus {
    /// Created, `start` not called yet
    Idle,
    /// Waiting for the host clock service
    Acquiring { attempts: u32 },
    /// Subscribed to minute ticks
    Subscribed,
    /// Acquisition failed for good; skipping is disabled this session
    Inert(AlwaysDayError),
    /// Killed
    Stopped,
}

impl EngineStatus {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, EngineStatus::Subscribed)
    }
}

struct EngineState {
    status: EngineStatus,
    acquirer: ClockAcquirer,
    window: SkipWindow,
    controller: Option<WindowController>,
    pending_retry: Option<TimerId>,
    last_skip: Option<SkipPlan>,
}

struct EngineShared {
    host: Arc<dyn ClockHost>,
    scheduler: Arc<dyn RetryScheduler>,
    state: Mutex<EngineState>,
    /// Read-held for the whole of a minute tick; `kill` takes it for writing
    tick_gate: RwLock<()>,
}

/// One engine per plugin session.
///
/// All callbacks handed to the host hold a weak reference, so dropping the
/// engine (which kills it) leaves nothing behind that can fire.
pub struct AlwaysDayEngine {
    shared: Arc<EngineShared>,
}

impl AlwaysDayEngine {
    /// Create an idle engine. The logger is the ambient `tracing` dispatcher;
    /// config and host collaborators are passed in.
    pub fn new(
        host: Arc<dyn ClockHost>,
        scheduler: Arc<dyn RetryScheduler>,
        window: SkipWindow,
        policy: AcquirePolicy,
    ) -> Self {
        audit_window(&window);
        AlwaysDayEngine {
            shared: Arc::new(EngineShared {
                host,
                scheduler,
                state: Mutex::new(EngineState {
                    status: EngineStatus::Idle,
                    acquirer: ClockAcquirer::new(policy),
                    window,
                    controller: None,
                    pending_retry: None,
                    last_skip: None,
                }),
                tick_gate: RwLock::new(()),
            }),
        }
    }

    /// Begin acquiring the host clock. Only the first call has an effect.
    pub fn start(&self) {
        {
            let state = self.shared.state.lock();
            if state.status != EngineStatus::Idle {
                debug!(status = ?state.status, "engine already started");
                return;
            }
        }
        run_acquisition(&self.shared);
    }

    /// Swap in a freshly loaded window
    pub fn reload(&self, window: SkipWindow) {
        audit_window(&window);
        let mut state = self.shared.state.lock();
        state.window = window;
        if let Some(controller) = state.controller.as_mut() {
            controller.set_window(window);
        }
        debug!(start = %window.start, end = %window.end, target = %window.target, "skip window reloaded");
    }

    /// Unconditional cleanup: cancel the retry timer, unsubscribe, release
    /// the clock handle. Safe before acquisition and when called twice.
    ///
    /// Waits for a tick running on another thread, so no advance is issued
    /// once this returns. Must not be called from inside a minute listener.
    pub fn kill(&self) {
        let _gate = self.shared.tick_gate.write();
        let mut state = self.shared.state.lock();
        if state.status == EngineStatus::Stopped {
            return;
        }
        if let Some(timer) = state.pending_retry.take() {
            self.shared.scheduler.cancel(timer);
        }
        if let Some(mut controller) = state.controller.take() {
            controller.unsubscribe();
        }
        state.status = EngineStatus::Stopped;
        debug!("engine stopped");
    }

    pub fn status(&self) -> EngineStatus {
        self.shared.state.lock().status.clone()
    }

    pub fn window(&self) -> SkipWindow {
        self.shared.state.lock().window
    }

    /// Failed clock lookups so far
    pub fn attempts(&self) -> u32 {
        self.shared.state.lock().acquirer.attempts()
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared
            .state
            .lock()
            .controller
            .as_ref()
            .is_some_and(WindowController::is_subscribed)
    }

    /// Most recent jump issued by this engine
    pub fn last_skip(&self) -> Option<SkipPlan> {
        self.shared.state.lock().last_skip
    }
}

impl Drop for AlwaysDayEngine {
    fn drop(&mut self) {
        self.kill();
    }
}

/// One acquisition step; reschedules itself until it settles
fn run_acquisition(shared: &Arc<EngineShared>) {
    let mut state = shared.state.lock();
    if !matches!(state.status, EngineStatus::Idle | EngineStatus::Acquiring { .. }) {
        return;
    }
    state.pending_retry = None;

    match state.acquirer.attempt(shared.host.as_ref()) {
        AcquireStep::Acquired(time) => {
            let mut controller = WindowController::new(time, state.window);
            let weak = Arc::downgrade(shared);
            let listener: MinuteListener = Arc::new(move || on_minute(&weak));
            controller.subscribe(listener);
            state.controller = Some(controller);
            state.status = EngineStatus::Subscribed;
            info!(attempts = state.acquirer.attempts(), "clock acquired, watching for night");
        }
        AcquireStep::RetryAfter { attempt, delay } => {
            state.status = EngineStatus::Acquiring { attempts: attempt };
            let reason = AlwaysDayError::ClockServiceMissing { attempt };
            debug!(error = %reason, ?delay, transient = reason.is_transient(), "retrying clock lookup");
            let weak = Arc::downgrade(shared);
            let timer = shared.scheduler.schedule(
                delay,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        run_acquisition(&shared);
                    }
                }),
            );
            state.pending_retry = Some(timer);
        }
        AcquireStep::Unavailable(err) => {
            error!(error = %err, "{}", err);
            state.status = EngineStatus::Inert(err);
        }
    }
}

/// Minute listener body.
/// The controller is cloned out so the state lock is not held across host
/// calls; the tick gate is, so `kill` cannot return mid-tick.
fn on_minute(weak: &Weak<EngineShared>) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    // Recursive read: a host may deliver a nested tick from inside an advance.
    let _gate = shared.tick_gate.read_recursive();
    let controller = {
        let state = shared.state.lock();
        match (&state.status, &state.controller) {
            (EngineStatus::Subscribed, Some(controller)) => controller.clone(),
            _ => return,
        }
    };

    if let Some(plan) = controller.on_minute_tick() {
        shared.state.lock().last_skip = Some(plan);
    }
}
