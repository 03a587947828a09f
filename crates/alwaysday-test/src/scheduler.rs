//! Virtual-time retry scheduler
//!
//! Nothing runs until the test advances time. Due tasks fire in
//! `(due, timer id)` order, including tasks scheduled by tasks that fire
//! during the same advance.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use alwaysday_time::{RetryScheduler, ScheduledTask, TimerId};
use parking_lot::Mutex;

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    queue: BinaryHeap<Reverse<(Duration, TimerId)>>,
    tasks: HashMap<TimerId, ScheduledTask>,
    scheduled: u64,
    cancelled: u64,
    fired: u64,
    delays: Vec<Duration>,
}

/// Deterministic [`RetryScheduler`]
#[derive(Default)]
pub struct ManualScheduler {
    state: Mutex<SchedulerState>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed so far
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Move virtual time forward by `by`, firing everything due on the way.
    /// Returns the number of tasks fired.
    pub fn advance(&self, by: Duration) -> usize {
        let until = self.state.lock().now + by;
        let mut fired = 0;
        loop {
            // The lock is released before the task runs; tasks schedule more work.
            let task = {
                let mut state = self.state.lock();
                match state.queue.peek() {
                    Some(Reverse((due, _))) if *due <= until => {}
                    _ => break,
                }
                let Some(Reverse((due, id))) = state.queue.pop() else {
                    break;
                };
                state.now = state.now.max(due);
                match state.tasks.remove(&id) {
                    Some(task) => {
                        state.fired += 1;
                        task
                    }
                    None => continue,
                }
            };
            task();
            fired += 1;
        }
        self.state.lock().now = until;
        fired
    }

    /// Advance straight to the next due task, if any
    pub fn run_next(&self) -> bool {
        let next_due = {
            let state = self.state.lock();
            state
                .queue
                .iter()
                .filter(|Reverse((_, id))| state.tasks.contains_key(id))
                .map(|Reverse((due, _))| *due)
                .min()
        };
        match next_due {
            Some(due) => {
                let by = due.saturating_sub(self.now());
                self.advance(by) > 0
            }
            None => false,
        }
    }

    /// Tasks waiting to fire
    pub fn pending(&self) -> usize {
        self.state.lock().tasks.len()
    }

    /// Tasks ever scheduled
    pub fn scheduled(&self) -> u64 {
        self.state.lock().scheduled
    }

    pub fn cancelled(&self) -> u64 {
        self.state.lock().cancelled
    }

    pub fn fired(&self) -> u64 {
        self.state.lock().fired
    }

    /// Requested delays, in scheduling order
    pub fn delays(&self) -> Vec<Duration> {
        self.state.lock().delays.clone()
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerId {
        let mut state = self.state.lock();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let due = state.now + delay;
        state.queue.push(Reverse((due, id)));
        state.tasks.insert(id, task);
        state.scheduled += 1;
        state.delays.push(delay);
        id
    }

    fn cancel(&self, timer: TimerId) {
        let mut state = self.state.lock();
        if state.tasks.remove(&timer).is_some() {
            state.cancelled += 1;
        }
    }
}
