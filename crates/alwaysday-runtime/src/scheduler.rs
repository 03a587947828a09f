//! Tokio retry scheduler
//!
//! Each scheduled task is a spawned sleep. Cancelling aborts the spawned
//! future; a task that already left the pending map runs to completion.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alwaysday_time::{RetryScheduler, ScheduledTask, TimerId};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::{RuntimeError, RuntimeResult};

/// [`RetryScheduler`] backed by a tokio runtime
pub struct TokioScheduler {
    handle: Handle,
    next_id: AtomicU64,
    pending: Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        TokioScheduler {
            handle,
            next_id: AtomicU64::new(1),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Scheduler on the runtime the caller is running in
    pub fn try_current() -> RuntimeResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| RuntimeError::NoRuntime(e.to_string()))
    }

    /// Tasks scheduled but not yet fired or cancelled
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }
}

impl RetryScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerId {
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let pending = Arc::clone(&self.pending);

        // Held across spawn so the task cannot remove itself before it is inserted.
        let mut map = self.pending.lock();
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let still_pending = pending.lock().remove(&id).is_some();
            if still_pending {
                trace!(timer = id.0, "retry timer fired");
                task();
            }
        });
        map.insert(id, join);
        id
    }

    fn cancel(&self, timer: TimerId) {
        if let Some(join) = self.pending.lock().remove(&timer) {
            join.abort();
            trace!(timer = timer.0, "retry timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, join) in self.pending.lock().drain() {
            join.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counter_task(counter: &Arc<AtomicUsize>) -> ScheduledTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_after_delay() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        scheduler.schedule(Duration::from_secs(3), counter_task(&fired));
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let scheduler = TokioScheduler::try_current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let timer = scheduler.schedule(Duration::from_secs(3), counter_task(&fired));
        scheduler.cancel(timer);
        scheduler.cancel(timer);
        assert_eq!(scheduler.pending(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_runtime_is_an_error() {
        assert!(matches!(
            TokioScheduler::try_current(),
            Err(RuntimeError::NoRuntime(_))
        ));
    }
}
