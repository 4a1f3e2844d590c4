//! # Timeout Scheduler
//!
//! Single-shot delayed tasks on a tokio runtime, with cancellation. One
//! scheduler backs every timeout of a bus: one-time waits and idle timeouts
//! of durable subscriptions.
//!
//! A task runs at most once and only if it is still registered when its
//! delay elapses. Cancelling removes the registration, so a cancelled task
//! never runs even if its sleep has already completed.

use crate::error::{BusError, BusResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::debug;

/// Deadline used when `now + delay` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Default)]
struct Pending {
    tasks: HashMap<u64, AbortHandle>,
    shut_down: bool,
}

/// Delayed-task facility shared by all timeouts of one bus.
pub struct TimeoutScheduler {
    handle: Handle,
    pending: Arc<Mutex<Pending>>,
    next_task: AtomicU64,
}

impl TimeoutScheduler {
    /// Schedule on the given runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            pending: Arc::new(Mutex::new(Pending::default())),
            next_task: AtomicU64::new(0),
        }
    }

    /// Schedule on the runtime of the calling context.
    pub fn current() -> BusResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| BusError::NoRuntime)
    }

    /// The runtime the scheduler spawns on, for collaborators that want to
    /// align their own timing with the bus.
    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run `task` once after `delay`, unless cancelled first.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> BusResult<ScheduledTask>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_task.fetch_add(1, Ordering::Relaxed);

        // Held across spawn so the task cannot look itself up before it is
        // registered.
        let mut pending = self.pending.lock();
        if pending.shut_down {
            return Err(BusError::SchedulerShutdown);
        }

        let now = tokio::time::Instant::now();
        let deadline = now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE);
        let registry = Arc::clone(&self.pending);
        let join = self.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let still_scheduled = registry.lock().tasks.remove(&id).is_some();
            if still_scheduled {
                task();
            }
        });
        pending.tasks.insert(id, join.abort_handle());

        Ok(ScheduledTask {
            id,
            pending: Arc::downgrade(&self.pending),
        })
    }

    /// Number of tasks that have neither run nor been cancelled.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.pending.lock().tasks.len()
    }

    /// Whether [`TimeoutScheduler::shutdown`] was called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.pending.lock().shut_down
    }

    /// Cancel every pending task and refuse new ones. Returns the number of
    /// cancelled tasks. Idempotent.
    pub fn shutdown(&self) -> usize {
        let mut pending = self.pending.lock();
        pending.shut_down = true;
        let cancelled = pending.tasks.len();
        for (_, task) in pending.tasks.drain() {
            task.abort();
        }
        if cancelled > 0 {
            debug!(cancelled, "Timeout scheduler shut down");
        }
        cancelled
    }
}

impl Drop for TimeoutScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to one scheduled task.
#[derive(Debug)]
pub struct ScheduledTask {
    id: u64,
    pending: Weak<Mutex<Pending>>,
}

impl ScheduledTask {
    /// Cancel the task. Returns `false` if it already ran, was already
    /// cancelled, or the scheduler is gone.
    pub fn cancel(&self) -> bool {
        let Some(pending) = self.pending.upgrade() else {
            return false;
        };
        let removed = pending.lock().tasks.remove(&self.id);
        match removed {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}
