//! Delayed one-shot tasks. The store schedules its post-submission insights
//! re-fetch through [`Scheduler`] so tests can drive time by hand.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

/// A deferred unit of work handed to a [`Scheduler`].
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Identifies one scheduled task and reports when it has run.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    label: &'static str,
    delay: Duration,
    done: watch::Receiver<bool>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Resolve once the task has run. Returns early if the scheduler dropped
    /// the task without running it.
    pub async fn wait(&self) {
        let mut done = self.done.clone();
        let _ = done.wait_for(|finished| *finished).await;
    }
}

/// Runs one-shot tasks after a delay. Tasks are fire-once and never
/// cancelled.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, label: &'static str, delay: Duration, task: Task) -> TaskHandle;
}

/// Wrap `task` so that it flips the handle's completion flag when done.
fn track(
    next_id: &AtomicU64,
    label: &'static str,
    delay: Duration,
    task: Task,
) -> (TaskHandle, Task) {
    let id = TaskId(next_id.fetch_add(1, Ordering::Relaxed));
    let (tx, rx) = watch::channel(false);
    let tracked: Task = Box::pin(async move {
        task.await;
        let _ = tx.send(true);
    });
    let handle = TaskHandle {
        id,
        label,
        delay,
        done: rx,
    };
    (handle, tracked)
}

/// Wall-clock scheduler backed by `tokio::spawn` + `tokio::time::sleep`.
/// Must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    next_id: AtomicU64,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, label: &'static str, delay: Duration, task: Task) -> TaskHandle {
        let (handle, tracked) = track(&self.next_id, label, delay, task);
        tracing::debug!(task = %handle.id(), label, delay_ms = delay.as_millis() as u64, "scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracked.await;
        });
        handle
    }
}

struct PendingTask {
    id: TaskId,
    due: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualClock {
    now: Duration,
    pending: Vec<PendingTask>,
}

/// Scheduler driven by an explicit clock. Nothing runs until [`advance`]
/// moves time past a task's due point.
///
/// [`advance`]: ManualScheduler::advance
#[derive(Default)]
pub struct ManualScheduler {
    next_id: AtomicU64,
    clock: Mutex<ManualClock>,
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clock = self.clock();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending", &clock.pending.len())
            .finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn clock(&self) -> MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Time elapsed on the manual clock.
    pub fn elapsed(&self) -> Duration {
        self.clock().now
    }

    pub fn pending_count(&self) -> usize {
        self.clock().pending.len()
    }

    /// Remaining delay of every pending task, in due order.
    pub fn pending(&self) -> Vec<(TaskId, Duration)> {
        let clock = self.clock();
        let mut out: Vec<_> = clock
            .pending
            .iter()
            .map(|p| (p.id, p.due.saturating_sub(clock.now)))
            .collect();
        out.sort_by_key(|(id, remaining)| (*remaining, *id));
        out
    }

    /// Move the clock forward and run every task that became due, earliest
    /// first. Tasks scheduled while these run wait for the next advance.
    /// Returns how many tasks ran.
    pub async fn advance(&self, by: Duration) -> usize {
        let mut due = {
            let mut clock = self.clock();
            clock.now += by;
            let now = clock.now;
            let (ready, waiting): (Vec<_>, Vec<_>) =
                clock.pending.drain(..).partition(|p| p.due <= now);
            clock.pending = waiting;
            ready
        };
        due.sort_by_key(|p| (p.due, p.id));

        let count = due.len();
        for pending in due {
            pending.task.await;
        }
        count
    }

    /// Jump to the latest due point and run everything pending.
    pub async fn run_all(&self) -> usize {
        let remaining = self
            .pending()
            .into_iter()
            .map(|(_, remaining)| remaining)
            .max()
            .unwrap_or_default();
        self.advance(remaining).await
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, label: &'static str, delay: Duration, task: Task) -> TaskHandle {
        let (handle, tracked) = track(&self.next_id, label, delay, task);
        let mut clock = self.clock();
        let due = clock.now + delay;
        clock.pending.push(PendingTask {
            id: handle.id(),
            due,
            task: tracked,
        });
        handle
    }
}
