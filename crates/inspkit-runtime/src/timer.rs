#![forbid(unsafe_code)]

//! Single-threaded timer queue for deferred callbacks.
//!
//! # Design
//!
//! The host event loop owns a [`TimerQueue`] and calls [`TimerQueue::run_due`]
//! once per iteration, using [`TimerQueue::time_until_next`] to size its poll
//! timeout. Nothing runs on another thread: a scheduled task executes on the
//! loop thread, after `run_due` observes that its deadline has passed.
//!
//! Time comes from a [`Clock`]. Production code uses [`SystemClock`]; tests
//! drive a [`ManualClock`] so debounce behavior is fully deterministic.
//!
//! # Invariants
//!
//! 1. Tasks fire in deadline order; equal deadlines fire in scheduling order.
//! 2. A cancelled task never fires.
//! 3. A task scheduled while `run_due` is executing never fires in that same
//!    pass, even with a zero delay. Each pass therefore terminates.
//! 4. Tasks run outside the internal borrow, so they may schedule or cancel
//!    other timers.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Source of the current time for a [`TimerQueue`].
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Shorthand for `advance(Duration::from_millis(ms))`.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Identifies one scheduled task. Never reused within a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timer({})", self.0)
    }
}

/// Deferred execution seam used by the notification bus.
pub trait TimerService {
    /// Run `task` once, `delay` from now.
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;

    /// Cancel a pending task. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

struct PendingTimer {
    deadline: Instant,
    handle: TimerHandle,
    task: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct TimerQueueInner {
    next_handle: u64,
    /// Sorted by `(deadline, handle)`.
    pending: Vec<PendingTimer>,
}

impl TimerQueueInner {
    fn insert(&mut self, timer: PendingTimer) {
        let key = (timer.deadline, timer.handle);
        let at = self
            .pending
            .partition_point(|p| (p.deadline, p.handle) <= key);
        self.pending.insert(at, timer);
    }

    /// Pop the earliest timer if it is due and was scheduled before `horizon`.
    fn pop_due(&mut self, now: Instant, horizon: u64) -> Option<PendingTimer> {
        let idx = self
            .pending
            .iter()
            .position(|p| p.handle.0 < horizon)?;
        if self.pending[idx].deadline > now {
            return None;
        }
        Some(self.pending.remove(idx))
    }
}

/// Event-loop driven timer queue.
///
/// Cloning a `TimerQueue` creates another handle to the **same** queue.
#[derive(Clone)]
pub struct TimerQueue {
    clock: Rc<dyn Clock>,
    inner: Rc<RefCell<TimerQueueInner>>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TimerQueue")
            .field("pending", &inner.pending.len())
            .field("next_handle", &inner.next_handle)
            .finish()
    }
}

impl TimerQueue {
    /// Queue driven by the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Rc::new(clock),
            inner: Rc::new(RefCell::new(TimerQueueInner {
                next_handle: 1,
                pending: Vec::new(),
            })),
        }
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Fire every task whose deadline has passed. Returns how many fired.
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();
        let horizon = self.inner.borrow().next_handle;
        let mut fired = 0;

        loop {
            let Some(timer) = self.inner.borrow_mut().pop_due(now, horizon) else {
                break;
            };
            tracing::trace!(handle = timer.handle.0, "timer fired");
            (timer.task)();
            fired += 1;
        }

        fired
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.borrow().pending.first().map(|p| p.deadline)
    }

    /// Time until the earliest pending deadline; zero if already due.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.next_deadline()?;
        Some(deadline.saturating_duration_since(self.clock.now()))
    }

    /// Number of scheduled, not yet fired, tasks.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.inner
            .borrow()
            .pending
            .iter()
            .any(|p| p.handle == handle)
    }

    /// Drop every pending task without running it.
    pub fn clear(&self) {
        // Tasks may own Rc cycles back into the queue; drop them after the borrow.
        let drained: Vec<PendingTimer> = self.inner.borrow_mut().pending.drain(..).collect();
        drop(drained);
    }
}

impl TimerService for TimerQueue {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
        let deadline = self.clock.now() + delay;
        let mut inner = self.inner.borrow_mut();
        let handle = TimerHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.insert(PendingTimer {
            deadline,
            handle,
            task,
        });
        handle
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let removed = {
            let mut inner = self.inner.borrow_mut();
            let idx = inner.pending.iter().position(|p| p.handle == handle);
            idx.map(|idx| inner.pending.remove(idx))
        };
        removed.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
