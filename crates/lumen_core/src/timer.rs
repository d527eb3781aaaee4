//! Timers and debouncing
//!
//! Time is read through a [`Clock`] so that widgets driven by real time in
//! an application can be driven by a [`ManualClock`] in tests. Expired
//! timers are executed by [`TimerQueue::run_due`], which the host calls
//! from its event loop.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifier for a scheduled timer
    pub struct TimerId;
}

/// A monotonic time source
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall-clock time
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

struct Timer {
    deadline: Duration,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

struct TimerQueueInner {
    clock: Rc<dyn Clock>,
    timers: RefCell<SlotMap<TimerId, Timer>>,
    next_seq: Cell<u64>,
}

/// One-shot timers ordered by deadline
#[derive(Clone)]
pub struct TimerQueue {
    inner: Rc<TimerQueueInner>,
}

impl TimerQueue {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(TimerQueueInner {
                clock,
                timers: RefCell::new(SlotMap::with_key()),
                next_seq: Cell::new(0),
            }),
        }
    }

    pub fn now(&self) -> Duration {
        self.inner.clock.now()
    }

    /// Run `callback` once `delay` has elapsed
    pub fn schedule<F: FnOnce() + 'static>(&self, delay: Duration, callback: F) -> TimerId {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        self.inner.timers.borrow_mut().insert(Timer {
            deadline: self.now() + delay,
            seq,
            callback: Box::new(callback),
        })
    }

    /// Cancel a timer; returns false if it already ran or was cancelled
    pub fn cancel(&self, id: TimerId) -> bool {
        self.inner.timers.borrow_mut().remove(id).is_some()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.inner.timers.borrow().contains_key(id)
    }

    pub fn pending(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Earliest deadline among pending timers
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.timers.borrow().values().map(|t| t.deadline).min()
    }

    /// Execute every timer whose deadline has passed, in deadline order
    ///
    /// Timers scheduled by callbacks run in the same pass if already due.
    pub fn run_due(&self) -> usize {
        let mut executed = 0;
        loop {
            let now = self.now();
            let due = {
                let timers = self.inner.timers.borrow();
                timers
                    .iter()
                    .filter(|(_, t)| t.deadline <= now)
                    .min_by_key(|(_, t)| (t.deadline, t.seq))
                    .map(|(id, _)| id)
            };
            let Some(id) = due else {
                break;
            };
            let Some(timer) = self.inner.timers.borrow_mut().remove(id) else {
                break;
            };
            (timer.callback)();
            executed += 1;
        }
        if executed > 0 {
            tracing::trace!(executed, "timers executed");
        }
        executed
    }
}

struct DebouncerInner {
    timers: TimerQueue,
    wait: Duration,
    action: Box<dyn Fn()>,
    pending: Cell<Option<TimerId>>,
}

impl Drop for DebouncerInner {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.timers.cancel(id);
        }
    }
}

/// Runs an action once calls have stopped for a quiet period
///
/// Every [`Debouncer::call`] restarts the period.
#[derive(Clone)]
pub struct Debouncer {
    inner: Rc<DebouncerInner>,
}

impl Debouncer {
    pub fn new<F: Fn() + 'static>(timers: &TimerQueue, wait: Duration, action: F) -> Self {
        Self {
            inner: Rc::new(DebouncerInner {
                timers: timers.clone(),
                wait,
                action: Box::new(action),
                pending: Cell::new(None),
            }),
        }
    }

    pub fn wait(&self) -> Duration {
        self.inner.wait
    }

    pub fn call(&self) {
        self.cancel();
        let weak: Weak<DebouncerInner> = Rc::downgrade(&self.inner);
        let id = self.inner.timers.schedule(self.inner.wait, move || {
            if let Some(inner) = weak.upgrade() {
                inner.pending.set(None);
                (inner.action)();
            }
        });
        self.inner.pending.set(Some(id));
    }

    pub fn cancel(&self) {
        if let Some(id) = self.inner.pending.take() {
            self.inner.timers.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.pending.get().is_some()
    }

    /// Run a pending action immediately
    pub fn flush(&self) {
        if self.inner.pending.get().is_some() {
            self.cancel();
            (self.inner.action)();
        }
    }
}
