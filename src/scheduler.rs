//! Virtual time and delayed delivery.
//!
//! The host never sleeps: every delay is an entry in a `DelayQueue` keyed by a
//! virtual due time, and the session drains entries in due order as the trace
//! advances the clock.

use std::cell::{Cell, RefCell};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::Duration;

use fnv::FnvHashMap;
use spot_core::{Scheduler, TimerEvent, TimerToken};

/// Shared monotonic clock.
#[derive(Clone, Debug, Default)]
pub struct VirtualClock(Rc<Cell<Duration>>);

impl VirtualClock {
    pub fn now(&self) -> Duration {
        self.0.get()
    }

    /// Move forward to `t`; earlier times are ignored.
    pub fn advance_to(&self, t: Duration) {
        if t > self.0.get() {
            self.0.set(t);
        }
    }
}

/// Items released at a virtual due time, FIFO among equal due times.
#[derive(Debug)]
pub struct DelayQueue<T> {
    clock: VirtualClock,
    next_id: u64,
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    items: FnvHashMap<u64, T>,
}

impl<T> DelayQueue<T> {
    pub fn new(clock: VirtualClock) -> Self {
        Self {
            clock,
            next_id: 0,
            heap: BinaryHeap::new(),
            items: FnvHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push_after(&mut self, delay: Duration, item: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((self.clock.now().saturating_add(delay), id)));
        self.items.insert(id, item);
        id
    }

    /// Remove a queued item. Cancelled entries are skipped lazily on pop.
    pub fn cancel(&mut self, id: u64) -> Option<T> {
        self.items.remove(&id)
    }

    /// Due time of the earliest live entry.
    pub fn peek_due(&mut self) -> Option<Duration> {
        while let Some(Reverse((due, id))) = self.heap.peek().copied() {
            if self.items.contains_key(&id) {
                return Some(due);
            }
            self.heap.pop();
        }
        None
    }

    /// Pop the earliest live entry if it is due at or before `until`.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, T)> {
        let due = self.peek_due()?;
        if due > until {
            return None;
        }
        let Reverse((due, id)) = self.heap.pop()?;
        self.items.remove(&id).map(|item| (due, item))
    }
}

/// `Scheduler` capability backed by a shared timer queue.
#[derive(Clone, Debug)]
pub struct SchedulerHandle(pub Rc<RefCell<DelayQueue<TimerEvent>>>);

impl Scheduler for SchedulerHandle {
    fn schedule_after(&mut self, delay: Duration, event: TimerEvent) -> TimerToken {
        TimerToken(self.0.borrow_mut().push_after(delay, event))
    }

    fn cancel(&mut self, token: TimerToken) {
        self.0.borrow_mut().cancel(token.0);
    }
}
