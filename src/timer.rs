//! Deferred one-shot events against the session clock.
//!
//! Cooldown releases are queued here instead of being fired from platform
//! timeouts. Each entry carries the epoch it was scheduled in; `invalidate`
//! bumps the epoch so that anything queued before a reset is dropped.

use crate::model::Millis;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

#[derive(Debug)]
struct Entry<E> {
    due: Millis,
    seq: u64,
    epoch: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug)]
pub struct DeferredQueue<E> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    epoch: u64,
    seq: u64,
}

impl<E> Default for DeferredQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> DeferredQueue<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            epoch: 0,
            seq: 0,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn schedule(&mut self, now: Millis, delay_ms: u64, event: E) {
        self.seq = self.seq.wrapping_add(1);
        self.heap.push(Reverse(Entry {
            due: now.after(delay_ms),
            seq: self.seq,
            epoch: self.epoch,
            event,
        }));
    }

    /// Pops every event due at or before `now`, oldest first, skipping stale epochs.
    pub fn drain_due(&mut self, now: Millis) -> Vec<E> {
        let mut out = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                if entry.epoch == self.epoch {
                    out.push(entry.event);
                }
            }
        }
        out
    }

    pub fn invalidate(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.heap.clear();
    }
}

/// Session clock. Readings start at 1ms so that `Millis::NEVER` stays unambiguous.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> Millis {
        let ms = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        Millis(ms.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_fire_in_due_order() {
        let mut q = DeferredQueue::new();
        q.schedule(Millis(100), 300, "slow");
        q.schedule(Millis(100), 50, "fast");
        assert!(q.drain_due(Millis(120)).is_empty());
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain_due(Millis(150)), vec!["fast"]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.drain_due(Millis(1_000)), vec!["slow"]);
        assert!(q.is_empty());
    }

    #[test]
    fn invalidate_drops_pending_events() {
        let mut q = DeferredQueue::new();
        q.schedule(Millis(1), 10, 1u8);
        q.invalidate();
        assert_eq!(q.len(), 0);
        q.schedule(Millis(1), 20, 2u8);
        assert_eq!(q.drain_due(Millis(100)), vec![2]);
        assert_eq!(q.epoch(), 1);
    }

    #[test]
    fn same_due_time_keeps_schedule_order() {
        let mut q = DeferredQueue::new();
        q.schedule(Millis(0), 10, 'a');
        q.schedule(Millis(0), 10, 'b');
        assert_eq!(q.drain_due(Millis(10)), vec!['a', 'b']);
    }

    #[test]
    fn clock_never_reads_never() {
        let clock = MonotonicClock::start();
        assert!(!clock.now().is_never());
    }
}
