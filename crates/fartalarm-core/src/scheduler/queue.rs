use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::Timestamp;

/// Handle to a scheduled entry, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Priority queue of `(fire_at, task)` pairs.
///
/// Entries due at the same instant pop in insertion order. Cancelled
/// entries are dropped lazily when they reach the head of the heap.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<(Timestamp, u64)>>,
    tasks: HashMap<u64, T>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            tasks: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at: Timestamp, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(Reverse((fire_at, id)));
        self.tasks.insert(id, task);
        TimerId(id)
    }

    /// Cancel a pending entry. Returns its task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.tasks.remove(&id.0)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.tasks.contains_key(&id.0)
    }

    /// Pop the earliest entry with `fire_at <= now`.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerId, T)> {
        while let Some(Reverse((fire_at, id))) = self.heap.peek().copied() {
            if !self.tasks.contains_key(&id) {
                self.heap.pop();
                continue;
            }
            if fire_at > now {
                return None;
            }
            self.heap.pop();
            let task = self.tasks.remove(&id)?;
            return Some((TimerId(id), task));
        }
        None
    }

    /// Earliest pending deadline, ignoring cancelled entries.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.heap
            .iter()
            .filter(|Reverse((_, id))| self.tasks.contains_key(id))
            .map(|Reverse((at, _))| *at)
            .min()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn t0() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 12, 8, 0, 0)
            .unwrap()
    }

    #[test]
    fn pops_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(t0() + Duration::seconds(10), "late");
        q.schedule(t0() + Duration::seconds(5), "early");

        assert!(q.pop_due(t0()).is_none());
        let now = t0() + Duration::seconds(30);
        assert_eq!(q.pop_due(now).map(|(_, t)| t), Some("early"));
        assert_eq!(q.pop_due(now).map(|(_, t)| t), Some("late"));
        assert!(q.pop_due(now).is_none());
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut q = TimerQueue::new();
        q.schedule(t0(), 1);
        q.schedule(t0(), 2);
        q.schedule(t0(), 3);
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(t0()).map(|(_, t)| t)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn cancelled_entries_never_fire() {
        let mut q = TimerQueue::new();
        let a = q.schedule(t0(), "a");
        q.schedule(t0() + Duration::seconds(1), "b");
        assert_eq!(q.cancel(a), Some("a"));
        assert!(!q.is_pending(a));
        assert_eq!(q.next_deadline(), Some(t0() + Duration::seconds(1)));
        let now = t0() + Duration::minutes(1);
        assert_eq!(q.pop_due(now).map(|(_, t)| t), Some("b"));
        assert!(q.is_empty());
    }
}
