//! The pending-event set.
//!
//! A binary min-heap keyed by `(due, seq)`, where `seq` is a monotonically
//! increasing insertion counter. Events therefore pop earliest-first, and
//! two events due at the same instant pop in insertion order; that is the
//! fixed, deterministic tie-break this kernel commits to.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::event::Event;

/// Heap entry. `Ord` is reversed so `BinaryHeap`, a max-heap, yields the
/// smallest `(due, seq)` first.
struct Scheduled {
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.event.due == other.event.due
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .event
            .due
            .cmp(&self.event.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Mutable collection of not-yet-due events.
#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event to the pending set.
    pub fn schedule(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { seq, event });
    }

    /// Removes and returns the event with the smallest termination time,
    /// or `None` when the set is empty.
    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|scheduled| scheduled.event)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
