//! Per-server FIFO queues.
//!
//! An arena of bounded queues indexed by `ServerId`; completion events
//! reference a server by index, never by pointer. Each queue holds the
//! completion times of admitted-but-uncompleted units in service order, so
//! the head always corresponds to the next completion event for that
//! server and the tail is the chaining point for newly admitted work.

use std::collections::VecDeque;

use crate::event::ServerId;
use crate::time::SimTime;

#[derive(Debug)]
pub struct ServerPool {
    /// Completion times of admitted units, head = in service.
    queues: Vec<VecDeque<SimTime>>,
    /// Admitted capacity per server: waiting slots + the unit in service.
    capacities: Vec<usize>,
    /// Units ever admitted per server.
    admitted: Vec<u64>,
}

impl ServerPool {
    /// Builds one queue per entry of `queue_sizes`; each server admits at
    /// most `queue_sizes[i] + 1` units at a time.
    pub fn new(queue_sizes: &[u64]) -> Self {
        let capacities = queue_sizes
            .iter()
            .map(|&slots| usize::try_from(slots).unwrap_or(usize::MAX).saturating_add(1))
            .collect::<Vec<_>>();
        Self {
            queues: vec![VecDeque::new(); capacities.len()],
            admitted: vec![0; capacities.len()],
            capacities,
        }
    }

    pub fn server_count(&self) -> usize {
        self.queues.len()
    }

    pub fn len(&self, server: ServerId) -> usize {
        self.queues[server].len()
    }

    pub fn is_full(&self, server: ServerId) -> bool {
        self.queues[server].len() == self.capacities[server]
    }

    /// Completion time of the unit at the tail, `None` when idle.
    pub fn tail_due(&self, server: ServerId) -> Option<SimTime> {
        self.queues[server].back().copied()
    }

    /// Appends an admitted unit. Admission past capacity is a kernel bug,
    /// not backpressure; the caller must check `is_full` first.
    pub fn admit(&mut self, server: ServerId, due: SimTime) {
        assert!(
            self.queues[server].len() < self.capacities[server],
            "admission past capacity on server {server}"
        );
        self.queues[server].push_back(due);
        self.admitted[server] += 1;
    }

    /// Removes and returns the head unit's completion time. Panics when
    /// the server is idle: a completion event fired for a unit the queue
    /// does not hold.
    pub fn complete_head(&mut self, server: ServerId) -> SimTime {
        self.queues[server]
            .pop_front()
            .unwrap_or_else(|| panic!("completion fired for idle server {server}"))
    }

    pub fn admitted(&self, server: ServerId) -> u64 {
        self.admitted[server]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_counts_unit_in_service() {
        // One waiting slot plus the unit in service.
        let mut pool = ServerPool::new(&[1]);
        assert!(!pool.is_full(0));
        pool.admit(0, SimTime::new(1.0));
        pool.admit(0, SimTime::new(2.0));
        assert!(pool.is_full(0));
        assert_eq!(pool.len(0), 2);
    }

    #[test]
    fn test_head_and_tail_follow_fifo_order() {
        let mut pool = ServerPool::new(&[4, 4]);
        pool.admit(1, SimTime::new(1.0));
        pool.admit(1, SimTime::new(2.5));
        assert_eq!(pool.tail_due(1), Some(SimTime::new(2.5)));
        assert_eq!(pool.tail_due(0), None);

        assert_eq!(pool.complete_head(1), SimTime::new(1.0));
        assert_eq!(pool.complete_head(1), SimTime::new(2.5));
        assert_eq!(pool.admitted(1), 2);
        assert_eq!(pool.admitted(0), 0);
    }

    #[test]
    #[should_panic(expected = "idle server")]
    fn test_completion_on_idle_server_is_a_bug() {
        let mut pool = ServerPool::new(&[0]);
        pool.complete_head(0);
    }

    #[test]
    #[should_panic(expected = "past capacity")]
    fn test_admission_past_capacity_is_a_bug() {
        let mut pool = ServerPool::new(&[0]);
        pool.admit(0, SimTime::new(1.0));
        pool.admit(0, SimTime::new(2.0));
    }
}
