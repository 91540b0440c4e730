//! Events on the simulated timeline.
//!
//! The arrival/completion distinction is a tagged variant so each kind
//! carries exactly the fields that are meaningful for it.

use crate::time::SimTime;

/// Index of a server in the pool.
pub type ServerId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind {
    /// A new message reaches the dispatcher and must be routed now.
    Arrival,
    /// A server finishes serving its head-of-queue unit now.
    Completion {
        server: ServerId,
        /// Time the unit arrived at the dispatcher.
        arrival_time: SimTime,
        /// Duration the server spends on the unit.
        service_time: f64,
    },
}

/// One occurrence in simulated time. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Simulated time at which this event becomes due.
    pub due: SimTime,
    pub kind: EventKind,
}

impl Event {
    pub fn arrival(due: SimTime) -> Self {
        Self {
            due,
            kind: EventKind::Arrival,
        }
    }

    pub fn completion(
        due: SimTime,
        server: ServerId,
        arrival_time: SimTime,
        service_time: f64,
    ) -> Self {
        Self {
            due,
            kind: EventKind::Completion {
                server,
                arrival_time,
                service_time,
            },
        }
    }
}
