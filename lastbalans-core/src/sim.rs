//! ## lastbalans-core::sim
//! **The dispatcher kernel: routing, admission, service, drain**
//!
//! Owns the clock, the pending-event set, the server pool, and the
//! statistics for one run. The loop pops the earliest-terminating event,
//! advances the clock to it, and dispatches: arrivals re-arm the generator
//! (while the horizon has not been reached) and route their unit to a
//! server; completions retire the head of a server's queue. Once the clock
//! passes the horizon the generator stops and admitted work drains.
//!
//! Every dispatched event is folded into a blake3 digest, so two runs with
//! the same configuration and seed can be checked for equality by
//! comparing one hex string.

use blake3::Hasher;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use tracing::{debug, trace};

use lastbalans_config::SimulationConfig;

use crate::error::SimulationError;
use crate::event::{Event, EventKind, ServerId};
use crate::queue::EventQueue;
use crate::server::ServerPool;
use crate::stats::{RunReport, RunStats};
use crate::time::{SimClock, SimTime};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Bootstrap arrival seeded, nothing dispatched yet.
    Warmup,
    /// Clock below the horizon; arrivals re-arm the generator.
    Running,
    /// Horizon reached; admitted work drains, nothing new is generated.
    Draining,
    /// Pending set empty; statistics are final.
    Done,
}

/// The simulation kernel. Single-shot: build, [`run`](Simulation::run),
/// read the report.
pub struct Simulation<R: Rng> {
    horizon: SimTime,
    inter_arrival: Exp<f64>,
    routing: WeightedIndex<f64>,
    service: Vec<Exp<f64>>,
    clock: SimClock,
    pending: EventQueue,
    servers: ServerPool,
    stats: RunStats,
    digest: Hasher,
    phase: Phase,
    rng: R,
}

impl Simulation<StdRng> {
    /// Kernel with a `StdRng` seeded from `config.seed`.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SimulationError> {
        Self::with_rng(config, StdRng::seed_from_u64(config.seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Builds a kernel around an injected randomness source.
    ///
    /// The configuration crate validates upstream; the checks here only
    /// reject shapes that would break kernel invariants.
    pub fn with_rng(config: &SimulationConfig, rng: R) -> Result<Self, SimulationError> {
        check_shape(config)?;
        let service = config
            .service_rates
            .iter()
            .map(|&rate| Exp::new(rate))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            horizon: SimTime::new(config.horizon),
            inter_arrival: Exp::new(config.arrival_rate)?,
            routing: WeightedIndex::new(config.probabilities.iter().copied())?,
            service,
            clock: SimClock::new(),
            pending: EventQueue::new(),
            servers: ServerPool::new(&config.queue_sizes),
            stats: RunStats::default(),
            digest: Hasher::new(),
            phase: Phase::Warmup,
            rng,
        })
    }

    /// Executes the run to completion and returns the final report.
    pub fn run(&mut self) -> RunReport {
        assert!(self.phase == Phase::Warmup, "simulation already ran");
        self.seed_bootstrap_arrival();

        while let Some(event) = self.pending.pop_earliest() {
            self.clock.advance_to(event.due);
            self.advance_phase();
            self.absorb(&event);
            match event.kind {
                EventKind::Arrival => self.dispatch_arrival(),
                EventKind::Completion {
                    server,
                    arrival_time,
                    service_time,
                } => self.complete(server, event.due, arrival_time, service_time),
            }
        }

        self.phase = Phase::Done;
        let report = self
            .stats
            .report(hex::encode(self.digest.finalize().as_bytes()));
        debug!(
            served = report.served,
            dropped = report.dropped,
            digest = %report.digest,
            "run complete"
        );
        report
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn servers(&self) -> &ServerPool {
        &self.servers
    }

    fn seed_bootstrap_arrival(&mut self) {
        let first = self.inter_arrival.sample(&mut self.rng);
        self.pending.schedule(Event::arrival(SimTime::ZERO + first));
    }

    fn advance_phase(&mut self) {
        let next = if self.clock.now() < self.horizon {
            Phase::Running
        } else {
            Phase::Draining
        };
        if next != self.phase {
            debug!(now = %self.clock.now(), ?next, "phase transition");
            self.phase = next;
        }
    }

    /// An arrival fired: while running, schedule the next one; either way
    /// route the unit that just arrived.
    fn dispatch_arrival(&mut self) {
        if self.phase == Phase::Running {
            let gap = self.inter_arrival.sample(&mut self.rng);
            self.pending.schedule(Event::arrival(self.clock.now() + gap));
        }
        self.route_unit();
    }

    /// Routing and admission for one arriving unit.
    fn route_unit(&mut self) {
        self.stats.offered += 1;
        let server = self.routing.sample(&mut self.rng);
        if self.servers.is_full(server) {
            self.stats.dropped += 1;
            trace!(server, "queue full, unit dropped");
            return;
        }

        let service_time = self.service[server].sample(&mut self.rng);
        let now = self.clock.now();
        // Service starts when the current tail finishes; immediately on an
        // idle server.
        let start = self.servers.tail_due(server).unwrap_or(now);
        let due = start + service_time;
        self.servers.admit(server, due);
        self.pending
            .schedule(Event::completion(due, server, now, service_time));
        trace!(server, due = %due, "unit admitted");
    }

    fn complete(
        &mut self,
        server: ServerId,
        due: SimTime,
        arrival_time: SimTime,
        service_time: f64,
    ) {
        let head = self.servers.complete_head(server);
        assert!(
            head == due,
            "server {server} queue head does not match the completion being dispatched"
        );

        let sojourn = due - arrival_time;
        // f64 rounding can pull the wait a hair below zero when service
        // starts the instant the unit arrives.
        let wait = (sojourn - service_time).max(0.0);
        self.stats.served += 1;
        self.stats.total_wait += wait;
        self.stats.total_sojourn += sojourn;
        if self.pending.is_empty() {
            self.stats.last_completion = self.clock.now().as_f64();
        }
    }

    fn absorb(&mut self, event: &Event) {
        match event.kind {
            EventKind::Arrival => {
                self.digest.update(&[0u8]);
                self.digest.update(&event.due.as_f64().to_le_bytes());
            }
            EventKind::Completion {
                server,
                service_time,
                ..
            } => {
                self.digest.update(&[1u8]);
                self.digest.update(&event.due.as_f64().to_le_bytes());
                self.digest.update(&(server as u64).to_le_bytes());
                self.digest.update(&service_time.to_le_bytes());
            }
        }
    }
}

/// Runs one simulation seeded from `config.seed`.
pub fn run(config: &SimulationConfig) -> Result<RunReport, SimulationError> {
    let mut sim = Simulation::from_config(config)?;
    Ok(sim.run())
}

fn check_shape(config: &SimulationConfig) -> Result<(), SimulationError> {
    if config.servers == 0 {
        return Err(SimulationError::Config(
            "server count must be positive".into(),
        ));
    }
    if config.probabilities.len() != config.servers
        || config.queue_sizes.len() != config.servers
        || config.service_rates.len() != config.servers
    {
        return Err(SimulationError::Config(format!(
            "per-server sequences must each have {} entries",
            config.servers
        )));
    }
    if !config.horizon.is_finite() || config.horizon < 0.0 {
        return Err(SimulationError::Config(format!(
            "horizon {} is not a finite non-negative time",
            config.horizon
        )));
    }
    if !(config.arrival_rate.is_finite() && config.arrival_rate > 0.0) {
        return Err(SimulationError::Config(format!(
            "arrival rate {} is not a finite positive rate",
            config.arrival_rate
        )));
    }
    if let Some(rate) = config
        .service_rates
        .iter()
        .find(|rate| !(rate.is_finite() && **rate > 0.0))
    {
        return Err(SimulationError::Config(format!(
            "service rate {rate} is not a finite positive rate"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(
        horizon: f64,
        probabilities: Vec<f64>,
        arrival_rate: f64,
        queue_sizes: Vec<u64>,
        service_rates: Vec<f64>,
        seed: u64,
    ) -> SimulationConfig {
        SimulationConfig {
            horizon,
            servers: probabilities.len(),
            probabilities,
            arrival_rate,
            queue_sizes,
            service_rates,
            seed,
        }
    }

    #[test]
    fn test_rejects_mismatched_sequences() {
        let bad = config(1.0, vec![0.5, 0.5], 1.0, vec![0], vec![1.0, 1.0], 0);
        assert!(matches!(
            Simulation::from_config(&bad),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_zero_servers() {
        let bad = config(1.0, vec![], 1.0, vec![], vec![], 0);
        assert!(matches!(
            Simulation::from_config(&bad),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_identical_seeds_produce_identical_runs() {
        let cfg = config(
            200.0,
            vec![0.3, 0.7],
            2.0,
            vec![2, 5],
            vec![1.5, 2.5],
            1234,
        );
        let first = run(&cfg).unwrap();
        let second = run(&cfg).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_produce_different_digests() {
        let mut cfg = config(200.0, vec![1.0], 2.0, vec![5], vec![2.0], 1);
        let first = run(&cfg).unwrap();
        cfg.seed = 2;
        let second = run(&cfg).unwrap();
        assert_ne!(first.digest, second.digest);
    }

    // Horizon zero: the bootstrap arrival fires past the horizon, so it is
    // routed during drain and nothing else is ever generated.
    #[test]
    fn test_zero_horizon_drains_immediately() {
        let cfg = config(0.0, vec![1.0], 1.0, vec![0], vec![1.0], 7);
        let mut sim = Simulation::from_config(&cfg).unwrap();
        let report = sim.run();

        assert_eq!(sim.phase(), Phase::Done);
        assert_eq!(sim.pending_events(), 0);
        assert_eq!(report.offered, 1);
        assert_eq!(report.served, 1);
        assert_eq!(report.dropped, 0);
        // The lone unit never waits behind anyone.
        assert!(report.mean_wait < 1e-9);
        assert!(report.mean_sojourn > 0.0);
        // Completed at bootstrap-arrival time + service time.
        assert!(report.last_completion > report.mean_sojourn);
    }

    // Light load with a roomy queue: nothing is dropped and units barely
    // wait.
    #[test]
    fn test_light_load_barely_queues() {
        let cfg = config(500.0, vec![1.0], 0.2, vec![1_000_000], vec![10.0], 99);
        let report = run(&cfg).unwrap();

        assert_eq!(report.dropped, 0);
        assert!(report.served > 0);
        assert!(report.mean_wait >= 0.0);
        assert!(report.mean_wait < 0.1, "mean wait {}", report.mean_wait);
    }

    // Overload with no waiting room: the drop fraction approaches
    // 1 - rate/lambda.
    #[test]
    fn test_overload_drop_fraction() {
        let cfg = config(2000.0, vec![1.0], 10.0, vec![0], vec![1.0], 5);
        let report = run(&cfg).unwrap();

        let fraction = report.dropped as f64 / report.offered as f64;
        assert!(
            (0.85..0.95).contains(&fraction),
            "drop fraction {fraction}"
        );
        assert!(report.mean_wait < 1e-9, "no waiting room, no waiting");
    }

    // Degenerate routing: all probability mass on server 0 means server 1
    // never sees a unit.
    #[test]
    fn test_degenerate_routing_starves_server() {
        let cfg = config(300.0, vec![1.0, 0.0], 3.0, vec![4, 4], vec![2.0, 2.0], 21);
        let mut sim = Simulation::from_config(&cfg).unwrap();
        let report = sim.run();

        assert_eq!(sim.servers().admitted(1), 0);
        assert_eq!(
            sim.servers().admitted(0),
            report.offered - report.dropped
        );
    }

    #[test]
    fn test_wait_never_exceeds_sojourn() {
        let cfg = config(400.0, vec![0.5, 0.5], 4.0, vec![1, 1], vec![1.0, 1.0], 17);
        let report = run(&cfg).unwrap();

        assert!(report.served > 0);
        assert!(report.mean_wait >= 0.0);
        assert!(report.mean_wait <= report.mean_sojourn);
    }

    fn arb_config() -> impl Strategy<Value = SimulationConfig> {
        (1usize..4).prop_flat_map(|servers| {
            (
                prop::collection::vec(0.05f64..1.0, servers),
                prop::collection::vec(0u64..4, servers),
                prop::collection::vec(0.2f64..4.0, servers),
                0.0f64..30.0,
                0.1f64..4.0,
                any::<u64>(),
            )
                .prop_map(
                    move |(weights, queue_sizes, service_rates, horizon, arrival_rate, seed)| {
                        let mass: f64 = weights.iter().sum();
                        SimulationConfig {
                            horizon,
                            servers,
                            probabilities: weights.iter().map(|w| w / mass).collect(),
                            arrival_rate,
                            queue_sizes,
                            service_rates,
                            seed,
                        }
                    },
                )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Conservation: every routed unit is either served or dropped, and
        // the run always drains to Done.
        #[test]
        fn prop_units_are_conserved(cfg in arb_config()) {
            let mut sim = Simulation::from_config(&cfg).unwrap();
            let report = sim.run();

            prop_assert_eq!(report.offered, report.served + report.dropped);
            prop_assert_eq!(sim.phase(), Phase::Done);
            prop_assert_eq!(sim.pending_events(), 0);
            prop_assert!(report.served >= 1);
            prop_assert!(report.mean_wait >= 0.0);
            prop_assert!(report.mean_wait <= report.mean_sojourn + 1e-9);
        }

        #[test]
        fn prop_reruns_are_deterministic(cfg in arb_config()) {
            let first = run(&cfg).unwrap();
            let second = run(&cfg).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
