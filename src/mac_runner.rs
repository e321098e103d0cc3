//! Run orchestration
//!
//! A [`Simulation`] is one replication: fresh stations, a fresh channel and
//! one random stream, driven through the configured number of slots and folded
//! into a [`RunResult`]. A [`SweepRunner`] repeats replications for every
//! (protocol, population) pair of a [`SweepConfig`].
//!
//! Replication seeding: with a base seed, each replication gets
//! `derive_seed(base, protocol, stations, index)`, so a sweep is reproducible
//! and no two replications share a stream. Without one, each replication
//! draws its own seed from OS entropy. The seed actually used is recorded in
//! the result either way.

use indexmap::IndexMap;
use log::{debug, info};

use crate::mac_aloha::AlohaArbiter;
use crate::mac_channel::Channel;
use crate::mac_config::{
    validate_load_range, validate_packet_size_range, ConfigError, SweepConfig,
};
use crate::mac_csma::CsmaArbiter;
use crate::mac_interface::{
    EventSink, NoOpSink, PacketSize, Protocol, SlotArbiter, SlotContext, SlotTime,
};
use crate::mac_rng::{derive_seed, entropy_seed, Seed, SimRng};
use crate::mac_station::{Station, StationParams};

// ============================================================================
// Run Result
// ============================================================================

/// Outcome of one completed replication
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub protocol: Protocol,
    pub num_stations: usize,
    pub replication: usize,
    pub seed: Seed,
    pub num_slots: usize,

    /// Delivered bits per slot
    pub throughput: f64,
    /// Collisions over transmission attempts; `None` when nothing was attempted
    pub collision_rate: Option<f64>,
    /// Mean over stations of granted backoff
    pub mean_waiting_time: f64,
    /// Mean over stations of abandoned packets
    pub mean_lost_packets: f64,
    pub delivered_packets: u64,

    pub delivered_bits: u64,
    pub transmission_attempts: u64,
    /// Colliding participants, summed over stations
    pub collisions: u64,
    /// Slots in which a collision happened
    pub collision_events: u64,
    pub lost_packets: u64,
    pub deferrals: u64,
}

/// Scalar views of a [`RunResult`] handed to the reporting side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Throughput,
    CollisionRate,
    Delay,
    LostPackets,
    DeliveredPackets,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Throughput,
        Metric::CollisionRate,
        Metric::Delay,
        Metric::LostPackets,
        Metric::DeliveredPackets,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Throughput => "throughput",
            Metric::CollisionRate => "collision_rate",
            Metric::Delay => "delay",
            Metric::LostPackets => "lost_packets",
            Metric::DeliveredPackets => "delivered_packets",
        }
    }

    /// `None` marks missing data (undefined collision rate)
    pub fn value(&self, result: &RunResult) -> Option<f64> {
        match self {
            Metric::Throughput => Some(result.throughput),
            Metric::CollisionRate => result.collision_rate,
            Metric::Delay => Some(result.mean_waiting_time),
            Metric::LostPackets => Some(result.mean_lost_packets),
            Metric::DeliveredPackets => Some(result.delivered_packets as f64),
        }
    }
}

pub fn arbiter_for(protocol: Protocol) -> Box<dyn SlotArbiter> {
    match protocol {
        Protocol::Aloha => Box::new(AlohaArbiter),
        Protocol::Csma => Box::new(CsmaArbiter),
    }
}

// ============================================================================
// Single Replication
// ============================================================================

pub struct Simulation {
    arbiter: Box<dyn SlotArbiter>,
    stations: Vec<Station>,
    channel: Channel,
    rng: SimRng,
    num_slots: usize,
    replication: usize,
}

impl Simulation {
    /// Build a replication from explicit station parameters.
    ///
    /// Station ids are positions in `params`.
    pub fn new(
        protocol: Protocol,
        params: &[StationParams],
        max_backoff: u64,
        num_slots: usize,
        rng: SimRng,
    ) -> Result<Self, ConfigError> {
        if num_slots == 0 {
            return Err(ConfigError::InvalidSlots);
        }
        if params.is_empty() {
            return Err(ConfigError::InvalidStationCount);
        }
        for p in params {
            validate_load_range((p.load, p.load))?;
            validate_packet_size_range((p.packet_size, p.packet_size))?;
        }

        let stations = params
            .iter()
            .enumerate()
            .map(|(id, p)| Station::new(id, *p, max_backoff))
            .collect();

        Ok(Self {
            arbiter: arbiter_for(protocol),
            stations,
            channel: Channel::new(),
            rng,
            num_slots,
            replication: 0,
        })
    }

    /// Build a replication whose station parameters are drawn from the
    /// configured ranges, using the replication's own stream.
    pub fn from_config(
        protocol: Protocol,
        num_stations: usize,
        config: &SweepConfig,
        mut rng: SimRng,
    ) -> Result<Self, ConfigError> {
        let params = draw_station_params(
            num_stations,
            config.load_range,
            config.packet_size_range,
            &mut rng,
        );
        Self::new(protocol, &params, config.max_backoff, config.num_slots, rng)
    }

    pub fn with_replication(mut self, replication: usize) -> Self {
        self.replication = replication;
        self
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn run(self) -> RunResult {
        self.run_with_sink(&mut NoOpSink)
    }

    pub fn run_with_sink(mut self, sink: &mut dyn EventSink) -> RunResult {
        for slot in 0..self.num_slots {
            self.step(slot as SlotTime + 1, sink);
        }
        self.build_result()
    }

    /// Process one slot; slot numbers start at 1
    pub fn step(&mut self, slot: SlotTime, sink: &mut dyn EventSink) {
        if slot % 1000 == 0 {
            debug!("[{}] :: Processing slot {}", self.arbiter.protocol(), slot);
        }

        self.arbiter.run_slot(&mut SlotContext {
            slot,
            stations: &mut self.stations,
            channel: &mut self.channel,
            rng: &mut self.rng,
            sink,
        });
    }

    fn build_result(&self) -> RunResult {
        let n = self.stations.len() as f64;

        let mut attempts = 0;
        let mut collisions = 0;
        let mut lost = 0;
        let mut waiting = 0;
        let mut deferrals = 0;
        for s in &self.stations {
            let c = s.counters();
            attempts += c.total_packets;
            collisions += c.collisions;
            lost += c.lost_packets;
            waiting += c.waiting_time;
            deferrals += c.deferrals;
        }

        let collision_rate = if attempts == 0 {
            None
        } else {
            Some(collisions as f64 / attempts as f64)
        };

        RunResult {
            protocol: self.arbiter.protocol(),
            num_stations: self.stations.len(),
            replication: self.replication,
            seed: self.rng.seed(),
            num_slots: self.num_slots,
            throughput: self.channel.delivered_bits() as f64 / self.num_slots as f64,
            collision_rate,
            mean_waiting_time: waiting as f64 / n,
            mean_lost_packets: lost as f64 / n,
            delivered_packets: self.channel.delivered_packets(),
            delivered_bits: self.channel.delivered_bits(),
            transmission_attempts: attempts,
            collisions,
            collision_events: self.channel.collision_events(),
            lost_packets: lost,
            deferrals,
        }
    }
}

/// Draw all offered loads first, then all packet sizes
pub fn draw_station_params(
    num_stations: usize,
    (load_lo, load_hi): (f64, f64),
    (size_lo, size_hi): (PacketSize, PacketSize),
    rng: &mut SimRng,
) -> Vec<StationParams> {
    let loads: Vec<f64> = (0..num_stations)
        .map(|_| rng.uniform(load_lo, load_hi))
        .collect();

    loads
        .into_iter()
        .map(|load| StationParams {
            load,
            packet_size: rng.random_int(size_lo, size_hi),
        })
        .collect()
}

// ============================================================================
// Sweep
// ============================================================================

/// Replication results keyed by (protocol, population), in sweep order
#[derive(Debug, Clone, Default)]
pub struct SweepResults {
    pub runs: IndexMap<(Protocol, usize), Vec<RunResult>>,
}

impl SweepResults {
    pub fn get(&self, protocol: Protocol, num_stations: usize) -> Option<&[RunResult]> {
        self.runs.get(&(protocol, num_stations)).map(|v| v.as_slice())
    }

    /// Defined samples of `metric`; undefined values are skipped
    pub fn samples(&self, protocol: Protocol, num_stations: usize, metric: Metric) -> Vec<f64> {
        self.get(protocol, num_stations)
            .map(|runs| runs.iter().filter_map(|r| metric.value(r)).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.runs.values().flatten()
    }
}

pub struct SweepRunner {
    config: SweepConfig,
    base_seed: Option<Seed>,
    event_sink: Box<dyn EventSink>,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let base_seed = config.base_seed()?;

        Ok(Self {
            config,
            base_seed,
            event_sink: Box::new(NoOpSink),
        })
    }

    /// Route engine events of every replication to `sink`
    pub fn with_event_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn replication_seed(
        &self,
        protocol: Protocol,
        num_stations: usize,
        replication: usize,
    ) -> Seed {
        match &self.base_seed {
            Some(base) => derive_seed(base, protocol, num_stations, replication),
            None => entropy_seed(),
        }
    }

    pub fn run_replication(
        &mut self,
        protocol: Protocol,
        num_stations: usize,
        replication: usize,
    ) -> Result<RunResult, ConfigError> {
        let rng = SimRng::from_seed(self.replication_seed(protocol, num_stations, replication));
        let sim = Simulation::from_config(protocol, num_stations, &self.config, rng)?
            .with_replication(replication);
        Ok(sim.run_with_sink(self.event_sink.as_mut()))
    }

    pub fn run_batch(
        &mut self,
        protocol: Protocol,
        num_stations: usize,
    ) -> Result<Vec<RunResult>, ConfigError> {
        info!(
            "[{}] :: Running {} simulations with {} stations",
            protocol, self.config.num_runs, num_stations
        );

        let mut results = Vec::with_capacity(self.config.num_runs);
        for run in 0..self.config.num_runs {
            if (run + 1) % 100 == 0 {
                debug!("[{}] :: Run number {}", protocol, run + 1);
            }
            results.push(self.run_replication(protocol, num_stations, run)?);
        }
        Ok(results)
    }

    /// Every configured population, every configured protocol
    pub fn run(&mut self) -> Result<SweepResults, ConfigError> {
        let mut sweep = SweepResults::default();

        let station_counts = self.config.station_counts.clone();
        let protocols = self.config.protocols.clone();
        for &num_stations in &station_counts {
            for &protocol in &protocols {
                let results = self.run_batch(protocol, num_stations)?;
                sweep.runs.insert((protocol, num_stations), results);
            }
        }

        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac_interface::RecordingSink;

    fn full_load(n: usize, packet_size: PacketSize) -> Vec<StationParams> {
        vec![
            StationParams {
                load: 1.0,
                packet_size,
            };
            n
        ]
    }

    fn small_config() -> SweepConfig {
        SweepConfig {
            num_runs: 4,
            num_slots: 300,
            station_counts: vec![3, 6],
            seed: Some("0x0badc0de".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_slots_rejected_before_running() {
        let rng = SimRng::from_seed([0u8; 32]);
        let err = Simulation::new(Protocol::Aloha, &full_load(2, 1), 8, 0, rng).err();
        assert_eq!(err, Some(ConfigError::InvalidSlots));
    }

    #[test]
    fn test_invalid_station_params_rejected() {
        let params = [StationParams {
            load: -0.5,
            packet_size: 1,
        }];
        let rng = SimRng::from_seed([0u8; 32]);
        assert!(matches!(
            Simulation::new(Protocol::Csma, &params, 8, 10, rng),
            Err(ConfigError::InvalidLoadRange(_, _))
        ));

        let rng = SimRng::from_seed([0u8; 32]);
        assert_eq!(
            Simulation::new(Protocol::Csma, &[], 8, 10, rng).err(),
            Some(ConfigError::InvalidStationCount)
        );

        let oversized = [StationParams {
            load: 1.0,
            packet_size: u64::MAX,
        }];
        let rng = SimRng::from_seed([0u8; 32]);
        assert_eq!(
            Simulation::new(Protocol::Csma, &oversized, 8, 10, rng).err(),
            Some(ConfigError::InvalidPacketSizeRange(u64::MAX, u64::MAX))
        );
    }

    #[test]
    fn test_duplicate_population_rejected_before_running() {
        let config = SweepConfig {
            num_runs: 2,
            station_counts: vec![3, 3],
            ..small_config()
        };
        assert_eq!(
            SweepRunner::new(config).err(),
            Some(ConfigError::DuplicateStationCount(3))
        );
    }

    #[test]
    fn test_zero_load_gives_undefined_collision_rate() {
        let params = [StationParams {
            load: 0.0,
            packet_size: 1,
        }; 3];
        for protocol in Protocol::ALL {
            let rng = SimRng::from_seed([1u8; 32]);
            let result = Simulation::new(protocol, &params, 8, 50, rng).unwrap().run();
            assert_eq!(result.collision_rate, None);
            assert_eq!(result.transmission_attempts, 0);
            assert_eq!(result.throughput, 0.0);
            assert_eq!(Metric::CollisionRate.value(&result), None);
        }
    }

    #[test]
    fn test_throughput_counts_delivered_bits_only() {
        let rng = SimRng::from_seed([2u8; 32]);
        let result = Simulation::new(Protocol::Aloha, &full_load(1, 3), 8, 20, rng)
            .unwrap()
            .run();
        assert_eq!(result.delivered_bits, 60);
        assert_eq!(result.throughput, 3.0);
        assert_eq!(result.collision_rate, Some(0.0));
    }

    #[test]
    fn test_seed_is_recorded() {
        let rng = SimRng::from_seed([9u8; 32]);
        let result = Simulation::new(Protocol::Csma, &full_load(2, 1), 8, 5, rng)
            .unwrap()
            .run();
        assert_eq!(result.seed, [9u8; 32]);
        assert_eq!(result.num_slots, 5);
    }

    #[test]
    fn test_sink_sees_every_delivery() {
        let rng = SimRng::from_seed([3u8; 32]);
        let mut sink = RecordingSink::default();
        let result = Simulation::new(Protocol::Csma, &full_load(3, 2), 4, 40, rng)
            .unwrap()
            .run_with_sink(&mut sink);

        let delivered = sink
            .events
            .iter()
            .filter(|(_, _, e)| matches!(e, crate::mac_interface::Event::Delivered { .. }))
            .count() as u64;
        assert_eq!(delivered, result.delivered_packets);
    }

    #[test]
    fn test_station_params_drawn_within_ranges() {
        let mut rng = SimRng::from_seed([4u8; 32]);
        let params = draw_station_params(50, (0.05, 0.4), (50, 1500), &mut rng);

        assert_eq!(params.len(), 50);
        for p in params {
            assert!((0.05..=0.4).contains(&p.load));
            assert!((50..=1500).contains(&p.packet_size));
        }
    }

    #[test]
    fn test_sweep_covers_every_pair_in_order() {
        let mut runner = SweepRunner::new(small_config()).unwrap();
        let sweep = runner.run().unwrap();

        let keys: Vec<_> = sweep.runs.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                (Protocol::Aloha, 3),
                (Protocol::Csma, 3),
                (Protocol::Aloha, 6),
                (Protocol::Csma, 6),
            ]
        );
        for runs in sweep.runs.values() {
            assert_eq!(runs.len(), 4);
            for (i, r) in runs.iter().enumerate() {
                assert_eq!(r.replication, i);
            }
        }
        assert_eq!(sweep.iter().count(), 16);
    }

    #[test]
    fn test_replications_get_distinct_seeds() {
        let mut runner = SweepRunner::new(small_config()).unwrap();
        let runs = runner.run_batch(Protocol::Aloha, 3).unwrap();

        for i in 0..runs.len() {
            for j in (i + 1)..runs.len() {
                assert_ne!(runs[i].seed, runs[j].seed);
            }
        }
    }

    #[test]
    fn test_fixed_seed_sweep_is_reproducible() {
        let a = SweepRunner::new(small_config()).unwrap().run().unwrap();
        let b = SweepRunner::new(small_config()).unwrap().run().unwrap();
        assert_eq!(a.runs, b.runs);
    }

    #[test]
    fn test_unseeded_replications_differ() {
        let config = SweepConfig {
            seed: None,
            ..small_config()
        };
        let mut runner = SweepRunner::new(config).unwrap();
        let a = runner.run_replication(Protocol::Aloha, 6, 0).unwrap();
        let b = runner.run_replication(Protocol::Aloha, 6, 0).unwrap();
        assert_ne!(a.seed, b.seed);
    }

    #[test]
    fn test_invalid_config_rejected_by_runner() {
        let config = SweepConfig {
            num_slots: 0,
            ..Default::default()
        };
        let err = SweepRunner::new(config).err().map(|e| e.to_string());
        assert_eq!(err, Some("slot count must be at least 1".to_string()));
    }

    #[test]
    fn test_metric_samples() {
        let mut runner = SweepRunner::new(small_config()).unwrap();
        let sweep = runner.run().unwrap();

        let tput = sweep.samples(Protocol::Csma, 6, Metric::Throughput);
        assert_eq!(tput.len(), 4);
        assert!(tput.iter().all(|&t| t >= 0.0));

        let csma_collisions = sweep.samples(Protocol::Csma, 6, Metric::CollisionRate);
        assert!(csma_collisions.iter().all(|&c| c == 0.0));

        assert!(sweep.samples(Protocol::Csma, 99, Metric::Delay).is_empty());
    }
}
