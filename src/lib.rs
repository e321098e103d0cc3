//! # mac_sim - Slotted Contention Simulator
//!
//! Discrete-time simulation of two random-access MAC protocols, slotted ALOHA
//! and a carrier-sense variant, contending for one shared broadcast channel.
//! Each run reports throughput, collision rate, mean backoff delay and packet
//! loss under stochastic offered load.
//!
//! ## Core Components
//!
//! - **Station**: per-node state machine with binary exponential backoff
//! - **Channel**: shared medium with transmitted/delivered/collision counters
//! - **AlohaArbiter / CsmaArbiter**: per-slot arbitration rules
//! - **Simulation / SweepRunner**: replications and protocol/population sweeps
//!
//! Everything stochastic draws from one `SimRng` per replication, so a fixed
//! seed reproduces a run exactly.
//!
//! ```no_run
//! use mac_sim::{Protocol, SimRng, Simulation, StationParams};
//!
//! let stations = vec![StationParams { load: 0.1, packet_size: 2 }; 10];
//! let rng = SimRng::from_seed([42u8; 32]);
//! let result = Simulation::new(Protocol::Aloha, &stations, 64, 10_000, rng)
//!     .expect("valid parameters")
//!     .run();
//! println!("throughput: {}", result.throughput);
//! ```
//!
//! ## Reporting
//!
//! `mac_stats` and `mac_report` consume `RunResult`s only; see the
//! `sweep_runner` binary in `simulator/` for a complete sweep driven by a
//! YAML scenario.

// Engine
pub mod mac_aloha;
pub mod mac_channel;
pub mod mac_csma;
pub mod mac_interface;
pub mod mac_rng;
pub mod mac_station;

// Orchestration and configuration
pub mod mac_config;
pub mod mac_runner;

// Reporting
pub mod mac_report;
pub mod mac_stats;

// Re-export commonly used types
pub use mac_channel::Channel;
pub use mac_config::{ConfigError, SweepConfig};
pub use mac_interface::{
    Event, EventSink, NoOpSink, Protocol, SlotArbiter, SlotTime, StationId, StationState,
};
pub use mac_rng::{Seed, SimRng};
pub use mac_runner::{Metric, RunResult, Simulation, SweepResults, SweepRunner};
pub use mac_station::{Station, StationParams};
