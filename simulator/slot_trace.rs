//! Trace a short run slot by slot
//!
//! Run with: cargo run --example slot_trace -- [aloha|csma]

use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use mac_sim::mac_report::LoggingEventSink;
use mac_sim::{Protocol, SimRng, Simulation, StationParams};

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()
        .unwrap();

    let protocol = match std::env::args().nth(1).as_deref() {
        Some("csma") => Protocol::Csma,
        _ => Protocol::Aloha,
    };

    let stations = [
        StationParams {
            load: 0.3,
            packet_size: 1,
        },
        StationParams {
            load: 0.3,
            packet_size: 2,
        },
        StationParams {
            load: 0.5,
            packet_size: 3,
        },
    ];

    let rng = SimRng::from_seed([42u8; 32]);
    let sim = Simulation::new(protocol, &stations, 8, 40, rng).unwrap();

    info!("Tracing {} with {} stations for 40 slots", protocol, stations.len());
    let result = sim.run_with_sink(&mut LoggingEventSink);

    info!("Delivered packets: {}", result.delivered_packets);
    info!("Throughput: {:.3} bits/slot", result.throughput);
    match result.collision_rate {
        Some(rate) => info!("Collision rate: {:.3}", rate),
        None => info!("Collision rate: undefined (no attempts)"),
    }
    info!("Mean waiting time: {:.2}", result.mean_waiting_time);
    info!("Mean lost packets: {:.2}", result.mean_lost_packets);
}
