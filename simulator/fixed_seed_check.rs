//! Run the same sweep twice with a fixed seed and check the results match
//!
//! Run with: cargo run --example fixed_seed_check

use log::info;
use simple_logger::SimpleLogger;

use mac_sim::mac_rng::seed_to_hex;
use mac_sim::{Metric, Protocol, SweepConfig, SweepRunner};

fn main() {
    SimpleLogger::new().init().unwrap();

    let fixed_seed = "0x2a2a2a2a";

    info!("Running sweep twice with fixed seed: {}", fixed_seed);

    let config = SweepConfig {
        num_runs: 10,
        num_slots: 5_000,
        station_counts: vec![5, 20],
        seed: Some(fixed_seed.to_string()),
        ..Default::default()
    };

    let first = SweepRunner::new(config.clone()).unwrap().run().unwrap();
    let second = SweepRunner::new(config).unwrap().run().unwrap();

    for ((key, a), b) in first.runs.iter().zip(second.runs.values()) {
        assert_eq!(a, b, "replications differ for {:?}", key);
    }

    let aloha = &first.runs[&(Protocol::Aloha, 20)];
    info!("First ALOHA replication seed: {}", seed_to_hex(&aloha[0].seed));
    info!(
        "ALOHA, 20 stations, mean throughput: {:.4}",
        mac_sim::mac_stats::mean(&first.samples(Protocol::Aloha, 20, Metric::Throughput))
            .unwrap_or(0.0)
    );
    info!("✓ Seed verification passed!");
}
