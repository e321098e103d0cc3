// Sweep Runner - Load a YAML scenario and compare ALOHA against CSMA
//
// Usage:
//   cargo run --release --bin sweep_runner scenarios/aloha_vs_csma.yaml
//   cargo run --release --bin sweep_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --release --bin sweep_runner scenarios/aloha_vs_csma.yaml --seed 0x1234 --runs 20
//
// Flags override the scenario file:
//   --seed HEX    fixed base seed
//   --runs N      replications per (protocol, population)
//   --slots N     slots per replication
//   --csv PATH    export one CSV row per replication
//   --debug       debug-level logging
//   --trace       log every engine event (very verbose, implies --debug)

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use mac_sim::mac_report::{print_sweep_summary, CsvRunWriter, LoggingEventSink};
use mac_sim::{SweepConfig, SweepRunner};

#[derive(Debug, Default)]
struct Overrides {
    seed: Option<String>,
    runs: Option<usize>,
    slots: Option<usize>,
    csv: Option<String>,
    debug: bool,
    trace: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <scenario.yaml | directory/> [--seed HEX] [--runs N] [--slots N] [--csv PATH] [--debug] [--trace]",
            args[0]
        );
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/aloha_vs_csma.yaml", args[0]);
        eprintln!("  {} scenarios/", args[0]);
        eprintln!("  {} scenarios/aloha_vs_csma.yaml --seed 0x2a --runs 20", args[0]);
        process::exit(1);
    }

    let overrides = parse_overrides(&args[2..]).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    // logger accepts everything, the global max level does the filtering
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialise logger: {}", e);
            process::exit(1);
        });

    let path = Path::new(&args[1]);
    let scenarios = if path.is_dir() {
        scenario_files(path)
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        process::exit(1);
    };

    if scenarios.is_empty() {
        eprintln!("No .yaml files found in {}", path.display());
        process::exit(1);
    }

    for (i, scenario) in scenarios.iter().enumerate() {
        info!("{}/{} Running: {}", i + 1, scenarios.len(), scenario.display());
        if let Err(e) = run_scenario_file(scenario, &overrides) {
            eprintln!("Error in {}: {}", scenario.display(), e);
            process::exit(1);
        }
    }
}

fn parse_overrides(args: &[String]) -> Result<Overrides, String> {
    let mut overrides = Overrides::default();
    let mut iter = args.iter();

    while let Some(flag) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} needs a value", name))
        };

        match flag.as_str() {
            "--seed" => overrides.seed = Some(value("--seed")?),
            "--runs" => {
                let v = value("--runs")?;
                overrides.runs = Some(v.parse().map_err(|e| format!("--runs {}: {}", v, e))?);
            }
            "--slots" => {
                let v = value("--slots")?;
                overrides.slots = Some(v.parse().map_err(|e| format!("--slots {}: {}", v, e))?);
            }
            "--csv" => overrides.csv = Some(value("--csv")?),
            "--debug" => overrides.debug = true,
            "--trace" => overrides.trace = true,
            other => return Err(format!("unknown flag {}", other)),
        }
    }

    Ok(overrides)
}

fn scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut scenarios = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str());
            if ext == Some("yaml") || ext == Some("yml") {
                scenarios.push(path);
            }
        }
    }

    scenarios.sort();
    scenarios
}

fn run_scenario_file(
    path: &Path,
    overrides: &Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = SweepConfig::from_file(path)?;

    if let Some(ref seed) = overrides.seed {
        config.seed = Some(seed.clone());
    }
    if let Some(runs) = overrides.runs {
        config.num_runs = runs;
    }
    if let Some(slots) = overrides.slots {
        config.num_slots = slots;
    }
    if let Some(ref csv) = overrides.csv {
        config.csv_output = Some(csv.clone());
    }
    if config.debug || overrides.debug || overrides.trace {
        log::set_max_level(LevelFilter::Debug);
    } else {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Configuration:");
    info!("  Replications: {}", config.num_runs);
    info!("  Slots: {}", config.num_slots);
    info!("  Max backoff: {}", config.max_backoff);
    info!("  Stations: {:?}", config.station_counts);
    info!("  Offered load: {:?}", config.load_range);
    info!("  Packet size: {:?}", config.packet_size_range);
    info!("  Seed: {}", config.seed.as_deref().unwrap_or("fresh entropy per run"));

    let mut runner = SweepRunner::new(config)?;
    if overrides.trace {
        runner = runner.with_event_sink(Box::new(LoggingEventSink));
    }

    let sweep = runner.run()?;
    print_sweep_summary(&sweep);

    if let Some(ref csv_path) = runner.config().csv_output {
        let mut csv = CsvRunWriter::create(csv_path)?;
        csv.write_sweep(&sweep)?;
        info!("Per-run results exported to: {}", csv_path);
    }

    Ok(())
}
