// Sweep Configuration

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::mac_interface::{PacketSize, Protocol};
use crate::mac_rng::{parse_seed_hex, Seed};

/// Largest accepted packet size in bits
pub const MAX_PACKET_SIZE: PacketSize = u32::MAX as PacketSize;

// ============================================================================
// Errors
// ============================================================================

/// Rejected configuration, reported before any slot executes
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidSlots,
    InvalidRuns,
    EmptyPopulation,
    InvalidStationCount,
    DuplicateStationCount(usize),
    InvalidLoadRange(f64, f64),
    InvalidPacketSizeRange(PacketSize, PacketSize),
    NoProtocols,
    DuplicateProtocol(Protocol),
    InvalidSeed(String),
    Io(String),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSlots => write!(f, "slot count must be at least 1"),
            ConfigError::InvalidRuns => write!(f, "replication count must be at least 1"),
            ConfigError::EmptyPopulation => write!(f, "station count list is empty"),
            ConfigError::InvalidStationCount => write!(f, "station counts must be at least 1"),
            ConfigError::DuplicateStationCount(n) => {
                write!(f, "station count {} is listed more than once", n)
            }
            ConfigError::InvalidLoadRange(lo, hi) => write!(
                f,
                "offered-load range [{}, {}] must satisfy 0 <= lo <= hi <= 1",
                lo, hi
            ),
            ConfigError::InvalidPacketSizeRange(lo, hi) => write!(
                f,
                "packet size range [{}, {}] must satisfy 1 <= lo <= hi <= {}",
                lo, hi, MAX_PACKET_SIZE
            ),
            ConfigError::NoProtocols => write!(f, "no protocol selected"),
            ConfigError::DuplicateProtocol(p) => {
                write!(f, "protocol {} is listed more than once", p)
            }
            ConfigError::InvalidSeed(e) => write!(f, "invalid seed: {}", e),
            ConfigError::Io(e) => write!(f, "cannot read config: {}", e),
            ConfigError::Parse(e) => write!(f, "cannot parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Main Configuration
// ============================================================================

/// Parameters of a full protocol comparison sweep
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Independent replications per (protocol, population)
    pub num_runs: usize,

    /// Slots per replication
    pub num_slots: usize,

    /// Backoff ceiling (ALOHA drop threshold, CSMA defer upper bound)
    pub max_backoff: u64,

    /// Station populations to sweep
    pub station_counts: Vec<usize>,

    /// Base seed as hex; absent means fresh entropy per replication
    pub seed: Option<String>,

    /// Offered-load probability range, drawn per station
    pub load_range: (f64, f64),

    /// Packet size range, drawn per station
    pub packet_size_range: (PacketSize, PacketSize),

    pub protocols: Vec<Protocol>,

    /// Debug-level logging
    pub debug: bool,

    /// Per-run CSV export
    pub csv_output: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            num_runs: 100,
            num_slots: 10_000,
            max_backoff: 64,
            station_counts: vec![5, 10, 20, 50],
            seed: None,
            load_range: (0.05, 0.2),
            packet_size_range: (1, 3),
            protocols: Protocol::ALL.to_vec(),
            debug: false,
            csv_output: None,
        }
    }
}

impl SweepConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SweepConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_slots == 0 {
            return Err(ConfigError::InvalidSlots);
        }
        if self.num_runs == 0 {
            return Err(ConfigError::InvalidRuns);
        }
        if self.station_counts.is_empty() {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.station_counts.contains(&0) {
            return Err(ConfigError::InvalidStationCount);
        }
        if let Some(n) = first_duplicate(&self.station_counts) {
            return Err(ConfigError::DuplicateStationCount(n));
        }
        validate_load_range(self.load_range)?;
        validate_packet_size_range(self.packet_size_range)?;

        if self.protocols.is_empty() {
            return Err(ConfigError::NoProtocols);
        }
        if let Some(p) = first_duplicate(&self.protocols) {
            return Err(ConfigError::DuplicateProtocol(p));
        }
        self.base_seed()?;

        Ok(())
    }

    /// Parsed base seed, if one is configured
    pub fn base_seed(&self) -> Result<Option<Seed>, ConfigError> {
        match self.seed.as_deref() {
            None => Ok(None),
            Some(hex) => parse_seed_hex(hex)
                .map(Some)
                .map_err(ConfigError::InvalidSeed),
        }
    }
}

pub fn validate_load_range((lo, hi): (f64, f64)) -> Result<(), ConfigError> {
    let in_unit = |p: f64| (0.0..=1.0).contains(&p);
    if !in_unit(lo) || !in_unit(hi) || lo > hi {
        return Err(ConfigError::InvalidLoadRange(lo, hi));
    }
    Ok(())
}

pub fn validate_packet_size_range(
    (lo, hi): (PacketSize, PacketSize),
) -> Result<(), ConfigError> {
    if lo == 0 || lo > hi || hi > MAX_PACKET_SIZE {
        return Err(ConfigError::InvalidPacketSizeRange(lo, hi));
    }
    Ok(())
}

fn first_duplicate<T: Copy + PartialEq>(items: &[T]) -> Option<T> {
    items
        .iter()
        .enumerate()
        .find(|&(i, item)| items[..i].contains(item))
        .map(|(_, item)| *item)
}
