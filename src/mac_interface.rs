// Shared types for the slotted contention simulator

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mac_channel::Channel;
use crate::mac_rng::SimRng;
use crate::mac_station::Station;

pub type StationId = usize;
pub type SlotTime = u64;

/// Payload size of a single packet, in bits
pub type PacketSize = u64;

// ============================================================================
// Protocols
// ============================================================================

/// Medium-access discipline applied by a slot engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Slotted ALOHA: transmit blindly, detect collisions afterwards
    Aloha,
    /// Carrier sense: check the channel, defer when busy
    Csma,
}

impl Protocol {
    pub const ALL: [Protocol; 2] = [Protocol::Aloha, Protocol::Csma];

    /// Stable tag used for seed derivation and CSV output
    pub fn tag(&self) -> &'static str {
        match self {
            Protocol::Aloha => "aloha",
            Protocol::Csma => "csma",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Aloha => write!(f, "ALOHA"),
            Protocol::Csma => write!(f, "CSMA"),
        }
    }
}

// ============================================================================
// Station State
// ============================================================================

/// Station state machine tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationState {
    /// No packet in flight, may offer one
    Idle,
    /// Currently attempting a transmission
    Transmit,
    /// Backoff timer running
    Wait,
    /// Backoff elapsed, must retry at the next opportunity
    ReadyToRetransmit,
}

impl fmt::Display for StationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationState::Idle => write!(f, "Idle"),
            StationState::Transmit => write!(f, "Transmit"),
            StationState::Wait => write!(f, "Wait"),
            StationState::ReadyToRetransmit => write!(f, "Ready To Retransmit"),
        }
    }
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the slot engines for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A lone sender got its packet through
    Delivered { size: PacketSize },
    /// Two or more stations transmitted in the same slot
    Collision { participants: usize },
    /// Drawn backoff exceeded the ceiling, packet abandoned
    PacketLost { attempts: u32, backoff: u64 },
    /// Station entered backoff
    BackoffStarted { backoff: u64 },
    /// Station sensed a busy channel and deferred
    Deferred { backoff: u64 },
}

/// Trait for consuming events from the slot engines
pub trait EventSink {
    fn log(&mut self, slot: SlotTime, station: StationId, event: Event);
}

/// No-op event sink, used when nobody is listening
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _slot: SlotTime, _station: StationId, _event: Event) {}
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<(SlotTime, StationId, Event)>,
}

impl EventSink for RecordingSink {
    fn log(&mut self, slot: SlotTime, station: StationId, event: Event) {
        self.events.push((slot, station, event));
    }
}

// ============================================================================
// Slot Arbitration
// ============================================================================

/// Everything a slot engine may touch while processing one slot
pub struct SlotContext<'a> {
    pub slot: SlotTime,
    pub stations: &'a mut [Station],
    pub channel: &'a mut Channel,
    pub rng: &'a mut SimRng,
    pub sink: &'a mut dyn EventSink,
}

/// What happened on the channel during one slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotOutcome {
    /// Stations that put a packet on the channel
    pub transmitters: usize,
    /// Stations that found the channel busy and deferred
    pub deferred: usize,
    pub delivered: bool,
    pub collided: bool,
}

/// Protocol-specific arbitration rule, applied once per slot.
///
/// Implementations run the three phases in order: assess eligibility,
/// resolve transmissions, age backoff timers.
pub trait SlotArbiter {
    fn protocol(&self) -> Protocol;

    fn run_slot(&self, ctx: &mut SlotContext<'_>) -> SlotOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_tags_are_distinct() {
        assert_ne!(Protocol::Aloha.tag(), Protocol::Csma.tag());
        assert_eq!(Protocol::Aloha.to_string(), "ALOHA");
    }

    #[test]
    fn test_protocol_deserializes_lowercase() {
        let protocols: Vec<Protocol> = serde_yaml::from_str("[aloha, csma]").unwrap();
        assert_eq!(protocols, vec![Protocol::Aloha, Protocol::Csma]);
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        sink.log(1, 0, Event::Delivered { size: 3 });
        sink.log(2, 1, Event::Collision { participants: 2 });

        assert_eq!(sink.events.len(), 2);
        assert_eq!(sink.events[0].0, 1);
        assert_eq!(sink.events[1].2, Event::Collision { participants: 2 });
    }
}
