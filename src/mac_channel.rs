// Shared broadcast channel

use crate::mac_interface::PacketSize;

/// Single shared medium contended by every station of a replication
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Channel {
    busy: bool,

    /// Bits of the transmissions started since the last resolution
    in_flight_bits: u64,

    /// Bits put on the medium, delivered or not
    transmitted_bits: u64,
    /// Transmissions started
    packets: u64,

    delivered_bits: u64,
    delivered_packets: u64,

    /// Collision events, one per slot with two or more senders
    collision_events: u64,
}

impl Channel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn begin_transmission(&mut self, size: PacketSize) {
        self.busy = true;
        self.in_flight_bits = self.in_flight_bits.saturating_add(size);
        self.transmitted_bits = self.transmitted_bits.saturating_add(size);
        self.packets += 1;
    }

    /// Resolve the in-flight transmission as delivered.
    ///
    /// On an idle channel this changes nothing.
    pub fn deliver(&mut self) {
        if !self.busy {
            return;
        }
        self.busy = false;
        self.delivered_packets += 1;
        self.delivered_bits = self.delivered_bits.saturating_add(self.in_flight_bits);
        self.in_flight_bits = 0;
    }

    /// Resolve the in-flight transmissions as one collision
    pub fn signal_collision(&mut self) {
        if !self.busy {
            return;
        }
        self.busy = false;
        self.collision_events += 1;
        self.in_flight_bits = 0;
    }

    pub fn transmitted_bits(&self) -> u64 {
        self.transmitted_bits
    }

    pub fn packets(&self) -> u64 {
        self.packets
    }

    pub fn delivered_bits(&self) -> u64 {
        self.delivered_bits
    }

    pub fn delivered_packets(&self) -> u64 {
        self.delivered_packets
    }

    pub fn collision_events(&self) -> u64 {
        self.collision_events
    }
}
