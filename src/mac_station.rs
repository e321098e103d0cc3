// Station state machine

use crate::mac_interface::{PacketSize, StationId, StationState};
use crate::mac_rng::SimRng;

/// How a station picks its backoff after losing a contention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    /// Collision: draw from [0, 2^attempt - 1], drop above the ceiling
    BinaryExponential,
    /// Busy channel: draw from [1, max_backoff], never drops
    UniformDefer,
}

/// Result of a lost contention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContendOutcome {
    /// Zero backoff drawn, station retries at the next opportunity
    Retry,
    /// Station waits the given number of slots
    Wait(u64),
    /// Backoff above the ceiling, packet abandoned
    Lost(u64),
}

/// Immutable per-station parameters, drawn once per replication
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationParams {
    /// Per-slot probability of offering a new packet
    pub load: f64,
    pub packet_size: PacketSize,
}

/// Terminal counters of one station
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationCounters {
    /// Packets put on the channel (first attempts and retries)
    pub total_packets: u64,
    pub sent_packets: u64,
    pub collisions: u64,
    pub lost_packets: u64,
    /// Sum of granted backoffs, not of slots actually waited
    pub waiting_time: u64,
    pub deferrals: u64,
}

#[derive(Debug, Clone)]
pub struct Station {
    id: StationId,
    params: StationParams,
    max_backoff: u64,

    state: StationState,
    backoff: u64,
    attempts: u32,

    counters: StationCounters,
}

impl Station {
    pub fn new(id: StationId, params: StationParams, max_backoff: u64) -> Self {
        Self {
            id,
            params,
            max_backoff,
            state: StationState::Idle,
            backoff: 0,
            attempts: 0,
            counters: StationCounters::default(),
        }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn packet_size(&self) -> PacketSize {
        self.params.packet_size
    }

    pub fn load(&self) -> f64 {
        self.params.load
    }

    pub fn state(&self) -> StationState {
        self.state
    }

    pub fn backoff(&self) -> u64 {
        self.backoff
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn counters(&self) -> &StationCounters {
        &self.counters
    }

    pub fn is_waiting(&self) -> bool {
        self.state == StationState::Wait
    }

    /// Whether the station wants the channel this slot.
    ///
    /// A station ready to retransmit always does. An idle one offers a new
    /// packet with probability `load`, one fresh draw per call; stations in
    /// any other state never draw.
    pub fn has_frame_to_transmit(&self, rng: &mut SimRng) -> bool {
        match self.state {
            StationState::ReadyToRetransmit => true,
            StationState::Idle => rng.random() < self.params.load,
            StationState::Transmit | StationState::Wait => false,
        }
    }

    /// Put the pending packet on the channel
    pub fn offer(&mut self) {
        self.counters.total_packets += 1;
        self.attempts += 1;
        self.state = StationState::Transmit;
    }

    /// Acknowledgment received
    pub fn on_success(&mut self) {
        self.counters.sent_packets += 1;
        self.set_idle();
    }

    /// React to a lost contention according to `policy`
    pub fn on_contend(&mut self, policy: BackoffPolicy, rng: &mut SimRng) -> ContendOutcome {
        match policy {
            BackoffPolicy::BinaryExponential => self.on_collision(rng),
            BackoffPolicy::UniformDefer => self.on_defer(rng),
        }
    }

    fn on_collision(&mut self, rng: &mut SimRng) -> ContendOutcome {
        self.counters.collisions += 1;

        let window = contention_window(self.attempts);
        let backoff = rng.random_int(0, window);

        if backoff == 0 {
            self.backoff = 0;
            self.state = StationState::ReadyToRetransmit;
            ContendOutcome::Retry
        } else if backoff > self.max_backoff {
            self.counters.lost_packets += 1;
            self.set_idle();
            ContendOutcome::Lost(backoff)
        } else {
            self.enter_wait(backoff);
            ContendOutcome::Wait(backoff)
        }
    }

    fn on_defer(&mut self, rng: &mut SimRng) -> ContendOutcome {
        self.counters.deferrals += 1;
        let backoff = rng.random_int(1, self.max_backoff.max(1));
        self.enter_wait(backoff);
        ContendOutcome::Wait(backoff)
    }

    /// One slot elapsed; only meaningful while waiting
    pub fn tick_backoff(&mut self) {
        if self.state != StationState::Wait {
            return;
        }

        self.backoff = self.backoff.saturating_sub(1);
        if self.backoff == 0 {
            self.state = StationState::ReadyToRetransmit;
        }
    }

    fn enter_wait(&mut self, backoff: u64) {
        self.backoff = backoff;
        self.counters.waiting_time += backoff;
        self.state = StationState::Wait;
    }

    fn set_idle(&mut self) {
        self.state = StationState::Idle;
        self.backoff = 0;
        self.attempts = 0;
    }
}

/// Upper bound of the backoff draw after `attempts` failed tries: 2^attempts - 1
pub fn contention_window(attempts: u32) -> u64 {
    1u64.checked_shl(attempts).map_or(u64::MAX, |w| w - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(load: f64, max_backoff: u64) -> Station {
        Station::new(
            0,
            StationParams {
                load,
                packet_size: 2,
            },
            max_backoff,
        )
    }

    #[test]
    fn test_contention_window_doubles() {
        assert_eq!(contention_window(0), 0);
        assert_eq!(contention_window(1), 1);
        assert_eq!(contention_window(2), 3);
        assert_eq!(contention_window(5), 31);
        assert_eq!(contention_window(64), u64::MAX);
    }

    #[test]
    fn test_full_load_always_offers() {
        let mut rng = SimRng::from_seed([0u8; 32]);
        let s = station(1.0, 64);
        for _ in 0..100 {
            assert!(s.has_frame_to_transmit(&mut rng));
        }
    }

    #[test]
    fn test_zero_load_never_offers() {
        let mut rng = SimRng::from_seed([0u8; 32]);
        let s = station(0.0, 64);
        for _ in 0..100 {
            assert!(!s.has_frame_to_transmit(&mut rng));
        }
    }

    #[test]
    fn test_offer_and_success_cycle() {
        let mut s = station(0.5, 64);
        s.offer();
        assert_eq!(s.state(), StationState::Transmit);
        assert_eq!(s.attempts(), 1);
        assert_eq!(s.counters().total_packets, 1);

        s.on_success();
        assert_eq!(s.state(), StationState::Idle);
        assert_eq!(s.attempts(), 0);
        assert_eq!(s.backoff(), 0);
        assert_eq!(s.counters().sent_packets, 1);
    }

    #[test]
    fn test_transmitting_station_does_not_offer_again() {
        let mut rng = SimRng::from_seed([0u8; 32]);
        let mut s = station(1.0, 64);
        s.offer();
        assert!(!s.has_frame_to_transmit(&mut rng));
    }

    #[test]
    fn test_collision_backoff_within_window() {
        let mut rng = SimRng::from_seed([11u8; 32]);

        for _ in 0..200 {
            let mut s = station(1.0, u64::MAX);
            s.offer();
            s.offer();
            s.offer();
            let attempts = s.attempts();

            match s.on_contend(BackoffPolicy::BinaryExponential, &mut rng) {
                ContendOutcome::Retry => {
                    assert_eq!(s.state(), StationState::ReadyToRetransmit);
                    assert_eq!(s.attempts(), attempts);
                }
                ContendOutcome::Wait(b) => {
                    assert!(b >= 1 && b <= contention_window(attempts));
                    assert_eq!(s.state(), StationState::Wait);
                    assert_eq!(s.backoff(), b);
                    assert_eq!(s.counters().waiting_time, b);
                }
                ContendOutcome::Lost(_) => panic!("no ceiling, nothing may be lost"),
            }
            assert_eq!(s.counters().collisions, 1);
        }
    }

    #[test]
    fn test_backoff_above_ceiling_drops_packet() {
        let mut rng = SimRng::from_seed([5u8; 32]);
        let mut lost = 0;

        for _ in 0..200 {
            let mut s = station(1.0, 0);
            s.offer();
            s.offer();
            match s.on_contend(BackoffPolicy::BinaryExponential, &mut rng) {
                ContendOutcome::Lost(b) => {
                    assert!(b >= 1 && b <= 3);
                    assert_eq!(s.state(), StationState::Idle);
                    assert_eq!(s.attempts(), 0);
                    assert_eq!(s.backoff(), 0);
                    assert_eq!(s.counters().lost_packets, 1);
                    assert_eq!(s.counters().waiting_time, 0);
                    lost += 1;
                }
                ContendOutcome::Retry => {
                    assert_eq!(s.state(), StationState::ReadyToRetransmit);
                    assert_eq!(s.counters().lost_packets, 0);
                }
                ContendOutcome::Wait(_) => panic!("ceiling 0 admits no wait"),
            }
        }

        assert!(lost > 0);
    }

    #[test]
    fn test_wait_counts_down_to_ready() {
        let mut rng = SimRng::from_seed([0u8; 32]);
        let mut s = station(0.5, 4);

        let backoff = match s.on_contend(BackoffPolicy::UniformDefer, &mut rng) {
            ContendOutcome::Wait(b) => b,
            other => panic!("defer must wait, got {:?}", other),
        };
        assert!((1..=4).contains(&backoff));
        assert_eq!(s.counters().deferrals, 1);
        assert_eq!(s.counters().collisions, 0);

        for remaining in (1..backoff).rev() {
            s.tick_backoff();
            assert_eq!(s.backoff(), remaining);
            assert_eq!(s.state(), StationState::Wait);
        }
        s.tick_backoff();
        assert_eq!(s.backoff(), 0);
        assert_eq!(s.state(), StationState::ReadyToRetransmit);
        assert!(s.has_frame_to_transmit(&mut rng));
    }

    #[test]
    fn test_tick_ignores_non_waiting_station() {
        let mut s = station(0.5, 4);
        s.tick_backoff();
        assert_eq!(s.state(), StationState::Idle);
        assert_eq!(s.backoff(), 0);
    }

    #[test]
    fn test_defer_keeps_attempt_count() {
        let mut rng = SimRng::from_seed([0u8; 32]);
        let mut s = station(0.5, 8);
        s.offer();
        s.on_contend(BackoffPolicy::UniformDefer, &mut rng);
        assert_eq!(s.attempts(), 1);
    }
}
