//! Carrier-sense slot engine
//!
//! Stations sense the channel in id order. The first one with a frame finds it
//! idle and commits; every later one finds it busy and defers for a uniform
//! random number of slots. Contention is resolved by deferral alone, so this
//! engine never produces a collision.

use crate::mac_interface::{
    Event, Protocol, SlotArbiter, SlotContext, SlotOutcome, StationId,
};
use crate::mac_station::{BackoffPolicy, ContendOutcome};

pub struct CsmaArbiter;

impl SlotArbiter for CsmaArbiter {
    fn protocol(&self) -> Protocol {
        Protocol::Csma
    }

    fn run_slot(&self, ctx: &mut SlotContext<'_>) -> SlotOutcome {
        let waiting: Vec<StationId> = ctx
            .stations
            .iter()
            .filter(|s| s.is_waiting())
            .map(|s| s.id())
            .collect();

        let mut outcome = SlotOutcome::default();
        let mut sender: Option<StationId> = None;

        for station in ctx.stations.iter_mut() {
            if !station.has_frame_to_transmit(ctx.rng) {
                continue;
            }

            if !ctx.channel.is_busy() {
                station.offer();
                ctx.channel.begin_transmission(station.packet_size());
                sender = Some(station.id());
                outcome.transmitters += 1;
            } else if let ContendOutcome::Wait(backoff) =
                station.on_contend(BackoffPolicy::UniformDefer, ctx.rng)
            {
                ctx.sink.log(ctx.slot, station.id(), Event::Deferred { backoff });
                outcome.deferred += 1;
            }
        }

        if let Some(id) = sender {
            let station = &mut ctx.stations[id];
            ctx.channel.deliver();
            station.on_success();
            ctx.sink.log(
                ctx.slot,
                id,
                Event::Delivered {
                    size: station.packet_size(),
                },
            );
            outcome.delivered = true;
        }

        for id in waiting {
            ctx.stations[id].tick_backoff();
        }

        outcome
    }
}
