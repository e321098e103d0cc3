//! Slotted ALOHA slot engine
//!
//! Every station with a frame transmits without looking at the channel. A lone
//! sender is delivered; two or more senders collide and each runs binary
//! exponential backoff on its own.

use log::debug;

use crate::mac_interface::{
    Event, Protocol, SlotArbiter, SlotContext, SlotOutcome, StationId,
};
use crate::mac_station::{BackoffPolicy, ContendOutcome};

pub struct AlohaArbiter;

impl SlotArbiter for AlohaArbiter {
    fn protocol(&self) -> Protocol {
        Protocol::Aloha
    }

    fn run_slot(&self, ctx: &mut SlotContext<'_>) -> SlotOutcome {
        // 1. eligibility, snapshot of waiting stations taken before anyone moves
        let mut transmitting: Vec<StationId> = Vec::new();
        for s in ctx.stations.iter() {
            if s.has_frame_to_transmit(ctx.rng) {
                transmitting.push(s.id());
            }
        }
        let waiting: Vec<StationId> = ctx
            .stations
            .iter()
            .filter(|s| s.is_waiting())
            .map(|s| s.id())
            .collect();

        // 2. transmissions
        for &id in &transmitting {
            let station = &mut ctx.stations[id];
            station.offer();
            ctx.channel.begin_transmission(station.packet_size());
        }

        let mut outcome = SlotOutcome {
            transmitters: transmitting.len(),
            ..Default::default()
        };

        match transmitting.as_slice() {
            [] => {}
            [id] => {
                let station = &mut ctx.stations[*id];
                station.on_success();
                ctx.channel.deliver();
                ctx.sink.log(
                    ctx.slot,
                    *id,
                    Event::Delivered {
                        size: station.packet_size(),
                    },
                );
                outcome.delivered = true;
            }
            colliding => {
                debug!(
                    "Slot {} : collision detected between {} stations {:?}",
                    ctx.slot,
                    colliding.len(),
                    colliding
                );
                ctx.channel.signal_collision();
                outcome.collided = true;

                for &id in colliding {
                    let station = &mut ctx.stations[id];
                    let attempts = station.attempts();
                    ctx.sink.log(
                        ctx.slot,
                        id,
                        Event::Collision {
                            participants: colliding.len(),
                        },
                    );

                    match station.on_contend(BackoffPolicy::BinaryExponential, ctx.rng) {
                        ContendOutcome::Retry => {}
                        ContendOutcome::Wait(backoff) => {
                            ctx.sink.log(ctx.slot, id, Event::BackoffStarted { backoff });
                        }
                        ContendOutcome::Lost(backoff) => {
                            ctx.sink
                                .log(ctx.slot, id, Event::PacketLost { attempts, backoff });
                        }
                    }
                }
            }
        }

        // 3. aging
        for id in waiting {
            ctx.stations[id].tick_backoff();
        }

        outcome
    }
}
