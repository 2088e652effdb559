//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use derive_new::new;
use tokio::sync::mpsc::UnboundedSender;
use tracing::error;

use crate::collections::{InterfaceId, NeighborId};
use crate::neighbor::nsm;
use crate::network::Hello;
use crate::tasks::messages::output::{
    DelayedAckTxMsg, HelloTxMsg, NsmEventMsg, TimerCancelMsg, TimerStartMsg,
};
use crate::tasks::{Scheduler, TimerKind};

pub use crate::tasks::messages::ProtocolOutputMsg;

// Side effects requested by the interface state machine.
pub trait ProtocolOutput {
    // Sends a Hello packet out of the given interface.
    fn send_hello(
        &self,
        iface_id: InterfaceId,
        dst: Ipv4Addr,
        ttl: u8,
        hello: &Hello,
    );

    // Flushes the delayed Link State Acknowledgments of the given interface.
    fn send_delayed_acks(&self, iface_id: InterfaceId);

    // Injects an event into the state machine of the given neighbor.
    fn nsm_event(
        &self,
        iface_id: InterfaceId,
        nbr_id: NeighborId,
        event: nsm::Event,
    );
}

// Forwards every requested side effect, timer operations included, as a
// message over an unbounded channel.
#[derive(Clone, Debug, new)]
pub struct ChannelOutput {
    output_tx: UnboundedSender<ProtocolOutputMsg>,
}

// ===== impl ChannelOutput =====

impl ChannelOutput {
    fn send(&self, msg: ProtocolOutputMsg) {
        if self.output_tx.send(msg).is_err() {
            error!("failed to send output message");
        }
    }
}

impl ProtocolOutput for ChannelOutput {
    fn send_hello(
        &self,
        iface_id: InterfaceId,
        dst: Ipv4Addr,
        ttl: u8,
        hello: &Hello,
    ) {
        let msg = HelloTxMsg {
            iface_id,
            dst,
            ttl,
            hello: hello.clone(),
        };
        self.send(ProtocolOutputMsg::HelloTx(msg));
    }

    fn send_delayed_acks(&self, iface_id: InterfaceId) {
        let msg = DelayedAckTxMsg { iface_id };
        self.send(ProtocolOutputMsg::DelayedAckTx(msg));
    }

    fn nsm_event(
        &self,
        iface_id: InterfaceId,
        nbr_id: NeighborId,
        event: nsm::Event,
    ) {
        let msg = NsmEventMsg {
            iface_id,
            nbr_id,
            event,
        };
        self.send(ProtocolOutputMsg::NsmEvent(msg));
    }
}

impl Scheduler for ChannelOutput {
    fn timer_start(
        &self,
        iface_id: InterfaceId,
        timer: TimerKind,
        timeout: Duration,
    ) {
        let msg = TimerStartMsg {
            iface_id,
            timer,
            timeout,
        };
        self.send(ProtocolOutputMsg::TimerStart(msg));
    }

    fn timer_cancel(&self, iface_id: InterfaceId, timer: TimerKind) {
        let msg = TimerCancelMsg { iface_id, timer };
        self.send(ProtocolOutputMsg::TimerCancel(msg));
    }
}
