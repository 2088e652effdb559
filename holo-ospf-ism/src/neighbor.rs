//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use nsm::State;
use serde::{Deserialize, Serialize};

use crate::collections::NeighborId;
use crate::debug::Debug;

// Neighbor entity, as learned from received Hello packets.
//
// The interface state machine only reads these entries. Their lifetime is
// managed by whoever owns the neighbor arena.
#[derive(Debug)]
pub struct Neighbor {
    pub id: NeighborId,
    pub router_id: Ipv4Addr,
    pub src: Ipv4Addr,
    // DR/BDR as declared in the neighbor's last Hello packet.
    pub dr: Option<Ipv4Addr>,
    pub bdr: Option<Ipv4Addr>,
    pub priority: u8,
    pub state: State,
}

/// Read-only snapshot of the neighbor attributes relevant to the DR election.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct NeighborView {
    pub addr: Ipv4Addr,
    pub router_id: Ipv4Addr,
    pub priority: u8,
    pub dr: Option<Ipv4Addr>,
    pub bdr: Option<Ipv4Addr>,
    pub bidirectional: bool,
}

// Neighbor state machine.
//
// Only the parts of the NSM that the interface state machine needs to observe
// or drive are represented here.
pub mod nsm {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    pub enum State {
        #[default]
        Down,
        Attempt,
        Init,
        TwoWay,
        ExStart,
        Exchange,
        Loading,
        Full,
    }

    // Events injected into the neighbor state machine by the interface.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    pub enum Event {
        Start,
        AdjOk,
        KillNbr,
    }
}

// ===== impl Neighbor =====

impl Neighbor {
    pub(crate) fn new(
        id: NeighborId,
        router_id: Ipv4Addr,
        src: Ipv4Addr,
    ) -> Neighbor {
        Debug::NeighborCreate(router_id).log();

        Neighbor {
            id,
            router_id,
            src,
            dr: None,
            bdr: None,
            priority: 0,
            state: State::Down,
        }
    }

    // Forgets everything learned from the neighbor's Hellos, except for its
    // identity and Router Priority.
    pub(crate) fn reset(&mut self) {
        self.state = State::Down;
        self.dr = None;
        self.bdr = None;
    }

    // Returns whether bidirectional communication has been established with
    // this neighbor.
    pub fn is_bidirectional(&self) -> bool {
        self.state >= State::TwoWay
    }

    // Returns whether the neighbor declares itself as the DR.
    pub fn declares_dr(&self) -> bool {
        self.dr == Some(self.src)
    }

    // Returns whether the neighbor declares itself as the BDR.
    pub fn declares_bdr(&self) -> bool {
        self.bdr == Some(self.src)
    }

    pub fn view(&self) -> NeighborView {
        NeighborView {
            addr: self.src,
            router_id: self.router_id,
            priority: self.priority,
            dr: self.dr,
            bdr: self.bdr,
            bidirectional: self.is_bidirectional(),
        }
    }
}

impl Drop for Neighbor {
    fn drop(&mut self) {
        Debug::NeighborDelete(self.router_id).log();
    }
}

// ===== impl NeighborView =====

impl NeighborView {
    // Returns whether the neighbor can take part in the DR election.
    pub fn is_dr_eligible(&self) -> bool {
        self.bidirectional && self.priority != 0
    }
}
