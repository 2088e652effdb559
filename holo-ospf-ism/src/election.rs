//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Designated Router election (RFC 2328 - Section 9.4).
//!
//! The election is a pure function of the local router's candidacy, the DR/BDR
//! currently declared on the interface and a snapshot of the attached
//! neighbors. It neither performs state transitions nor triggers any side
//! effect; that is left to the interface state machine.

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::neighbor::NeighborView;

/// Identifies a DR or BDR as seen on an interface.
///
/// The absence of a DR/BDR is represented by `None` wherever this type is
/// used.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct DesignatedRouter {
    pub addr: Ipv4Addr,
    pub router_id: Ipv4Addr,
}

/// Candidacy of the calculating router itself.
#[derive(Clone, Copy, Debug)]
pub struct LocalCandidate {
    pub addr: Ipv4Addr,
    pub router_id: Ipv4Addr,
    pub priority: u8,
}

/// Outcome of a DR election.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Election {
    pub dr: Option<DesignatedRouter>,
    pub bdr: Option<DesignatedRouter>,
    // Whether steps 2 and 3 had to be repeated because the local router's
    // own role changed.
    pub rerun: bool,
}

#[derive(Clone, Copy, Debug)]
struct DrCandidate {
    addr: Ipv4Addr,
    router_id: Ipv4Addr,
    priority: u8,
    dr: Option<Ipv4Addr>,
    bdr: Option<Ipv4Addr>,
}

// ===== impl DesignatedRouter =====

impl std::fmt::Display for DesignatedRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.addr, self.router_id)
    }
}

// ===== impl Election =====

impl Election {
    pub fn is_dr(&self, addr: Ipv4Addr) -> bool {
        self.dr.is_some_and(|dr| dr.addr == addr)
    }

    pub fn is_bdr(&self, addr: Ipv4Addr) -> bool {
        self.bdr.is_some_and(|bdr| bdr.addr == addr)
    }
}

// ===== impl DrCandidate =====

impl DrCandidate {
    fn declares_dr(&self) -> bool {
        self.dr == Some(self.addr)
    }

    fn declares_bdr(&self) -> bool {
        self.bdr == Some(self.addr)
    }

    // Priority first, Router ID second. The interface address is only used to
    // keep the ordering total in the presence of duplicate Router IDs.
    fn key(&self) -> (u8, Ipv4Addr, Ipv4Addr) {
        (self.priority, self.router_id, self.addr)
    }

    fn entry(&self) -> DesignatedRouter {
        DesignatedRouter {
            addr: self.addr,
            router_id: self.router_id,
        }
    }
}

impl From<NeighborView> for DrCandidate {
    fn from(nbr: NeighborView) -> DrCandidate {
        DrCandidate {
            addr: nbr.addr,
            router_id: nbr.router_id,
            priority: nbr.priority,
            dr: nbr.dr,
            bdr: nbr.bdr,
        }
    }
}

// ===== global functions =====

/// Runs the DR election.
///
/// `dr` and `bdr` are the values currently declared by the local router on the
/// interface. Neighbors that aren't in state 2-Way or greater, as well as those
/// with a Router Priority of zero, don't take part in the election. The same
/// holds for the local router when its own priority is zero.
///
/// The result doesn't depend on the order in which the neighbors are given.
pub fn elect<I>(
    local: LocalCandidate,
    dr: Option<DesignatedRouter>,
    bdr: Option<DesignatedRouter>,
    neighbors: I,
) -> Election
where
    I: IntoIterator<Item = NeighborView>,
{
    let nbrs = neighbors
        .into_iter()
        .filter(|nbr| nbr.is_dr_eligible())
        .map(DrCandidate::from)
        .collect::<Vec<_>>();

    // Step 1: note the current values for the network's Designated Router
    // and Backup Designated Router.
    let mut myself = DrCandidate {
        addr: local.addr,
        router_id: local.router_id,
        priority: local.priority,
        dr: dr.map(|dr| dr.addr),
        bdr: bdr.map(|bdr| bdr.addr),
    };

    let mut election = Election {
        dr: None,
        bdr: None,
        rerun: false,
    };
    for pass in 0..2 {
        let candidates = eligible_routers(&myself, &nbrs);

        // Step 2: calculate the new Backup Designated Router.
        let new_bdr = calc_bdr(&candidates);

        // Step 3: calculate the new Designated Router.
        let new_dr = calc_dr(&candidates).or(new_bdr);

        election.dr = new_dr.map(|rtr| rtr.entry());
        election.bdr = new_bdr.map(|rtr| rtr.entry());

        // Step 4: if the router is now newly the DR or BDR, or is no longer
        // the DR or BDR, repeat steps 2 and 3 (once).
        let was_dr = myself.declares_dr();
        let was_bdr = myself.declares_bdr();
        let is_dr = election.is_dr(myself.addr);
        let is_bdr = election.is_bdr(myself.addr);
        if pass == 0 && (was_dr != is_dr || was_bdr != is_bdr) {
            myself.dr = election.dr.map(|dr| dr.addr);
            myself.bdr = election.bdr.map(|bdr| bdr.addr);
            election.rerun = true;
            continue;
        }

        break;
    }

    // When nobody declared itself DR, the newly elected BDR was promoted to DR
    // above. Unless that router was the local one (handled by the second
    // pass), the BDR needs to be chosen again among the remaining routers.
    if let Some(dr) = election.dr
        && election.bdr == Some(dr)
    {
        let candidates = eligible_routers(&myself, &nbrs)
            .into_iter()
            .filter(|rtr| rtr.addr != dr.addr)
            .collect::<Vec<_>>();
        election.bdr = calc_bdr(&candidates).map(|rtr| rtr.entry());
    }

    election
}

fn eligible_routers(
    myself: &DrCandidate,
    nbrs: &[DrCandidate],
) -> Vec<DrCandidate> {
    (myself.priority != 0)
        .then_some(*myself)
        .into_iter()
        .chain(nbrs.iter().copied())
        .collect()
}

// Routers that declared themselves DR are not eligible to become BDR. Among the
// remaining ones, those that declared themselves BDR are preferred.
fn calc_bdr(candidates: &[DrCandidate]) -> Option<DrCandidate> {
    candidates
        .iter()
        .filter(|rtr| !rtr.declares_dr())
        .filter(|rtr| rtr.declares_bdr())
        .max_by_key(|rtr| rtr.key())
        .or_else(|| {
            candidates
                .iter()
                .filter(|rtr| !rtr.declares_dr())
                .max_by_key(|rtr| rtr.key())
        })
        .copied()
}

fn calc_dr(candidates: &[DrCandidate]) -> Option<DrCandidate> {
    candidates
        .iter()
        .filter(|rtr| rtr.declares_dr())
        .max_by_key(|rtr| rtr.key())
        .copied()
}
