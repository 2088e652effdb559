//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::election::DesignatedRouter;
use crate::interface::ism;
use crate::neighbor::nsm;
use crate::tasks::TimerKind;

// OSPF ISM debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Interfaces
    InterfaceCreate(&'a str),
    InterfaceDelete(&'a str),
    InterfaceStart(&'a str),
    InterfaceReset(&'a str, InterfaceInactiveReason),
    IsmEvent(&'a str, &'a ism::State, &'a ism::Event),
    IsmEventIgnored(&'a str, &'a ism::State, &'a ism::Event),
    IsmTransition(&'a str, &'a ism::State, &'a ism::State),
    IsmDrElection(
        &'a str,
        Option<DesignatedRouter>,
        Option<DesignatedRouter>,
        Option<DesignatedRouter>,
        Option<DesignatedRouter>,
    ),
    IsmTimerStart(&'a str, TimerKind),
    // Neighbors
    NeighborCreate(Ipv4Addr),
    NeighborDelete(Ipv4Addr),
    NeighborEvent(Ipv4Addr, nsm::Event),
}

// Reason why the interface state machine was reset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum InterfaceInactiveReason {
    OperationalDown,
    LoopedBack,
    Administrative,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::InterfaceCreate(name)
            | Debug::InterfaceDelete(name)
            | Debug::InterfaceStart(name) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::InterfaceReset(name, reason) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug!(%reason, "{}", self);
                })
            }
            Debug::IsmEvent(name, state, event)
            | Debug::IsmEventIgnored(name, state, event) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?state, ?event, "{}", self);
                    })
                })
            }
            Debug::IsmTransition(name, old_state, new_state) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(?old_state, ?new_state, "{}", self);
                    })
                })
            }
            Debug::IsmDrElection(name, old_dr, new_dr, old_bdr, new_bdr) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug_span!("fsm").in_scope(|| {
                        debug!(
                            ?old_dr,
                            ?new_dr,
                            ?old_bdr,
                            ?new_bdr,
                            "{}",
                            self
                        );
                    })
                })
            }
            Debug::IsmTimerStart(name, timer) => {
                debug_span!("interface", %name).in_scope(|| {
                    debug!(?timer, "{}", self);
                })
            }
            Debug::NeighborCreate(router_id)
            | Debug::NeighborDelete(router_id) => {
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::NeighborEvent(router_id, event) => {
                debug_span!("neighbor", %router_id).in_scope(|| {
                    debug!(?event, "{}", self);
                })
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::InterfaceCreate(..) => {
                write!(f, "interface created")
            }
            Debug::InterfaceDelete(..) => {
                write!(f, "interface deleted")
            }
            Debug::InterfaceStart(..) => {
                write!(f, "starting interface")
            }
            Debug::InterfaceReset(..) => {
                write!(f, "resetting interface")
            }
            Debug::IsmEvent(..) => {
                write!(f, "event")
            }
            Debug::IsmEventIgnored(..) => {
                write!(f, "event ignored")
            }
            Debug::IsmTransition(..) => {
                write!(f, "state transition")
            }
            Debug::IsmDrElection(..) => {
                write!(f, "DR election")
            }
            Debug::IsmTimerStart(..) => {
                write!(f, "timer started")
            }
            Debug::NeighborCreate(..) => {
                write!(f, "neighbor created")
            }
            Debug::NeighborDelete(..) => {
                write!(f, "neighbor deleted")
            }
            Debug::NeighborEvent(..) => {
                write!(f, "injecting neighbor event")
            }
        }
    }
}

// ===== impl InterfaceInactiveReason =====

impl std::fmt::Display for InterfaceInactiveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceInactiveReason::OperationalDown => {
                write!(f, "operational status down")
            }
            InterfaceInactiveReason::LoopedBack => {
                write!(f, "looped back")
            }
            InterfaceInactiveReason::Administrative => {
                write!(f, "administrative reset")
            }
        }
    }
}
