//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::{warn, warn_span};

use crate::collections::{InterfaceId, NeighborId};

// OSPF ISM errors.
#[derive(Debug)]
pub enum Error {
    // Inter-task communication
    InterfaceIdNotFound(InterfaceId),
    InterfaceNameNotFound(String),
    NeighborIdNotFound(NeighborId),
    NeighborRouterIdNotFound(Ipv4Addr),
    // Neighbor discovery
    NeighborDuplicateRouterId(Ipv4Addr, Ipv4Addr),
    // Configuration
    StaticNbrsUnsupported(String),
    // Packet input
    InterfaceCfgError(String, Ipv4Addr, InterfaceCfgError),
}

// OSPF interface configuration errors.
#[derive(Debug)]
pub enum InterfaceCfgError {
    AreaIdMismatch(Ipv4Addr, Ipv4Addr),
    HelloMaskMismatch(Ipv4Addr, Ipv4Addr),
    HelloIntervalMismatch(u16, u16),
    DeadIntervalMismatch(u16, u16),
    DuplicateRouterId(Ipv4Addr),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::InterfaceIdNotFound(iface_id) => {
                warn!(?iface_id, "{}", self);
            }
            Error::InterfaceNameNotFound(name) => {
                warn!(%name, "{}", self);
            }
            Error::NeighborIdNotFound(nbr_id) => {
                warn!(?nbr_id, "{}", self);
            }
            Error::NeighborRouterIdNotFound(router_id) => {
                warn!(%router_id, "{}", self);
            }
            Error::NeighborDuplicateRouterId(router_id, source) => {
                warn!(%router_id, %source, "{}", self);
            }
            Error::StaticNbrsUnsupported(name) => {
                warn!(%name, "{}", self);
            }
            Error::InterfaceCfgError(iface, source, error) => {
                warn_span!("interface", name = %iface, %source).in_scope(|| {
                    error.log();
                })
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InterfaceIdNotFound(..) => {
                write!(f, "interface ID not found")
            }
            Error::InterfaceNameNotFound(..) => {
                write!(f, "interface name not found")
            }
            Error::NeighborIdNotFound(..) => {
                write!(f, "neighbor ID not found")
            }
            Error::NeighborRouterIdNotFound(..) => {
                write!(f, "neighbor Router ID not found")
            }
            Error::NeighborDuplicateRouterId(..) => {
                write!(f, "Router ID already in use by another neighbor")
            }
            Error::StaticNbrsUnsupported(..) => {
                write!(f, "static neighbors ignored on non-NBMA interface")
            }
            Error::InterfaceCfgError(_, _, error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InterfaceCfgError(_, _, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl InterfaceCfgError =====

impl InterfaceCfgError {
    pub(crate) fn log(&self) {
        match self {
            InterfaceCfgError::AreaIdMismatch(received, expected)
            | InterfaceCfgError::HelloMaskMismatch(received, expected) => {
                warn!(%received, %expected, "{}", self);
            }
            InterfaceCfgError::HelloIntervalMismatch(received, expected)
            | InterfaceCfgError::DeadIntervalMismatch(received, expected) => {
                warn!(%received, %expected, "{}", self);
            }
            InterfaceCfgError::DuplicateRouterId(router_id) => {
                warn!(%router_id, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for InterfaceCfgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceCfgError::AreaIdMismatch(..) => {
                write!(f, "area ID mismatch")
            }
            InterfaceCfgError::HelloMaskMismatch(..) => {
                write!(f, "network mask mismatch")
            }
            InterfaceCfgError::HelloIntervalMismatch(..) => {
                write!(f, "hello interval mismatch")
            }
            InterfaceCfgError::DeadIntervalMismatch(..) => {
                write!(f, "dead interval mismatch")
            }
            InterfaceCfgError::DuplicateRouterId(..) => {
                write!(f, "duplicate Router ID")
            }
        }
    }
}

impl std::error::Error for InterfaceCfgError {}
