//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

// TTL used by all OSPF packets sent over physical links.
pub const HELLO_TTL: u8 = 1;

// TTL used by OSPF packets sent over virtual links.
pub const VIRTUAL_LINK_TTL: u8 = 32;

// OSPF multicast addresses.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum MulticastAddr {
    AllSpfRtrs,
}

// Contents of an OSPF Hello packet, as far as neighbor discovery and the DR
// election are concerned.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Hello {
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub network_mask: Ipv4Addr,
    pub hello_interval: u16,
    pub dead_interval: u16,
    pub priority: u8,
    pub dr: Option<Ipv4Addr>,
    pub bdr: Option<Ipv4Addr>,
    // Router IDs of the neighbors heard from recently.
    pub neighbors: BTreeSet<Ipv4Addr>,
}

// ===== impl MulticastAddr =====

impl MulticastAddr {
    pub const ALL_SPF_RTRS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 5);

    pub const fn addr(&self) -> Ipv4Addr {
        match self {
            MulticastAddr::AllSpfRtrs => Self::ALL_SPF_RTRS,
        }
    }
}

impl std::fmt::Display for MulticastAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.addr())
    }
}
