//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};

use crate::interface::InterfaceType;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstanceCfg {
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub interfaces: BTreeMap<String, InterfaceCfg>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterfaceCfg {
    pub if_type: InterfaceType,
    // Primary address and mask of the interface.
    pub address: Ipv4Network,
    pub priority: u8,
    pub hello_interval: u16,
    pub dead_interval: u16,
    pub poll_interval: u16,
    // Interval between delayed Link State Acknowledgment transmissions.
    pub ack_delay: u16,
    // Configured neighbors (NBMA only).
    pub static_nbrs: BTreeMap<Ipv4Addr, StaticNbr>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticNbr {
    pub priority: u8,
}

// ===== impl InstanceCfg =====

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            router_id: Ipv4Addr::UNSPECIFIED,
            area_id: Ipv4Addr::UNSPECIFIED,
            interfaces: Default::default(),
        }
    }
}

// ===== impl InterfaceCfg =====

impl InterfaceCfg {
    pub const DFLT_PRIORITY: u8 = 1;
    pub const DFLT_HELLO_INTERVAL: u16 = 10;
    pub const DFLT_DEAD_INTERVAL: u16 = 40;
    pub const DFLT_POLL_INTERVAL: u16 = 120;
    pub const DFLT_ACK_DELAY: u16 = 1;
}

impl Default for InterfaceCfg {
    fn default() -> InterfaceCfg {
        InterfaceCfg {
            if_type: InterfaceType::Broadcast,
            address: Ipv4Network::from(Ipv4Addr::UNSPECIFIED),
            priority: InterfaceCfg::DFLT_PRIORITY,
            hello_interval: InterfaceCfg::DFLT_HELLO_INTERVAL,
            dead_interval: InterfaceCfg::DFLT_DEAD_INTERVAL,
            poll_interval: InterfaceCfg::DFLT_POLL_INTERVAL,
            ack_delay: InterfaceCfg::DFLT_ACK_DELAY,
            static_nbrs: Default::default(),
        }
    }
}

// ===== impl StaticNbr =====

impl Default for StaticNbr {
    fn default() -> StaticNbr {
        StaticNbr {
            priority: InterfaceCfg::DFLT_PRIORITY,
        }
    }
}
