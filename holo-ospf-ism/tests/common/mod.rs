//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use const_addrs::ip4;
use holo_ospf_ism::collections::{InterfaceKey, NeighborKey};
use holo_ospf_ism::config::{InstanceCfg, InterfaceCfg};
use holo_ospf_ism::instance::Instance;
use holo_ospf_ism::interface::{Interface, InterfaceType, ism};
use holo_ospf_ism::neighbor::{NeighborView, nsm};
use holo_ospf_ism::network::Hello;
use holo_ospf_ism::output::{ChannelOutput, ProtocolOutputMsg};
use holo_ospf_ism::tasks::TimerKind;
use holo_ospf_ism::tasks::messages::ProtocolInputMsg;
use holo_ospf_ism::tasks::messages::input::{
    HelloRxMsg, IsmEventMsg, NbrKillMsg,
};
use holo_ospf_ism::tasks::messages::output::{
    HelloTxMsg, NsmEventMsg, TimerStartMsg,
};
use ipnetwork::Ipv4Network;
use maplit::btreemap;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub const ROUTER_ID: Ipv4Addr = ip4!("1.1.1.1");
pub const AREA_ID: Ipv4Addr = ip4!("0.0.0.0");
pub const IFNAME: &str = "eth0";
pub const IFADDR: Ipv4Addr = ip4!("10.0.0.1");
pub const NETMASK: Ipv4Addr = ip4!("255.255.255.0");

// Single-interface instance whose side effects are collected from a channel.
pub struct TestInstance {
    pub instance: Instance,
    output_rx: UnboundedReceiver<ProtocolOutputMsg>,
}

//
// Helper functions.
//

pub fn iface_cfg(if_type: InterfaceType, priority: u8) -> InterfaceCfg {
    InterfaceCfg {
        if_type,
        address: Ipv4Network::new(IFADDR, 24).unwrap(),
        priority,
        ..Default::default()
    }
}

pub fn instance_cfg(iface_cfg: InterfaceCfg) -> InstanceCfg {
    InstanceCfg {
        router_id: ROUTER_ID,
        area_id: AREA_ID,
        interfaces: btreemap! {
            IFNAME.to_owned() => iface_cfg,
        },
    }
}

// Hello sent by a neighbor that hasn't heard from the local router yet.
pub fn hello(router_id: Ipv4Addr, priority: u8) -> Hello {
    Hello {
        router_id,
        area_id: AREA_ID,
        network_mask: NETMASK,
        hello_interval: InterfaceCfg::DFLT_HELLO_INTERVAL,
        dead_interval: InterfaceCfg::DFLT_DEAD_INTERVAL,
        priority,
        dr: None,
        bdr: None,
        neighbors: BTreeSet::new(),
    }
}

// Hello sent by a neighbor that has already heard from the local router.
pub fn hello_2way(router_id: Ipv4Addr, priority: u8) -> Hello {
    let mut hello = hello(router_id, priority);
    hello.neighbors.insert(ROUTER_ID);
    hello
}

pub fn nbr_view(
    addr: Ipv4Addr,
    router_id: Ipv4Addr,
    priority: u8,
    dr: Option<Ipv4Addr>,
    bdr: Option<Ipv4Addr>,
) -> NeighborView {
    NeighborView {
        addr,
        router_id,
        priority,
        dr,
        bdr,
        bidirectional: true,
    }
}

pub fn timer_started(
    output: &[ProtocolOutputMsg],
    timer: TimerKind,
) -> Option<Duration> {
    output.iter().find_map(|msg| match msg {
        ProtocolOutputMsg::TimerStart(TimerStartMsg {
            timer: t, timeout, ..
        }) if *t == timer => Some(*timeout),
        _ => None,
    })
}

pub fn timers_cancelled(output: &[ProtocolOutputMsg]) -> Vec<TimerKind> {
    output
        .iter()
        .filter_map(|msg| match msg {
            ProtocolOutputMsg::TimerCancel(msg) => Some(msg.timer),
            _ => None,
        })
        .collect()
}

pub fn hellos_sent(output: &[ProtocolOutputMsg]) -> Vec<&HelloTxMsg> {
    output
        .iter()
        .filter_map(|msg| match msg {
            ProtocolOutputMsg::HelloTx(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

pub fn nsm_events(
    output: &[ProtocolOutputMsg],
    event: nsm::Event,
) -> Vec<&NsmEventMsg> {
    output
        .iter()
        .filter_map(|msg| match msg {
            ProtocolOutputMsg::NsmEvent(msg) if msg.event == event => Some(msg),
            _ => None,
        })
        .collect()
}

// ===== impl TestInstance =====

impl TestInstance {
    pub fn new(iface_cfg: InterfaceCfg) -> TestInstance {
        let config = instance_cfg(iface_cfg);
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let output = ChannelOutput::new(output_tx);
        let instance = Instance::new(
            "test",
            &config,
            Box::new(output.clone()),
            Box::new(output),
        );

        TestInstance {
            instance,
            output_rx,
        }
    }

    pub fn event(&mut self, event: ism::Event) {
        let msg = IsmEventMsg {
            iface_key: InterfaceKey::Value(IFNAME.to_owned()),
            event,
        };
        self.instance.process_msg(ProtocolInputMsg::IsmEvent(msg));
    }

    pub fn hello_rx(&mut self, src: Ipv4Addr, hello: Hello) {
        let msg = HelloRxMsg {
            iface_key: InterfaceKey::Value(IFNAME.to_owned()),
            src,
            hello,
        };
        self.instance.process_msg(ProtocolInputMsg::HelloRx(msg));
    }

    pub fn nbr_kill(&mut self, router_id: Ipv4Addr) {
        let msg = NbrKillMsg {
            iface_key: InterfaceKey::Value(IFNAME.to_owned()),
            nbr_key: NeighborKey::Value(router_id),
        };
        self.instance.process_msg(ProtocolInputMsg::NbrKill(msg));
    }

    pub fn iface(&self) -> &Interface {
        let (_, iface) = self.instance.interfaces.get_by_name(IFNAME).unwrap();
        iface
    }

    pub fn state(&self) -> ism::State {
        self.iface().state()
    }

    pub fn neighbor(&self, n: usize) -> Option<NeighborView> {
        self.iface().neighbor(&self.instance.neighbors, n)
    }

    // Returns all side effects produced since the last call.
    pub fn output(&mut self) -> Vec<ProtocolOutputMsg> {
        let mut output = vec![];
        while let Ok(msg) = self.output_rx.try_recv() {
            output.push(msg);
        }
        output
    }
}
