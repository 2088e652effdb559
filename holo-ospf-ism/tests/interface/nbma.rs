//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use const_addrs::ip4;
use holo_ospf_ism::config::{InterfaceCfg, StaticNbr};
use holo_ospf_ism::election::DesignatedRouter;
use holo_ospf_ism::interface::{InterfaceType, ism};
use holo_ospf_ism::neighbor::nsm;
use holo_ospf_ism::tasks::TimerKind;
use maplit::btreemap;

use crate::common::*;

// DR-eligible neighbor.
const NBR1_ADDR: Ipv4Addr = ip4!("10.0.0.2");
const NBR1_RTR_ID: Ipv4Addr = ip4!("2.2.2.2");
// Neighbor that can't become DR.
const NBR2_ADDR: Ipv4Addr = ip4!("10.0.0.3");

//
// Helper functions.
//

fn nbma_cfg(priority: u8) -> InterfaceCfg {
    let mut cfg = iface_cfg(InterfaceType::NonBroadcast, priority);
    cfg.static_nbrs = btreemap! {
        NBR1_ADDR => StaticNbr { priority: 1 },
        NBR2_ADDR => StaticNbr { priority: 0 },
    };
    cfg
}

fn hello_dsts(test: &mut TestInstance) -> Vec<Ipv4Addr> {
    let output = test.output();
    hellos_sent(&output).iter().map(|msg| msg.dst).collect()
}

//
// Tests.
//

#[test]
fn test_static_nbrs() {
    let test = TestInstance::new(nbma_cfg(1));

    assert_eq!(test.iface().neighbor_count(), 2);
    let nbr1 = test.neighbor(0).unwrap();
    assert_eq!(nbr1.addr, NBR1_ADDR);
    assert_eq!(nbr1.router_id, Ipv4Addr::UNSPECIFIED);
    assert_eq!(nbr1.priority, 1);
    assert!(!nbr1.bidirectional);
    let nbr2 = test.neighbor(1).unwrap();
    assert_eq!(nbr2.addr, NBR2_ADDR);
    assert_eq!(nbr2.priority, 0);
}

#[test]
fn test_interface_up() {
    let mut test = TestInstance::new(nbma_cfg(1));
    test.event(ism::Event::InterfaceUp);

    let output = test.output();
    assert_eq!(test.state(), ism::State::Waiting);
    assert_eq!(
        timer_started(&output, TimerKind::Poll),
        Some(Duration::from_secs(120))
    );
    assert_eq!(
        timer_started(&output, TimerKind::Wait),
        Some(Duration::from_secs(40))
    );

    // Only the neighbors eligible to become DR are started.
    let started = nsm_events(&output, nsm::Event::Start);
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].nbr_id, 1);
}

#[test]
fn test_interface_up_priority_zero() {
    let mut test = TestInstance::new(nbma_cfg(0));
    test.event(ism::Event::InterfaceUp);

    let output = test.output();
    assert_eq!(test.state(), ism::State::DrOther);
    assert_eq!(timer_started(&output, TimerKind::Wait), None);
    assert!(timer_started(&output, TimerKind::Poll).is_some());
    assert!(nsm_events(&output, nsm::Event::Start).is_empty());
}

#[test]
fn test_hello_tx_waiting() {
    let mut test = TestInstance::new(nbma_cfg(1));
    test.event(ism::Event::InterfaceUp);
    test.output();

    test.event(ism::Event::HelloTimer);
    assert_eq!(hello_dsts(&mut test), vec![NBR1_ADDR]);
}

#[test]
fn test_poll_timer() {
    let mut test = TestInstance::new(nbma_cfg(1));
    test.event(ism::Event::InterfaceUp);
    test.output();

    test.event(ism::Event::PollTimer);
    let output = test.output();
    let hellos = hellos_sent(&output);
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].dst, NBR1_ADDR);
    assert_eq!(
        timer_started(&output, TimerKind::Poll),
        Some(Duration::from_secs(120))
    );

    // Neighbors that are up aren't polled.
    test.hello_rx(NBR1_ADDR, hello(NBR1_RTR_ID, 1));
    assert_eq!(test.neighbor(0).unwrap().router_id, NBR1_RTR_ID);
    test.output();
    test.event(ism::Event::PollTimer);
    let output = test.output();
    assert!(hellos_sent(&output).is_empty());
    assert!(timer_started(&output, TimerKind::Poll).is_some());
}

#[test]
fn test_dr_talks_to_everyone() {
    let mut test = TestInstance::new(nbma_cfg(1));
    test.event(ism::Event::InterfaceUp);
    test.output();

    test.event(ism::Event::WaitTimer);
    let output = test.output();
    assert_eq!(test.state(), ism::State::Dr);

    // The new DR starts the neighbors that can't become DR.
    let started = nsm_events(&output, nsm::Event::Start);
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].nbr_id, 2);

    test.event(ism::Event::HelloTimer);
    assert_eq!(hello_dsts(&mut test), vec![NBR1_ADDR, NBR2_ADDR]);
}

#[test]
fn test_priority_zero_talks_to_dr() {
    let mut test = TestInstance::new(nbma_cfg(0));
    test.event(ism::Event::InterfaceUp);
    test.output();

    // Nobody is known to be the DR or BDR yet.
    test.event(ism::Event::HelloTimer);
    assert!(hello_dsts(&mut test).is_empty());

    let mut hello = hello_2way(NBR1_RTR_ID, 1);
    hello.dr = Some(NBR1_ADDR);
    test.hello_rx(NBR1_ADDR, hello);

    let output = test.output();
    assert_eq!(test.state(), ism::State::DrOther);
    assert_eq!(
        test.iface().dr(),
        Some(DesignatedRouter {
            addr: NBR1_ADDR,
            router_id: NBR1_RTR_ID,
        })
    );
    assert_eq!(test.iface().bdr(), None);
    let adj_ok = nsm_events(&output, nsm::Event::AdjOk);
    assert_eq!(adj_ok.len(), 1);
    assert_eq!(adj_ok[0].nbr_id, 1);

    test.event(ism::Event::HelloTimer);
    assert_eq!(hello_dsts(&mut test), vec![NBR1_ADDR]);
}

#[test]
fn test_static_nbrs_non_nbma() {
    let mut cfg = nbma_cfg(1);
    cfg.if_type = InterfaceType::Broadcast;
    let test = TestInstance::new(cfg);

    assert_eq!(test.iface().neighbor_count(), 0);
    assert!(test.instance.neighbors.is_empty());
}
