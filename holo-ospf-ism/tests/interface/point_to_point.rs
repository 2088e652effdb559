//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use const_addrs::ip4;
use holo_ospf_ism::interface::{InterfaceType, ism};
use holo_ospf_ism::network::{MulticastAddr, VIRTUAL_LINK_TTL};
use holo_ospf_ism::tasks::TimerKind;

use crate::common::*;

const NBR_ADDR: Ipv4Addr = ip4!("10.0.0.2");
const NBR_RTR_ID: Ipv4Addr = ip4!("2.2.2.2");

#[test]
fn test_interface_up() {
    for if_type in [
        InterfaceType::PointToPoint,
        InterfaceType::PointToMultipoint,
        InterfaceType::Virtual,
    ] {
        let mut test = TestInstance::new(iface_cfg(if_type, 1));
        test.event(ism::Event::InterfaceUp);

        let output = test.output();
        assert_eq!(test.state(), ism::State::PointToPoint);
        assert_eq!(test.iface().if_type(), if_type);
        assert_eq!(test.iface().priority(), 1);
        assert_eq!(test.iface().src_addr(), IFADDR);
        assert_eq!(timer_started(&output, TimerKind::Wait), None);
        assert_eq!(
            timer_started(&output, TimerKind::Hello),
            Some(Duration::from_millis(100))
        );
    }
}

#[test]
fn test_loop_ind() {
    let mut test = TestInstance::new(iface_cfg(InterfaceType::PointToPoint, 1));
    test.event(ism::Event::InterfaceUp);
    test.output();

    test.event(ism::Event::LoopInd);
    let output = test.output();
    assert_eq!(test.state(), ism::State::Loopback);
    assert_eq!(timers_cancelled(&output), TimerKind::ALL.to_vec());
    assert_eq!(test.iface().dr(), None);
    assert_eq!(test.iface().bdr(), None);

    // No Hellos are sent while looped.
    test.event(ism::Event::HelloTimer);
    assert!(test.output().is_empty());
    assert_eq!(test.state(), ism::State::Loopback);
}

#[test]
fn test_down_up_round_trip() {
    let mut test = TestInstance::new(iface_cfg(InterfaceType::PointToPoint, 1));
    test.event(ism::Event::InterfaceUp);
    test.event(ism::Event::InterfaceDown);
    assert_eq!(test.state(), ism::State::Down);
    test.event(ism::Event::InterfaceUp);
    assert_eq!(test.state(), ism::State::PointToPoint);

    let output = test.output();
    assert_eq!(timer_started(&output, TimerKind::Wait), None);
    assert_eq!(test.iface().state.event_count, 3);
}

#[test]
fn test_nbr_change_ignored() {
    let mut test = TestInstance::new(iface_cfg(InterfaceType::PointToPoint, 1));
    test.event(ism::Event::InterfaceUp);
    test.hello_rx(NBR_ADDR, hello_2way(NBR_RTR_ID, 1));
    test.event(ism::Event::NbrChange);

    assert_eq!(test.state(), ism::State::PointToPoint);
    assert_eq!(test.iface().dr(), None);
    assert_eq!(test.iface().neighbor_count(), 1);
}

#[test]
fn test_hello_tx() {
    let mut test = TestInstance::new(iface_cfg(InterfaceType::PointToPoint, 1));
    test.event(ism::Event::InterfaceUp);
    test.output();
    test.event(ism::Event::HelloTimer);

    let output = test.output();
    let hellos = hellos_sent(&output);
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].dst, MulticastAddr::AllSpfRtrs.addr());
    assert_eq!(hellos[0].ttl, 1);
    assert_eq!(hellos[0].hello.network_mask, Ipv4Addr::UNSPECIFIED);
}

#[test]
fn test_virtual_link_hello_tx() {
    let mut test = TestInstance::new(iface_cfg(InterfaceType::Virtual, 1));
    test.event(ism::Event::InterfaceUp);
    test.output();

    // Nobody to talk to yet.
    test.event(ism::Event::HelloTimer);
    let output = test.output();
    assert!(hellos_sent(&output).is_empty());
    assert_eq!(
        timer_started(&output, TimerKind::Hello),
        Some(Duration::from_secs(10))
    );

    // Virtual links don't check the network mask.
    let mut hello = hello_2way(NBR_RTR_ID, 1);
    hello.network_mask = Ipv4Addr::UNSPECIFIED;
    test.hello_rx(NBR_ADDR, hello);
    assert_eq!(test.iface().neighbor_count(), 1);

    test.event(ism::Event::HelloTimer);
    let output = test.output();
    let hellos = hellos_sent(&output);
    assert_eq!(hellos.len(), 1);
    assert_eq!(hellos[0].dst, NBR_ADDR);
    assert_eq!(hellos[0].ttl, VIRTUAL_LINK_TTL);
    assert_eq!(hellos[0].hello.network_mask, Ipv4Addr::UNSPECIFIED);
    assert!(hellos[0].hello.neighbors.contains(&NBR_RTR_ID));
}
