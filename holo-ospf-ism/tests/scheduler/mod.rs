//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::time::Duration;

use holo_ospf_ism::collections::InterfaceKey;
use holo_ospf_ism::instance::Instance;
use holo_ospf_ism::interface::{InterfaceType, ism};
use holo_ospf_ism::output::{ChannelOutput, ProtocolOutputMsg};
use holo_ospf_ism::tasks::messages::ProtocolInputMsg;
use holo_ospf_ism::tasks::messages::input::IsmEventMsg;
use holo_ospf_ism::tasks::{Scheduler, TaskScheduler, TimerKind};
use tokio::sync::mpsc;

use crate::common::*;

const IFACE_ID: u32 = 1;

#[tokio::test(start_paused = true)]
async fn test_timer_fires() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = TaskScheduler::new(tx);

    scheduler.timer_start(IFACE_ID, TimerKind::Wait, Duration::from_secs(40));
    assert_eq!(
        scheduler.remaining(IFACE_ID, TimerKind::Wait),
        Some(Duration::from_secs(40))
    );

    let msg = rx.recv().await.unwrap();
    let ProtocolInputMsg::IsmEvent(msg) = msg else {
        panic!("unexpected message: {msg:?}");
    };
    assert_eq!(msg.iface_key, InterfaceKey::Id(IFACE_ID));
    assert_eq!(msg.event, ism::Event::WaitTimer);
}

#[tokio::test(start_paused = true)]
async fn test_timer_cancel() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = TaskScheduler::new(tx);

    scheduler.timer_start(IFACE_ID, TimerKind::Ack, Duration::from_secs(1));
    scheduler.timer_cancel(IFACE_ID, TimerKind::Ack);
    assert_eq!(scheduler.remaining(IFACE_ID, TimerKind::Ack), None);

    // Cancelling a timer that isn't running has no effect.
    scheduler.timer_cancel(IFACE_ID, TimerKind::Ack);
    scheduler.timer_cancel(IFACE_ID, TimerKind::Poll);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_timer_restart() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = TaskScheduler::new(tx);

    scheduler.timer_start(IFACE_ID, TimerKind::Hello, Duration::from_secs(10));
    scheduler.timer_start(IFACE_ID, TimerKind::Hello, Duration::from_secs(30));

    // The first instance of the timer never fires.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(rx.try_recv().is_err());

    let msg = rx.recv().await.unwrap();
    let ProtocolInputMsg::IsmEvent(IsmEventMsg { event, .. }) = msg else {
        panic!("unexpected message: {msg:?}");
    };
    assert_eq!(event, ism::Event::HelloTimer);
}

#[tokio::test(start_paused = true)]
async fn test_instance_run() {
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    let (output_tx, mut output_rx) = mpsc::unbounded_channel();
    let config = instance_cfg(iface_cfg(InterfaceType::Broadcast, 5));
    let mut instance = Instance::new(
        "test",
        &config,
        Box::new(TaskScheduler::new(input_tx.clone())),
        Box::new(ChannelOutput::new(output_tx)),
    );

    let msg = IsmEventMsg {
        iface_key: InterfaceKey::Value(IFNAME.to_owned()),
        event: ism::Event::InterfaceUp,
    };
    input_tx.send(ProtocolInputMsg::IsmEvent(msg)).unwrap();

    // The scheduler keeps the input channel open, so the instance runs until
    // the timeout expires. By then the wait timer has fired.
    let result = tokio::time::timeout(
        Duration::from_secs(45),
        instance.run(input_rx),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(
        instance.interfaces.get_by_name(IFNAME).unwrap().1.state(),
        ism::State::Dr
    );

    let mut hellos = 0;
    while let Ok(msg) = output_rx.try_recv() {
        if let ProtocolOutputMsg::HelloTx(_) = msg {
            hellos += 1;
        }
    }
    assert!(hellos >= 4);
}
