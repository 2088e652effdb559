//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task;
use tokio::time::Instant;

use crate::collections::InterfaceId;
use crate::interface::ism;

//
// OSPF ISM tasks diagram:
//                                    +--------------+
//                 hello_rx (Nx) ->   |              | -> (Nx) hello_tx
//                 nbr_kill (Nx) ->   |              | -> (Nx) delayed_ack_tx
//                                    |   instance   | -> (Nx) nsm_event
//        ism_hello_timer (Nx) ->     |              |
//         ism_wait_timer (Nx) ->     |              |
//          ism_ack_timer (Nx) ->     |              |
//         ism_poll_timer (Nx) ->     |              |
//                                    +--------------+
//

// Interface timers.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum TimerKind {
    Hello,
    Wait,
    Ack,
    Poll,
}

// Timer service used by the interface state machine.
//
// Starting a timer that is already running replaces it. Cancelling a timer that
// isn't running (either because it has already fired or because it was never
// started) is a no-op.
pub trait Scheduler {
    fn timer_start(
        &self,
        iface_id: InterfaceId,
        timer: TimerKind,
        timeout: Duration,
    );

    fn timer_cancel(&self, iface_id: InterfaceId, timer: TimerKind);
}

/// A handle which can be used to manipulate the timeout task created by the
/// [`TimeoutTask::new`] function.
///
/// Dropping this handle cancels the timeout task.
#[derive(Debug)]
pub struct TimeoutTask {
    join_handle: task::JoinHandle<()>,
    next: Instant,
}

// Tokio-based timer service.
//
// Expired timers are delivered to the instance as ISM events.
#[derive(Debug)]
pub struct TaskScheduler {
    tasks: Mutex<HashMap<(InterfaceId, TimerKind), TimeoutTask>>,
    ism_eventp: UnboundedSender<messages::ProtocolInputMsg>,
}

// OSPF ISM inter-task message types.
pub mod messages {
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use crate::collections::{
        InterfaceId, InterfaceKey, NeighborId, NeighborKey,
    };
    use crate::interface::ism;
    use crate::neighbor::nsm;
    use crate::network::Hello;
    use crate::tasks::TimerKind;

    // Type aliases.
    pub type ProtocolInputMsg = input::ProtocolMsg;
    pub type ProtocolOutputMsg = output::ProtocolMsg;

    // Input messages (child task -> main task).
    pub mod input {
        use super::*;

        #[derive(Debug, Deserialize, Serialize)]
        pub enum ProtocolMsg {
            IsmEvent(IsmEventMsg),
            HelloRx(HelloRxMsg),
            NbrKill(NbrKillMsg),
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct IsmEventMsg {
            pub iface_key: InterfaceKey,
            pub event: ism::Event,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct HelloRxMsg {
            pub iface_key: InterfaceKey,
            pub src: Ipv4Addr,
            pub hello: Hello,
        }

        #[derive(Debug, Deserialize, Serialize)]
        pub struct NbrKillMsg {
            pub iface_key: InterfaceKey,
            pub nbr_key: NeighborKey,
        }
    }

    // Output messages (main task -> child task).
    pub mod output {
        use super::*;

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub enum ProtocolMsg {
            HelloTx(HelloTxMsg),
            DelayedAckTx(DelayedAckTxMsg),
            NsmEvent(NsmEventMsg),
            TimerStart(TimerStartMsg),
            TimerCancel(TimerCancelMsg),
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct HelloTxMsg {
            pub iface_id: InterfaceId,
            pub dst: Ipv4Addr,
            pub ttl: u8,
            pub hello: Hello,
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct DelayedAckTxMsg {
            pub iface_id: InterfaceId,
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct NsmEventMsg {
            pub iface_id: InterfaceId,
            pub nbr_id: NeighborId,
            pub event: nsm::Event,
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct TimerStartMsg {
            pub iface_id: InterfaceId,
            pub timer: TimerKind,
            pub timeout: Duration,
        }

        #[derive(Clone, Debug, Eq, PartialEq)]
        #[derive(Deserialize, Serialize)]
        pub struct TimerCancelMsg {
            pub iface_id: InterfaceId,
            pub timer: TimerKind,
        }
    }
}

// ===== impl TimerKind =====

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::Hello,
        TimerKind::Wait,
        TimerKind::Ack,
        TimerKind::Poll,
    ];

    // Returns the ISM event triggered when the timer expires.
    pub const fn event(&self) -> ism::Event {
        match self {
            TimerKind::Hello => ism::Event::HelloTimer,
            TimerKind::Wait => ism::Event::WaitTimer,
            TimerKind::Ack => ism::Event::AckTimer,
            TimerKind::Poll => ism::Event::PollTimer,
        }
    }
}

// ===== impl TimeoutTask =====

impl TimeoutTask {
    /// Spawns a new task that will call the provided async closure when the
    /// specified timeout expires.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new<F, Fut>(timeout: Duration, cb: F) -> TimeoutTask
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let next = Instant::now() + timeout;
        let join_handle = task::spawn(async move {
            tokio::time::sleep_until(next).await;
            (cb)().await;
        });

        TimeoutTask { join_handle, next }
    }

    /// Returns the remaining time before the timeout expires.
    pub fn remaining(&self) -> Duration {
        self.next.saturating_duration_since(Instant::now())
    }

    /// Returns whether the timeout has already expired.
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

impl Drop for TimeoutTask {
    fn drop(&mut self) {
        self.join_handle.abort();
    }
}

// ===== impl TaskScheduler =====

impl TaskScheduler {
    pub fn new(
        ism_eventp: UnboundedSender<messages::ProtocolInputMsg>,
    ) -> TaskScheduler {
        TaskScheduler {
            tasks: Default::default(),
            ism_eventp,
        }
    }

    // Returns the remaining time of the given timer, if it's running.
    pub fn remaining(
        &self,
        iface_id: InterfaceId,
        timer: TimerKind,
    ) -> Option<Duration> {
        let tasks = self.tasks.lock().unwrap();
        tasks
            .get(&(iface_id, timer))
            .filter(|task| !task.is_finished())
            .map(|task| task.remaining())
    }
}

impl Scheduler for TaskScheduler {
    fn timer_start(
        &self,
        iface_id: InterfaceId,
        timer: TimerKind,
        timeout: Duration,
    ) {
        let ism_eventp = self.ism_eventp.clone();
        let task = TimeoutTask::new(timeout, move || async move {
            let msg = messages::input::IsmEventMsg {
                iface_key: iface_id.into(),
                event: timer.event(),
            };
            let msg = messages::input::ProtocolMsg::IsmEvent(msg);
            let _ = ism_eventp.send(msg);
        });

        // Any previous instance of the timer is aborted once dropped.
        let mut tasks = self.tasks.lock().unwrap();
        tasks.insert((iface_id, timer), task);
    }

    fn timer_cancel(&self, iface_id: InterfaceId, timer: TimerKind) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.remove(&(iface_id, timer));
    }
}
