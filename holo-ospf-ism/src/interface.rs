//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ism::{Event, State};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::collections::{Arena, InterfaceId, Neighbors};
use crate::config::InterfaceCfg;
use crate::debug::{Debug, InterfaceInactiveReason};
use crate::election::{self, DesignatedRouter, LocalCandidate};
use crate::instance::InstanceUpView;
use crate::neighbor::{Neighbor, NeighborView, nsm};
use crate::network::{self, Hello, MulticastAddr};
use crate::tasks::TimerKind;

#[derive(Debug)]
pub struct Interface {
    pub id: InterfaceId,
    pub name: String,
    pub config: InterfaceCfg,
    pub state: InterfaceState,
}

#[derive(Debug)]
pub struct InterfaceState {
    // ISM state.
    pub ism_state: State,
    // DR/BDR as declared by the local router on this interface.
    pub dr: Option<DesignatedRouter>,
    pub bdr: Option<DesignatedRouter>,
    // List of neighbors attached to this interface.
    pub neighbors: Neighbors,
    // Statistics.
    pub event_count: u32,
    pub discontinuity_time: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterfaceType {
    PointToPoint,
    Broadcast,
    NonBroadcast,
    PointToMultipoint,
    Virtual,
}

// Hello destinations, along with the IP TTL to use for each one of them.
type HelloDst = SmallVec<[(Ipv4Addr, u8); 4]>;

// OSPF interface state machine.
pub mod ism {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
    #[derive(Deserialize, Serialize)]
    pub enum State {
        #[default]
        Down,
        Loopback,
        Waiting,
        PointToPoint,
        DrOther,
        Backup,
        Dr,
    }

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[derive(Deserialize, Serialize)]
    pub enum Event {
        InterfaceUp,
        HelloTimer,
        WaitTimer,
        BackupSeen,
        NbrChange,
        LoopInd,
        UnloopInd,
        InterfaceDown,
        AckTimer,
        PollTimer,
    }
}

// ===== impl Interface =====

impl Interface {
    pub(crate) fn new(
        id: InterfaceId,
        name: String,
        config: InterfaceCfg,
    ) -> Interface {
        Debug::InterfaceCreate(&name).log();

        Interface {
            id,
            name,
            config,
            state: Default::default(),
        }
    }

    // Interface state machine entry point.
    pub fn fsm(
        &mut self,
        instance: &InstanceUpView<'_>,
        neighbors: &mut Arena<Neighbor>,
        event: Event,
    ) {
        let ism_state = self.state.ism_state;
        Debug::IsmEvent(&self.name, &ism_state, &event).log();

        let new_ism_state = match (ism_state, event) {
            (State::Down, Event::InterfaceUp) => {
                // Start interface.
                self.start(instance, neighbors)
            }
            (
                State::Waiting,
                Event::NbrChange | Event::BackupSeen | Event::WaitTimer,
            ) => {
                // Run DR election.
                self.dr_election(instance, neighbors)
            }
            (State::DrOther | State::Backup | State::Dr, Event::NbrChange) => {
                // Run DR election.
                self.dr_election(instance, neighbors)
            }
            (
                State::Waiting
                | State::PointToPoint
                | State::DrOther
                | State::Backup
                | State::Dr,
                Event::HelloTimer,
            ) => {
                let dst = self.hello_dst(neighbors);
                self.send_hello(instance, neighbors, dst);
                let interval = secs(self.config.hello_interval);
                self.timer_start(instance, TimerKind::Hello, interval);
                return;
            }
            (
                State::Waiting | State::DrOther | State::Backup | State::Dr,
                Event::PollTimer,
            ) if self.config.if_type == InterfaceType::NonBroadcast => {
                let dst = self.poll_dst(neighbors);
                self.send_hello(instance, neighbors, dst);
                let interval = secs(self.config.poll_interval);
                self.timer_start(instance, TimerKind::Poll, interval);
                return;
            }
            (
                State::Waiting
                | State::PointToPoint
                | State::DrOther
                | State::Backup
                | State::Dr,
                Event::AckTimer,
            ) => {
                instance.output.send_delayed_acks(self.id);
                let delay = secs(self.config.ack_delay);
                self.timer_start(instance, TimerKind::Ack, delay);
                return;
            }
            (
                State::Waiting
                | State::PointToPoint
                | State::DrOther
                | State::Backup
                | State::Dr,
                Event::InterfaceDown,
            ) => {
                let reason = InterfaceInactiveReason::OperationalDown;
                self.reset(instance, neighbors, reason);
                State::Down
            }
            (
                State::Down
                | State::Waiting
                | State::PointToPoint
                | State::DrOther
                | State::Backup
                | State::Dr,
                Event::LoopInd,
            ) => {
                let reason = InterfaceInactiveReason::LoopedBack;
                self.reset(instance, neighbors, reason);
                State::Loopback
            }
            (State::Loopback, Event::UnloopInd) => {
                // No actions are necessary.
                State::Down
            }
            _ => {
                Debug::IsmEventIgnored(&self.name, &ism_state, &event).log();
                return;
            }
        };

        // Check for FSM state change.
        if new_ism_state != ism_state {
            self.change_state(instance, ism_state, new_ism_state);
        }
    }

    fn change_state(
        &mut self,
        instance: &InstanceUpView<'_>,
        old_ism_state: State,
        new_ism_state: State,
    ) {
        assert!(
            self.state.ism_state == old_ism_state,
            "interface {}: state mismatch (expected {:?}, found {:?})",
            self.name,
            old_ism_state,
            self.state.ism_state
        );

        // The wait timer only runs in the Waiting state.
        if old_ism_state == State::Waiting {
            instance.scheduler.timer_cancel(self.id, TimerKind::Wait);
        }

        // Effectively transition to the new FSM state.
        Debug::IsmTransition(&self.name, &old_ism_state, &new_ism_state).log();
        self.state.ism_state = new_ism_state;

        // Update statistics.
        self.state.event_count += 1;
        self.state.discontinuity_time = Utc::now();
    }

    fn start(
        &mut self,
        instance: &InstanceUpView<'_>,
        neighbors: &Arena<Neighbor>,
    ) -> State {
        Debug::InterfaceStart(&self.name).log();

        self.timer_start(instance, TimerKind::Hello, hello_jitter());
        self.timer_start(
            instance,
            TimerKind::Ack,
            secs(self.config.ack_delay),
        );

        match self.config.if_type {
            InterfaceType::PointToPoint
            | InterfaceType::PointToMultipoint
            | InterfaceType::Virtual => State::PointToPoint,
            InterfaceType::NonBroadcast => {
                self.timer_start(
                    instance,
                    TimerKind::Poll,
                    secs(self.config.poll_interval),
                );
                if self.config.priority == 0 {
                    return State::DrOther;
                }

                self.timer_start(
                    instance,
                    TimerKind::Wait,
                    secs(self.config.dead_interval),
                );

                // Start neighbor discovery on the eligible neighbors.
                for nbr in self
                    .state
                    .neighbors
                    .iter(neighbors)
                    .filter(|nbr| nbr.priority != 0)
                {
                    self.nsm_event(instance, nbr, nsm::Event::Start);
                }

                State::Waiting
            }
            InterfaceType::Broadcast => {
                if self.config.priority == 0 {
                    return State::DrOther;
                }

                self.timer_start(
                    instance,
                    TimerKind::Wait,
                    secs(self.config.dead_interval),
                );
                State::Waiting
            }
        }
    }

    // Cancels all interface timers, forgets the DR/BDR and asks the neighbor
    // subsystem to tear down every neighbor attached to this interface.
    //
    // The neighbors are also brought down locally, so that nothing learned
    // before the reset takes part in subsequent DR elections.
    //
    // Calling this more than once in a row has no additional effect on the
    // interface.
    pub fn reset(
        &mut self,
        instance: &InstanceUpView<'_>,
        neighbors: &mut Arena<Neighbor>,
        reason: InterfaceInactiveReason,
    ) {
        Debug::InterfaceReset(&self.name, reason).log();

        for timer in TimerKind::ALL {
            instance.scheduler.timer_cancel(self.id, timer);
        }

        self.state.dr = None;
        self.state.bdr = None;

        for nbr_idx in self.state.neighbors.indexes() {
            let nbr = &mut neighbors[nbr_idx];
            self.nsm_event(instance, nbr, nsm::Event::KillNbr);
            nbr.reset();
        }
    }

    fn dr_election(
        &mut self,
        instance: &InstanceUpView<'_>,
        neighbors: &Arena<Neighbor>,
    ) -> State {
        let src_addr = self.src_addr();

        // Step 1: note the current values for the network's Designated Router
        // and Backup Designated Router.
        let old_dr = self.state.dr;
        let old_bdr = self.state.bdr;

        // Steps 2-4: calculate the new Designated Router and Backup Designated
        // Router.
        let local = LocalCandidate {
            addr: src_addr,
            router_id: instance.router_id,
            priority: self.config.priority,
        };
        let nbrs = self.state.neighbors.iter(neighbors).map(Neighbor::view);
        let election = election::elect(local, old_dr, old_bdr, nbrs);
        self.state.dr = election.dr;
        self.state.bdr = election.bdr;

        // Step 5: set the interface state accordingly.
        Debug::IsmDrElection(
            &self.name,
            old_dr,
            election.dr,
            old_bdr,
            election.bdr,
        )
        .log();
        let next_state = if election.is_dr(src_addr) {
            State::Dr
        } else if election.is_bdr(src_addr) {
            State::Backup
        } else {
            State::DrOther
        };

        // Step 6: if the attached network is an NBMA network, and the router
        // itself has just become either DR or BDR, it must start sending Hello
        // Packets to those neighbors that are not eligible to become DR. This
        // is done by invoking the neighbor event Start for each neighbor having
        // a Router Priority of 0.
        if self.config.if_type == InterfaceType::NonBroadcast
            && matches!(next_state, State::Dr | State::Backup)
            && next_state != self.state.ism_state
        {
            for nbr in self
                .state
                .neighbors
                .iter(neighbors)
                .filter(|nbr| nbr.priority == 0)
            {
                self.nsm_event(instance, nbr, nsm::Event::Start);
            }
        }

        // Step 7: if the DR or BDR changes, invoke the AdjOk? event on all
        // neighbors whose state is at least 2-Way.
        if election.dr != old_dr || election.bdr != old_bdr {
            for nbr in self
                .state
                .neighbors
                .iter(neighbors)
                .filter(|nbr| nbr.is_bidirectional())
            {
                self.nsm_event(instance, nbr, nsm::Event::AdjOk);
            }
        }

        next_state
    }

    // Returns where periodic Hellos should be sent to.
    fn hello_dst(&self, neighbors: &Arena<Neighbor>) -> HelloDst {
        match self.config.if_type {
            InterfaceType::PointToPoint
            | InterfaceType::Broadcast
            | InterfaceType::PointToMultipoint => {
                let addr = MulticastAddr::AllSpfRtrs.addr();
                smallvec![(addr, network::HELLO_TTL)]
            }
            InterfaceType::Virtual => self
                .state
                .neighbors
                .get_nth(neighbors, 0)
                .map(|nbr| (nbr.src, network::VIRTUAL_LINK_TTL))
                .into_iter()
                .collect(),
            InterfaceType::NonBroadcast if self.config.priority == 0 => {
                // Routers that can't become DR only talk to the DR and BDR.
                [self.state.dr, self.state.bdr]
                    .into_iter()
                    .flatten()
                    .map(|rtr| (rtr.addr, network::HELLO_TTL))
                    .collect()
            }
            InterfaceType::NonBroadcast => {
                // The DR and BDR talk to every neighbor, the other routers
                // only to those also eligible to become DR. Neighbors with
                // priority 0 are included for the DR and BDR as per RFC 2328
                // Section 9.5.1, which goes beyond sending to eligible
                // neighbors only.
                let dr_or_backup = self.is_dr_or_backup();
                self.state
                    .neighbors
                    .iter(neighbors)
                    .filter(|nbr| dr_or_backup || nbr.priority != 0)
                    .map(|nbr| (nbr.src, network::HELLO_TTL))
                    .collect()
            }
        }
    }

    // Returns the NBMA neighbors that need to be polled (those that are
    // believed to be down).
    fn poll_dst(&self, neighbors: &Arena<Neighbor>) -> HelloDst {
        let nbrs_down = self
            .state
            .neighbors
            .iter(neighbors)
            .filter(|nbr| nbr.state == nsm::State::Down)
            .map(|nbr| nbr.src)
            .collect::<SmallVec<[_; 4]>>();

        self.hello_dst(neighbors)
            .into_iter()
            .filter(|(addr, _)| nbrs_down.contains(addr))
            .collect()
    }

    // Generates the Hello packet to be sent on this interface.
    pub fn generate_hello(
        &self,
        instance: &InstanceUpView<'_>,
        neighbors: &Arena<Neighbor>,
    ) -> Hello {
        Hello {
            router_id: instance.router_id,
            area_id: instance.area_id,
            network_mask: if self.uses_network_mask() {
                self.config.address.mask()
            } else {
                Ipv4Addr::UNSPECIFIED
            },
            hello_interval: self.config.hello_interval,
            dead_interval: self.config.dead_interval,
            priority: self.config.priority,
            dr: self.state.dr.map(|dr| dr.addr),
            bdr: self.state.bdr.map(|bdr| bdr.addr),
            neighbors: self
                .state
                .neighbors
                .iter(neighbors)
                .filter(|nbr| nbr.state >= nsm::State::Init)
                .map(|nbr| nbr.router_id)
                .collect(),
        }
    }

    fn send_hello(
        &self,
        instance: &InstanceUpView<'_>,
        neighbors: &Arena<Neighbor>,
        dst: HelloDst,
    ) {
        if dst.is_empty() {
            return;
        }

        let hello = self.generate_hello(instance, neighbors);
        for (addr, ttl) in dst {
            instance.output.send_hello(self.id, addr, ttl, &hello);
        }
    }

    fn nsm_event(
        &self,
        instance: &InstanceUpView<'_>,
        nbr: &Neighbor,
        event: nsm::Event,
    ) {
        Debug::NeighborEvent(nbr.router_id, event).log();
        instance.output.nsm_event(self.id, nbr.id, event);
    }

    fn timer_start(
        &self,
        instance: &InstanceUpView<'_>,
        timer: TimerKind,
        timeout: Duration,
    ) {
        Debug::IsmTimerStart(&self.name, timer).log();
        instance.scheduler.timer_start(self.id, timer, timeout);
    }

    // Returns the primary address of the interface.
    pub fn src_addr(&self) -> Ipv4Addr {
        self.config.address.ip()
    }

    pub fn state(&self) -> State {
        self.state.ism_state
    }

    pub fn dr(&self) -> Option<DesignatedRouter> {
        self.state.dr
    }

    pub fn bdr(&self) -> Option<DesignatedRouter> {
        self.state.bdr
    }

    pub fn if_type(&self) -> InterfaceType {
        self.config.if_type
    }

    pub fn priority(&self) -> u8 {
        self.config.priority
    }

    pub fn neighbor_count(&self) -> usize {
        self.state.neighbors.count()
    }

    // Returns a snapshot of the n-th neighbor, in creation order.
    pub fn neighbor(
        &self,
        neighbors: &Arena<Neighbor>,
        n: usize,
    ) -> Option<NeighborView> {
        self.state.neighbors.get_nth(neighbors, n).map(Neighbor::view)
    }

    pub fn is_down(&self) -> bool {
        matches!(self.state.ism_state, State::Down | State::Loopback)
    }

    pub fn is_dr_or_backup(&self) -> bool {
        matches!(self.state.ism_state, State::Dr | State::Backup)
    }

    // Returns whether the network mask is advertised in and checked against
    // received Hellos. It isn't on point-to-point networks and virtual links.
    pub(crate) fn uses_network_mask(&self) -> bool {
        !matches!(
            self.config.if_type,
            InterfaceType::PointToPoint | InterfaceType::Virtual
        )
    }

    pub(crate) fn is_broadcast_or_nbma(&self) -> bool {
        matches!(
            self.config.if_type,
            InterfaceType::Broadcast | InterfaceType::NonBroadcast
        )
    }
}

impl Drop for Interface {
    fn drop(&mut self) {
        Debug::InterfaceDelete(&self.name).log();
    }
}

// ===== impl InterfaceState =====

impl Default for InterfaceState {
    fn default() -> InterfaceState {
        InterfaceState {
            ism_state: Default::default(),
            dr: None,
            bdr: None,
            neighbors: Default::default(),
            event_count: 0,
            discontinuity_time: Utc::now(),
        }
    }
}

// ===== helper functions =====

fn secs(value: u16) -> Duration {
    Duration::from_secs(value.into())
}

// Randomized delay before the first Hello, so that routers booting at the
// same time don't send their Hellos in lockstep.
fn hello_jitter() -> Duration {
    #[cfg(not(feature = "deterministic"))]
    {
        use rand::Rng;

        let msecs = rand::rng().random_range(83..=117);
        Duration::from_millis(msecs)
    }
    #[cfg(feature = "deterministic")]
    {
        Duration::from_millis(100)
    }
}
