//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, debug_span};

use crate::collections::{Arena, InterfaceKey, Interfaces};
use crate::config::InstanceCfg;
use crate::debug::InterfaceInactiveReason;
use crate::error::Error;
use crate::events;
use crate::interface::InterfaceType;
use crate::neighbor::Neighbor;
use crate::output::ProtocolOutput;
use crate::tasks::Scheduler;
use crate::tasks::messages::ProtocolInputMsg;

pub struct Instance {
    // Instance name (used for logging only).
    pub name: String,
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub interfaces: Interfaces,
    // Neighbors of all interfaces.
    pub neighbors: Arena<Neighbor>,
    scheduler: Box<dyn Scheduler>,
    output: Box<dyn ProtocolOutput>,
}

// Read-only view of the instance, passed down to the interface state machine.
pub struct InstanceUpView<'a> {
    pub router_id: Ipv4Addr,
    pub area_id: Ipv4Addr,
    pub scheduler: &'a dyn Scheduler,
    pub output: &'a dyn ProtocolOutput,
}

// ===== impl Instance =====

impl Instance {
    pub fn new(
        name: &str,
        config: &InstanceCfg,
        scheduler: Box<dyn Scheduler>,
        output: Box<dyn ProtocolOutput>,
    ) -> Instance {
        debug_span!("instance", %name).in_scope(|| {
            debug!("instance created");
        });

        let mut instance = Instance {
            name: name.to_owned(),
            router_id: config.router_id,
            area_id: config.area_id,
            interfaces: Default::default(),
            neighbors: Default::default(),
            scheduler,
            output,
        };

        for (ifname, iface_cfg) in &config.interfaces {
            let (_, iface) =
                instance.interfaces.insert(ifname, iface_cfg.clone());

            // Configured NBMA neighbors are known before any Hello is heard
            // from them. Their Router IDs are learned later.
            if iface.config.if_type != InterfaceType::NonBroadcast {
                if !iface.config.static_nbrs.is_empty() {
                    Error::StaticNbrsUnsupported(ifname.clone()).log();
                }
                continue;
            }
            for (addr, snbr) in &iface.config.static_nbrs {
                let (_, nbr) = iface.state.neighbors.insert(
                    &mut instance.neighbors,
                    Ipv4Addr::UNSPECIFIED,
                    *addr,
                );
                nbr.priority = snbr.priority;
            }
        }

        instance
    }

    // Returns a view of the instance along with its mutable collections.
    pub fn as_up(
        &mut self,
    ) -> (InstanceUpView<'_>, &mut Interfaces, &mut Arena<Neighbor>) {
        let instance = InstanceUpView {
            router_id: self.router_id,
            area_id: self.area_id,
            scheduler: self.scheduler.as_ref(),
            output: self.output.as_ref(),
        };
        (instance, &mut self.interfaces, &mut self.neighbors)
    }

    // Resets the given interface without changing its state.
    pub fn interface_reset(
        &mut self,
        key: &InterfaceKey,
    ) -> Result<(), Error> {
        let (instance, interfaces, neighbors) = self.as_up();
        let (_, iface) = interfaces.get_mut_by_key(key)?;
        let reason = InterfaceInactiveReason::Administrative;
        iface.reset(&instance, neighbors, reason);
        Ok(())
    }

    // Removes the given interface, along with all of its neighbors.
    pub fn interface_delete(
        &mut self,
        key: &InterfaceKey,
    ) -> Result<(), Error> {
        let (instance, interfaces, neighbors) = self.as_up();
        let (iface_idx, iface) = interfaces.get_mut_by_key(key)?;
        let reason = InterfaceInactiveReason::Administrative;
        iface.reset(&instance, neighbors, reason);

        let nbr_idxs = iface.state.neighbors.indexes().collect::<Vec<_>>();
        for nbr_idx in nbr_idxs {
            iface.state.neighbors.delete(neighbors, nbr_idx);
        }
        interfaces.delete(iface_idx);

        Ok(())
    }

    // Processes a single input message.
    pub fn process_msg(&mut self, msg: ProtocolInputMsg) {
        let (instance, interfaces, neighbors) = self.as_up();
        if let Err(error) =
            process_protocol_msg(&instance, interfaces, neighbors, msg)
        {
            error.log();
        }
    }

    // Processes input messages until all senders are gone.
    pub async fn run(
        &mut self,
        mut protocol_input: UnboundedReceiver<ProtocolInputMsg>,
    ) {
        let span = debug_span!("instance", name = %self.name);
        while let Some(msg) = protocol_input.recv().await {
            let _span_guard = span.enter();
            self.process_msg(msg);
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("name", &self.name)
            .field("router_id", &self.router_id)
            .field("area_id", &self.area_id)
            .field("interfaces", &self.interfaces)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}

// ===== helper functions =====

fn process_protocol_msg(
    instance: &InstanceUpView<'_>,
    interfaces: &mut Interfaces,
    neighbors: &mut Arena<Neighbor>,
    msg: ProtocolInputMsg,
) -> Result<(), Error> {
    match msg {
        // Interface FSM event.
        ProtocolInputMsg::IsmEvent(msg) => events::process_ism_event(
            instance,
            interfaces,
            neighbors,
            msg.iface_key,
            msg.event,
        )?,
        // Received Hello packet.
        ProtocolInputMsg::HelloRx(msg) => events::process_hello(
            instance,
            interfaces,
            neighbors,
            msg.iface_key,
            msg.src,
            msg.hello,
        )?,
        // Neighbor torn down.
        ProtocolInputMsg::NbrKill(msg) => events::process_nbr_kill(
            instance,
            interfaces,
            neighbors,
            msg.iface_key,
            msg.nbr_key,
        )?,
    }

    Ok(())
}
