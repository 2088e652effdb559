//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use crate::collections::{Arena, InterfaceKey, Interfaces, NeighborKey};
use crate::error::{Error, InterfaceCfgError};
use crate::instance::InstanceUpView;
use crate::interface::{Interface, ism};
use crate::neighbor::{Neighbor, nsm};
use crate::network::Hello;

// ===== Interface FSM event =====

pub(crate) fn process_ism_event(
    instance: &InstanceUpView<'_>,
    interfaces: &mut Interfaces,
    neighbors: &mut Arena<Neighbor>,
    iface_key: InterfaceKey,
    event: ism::Event,
) -> Result<(), Error> {
    // Lookup interface.
    let (_, iface) = interfaces.get_mut_by_key(&iface_key)?;

    // Invoke FSM event.
    iface.fsm(instance, neighbors, event);

    Ok(())
}

// ===== Hello packet receipt =====

pub(crate) fn process_hello(
    instance: &InstanceUpView<'_>,
    interfaces: &mut Interfaces,
    neighbors: &mut Arena<Neighbor>,
    iface_key: InterfaceKey,
    src: Ipv4Addr,
    hello: Hello,
) -> Result<(), Error> {
    // Lookup interface.
    let (_, iface) = interfaces.get_mut_by_key(&iface_key)?;

    // Hellos received on inactive interfaces are ignored.
    if iface.is_down() {
        return Ok(());
    }

    // Perform all the required sanity checks.
    process_hello_sanity_checks(iface, instance, &hello).map_err(|error| {
        Error::InterfaceCfgError(iface.name.clone(), src, error)
    })?;

    // Find or create new neighbor.
    let nbr_idx = iface
        .state
        .neighbors
        .get_by_addr(neighbors, src)
        .map(|(nbr_idx, _)| nbr_idx);
    let nbr_idx = match nbr_idx {
        Some(nbr_idx) => nbr_idx,
        None => {
            let (nbr_idx, nbr) =
                iface.state.neighbors.insert(neighbors, hello.router_id, src);

            // Initialize neighbor values.
            nbr.priority = hello.priority;
            if iface.is_broadcast_or_nbma() {
                nbr.dr = hello.dr;
                nbr.bdr = hello.bdr;
            }

            nbr_idx
        }
    };
    let nbr = &mut neighbors[nbr_idx];

    // Configured NBMA neighbors learn their Router ID from the first Hello.
    if nbr.router_id != hello.router_id {
        iface
            .state
            .neighbors
            .update_router_id(nbr_idx, nbr, hello.router_id);
    }

    let mut backup_seen = false;
    let mut nbr_change = false;
    let was_bidirectional = nbr.is_bidirectional();

    // HelloReceived.
    if nbr.state < nsm::State::Init {
        nbr.state = nsm::State::Init;
    }

    // 1-WayReceived or 2-WayReceived.
    if !hello.neighbors.contains(&instance.router_id) {
        if was_bidirectional {
            nbr.state = nsm::State::Init;
            nbr_change = true;
        }

        // Update neighbor values.
        if iface.is_broadcast_or_nbma() {
            nbr.priority = hello.priority;
            nbr.dr = hello.dr;
            nbr.bdr = hello.bdr;
        }
    } else {
        if !was_bidirectional {
            nbr.state = nsm::State::TwoWay;
            nbr_change = true;
        }

        // Examine rest of the Hello Packet (ignore Point-to-MultiPoint
        // interfaces as per errata 4022 of RFC 2328).
        if iface.is_broadcast_or_nbma() {
            // Check for Router Priority change.
            if hello.priority != nbr.priority {
                nbr.priority = hello.priority;
                nbr_change = true;
            }

            // Check for DR/BDR changes.
            let declares_dr = hello.dr == Some(src);
            let declares_bdr = hello.bdr == Some(src);
            if iface.state.ism_state == ism::State::Waiting
                && ((declares_dr && hello.bdr.is_none()) || declares_bdr)
            {
                backup_seen = true;
            }
            if declares_dr != nbr.declares_dr()
                || declares_bdr != nbr.declares_bdr()
            {
                nbr_change = true;
            }

            // Update neighbor's DR/BDR.
            nbr.dr = hello.dr;
            nbr.bdr = hello.bdr;
        }
    }

    if backup_seen {
        iface.fsm(instance, neighbors, ism::Event::BackupSeen);
    }
    if nbr_change {
        iface.fsm(instance, neighbors, ism::Event::NbrChange);
    }

    Ok(())
}

fn process_hello_sanity_checks(
    iface: &Interface,
    instance: &InstanceUpView<'_>,
    hello: &Hello,
) -> Result<(), InterfaceCfgError> {
    // Check for Area ID mismatch.
    if hello.area_id != instance.area_id {
        return Err(InterfaceCfgError::AreaIdMismatch(
            hello.area_id,
            instance.area_id,
        ));
    }

    // Check for Network Mask mismatch (not applicable to point-to-point
    // networks and virtual links).
    if iface.uses_network_mask()
        && hello.network_mask != iface.config.address.mask()
    {
        return Err(InterfaceCfgError::HelloMaskMismatch(
            hello.network_mask,
            iface.config.address.mask(),
        ));
    }

    // Check for HelloInterval mismatch.
    if hello.hello_interval != iface.config.hello_interval {
        return Err(InterfaceCfgError::HelloIntervalMismatch(
            hello.hello_interval,
            iface.config.hello_interval,
        ));
    }

    // Check for RouterDeadInterval mismatch.
    if hello.dead_interval != iface.config.dead_interval {
        return Err(InterfaceCfgError::DeadIntervalMismatch(
            hello.dead_interval,
            iface.config.dead_interval,
        ));
    }

    // Check for duplicate Router ID.
    if hello.router_id == instance.router_id {
        return Err(InterfaceCfgError::DuplicateRouterId(hello.router_id));
    }

    Ok(())
}

// ===== Neighbor teardown =====

pub(crate) fn process_nbr_kill(
    instance: &InstanceUpView<'_>,
    interfaces: &mut Interfaces,
    neighbors: &mut Arena<Neighbor>,
    iface_key: InterfaceKey,
    nbr_key: NeighborKey,
) -> Result<(), Error> {
    // Lookup interface and neighbor.
    let (_, iface) = interfaces.get_mut_by_key(&iface_key)?;
    let nbr_idx =
        iface.state.neighbors.get_index_by_key(neighbors, &nbr_key)?;

    // Remove neighbor.
    let was_bidirectional = neighbors[nbr_idx].is_bidirectional();
    iface.state.neighbors.delete(neighbors, nbr_idx);

    // The set of DR candidates might have changed.
    if was_bidirectional {
        iface.fsm(instance, neighbors, ism::Event::NbrChange);
    }

    Ok(())
}
