//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap, btree_map};
use std::net::Ipv4Addr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::config::InterfaceCfg;
use crate::error::Error;
use crate::interface::Interface;
use crate::neighbor::Neighbor;

pub type ObjectId = u32;

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ObjectKey<T> {
    Id(ObjectId),
    Value(T),
}

pub type InterfaceId = ObjectId;
pub type InterfaceIndex = Index;
pub type InterfaceKey = ObjectKey<String>;
pub type NeighborId = ObjectId;
pub type NeighborIndex = Index;
pub type NeighborKey = ObjectKey<Ipv4Addr>;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

#[derive(Debug, Default)]
pub struct Interfaces {
    arena: Arena<Interface>,
    id_tree: HashMap<InterfaceId, InterfaceIndex>,
    name_tree: BTreeMap<String, InterfaceIndex>,
    next_id: InterfaceId,
}

// Per-interface list of neighbors.
//
// Neighbors are stored in an arena owned elsewhere; this structure only keeps
// handles into it. Since neighbor IDs are allocated in increasing order, the
// ID tree also preserves the order in which the neighbors were created.
#[derive(Debug, Default)]
pub struct Neighbors {
    id_tree: BTreeMap<NeighborId, NeighborIndex>,
    router_id_tree: BTreeMap<Ipv4Addr, NeighborIndex>,
    addr_tree: BTreeMap<Ipv4Addr, NeighborIndex>,
    next_id: NeighborId,
}

// ===== impl ObjectKey =====

impl<T> From<ObjectId> for ObjectKey<T> {
    fn from(id: ObjectId) -> ObjectKey<T> {
        ObjectKey::Id(id)
    }
}

// ===== impl Arena =====

impl<T> Arena<T> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Interfaces =====

impl Interfaces {
    pub fn insert(
        &mut self,
        name: &str,
        config: InterfaceCfg,
    ) -> (InterfaceIndex, &mut Interface) {
        // Create and insert interface into the arena.
        self.next_id += 1;
        let iface = Interface::new(self.next_id, name.to_owned(), config);
        let iface_idx = self.arena.0.insert(iface);

        // Link interface to different collections.
        let iface = &mut self.arena[iface_idx];
        self.id_tree.insert(iface.id, iface_idx);
        if self.name_tree.insert(iface.name.clone(), iface_idx).is_some() {
            panic!("interface name={} already exists", iface.name);
        }

        (iface_idx, iface)
    }

    pub fn delete(&mut self, iface_idx: InterfaceIndex) {
        let iface = &self.arena[iface_idx];

        // Unlink interface from different collections.
        self.id_tree.remove(&iface.id);
        self.name_tree.remove(&iface.name);

        // Remove interface from the arena.
        self.arena.0.remove(iface_idx);
    }

    // Returns a mutable reference to the interface corresponding to the given
    // ID.
    pub fn get_mut_by_id(
        &mut self,
        id: InterfaceId,
    ) -> Result<(InterfaceIndex, &mut Interface), Error> {
        let iface_idx = self
            .id_tree
            .get(&id)
            .copied()
            .ok_or(Error::InterfaceIdNotFound(id))?;
        let iface = &mut self.arena[iface_idx];
        if iface.id != id {
            return Err(Error::InterfaceIdNotFound(id));
        }

        Ok((iface_idx, iface))
    }

    // Returns a reference to the interface corresponding to the given name.
    pub fn get_by_name(
        &self,
        name: &str,
    ) -> Option<(InterfaceIndex, &Interface)> {
        self.name_tree
            .get(name)
            .copied()
            .map(|iface_idx| (iface_idx, &self.arena[iface_idx]))
    }

    // Returns a mutable reference to the interface corresponding to the given
    // name.
    pub fn get_mut_by_name(
        &mut self,
        name: &str,
    ) -> Option<(InterfaceIndex, &mut Interface)> {
        let iface_idx = self.name_tree.get(name).copied()?;
        Some((iface_idx, &mut self.arena[iface_idx]))
    }

    // Returns a mutable reference to the interface corresponding to the given
    // object key.
    pub fn get_mut_by_key(
        &mut self,
        key: &InterfaceKey,
    ) -> Result<(InterfaceIndex, &mut Interface), Error> {
        match key {
            InterfaceKey::Id(id) => self.get_mut_by_id(*id),
            InterfaceKey::Value(name) => self
                .get_mut_by_name(name)
                .ok_or_else(|| Error::InterfaceNameNotFound(name.clone())),
        }
    }
}

// ===== impl Neighbors =====

impl Neighbors {
    pub fn insert<'a>(
        &mut self,
        arena: &'a mut Arena<Neighbor>,
        router_id: Ipv4Addr,
        src: Ipv4Addr,
    ) -> (NeighborIndex, &'a mut Neighbor) {
        // Create and insert neighbor into the arena.
        self.next_id += 1;
        let nbr = Neighbor::new(self.next_id, router_id, src);
        let nbr_idx = arena.0.insert(nbr);

        // Link neighbor to different collections.
        let nbr = &mut arena[nbr_idx];
        self.id_tree.insert(nbr.id, nbr_idx);
        self.link_router_id(nbr_idx, nbr);
        self.addr_tree.insert(nbr.src, nbr_idx);

        (nbr_idx, nbr)
    }

    pub fn delete(
        &mut self,
        arena: &mut Arena<Neighbor>,
        nbr_idx: NeighborIndex,
    ) {
        let nbr = &arena[nbr_idx];
        let router_id = nbr.router_id;

        // Unlink neighbor from different collections.
        self.id_tree.remove(&nbr.id);
        self.addr_tree.remove(&nbr.src);
        let relink = self.unlink_router_id(nbr_idx, router_id);

        // Remove neighbor from the arena.
        arena.0.remove(nbr_idx);

        // Another neighbor might be sharing the same Router ID.
        if relink
            && let Some(other_idx) = self
                .id_tree
                .values()
                .copied()
                .find(|other_idx| arena[*other_idx].router_id == router_id)
        {
            self.router_id_tree.insert(router_id, other_idx);
        }
    }

    // Static NBMA neighbors are created before their Router ID is known, in
    // which case the unspecified address is used as a placeholder.
    pub fn update_router_id(
        &mut self,
        nbr_idx: NeighborIndex,
        nbr: &mut Neighbor,
        router_id: Ipv4Addr,
    ) {
        self.unlink_router_id(nbr_idx, nbr.router_id);
        nbr.router_id = router_id;
        self.link_router_id(nbr_idx, nbr);
    }

    // Indexes the neighbor by its Router ID, unless another neighbor is
    // already using it.
    fn link_router_id(&mut self, nbr_idx: NeighborIndex, nbr: &Neighbor) {
        if nbr.router_id.is_unspecified() {
            return;
        }

        match self.router_id_tree.entry(nbr.router_id) {
            btree_map::Entry::Vacant(e) => {
                e.insert(nbr_idx);
            }
            btree_map::Entry::Occupied(e) => {
                if *e.get() != nbr_idx {
                    Error::NeighborDuplicateRouterId(nbr.router_id, nbr.src)
                        .log();
                }
            }
        }
    }

    // Removes the Router ID index entry, but only if it belongs to the given
    // neighbor. Returns whether the entry was removed.
    fn unlink_router_id(
        &mut self,
        nbr_idx: NeighborIndex,
        router_id: Ipv4Addr,
    ) -> bool {
        if self.router_id_tree.get(&router_id) != Some(&nbr_idx) {
            return false;
        }
        self.router_id_tree.remove(&router_id);
        true
    }

    // Returns a reference to the neighbor corresponding to the given ID.
    pub fn get_by_id<'a>(
        &self,
        arena: &'a Arena<Neighbor>,
        id: NeighborId,
    ) -> Result<(NeighborIndex, &'a Neighbor), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|nbr_idx| (nbr_idx, &arena[nbr_idx]))
            .filter(|(_, nbr)| nbr.id == id)
            .ok_or(Error::NeighborIdNotFound(id))
    }

    // Returns a reference to the neighbor corresponding to the given source
    // address.
    pub fn get_by_addr<'a>(
        &self,
        arena: &'a Arena<Neighbor>,
        addr: Ipv4Addr,
    ) -> Option<(NeighborIndex, &'a Neighbor)> {
        self.addr_tree
            .get(&addr)
            .copied()
            .map(|nbr_idx| (nbr_idx, &arena[nbr_idx]))
    }

    // Returns the index of the neighbor corresponding to the given object key.
    pub fn get_index_by_key(
        &self,
        arena: &Arena<Neighbor>,
        key: &NeighborKey,
    ) -> Result<NeighborIndex, Error> {
        match key {
            NeighborKey::Id(id) => {
                self.get_by_id(arena, *id).map(|(nbr_idx, _)| nbr_idx)
            }
            NeighborKey::Value(router_id) => self
                .router_id_tree
                .get(router_id)
                .copied()
                .ok_or(Error::NeighborRouterIdNotFound(*router_id)),
        }
    }

    // Returns the n-th neighbor, in creation order.
    pub fn get_nth<'a>(
        &self,
        arena: &'a Arena<Neighbor>,
        n: usize,
    ) -> Option<&'a Neighbor> {
        self.id_tree.values().nth(n).map(|nbr_idx| &arena[*nbr_idx])
    }

    // Returns an iterator visiting all neighbors, in creation order.
    pub fn iter<'a>(
        &'a self,
        arena: &'a Arena<Neighbor>,
    ) -> impl Iterator<Item = &'a Neighbor> + 'a {
        self.id_tree.values().map(|nbr_idx| &arena[*nbr_idx])
    }

    // Returns an iterator over all neighbor indexes, in creation order.
    pub fn indexes(&self) -> impl Iterator<Item = NeighborIndex> + '_ {
        self.id_tree.values().copied()
    }

    pub fn count(&self) -> usize {
        self.id_tree.len()
    }
}
