// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node storage: a slot arena with a free list threaded through vacant slots.
//!
//! Nodes are addressed by stable `u32` indices. Freed slots are linked into a
//! singly linked free list (the link lives in the vacant slot itself) and are
//! handed out again, most recently freed first, before the arena grows.
//! Every slot carries a generation that is bumped when the slot is vacated,
//! so public handles ([`NodeId`], [`LeafId`]) never alias a newer node. A
//! slot whose generation reaches `u32::MAX` is retired: it stays vacant and
//! never rejoins the free list.

use alloc::vec::Vec;

use crate::types::Volume;

/// Identifier for a node in an [`AabbTree`](crate::AabbTree).
///
/// A slot index plus the generation the slot had when the node was created.
/// Internal nodes are recreated freely by optimization, so a `NodeId` for an
/// internal node is only meaningful until the next mutation. Leaves keep
/// theirs; see [`LeafId`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: NodeIdx, generation: u32) -> Self {
        Self(idx.0, generation)
    }

    /// Arena slot index.
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of the slot when this node was created.
    pub const fn generation(self) -> u32 {
        self.1
    }

    pub(crate) const fn idx(self) -> NodeIdx {
        NodeIdx(self.0)
    }
}

/// Handle to a leaf returned by [`AabbTree::insert`](crate::AabbTree::insert).
///
/// Stays valid across updates and optimization passes; becomes stale after
/// the leaf is removed or the tree is cleared. A stale handle never refers
/// to a different leaf because the slot generation must match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub(crate) NodeId);

impl LeafId {
    /// The underlying node identifier.
    pub const fn node(self) -> NodeId {
        self.0
    }

    pub(crate) const fn idx(self) -> NodeIdx {
        self.0.idx()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeIdx(u32);

impl NodeIdx {
    /// Placeholder child link, overwritten before the owning operation returns.
    pub(crate) const DANGLING: Self = Self(u32::MAX);

    pub(crate) const fn get(self) -> usize {
        self.0 as usize
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "Arena slots are intentionally 32-bit; the arena never grows past u32::MAX slots."
    )]
    const fn from_usize(i: usize) -> Self {
        Self(i as u32)
    }
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind<P> {
    Leaf(P),
    Internal([NodeIdx; 2]),
}

#[derive(Clone, Debug)]
pub(crate) struct Node<P> {
    pub(crate) volume: Volume,
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) kind: NodeKind<P>,
}

impl<P> Node<P> {
    pub(crate) fn leaf(volume: Volume, payload: P) -> Self {
        Self {
            volume,
            parent: None,
            kind: NodeKind::Leaf(payload),
        }
    }

    pub(crate) fn internal(volume: Volume, parent: Option<NodeIdx>, children: [NodeIdx; 2]) -> Self {
        Self {
            volume,
            parent,
            kind: NodeKind::Internal(children),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub(crate) fn children(&self) -> Option<[NodeIdx; 2]> {
        match self.kind {
            NodeKind::Internal(c) => Some(c),
            NodeKind::Leaf(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
enum Slot<P> {
    Occupied(Node<P>),
    Vacant { next_free: Option<NodeIdx> },
}

/// Generation of a slot that has been vacated too often to be reused.
const RETIRED: u32 = u32::MAX;

#[derive(Clone, Debug)]
struct Entry<P> {
    generation: u32,
    slot: Slot<P>,
}

#[derive(Clone)]
pub(crate) struct Arena<P> {
    entries: Vec<Entry<P>>,
    free_head: Option<NodeIdx>,
    live: usize,
}

impl<P> Default for Arena<P> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<P> Arena<P> {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
            free_head: None,
            live: 0,
        }
    }

    /// Store `node`, reusing the most recently freed slot if there is one.
    pub(crate) fn alloc(&mut self, node: Node<P>) -> NodeIdx {
        self.live += 1;
        if let Some(idx) = self.free_head {
            let entry = &mut self.entries[idx.get()];
            let Slot::Vacant { next_free } = entry.slot else {
                unreachable!("free list points at an occupied slot");
            };
            self.free_head = next_free;
            entry.slot = Slot::Occupied(node);
            idx
        } else {
            let idx = NodeIdx::from_usize(self.entries.len());
            self.entries.push(Entry {
                generation: 1,
                slot: Slot::Occupied(node),
            });
            idx
        }
    }

    /// Vacate `idx`, returning its node and pushing the slot onto the free list
    /// unless it is now retired.
    pub(crate) fn free(&mut self, idx: NodeIdx) -> Node<P> {
        let entry = &mut self.entries[idx.get()];
        let prev = core::mem::replace(&mut entry.slot, Slot::Vacant { next_free: None });
        let Slot::Occupied(node) = prev else {
            unreachable!("double free of arena slot {}", idx.get());
        };
        entry.generation += 1;
        if entry.generation != RETIRED {
            entry.slot = Slot::Vacant {
                next_free: self.free_head,
            };
            self.free_head = Some(idx);
        }
        self.live -= 1;
        node
    }

    /// Vacate every slot and rebuild the free list in ascending slot order,
    /// leaving retired slots out.
    pub(crate) fn clear(&mut self) {
        let mut next_free = None;
        for (i, entry) in self.entries.iter_mut().enumerate().rev() {
            if matches!(entry.slot, Slot::Occupied(_)) {
                entry.generation += 1;
            }
            if entry.generation == RETIRED {
                entry.slot = Slot::Vacant { next_free: None };
                continue;
            }
            entry.slot = Slot::Vacant { next_free };
            next_free = Some(NodeIdx::from_usize(i));
        }
        self.free_head = next_free;
        self.live = 0;
    }

    pub(crate) fn get(&self, idx: NodeIdx) -> &Node<P> {
        match &self.entries[idx.get()].slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to vacant arena slot {}", idx.get()),
        }
    }

    pub(crate) fn get_mut(&mut self, idx: NodeIdx) -> &mut Node<P> {
        match &mut self.entries[idx.get()].slot {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to vacant arena slot {}", idx.get()),
        }
    }

    pub(crate) fn try_get(&self, idx: NodeIdx) -> Option<&Node<P>> {
        match &self.entries.get(idx.get())?.slot {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    /// Resolve a public handle, checking the generation.
    pub(crate) fn resolve(&self, id: NodeId) -> Option<&Node<P>> {
        let entry = self.entries.get(id.idx().get())?;
        if entry.generation != id.generation() {
            return None;
        }
        match &entry.slot {
            Slot::Occupied(node) => Some(node),
            Slot::Vacant { .. } => None,
        }
    }

    pub(crate) fn id(&self, idx: NodeIdx) -> NodeId {
        NodeId::new(idx, self.entries[idx.get()].generation)
    }

    /// The id the next [`Arena::alloc`] will return.
    pub(crate) fn next_id(&self) -> NodeId {
        match self.free_head {
            Some(idx) => self.id(idx),
            None => NodeId::new(NodeIdx::from_usize(self.entries.len()), 1),
        }
    }

    /// Number of occupied slots.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    /// Total slots, occupied or vacant.
    pub(crate) fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Length of the free list.
    pub(crate) fn free_count(&self) -> usize {
        let mut n = 0;
        let mut cur = self.free_head;
        while let Some(idx) = cur {
            n += 1;
            cur = match self.entries[idx.get()].slot {
                Slot::Vacant { next_free } => next_free,
                Slot::Occupied(_) => None,
            };
        }
        n
    }

    #[cfg(test)]
    pub(crate) fn free_head(&self) -> Option<NodeIdx> {
        self.free_head
    }

    /// Slot index following `idx`, wrapping at the end of the arena.
    pub(crate) fn next_slot(&self, idx: usize) -> usize {
        if idx + 1 >= self.entries.len() { 0 } else { idx + 1 }
    }

    pub(crate) fn idx_at(&self, i: usize) -> NodeIdx {
        debug_assert!(i < self.entries.len(), "slot index out of range");
        NodeIdx::from_usize(i)
    }
}

impl<P> core::fmt::Debug for Arena<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("slots", &self.entries.len())
            .field("live", &self.live)
            .field("free", &self.free_count())
            .finish_non_exhaustive()
    }
}
