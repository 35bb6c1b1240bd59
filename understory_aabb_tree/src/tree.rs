// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: structure, insertion, removal, updates.

use glam::Vec3;
use smallvec::smallvec;
use tracing::{debug, trace};

use crate::arena::{Arena, LeafId, Node, NodeId, NodeIdx, NodeKind};
use crate::collector::{Leaf, NodeRef};
use crate::error::TreeError;
use crate::query::NodeStack;
use crate::types::Volume;

/// Default scale applied to velocities by [`AabbTree::update_with_velocity`].
pub const DEFAULT_LOOKAHEAD: f32 = 1.0;

/// Construction-time settings for an [`AabbTree`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TreeConfig {
    /// Scale applied to the velocity passed to [`AabbTree::update_with_velocity`]
    /// and [`AabbTree::update_with_margin`] before the fattened volume is
    /// stretched along it.
    pub lookahead: f32,
    /// Number of node slots reserved up front.
    pub initial_capacity: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            initial_capacity: 0,
        }
    }
}

/// A dynamic bounding volume hierarchy over leaves carrying payload handles.
///
/// Leaves hold a [`Volume`] and a payload `P`. The payload is a handle into
/// something the caller owns (an entity id, an index into a table); the tree
/// copies it around but never interprets it.
///
/// Every internal node's volume is the exact merge of its two children, and
/// this holds again after every mutating call returns.
#[derive(Clone)]
pub struct AabbTree<P> {
    pub(crate) arena: Arena<P>,
    pub(crate) root: Option<NodeIdx>,
    pub(crate) leaf_count: usize,
    pub(crate) cursor: usize,
    config: TreeConfig,
}

impl<P> core::fmt::Debug for AabbTree<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AabbTree")
            .field("leaves", &self.leaf_count)
            .field("has_root", &self.root.is_some())
            .field("arena", &self.arena)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<P: Copy> Default for AabbTree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Copy> AabbTree<P> {
    /// Create an empty tree with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    /// Create an empty tree with the given configuration.
    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            arena: Arena::with_capacity(config.initial_capacity),
            root: None,
            leaf_count: 0,
            cursor: 0,
            config,
        }
    }

    /// The configuration this tree was created with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Whether the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live leaves.
    pub fn len(&self) -> usize {
        self.leaf_count
    }

    /// Number of live nodes, leaves and internal nodes together.
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }

    /// Number of vacant node slots waiting for reuse.
    pub fn free_slots(&self) -> usize {
        self.arena.free_count()
    }

    /// The root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root.map(|r| self.arena.id(r))
    }

    /// Volume enclosing every leaf, or `None` for an empty tree.
    pub fn bounds(&self) -> Option<Volume> {
        self.root.map(|r| self.arena.get(r).volume)
    }

    /// Number of levels: 0 when empty, 1 for a single leaf.
    pub fn height(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut stack: SmallVecDepth = smallvec![(root, 1)];
        let mut height = 0;
        while let Some((idx, depth)) = stack.pop() {
            height = height.max(depth);
            if let Some([c0, c1]) = self.arena.get(idx).children() {
                stack.push((c0, depth + 1));
                stack.push((c1, depth + 1));
            }
        }
        height
    }

    /// Whether `leaf` refers to a live leaf of this tree.
    pub fn contains_leaf(&self, leaf: LeafId) -> bool {
        self.arena.resolve(leaf.node()).is_some_and(Node::is_leaf)
    }

    /// The stored volume of a live leaf.
    pub fn volume(&self, leaf: LeafId) -> Option<Volume> {
        self.leaf(leaf).map(|l| l.volume)
    }

    /// The payload of a live leaf.
    pub fn payload(&self, leaf: LeafId) -> Option<P> {
        self.leaf(leaf).map(|l| l.payload)
    }

    /// A live leaf's handle, volume and payload.
    pub fn leaf(&self, leaf: LeafId) -> Option<Leaf<P>> {
        match self.arena.resolve(leaf.node())?.kind {
            NodeKind::Leaf(payload) => Some(Leaf {
                id: leaf,
                volume: self.arena.get(leaf.idx()).volume,
                payload,
            }),
            NodeKind::Internal(_) => None,
        }
    }

    /// Insert a leaf and return its handle.
    ///
    /// The leaf is placed next to the existing leaf reached by walking down
    /// from the root, always towards the child whose centre is closer to
    /// `volume`. No rebalancing happens beyond that; see the `optimize_*`
    /// methods.
    pub fn insert(&mut self, volume: Volume, payload: P) -> LeafId {
        let idx = self.arena.alloc(Node::leaf(volume, payload));
        self.insert_leaf(idx);
        self.leaf_count += 1;
        LeafId(self.arena.id(idx))
    }

    /// Remove a leaf and return its payload.
    ///
    /// `leaf` must be a live handle from this tree; see [`Self::try_remove`]
    /// for a checked variant.
    pub fn remove(&mut self, leaf: LeafId) -> P {
        debug_assert!(
            self.contains_leaf(leaf),
            "remove called with a stale or foreign leaf handle"
        );
        let idx = leaf.idx();
        self.detach_leaf(idx);
        self.leaf_count -= 1;
        match self.arena.free(idx).kind {
            NodeKind::Leaf(payload) => payload,
            NodeKind::Internal(_) => unreachable!("leaf handle resolved to an internal node"),
        }
    }

    /// Remove a leaf, reporting a stale or foreign handle as an error.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::StaleLeaf`] when `leaf` is not a live leaf of this tree.
    pub fn try_remove(&mut self, leaf: LeafId) -> Result<P, TreeError> {
        if !self.contains_leaf(leaf) {
            return Err(TreeError::StaleLeaf(leaf));
        }
        Ok(self.remove(leaf))
    }

    /// Move a leaf to `volume` with no velocity and no margin.
    ///
    /// Returns `false` without touching the tree when the stored volume
    /// already contains `volume`.
    pub fn update(&mut self, leaf: LeafId, volume: Volume) -> bool {
        self.update_with_margin(leaf, volume, Vec3::ZERO, 0.0)
    }

    /// Move a leaf, stretching its stored volume along `velocity`.
    pub fn update_with_velocity(&mut self, leaf: LeafId, volume: Volume, velocity: Vec3) -> bool {
        self.update_with_margin(leaf, volume, velocity, 0.0)
    }

    /// Move a leaf, fattening its stored volume by `margin` and stretching it
    /// along `velocity` scaled by [`TreeConfig::lookahead`].
    ///
    /// If the leaf's stored volume still contains `volume`, nothing changes
    /// and `false` is returned. Otherwise the leaf is taken out of the tree
    /// (keeping its handle), given the fattened volume, reinserted, and
    /// `true` is returned.
    pub fn update_with_margin(
        &mut self,
        leaf: LeafId,
        volume: Volume,
        velocity: Vec3,
        margin: f32,
    ) -> bool {
        debug_assert!(
            self.contains_leaf(leaf),
            "update called with a stale or foreign leaf handle"
        );
        let idx = leaf.idx();
        if self.arena.get(idx).volume.contains(&volume) {
            return false;
        }
        let fat = volume
            .expand_uniform(margin)
            .signed_expand(velocity * self.config.lookahead);
        self.detach_leaf(idx);
        self.arena.get_mut(idx).volume = fat;
        self.insert_leaf(idx);
        trace!(slot = idx.get(), "reinserted leaf after update");
        true
    }

    /// Take a leaf out and insert it again with its current volume.
    pub fn reinsert(&mut self, leaf: LeafId) {
        debug_assert!(
            self.contains_leaf(leaf),
            "reinsert called with a stale or foreign leaf handle"
        );
        let idx = leaf.idx();
        self.detach_leaf(idx);
        self.insert_leaf(idx);
    }

    /// Remove every node. All outstanding handles become stale.
    pub fn clear(&mut self) {
        debug!(leaves = self.leaf_count, "clearing tree");
        self.arena.clear();
        self.root = None;
        self.leaf_count = 0;
        self.cursor = 0;
    }

    /// Check the structural invariants.
    ///
    /// Walks the whole tree, so this is meant for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: an internal volume that is not the
    /// merge of its children, a broken parent link, a dangling child link, a
    /// wrong leaf count, or live nodes unreachable from the root.
    pub fn validate(&self) -> Result<(), TreeError> {
        let live = self.arena.live();
        let Some(root) = self.root else {
            if self.leaf_count != 0 {
                return Err(TreeError::LeafCountMismatch {
                    expected: self.leaf_count,
                    found: 0,
                });
            }
            if live != 0 {
                return Err(TreeError::UnreachableNodes { live, reachable: 0 });
            }
            return Ok(());
        };
        if self.arena.get(root).parent.is_some() {
            return Err(TreeError::RootHasParent {
                node: self.arena.id(root),
            });
        }

        let mut stack: NodeStack = smallvec![root];
        let mut reachable = 0;
        let mut leaves = 0;
        while let Some(idx) = stack.pop() {
            reachable += 1;
            if reachable > live {
                return Err(TreeError::UnreachableNodes { live, reachable });
            }
            let node = self.arena.get(idx);
            let NodeKind::Internal(children) = node.kind else {
                leaves += 1;
                continue;
            };
            let mut merged: Option<Volume> = None;
            for c in children {
                let Some(child) = self.arena.try_get(c) else {
                    return Err(TreeError::DanglingChild {
                        node: self.arena.id(idx),
                    });
                };
                if child.parent != Some(idx) {
                    return Err(TreeError::ParentMismatch {
                        node: self.arena.id(c),
                    });
                }
                merged = Some(match merged {
                    Some(m) => Volume::merge(&m, &child.volume),
                    None => child.volume,
                });
                stack.push(c);
            }
            if merged != Some(node.volume) {
                return Err(TreeError::VolumeMismatch {
                    node: self.arena.id(idx),
                });
            }
        }

        if leaves != self.leaf_count {
            return Err(TreeError::LeafCountMismatch {
                expected: self.leaf_count,
                found: leaves,
            });
        }
        if reachable != live {
            return Err(TreeError::UnreachableNodes { live, reachable });
        }
        Ok(())
    }

    pub(crate) fn node_ref(&self, idx: NodeIdx) -> NodeRef<P> {
        let node = self.arena.get(idx);
        NodeRef {
            id: self.arena.id(idx),
            volume: node.volume,
            payload: match node.kind {
                NodeKind::Leaf(p) => Some(p),
                NodeKind::Internal(_) => None,
            },
        }
    }

    pub(crate) fn leaf_ref(&self, idx: NodeIdx) -> Leaf<P> {
        let node = self.arena.get(idx);
        let NodeKind::Leaf(payload) = node.kind else {
            unreachable!("leaf_ref on an internal node");
        };
        Leaf {
            id: LeafId(self.arena.id(idx)),
            volume: node.volume,
            payload,
        }
    }

    pub(crate) fn children_of(&self, idx: NodeIdx) -> [NodeIdx; 2] {
        match self.arena.get(idx).kind {
            NodeKind::Internal(c) => c,
            NodeKind::Leaf(_) => unreachable!("children_of on a leaf"),
        }
    }

    pub(crate) fn set_child(&mut self, parent: NodeIdx, slot: usize, child: NodeIdx) {
        match &mut self.arena.get_mut(parent).kind {
            NodeKind::Internal(c) => c[slot] = child,
            NodeKind::Leaf(_) => unreachable!("set_child on a leaf"),
        }
        self.arena.get_mut(child).parent = Some(parent);
    }

    fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        let slot = usize::from(self.children_of(parent)[0] != old);
        debug_assert_eq!(self.children_of(parent)[slot], old, "old child not found");
        self.set_child(parent, slot, new);
    }

    /// Recompute ancestor volumes starting at `start`.
    ///
    /// Stops at the first node whose merged volume did not change: everything
    /// above it was computed from that same value.
    fn refit_from(&mut self, start: NodeIdx) {
        let mut cur = Some(start);
        while let Some(idx) = cur {
            let [c0, c1] = self.children_of(idx);
            let merged = Volume::merge(&self.arena.get(c0).volume, &self.arena.get(c1).volume);
            let node = self.arena.get_mut(idx);
            if node.volume == merged {
                break;
            }
            node.volume = merged;
            cur = node.parent;
        }
    }

    /// Link an allocated, detached leaf into the tree using its stored volume.
    pub(crate) fn insert_leaf(&mut self, leaf: NodeIdx) {
        let Some(root) = self.root else {
            self.arena.get_mut(leaf).parent = None;
            self.root = Some(leaf);
            return;
        };
        let volume = self.arena.get(leaf).volume;
        let mut sibling = root;
        while let Some([c0, c1]) = self.arena.get(sibling).children() {
            let p0 = Volume::proximity(&volume, &self.arena.get(c0).volume);
            let p1 = Volume::proximity(&volume, &self.arena.get(c1).volume);
            sibling = if p0 < p1 { c0 } else { c1 };
        }

        let sibling_node = self.arena.get(sibling);
        let old_parent = sibling_node.parent;
        let merged = Volume::merge(&sibling_node.volume, &volume);
        let node = self
            .arena
            .alloc(Node::internal(merged, old_parent, [sibling, leaf]));
        self.arena.get_mut(sibling).parent = Some(node);
        self.arena.get_mut(leaf).parent = Some(node);
        match old_parent {
            Some(p) => {
                self.replace_child(p, sibling, node);
                self.refit_from(p);
            }
            None => self.root = Some(node),
        }
    }

    /// Unlink a leaf from the tree without freeing its slot.
    ///
    /// The leaf's sibling takes over the parent's place and the parent slot
    /// goes back to the arena.
    pub(crate) fn detach_leaf(&mut self, leaf: NodeIdx) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }
        let Some(parent) = self.arena.get(leaf).parent else {
            unreachable!("non-root leaf without a parent");
        };
        let [c0, c1] = self.children_of(parent);
        let sibling = if c0 == leaf { c1 } else { c0 };
        let grandparent = self.arena.free(parent).parent;
        self.arena.get_mut(sibling).parent = grandparent;
        self.arena.get_mut(leaf).parent = None;
        match grandparent {
            Some(gp) => {
                self.replace_child(gp, parent, sibling);
                self.refit_from(gp);
            }
            None => self.root = Some(sibling),
        }
    }
}

type SmallVecDepth = smallvec::SmallVec<[(NodeIdx, usize); 64]>;
