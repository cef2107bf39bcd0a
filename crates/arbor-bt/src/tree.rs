//! Arena-backed tree store and its structural edits.
//!
//! Nodes live in slots addressed by [`NodeId`]. A removed node leaves an empty
//! slot (a tombstone) that later insertions may reuse. Parent links are kept in
//! a parallel vector; child order is slot order.
//!
//! Every committed edit issues a new [`Version`]. Runners compare versions to
//! decide when their private instance is stale.

use std::collections::VecDeque;
use std::fmt;

use arbor_core::NodeState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layout::TreeLayout;
use crate::node::{Category, Node};
use crate::property::Property;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque token identifying one state of a tree's structure and configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(Uuid);

impl Version {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "TreeLayout")]
pub struct Tree {
    pub(crate) nodes: Vec<Option<Node>>,
    pub(crate) parents: Vec<Option<NodeId>>,
    pub(crate) root: NodeId,
    pub(crate) properties: Vec<Property>,
    pub(crate) version: Version,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree whose root repeats forever over a single `Empty` action.
    pub fn new() -> Self {
        Self::with_root(Node::repeat_infinite().with_name("Root"))
    }

    pub fn with_root(root: Node) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            parents: Vec::new(),
            root: NodeId(0),
            properties: Vec::new(),
            version: Version::fresh(),
        };
        tree.root = tree.insert(root, None);
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Issues a new version. Called by every committed edit.
    pub fn touch(&mut self) {
        self.version = Version::fresh();
    }

    /// Number of slots, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access for authoring. Regenerates the version.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if !self.contains(id) {
            return None;
        }
        self.touch();
        self.node_slot_mut(id)
    }

    pub(crate) fn node_slot_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Occupied slots in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i), node)))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        self.parents.get(id.0).copied().flatten()
    }

    /// Children of `id` in slot order. Empty for unknown ids.
    ///
    /// Works while `id` itself is out of its slot for a run.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.parents
            .iter()
            .enumerate()
            .filter(|(i, parent)| **parent == Some(id) && self.nodes[*i].is_some())
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Whether `ancestor` is `id` itself or lies on its parent chain.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parents.get(node.0).copied().flatten();
        }
        false
    }

    /// `id` and all of its descendants, breadth-first.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.children(next));
        }
        out
    }

    /// Adds `node` as the last child of `parent`.
    ///
    /// Refused for missing parents, actions, and decorators that already have
    /// a child.
    pub fn add(&mut self, node: Node, parent: NodeId) -> Option<NodeId> {
        let accepts = match self.node(parent).map(Node::category) {
            Some(Category::Composite) => true,
            Some(Category::Decorator) => self.children(parent).is_empty(),
            Some(Category::Action) | None => false,
        };
        if !accepts {
            tracing::debug!(parent = %parent, "add refused: parent cannot take another child");
            return None;
        }

        let id = self.insert(node, Some(parent));
        self.touch();
        Some(id)
    }

    /// Inserts `new_parent` between `id` and its parent.
    ///
    /// `new_parent` takes over `id`'s slot; the node formerly at `id` moves to
    /// the first free slot and becomes `new_parent`'s only child. Returns the
    /// moved node's new id.
    pub fn add_parent(&mut self, id: NodeId, new_parent: Node) -> Option<NodeId> {
        if !self.contains(id) || new_parent.is_action() {
            tracing::debug!(node = %id, "add_parent refused");
            return None;
        }

        let children = self.children(id);
        let moved = self.free_slot_from(0);
        let node = self.nodes[id.0].take()?;

        self.place(moved, node, Some(id));
        for child in children {
            self.parents[child.0] = Some(moved);
        }
        self.nodes[id.0] = Some(new_parent);
        for property in &mut self.properties {
            if property.node == id {
                property.node = moved;
            }
        }

        self.initialize(id);
        self.touch();
        Some(moved)
    }

    /// Removes `id` and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root || !self.contains(id) {
            tracing::debug!(node = %id, "remove refused");
            return false;
        }

        let parent = self.parents[id.0];
        self.remove_subtree(id);
        if let Some(parent) = parent {
            self.initialize(parent);
        }
        self.touch();
        true
    }

    /// Swaps the node at `id` for `node`, keeping as many children as the new
    /// category allows (in slot order) and dropping the rest with their subtrees.
    pub fn replace(&mut self, id: NodeId, node: Node) -> bool {
        if !self.contains(id) {
            tracing::debug!(node = %id, "replace refused: no such node");
            return false;
        }

        let children = self.children(id);
        let keep = match node.category() {
            Category::Composite => children.len(),
            Category::Decorator => 1,
            Category::Action => 0,
        };
        for child in children.into_iter().skip(keep) {
            self.remove_subtree(child);
        }

        self.nodes[id.0] = Some(node);
        self.initialize(id);
        self.touch();
        true
    }

    /// Swaps `id` with its previous sibling. Returns the node's new id.
    pub fn move_left(&mut self, id: NodeId) -> Option<NodeId> {
        self.swap_with_sibling(id, Direction::Left)
    }

    /// Swaps `id` with its next sibling. Returns the node's new id.
    pub fn move_right(&mut self, id: NodeId) -> Option<NodeId> {
        self.swap_with_sibling(id, Direction::Right)
    }

    fn swap_with_sibling(&mut self, id: NodeId, direction: Direction) -> Option<NodeId> {
        if id == self.root || !self.contains(id) {
            return None;
        }

        let parent = self.parents[id.0];
        let is_sibling = |i: &usize| self.parents[*i] == parent && self.nodes[*i].is_some();
        let sibling = match direction {
            Direction::Left => (0..id.0).rev().find(is_sibling),
            Direction::Right => (id.0 + 1..self.nodes.len()).find(is_sibling),
        }
        .map(NodeId)?;

        let ours = self.children(id);
        let theirs = self.children(sibling);
        for child in ours {
            self.parents[child.0] = Some(sibling);
        }
        for child in theirs {
            self.parents[child.0] = Some(id);
        }
        self.nodes.swap(id.0, sibling.0);

        for property in &mut self.properties {
            if property.node == id {
                property.node = sibling;
            } else if property.node == sibling {
                property.node = id;
            }
        }

        self.touch();
        Some(sibling)
    }

    /// Independent copy for execution: same ids, same version, fresh run state.
    pub fn instantiate(&self) -> Tree {
        Tree {
            nodes: self
                .nodes
                .iter()
                .map(|slot| slot.as_ref().map(Node::copy))
                .collect(),
            parents: self.parents.clone(),
            root: self.root,
            properties: self.properties.clone(),
            version: self.version,
        }
    }

    /// Places `node` without any of the public edit checks and initializes it.
    pub(crate) fn insert(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.attach(node, parent);
        self.initialize(id);
        id
    }

    /// Places `node` as the last child of `parent` without initializing it.
    pub(crate) fn attach(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.free_slot_after_siblings(parent);
        self.place(id, node, parent);
        id
    }

    /// First free slot after the last existing sibling under `parent`.
    fn free_slot_after_siblings(&self, parent: Option<NodeId>) -> NodeId {
        let start = match parent {
            Some(_) => self
                .parents
                .iter()
                .rposition(|p| *p == parent)
                .map_or(0, |i| i + 1),
            None => 0,
        };
        self.free_slot_from(start)
    }

    fn free_slot_from(&self, start: usize) -> NodeId {
        let index = (start..self.nodes.len())
            .find(|&i| self.nodes[i].is_none())
            .unwrap_or(self.nodes.len());
        NodeId(index)
    }

    fn place(&mut self, id: NodeId, node: Node, parent: Option<NodeId>) {
        if id.0 == self.nodes.len() {
            self.nodes.push(Some(node));
            self.parents.push(parent);
        } else {
            self.nodes[id.0] = Some(node);
            self.parents[id.0] = parent;
        }
    }

    /// A decorator left without a child gets a fresh `Empty` action.
    pub(crate) fn initialize(&mut self, id: NodeId) {
        let childless_decorator = self.node(id).is_some_and(Node::is_decorator)
            && self.children(id).is_empty();
        if childless_decorator {
            self.insert(Node::empty(), Some(id));
        }
    }

    pub(crate) fn remove_subtree(&mut self, id: NodeId) {
        let mut removed = Vec::new();
        let mut queue = VecDeque::from([id]);
        while let Some(next) = queue.pop_front() {
            queue.extend(
                self.parents
                    .iter()
                    .enumerate()
                    .filter(|(_, parent)| **parent == Some(next))
                    .map(|(i, _)| NodeId(i)),
            );
            self.nodes[next.0] = None;
            self.parents[next.0] = None;
            removed.push(next);
        }
        self.properties.retain(|p| !removed.contains(&p.node));
    }

    pub(crate) fn take_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.get_mut(id.0).and_then(Option::take)
    }

    pub(crate) fn put_node(&mut self, id: NodeId, node: Node) {
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = Some(node);
        }
    }

    pub(crate) fn is_started(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(Node::is_started)
    }

    /// Sets `id` and its descendants back to [`NodeState::Idle`].
    pub(crate) fn reset_display_state(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            stack.extend(self.children(next));
            if let Some(node) = self.node_slot_mut(next) {
                node.run.state = NodeState::Idle;
            }
        }
    }
}
