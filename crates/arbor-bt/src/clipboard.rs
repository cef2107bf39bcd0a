//! Copying whole subtrees between positions and trees.

use serde::{Deserialize, Serialize};

use crate::naming::unique_name;
use crate::node::Node;
use crate::tree::{NodeId, Tree};

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    node: Node,
    /// Index of the parent entry; `None` for the copied root.
    parent: Option<usize>,
}

/// A detached copy of a subtree, parents before children.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Clipboard {
    entries: Vec<Entry>,
}

impl Clipboard {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The copied subtree's top node.
    pub fn root(&self) -> Option<&Node> {
        self.entries.first().map(|e| &e.node)
    }
}

impl Tree {
    /// Copies `id` and its descendants, without run state.
    pub fn copy_subtree(&self, id: NodeId) -> Option<Clipboard> {
        let ids = self.subtree_ids(id);
        if ids.is_empty() {
            return None;
        }

        let mut entries = Vec::with_capacity(ids.len());
        for &node_id in &ids {
            let node = self.node(node_id)?;
            let parent = if node_id == id {
                None
            } else {
                self.parent(node_id)
                    .and_then(|p| ids.iter().position(|&other| other == p))
            };
            entries.push(Entry {
                node: node.copy(),
                parent,
            });
        }
        Some(Clipboard { entries })
    }

    /// Replaces the node at `id` and its subtree with a copy of `clipboard`.
    ///
    /// Pasted nodes are renamed where their names clash with nodes outside the
    /// replaced subtree. Returns `id`, which now holds the pasted top node.
    pub fn paste_replace(&mut self, id: NodeId, clipboard: &Clipboard) -> Option<NodeId> {
        if !self.contains(id) || clipboard.is_empty() {
            tracing::debug!(node = %id, "paste refused");
            return None;
        }

        let replaced = self.subtree_ids(id);
        let mut names: Vec<String> = self
            .nodes()
            .filter(|(other, _)| !replaced.contains(other))
            .map(|(_, node)| node.name.clone())
            .collect();

        for child in self.children(id) {
            self.remove_subtree(child);
        }

        let mut placed: Vec<NodeId> = Vec::with_capacity(clipboard.len());
        for entry in &clipboard.entries {
            let mut node = entry.node.copy();
            node.name = unique_name(names.iter().map(String::as_str), &node.name);
            names.push(node.name.clone());

            let new_id = match entry.parent.and_then(|p| placed.get(p).copied()) {
                Some(parent) => self.attach(node, Some(parent)),
                None => {
                    self.put_node(id, node);
                    id
                }
            };
            placed.push(new_id);
        }

        for &node in &placed {
            self.initialize(node);
        }
        self.touch();
        Some(id)
    }
}
