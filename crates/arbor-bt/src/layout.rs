//! Serialized tree layout and its validation.

use serde::Deserialize;
use thiserror::Error;

use crate::node::{Category, Node};
use crate::property::Property;
use crate::tree::{NodeId, Tree, Version};

/// Raw deserialized form of a [`Tree`], checked before it becomes one.
#[derive(Debug, Deserialize)]
pub struct TreeLayout {
    pub nodes: Vec<Option<Node>>,
    pub parents: Vec<Option<NodeId>>,
    pub root: NodeId,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default = "Version::fresh")]
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("{nodes} node slots but {parents} parent entries")]
    LengthMismatch { nodes: usize, parents: usize },
    #[error("root {0} is missing or has a parent")]
    RootMissing(NodeId),
    #[error("node {node} has no valid parent")]
    DanglingParent { node: NodeId },
    #[error("node {node} is not connected to the root")]
    ParentCycle { node: NodeId },
    #[error("{category} node {node} has {count} children")]
    ChildCount {
        node: NodeId,
        category: Category,
        count: usize,
    },
}

impl TryFrom<TreeLayout> for Tree {
    type Error = LayoutError;

    fn try_from(layout: TreeLayout) -> Result<Self, Self::Error> {
        let TreeLayout {
            nodes,
            mut parents,
            root,
            properties,
            version,
        } = layout;

        if nodes.len() != parents.len() {
            return Err(LayoutError::LengthMismatch {
                nodes: nodes.len(),
                parents: parents.len(),
            });
        }

        let occupied = |id: NodeId| matches!(nodes.get(id.0), Some(Some(_)));
        if !occupied(root) || parents[root.0].is_some() {
            return Err(LayoutError::RootMissing(root));
        }

        for (i, slot) in nodes.iter().enumerate() {
            if slot.is_none() {
                parents[i] = None;
                continue;
            }
            let id = NodeId(i);
            if id == root {
                continue;
            }
            match parents[i] {
                Some(parent) if occupied(parent) => {}
                _ => return Err(LayoutError::DanglingParent { node: id }),
            }
        }

        for (i, _) in nodes.iter().enumerate().filter(|(_, slot)| slot.is_some()) {
            let mut current = NodeId(i);
            let mut steps = 0;
            while let Some(parent) = parents[current.0] {
                current = parent;
                steps += 1;
                if steps > nodes.len() {
                    return Err(LayoutError::ParentCycle { node: NodeId(i) });
                }
            }
            if current != root {
                return Err(LayoutError::ParentCycle { node: NodeId(i) });
            }
        }

        let tree = Tree {
            nodes,
            parents,
            root,
            properties,
            version,
        };

        for (id, node) in tree.nodes() {
            let count = tree.children(id).len();
            let allowed = match node.category() {
                Category::Composite => true,
                Category::Decorator => count == 1,
                Category::Action => count == 0,
            };
            if !allowed {
                return Err(LayoutError::ChildCount {
                    node: id,
                    category: node.category(),
                    count,
                });
            }
        }

        Ok(tree)
    }
}
