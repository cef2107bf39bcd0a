//! Catalog of node types available to authoring tools.

use std::fmt;

use arbor_core::SeedMode;

use crate::node::{Category, Node};
use crate::nodes::{UntilCondition, DEFAULT_WAIT_SECONDS};

type NodeFactory = Box<dyn Fn() -> Node>;

struct Entry {
    name: String,
    category: Category,
    factory: NodeFactory,
}

/// Named node factories, listed in registration order.
pub struct NodeRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|e| &e.name)).finish()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NodeRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Every built-in node type under its default name.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Node::sequence);
        registry.register(Node::selector);
        registry.register(Node::parallel);
        registry.register(|| Node::random_sequence(SeedMode::default()));
        registry.register(|| Node::random_selector(SeedMode::default()));
        registry.register(|| Node::condition(true));
        registry.register(|| Node::condition_fn(""));
        registry.register(|| Node::callback_fn(""));
        registry.register(|| Node::weight(1.0));
        registry.register(Node::inverse);
        registry.register(Node::always_succeed);
        registry.register(Node::always_fail);
        registry.register(Node::repeat_infinite);
        registry.register(|| Node::repeat_fixed(1));
        registry.register(|| Node::repeat_until(UntilCondition::default()));
        registry.register(Node::empty);
        registry.register(|| Node::wait(DEFAULT_WAIT_SECONDS));
        registry.register(|| Node::action_fn(""));
        registry.register(|| Node::subtree(None));
        registry
    }

    /// Registers `factory` under the name of the node it builds, replacing
    /// any entry with that name.
    pub fn register(&mut self, factory: impl Fn() -> Node + 'static) -> &mut Self {
        let sample = factory();
        let entry = Entry {
            name: sample.name.clone(),
            category: sample.category(),
            factory: Box::new(factory),
        };
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Names of the registered types in `category`.
    pub fn names_in(&self, category: Category) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.category == category)
            .map(|e| e.name.as_str())
    }

    pub fn create(&self, name: &str) -> Option<Node> {
        let node = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| (e.factory)());
        if node.is_none() {
            tracing::debug!(node_type = %name, "unknown node type");
        }
        node
    }
}
