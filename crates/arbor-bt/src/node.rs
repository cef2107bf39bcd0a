use std::fmt;

use arbor_core::{sanitize_weight, NodeState, SeedMode, DEFAULT_WEIGHT};
use serde::{Deserialize, Serialize};

use crate::engine::Behaviour;
use crate::nodes::{
    ActionFunction, ActionNode, CallbackFunction, CompositeNode, Condition, ConditionFunction,
    DecoratorNode, Parallel, RepeatFixed, RepeatUntil, Selector, Sequence, Subtree,
    UntilCondition, Wait, WeightDecorator, WeightedPool,
};
use crate::property::{FieldInfo, FieldValue};
use crate::runner::{TreeHandle, TreeRunner};

/// Structural category of a node: how many children it may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Any number of children.
    Composite,
    /// Exactly one child.
    Decorator,
    /// No children.
    Action,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Composite => "composite",
            Category::Decorator => "decorator",
            Category::Action => "action",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Composite(CompositeNode),
    Decorator(DecoratorNode),
    Action(ActionNode),
}

impl NodeKind {
    pub fn category(&self) -> Category {
        match self {
            NodeKind::Composite(_) => Category::Composite,
            NodeKind::Decorator(_) => Category::Decorator,
            NodeKind::Action(_) => Category::Action,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            NodeKind::Composite(node) => node.field(name),
            NodeKind::Decorator(node) => node.field(name),
            NodeKind::Action(node) => node.field(name),
        }
    }

    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        match self {
            NodeKind::Composite(node) => node.store_field(name, value),
            NodeKind::Decorator(node) => node.store_field(name, value),
            NodeKind::Action(node) => node.store_field(name, value),
        }
    }

    fn field_names(&self) -> &'static [&'static str] {
        match self {
            NodeKind::Composite(node) => node.field_names(),
            NodeKind::Decorator(node) => node.field_names(),
            NodeKind::Action(node) => node.field_names(),
        }
    }
}

/// Per-instance run bookkeeping. Never serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunState {
    pub started: bool,
    pub state: NodeState,
}

/// A node of a behaviour tree.
///
/// Nodes hold configuration plus transient run state. Cloning a tree for
/// execution goes through [`Node::copy`], which keeps the configuration and
/// clears everything run-related.
#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default = "default_exposed")]
    pub exposed: bool,
    pub kind: NodeKind,
    #[serde(skip)]
    pub(crate) run: RunState,
}

fn default_exposed() -> bool {
    true
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            exposed: true,
            kind,
            run: RunState::default(),
        }
    }

    fn composite(name: &str, node: CompositeNode) -> Self {
        Self::new(name, NodeKind::Composite(node))
    }

    fn decorator(name: &str, node: DecoratorNode) -> Self {
        Self::new(name, NodeKind::Decorator(node))
    }

    fn action(name: &str, node: ActionNode) -> Self {
        Self::new(name, NodeKind::Action(node))
    }

    pub fn sequence() -> Self {
        Self::composite("Sequence", CompositeNode::Sequence(Sequence::default()))
    }

    pub fn selector() -> Self {
        Self::composite("Selector", CompositeNode::Selector(Selector::default()))
    }

    pub fn parallel() -> Self {
        Self::composite("Parallel", CompositeNode::Parallel(Parallel::default()))
    }

    pub fn random_sequence(seed_mode: SeedMode) -> Self {
        Self::composite(
            "Random Sequence",
            CompositeNode::RandomSequence(WeightedPool::new(seed_mode)),
        )
    }

    pub fn random_selector(seed_mode: SeedMode) -> Self {
        Self::composite(
            "Random Selector",
            CompositeNode::RandomSelector(WeightedPool::new(seed_mode)),
        )
    }

    pub fn condition(enabled: bool) -> Self {
        Self::decorator("Condition", DecoratorNode::Condition(Condition { enabled }))
    }

    pub fn condition_fn(condition_id: impl Into<String>) -> Self {
        Self::decorator(
            "Condition Function",
            DecoratorNode::ConditionFunction(ConditionFunction {
                condition_id: condition_id.into(),
            }),
        )
    }

    pub fn callback_fn(callback_id: impl Into<String>) -> Self {
        Self::decorator(
            "Callback Function",
            DecoratorNode::CallbackFunction(CallbackFunction {
                callback_id: callback_id.into(),
            }),
        )
    }

    pub fn weight(weight: f32) -> Self {
        Self::decorator("Weight", DecoratorNode::Weight(WeightDecorator { weight }))
    }

    pub fn inverse() -> Self {
        Self::decorator("Inverse", DecoratorNode::Inverse)
    }

    pub fn always_succeed() -> Self {
        Self::decorator("Always Succeed", DecoratorNode::AlwaysSucceed)
    }

    pub fn always_fail() -> Self {
        Self::decorator("Always Fail", DecoratorNode::AlwaysFail)
    }

    pub fn repeat_infinite() -> Self {
        Self::decorator("Repeat Infinite", DecoratorNode::RepeatInfinite)
    }

    pub fn repeat_fixed(iterations: i32) -> Self {
        Self::decorator(
            "Repeat Fixed",
            DecoratorNode::RepeatFixed(RepeatFixed::new(iterations)),
        )
    }

    pub fn repeat_until(until: UntilCondition) -> Self {
        Self::decorator("Repeat Until", DecoratorNode::RepeatUntil(RepeatUntil { until }))
    }

    pub fn empty() -> Self {
        Self::action("Empty", ActionNode::Empty)
    }

    pub fn wait(duration: f32) -> Self {
        Self::action("Wait", ActionNode::Wait(Wait::new(duration)))
    }

    pub fn action_fn(action_id: impl Into<String>) -> Self {
        Self::action(
            "Action Function",
            ActionNode::ActionFunction(ActionFunction {
                action_id: action_id.into(),
            }),
        )
    }

    pub fn subtree(blueprint: Option<TreeHandle>) -> Self {
        let mut runner = TreeRunner::default();
        runner.set_blueprint(blueprint);
        Self::action("Subtree", ActionNode::Subtree(Subtree { runner }))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_composite(&self) -> bool {
        self.category() == Category::Composite
    }

    pub fn is_decorator(&self) -> bool {
        self.category() == Category::Decorator
    }

    pub fn is_action(&self) -> bool {
        self.category() == Category::Action
    }

    /// Whether the node is inside a run (started and not yet ended).
    pub fn is_started(&self) -> bool {
        self.run.started
    }

    /// Last result produced since the parent last started.
    pub fn state(&self) -> NodeState {
        self.run.state
    }

    /// Weight declared to pool composites, if this node declares one.
    pub fn weight_value(&self) -> Option<f32> {
        match &self.kind {
            NodeKind::Decorator(DecoratorNode::Weight(w)) => Some(sanitize_weight(w.weight)),
            _ => None,
        }
    }

    /// Weight as seen by a pool composite: declared weight or [`DEFAULT_WEIGHT`].
    pub fn pool_weight(&self) -> f32 {
        self.weight_value().unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn field(&self, name: &str) -> Option<FieldValue> {
        self.kind.field(name)
    }

    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        self.kind.store_field(name, value)
    }

    /// Fields a property may bind to.
    pub fn bindable_fields(&self) -> Vec<FieldInfo> {
        self.kind
            .field_names()
            .iter()
            .filter_map(|name| {
                self.field(name).map(|value| FieldInfo {
                    name,
                    ty: value.field_type(),
                })
            })
            .collect()
    }

    /// Configuration-only copy: run state and transient fields are reset.
    pub fn copy(&self) -> Node {
        let mut kind = self.kind.clone();
        kind.reset();
        Node {
            name: self.name.clone(),
            exposed: self.exposed,
            kind,
            run: RunState::default(),
        }
    }
}
