//! Node lifecycle and the tick driver.
//!
//! Every node run goes through [`run_node`]:
//! 1. on first evaluation after being idle the node is started (observer hook,
//!    then `start`); a failed start makes the tick return `Failure`;
//! 2. `evaluate` produces the tick's status;
//! 3. a terminal status ends the run (`end`, then children still started are
//!    force-stopped, then the observer hook).
//!
//! Force-stop walks started descendants breadth-first, clearing `started`
//! before each node's `force_stop` runs.

use std::collections::VecDeque;

use arbor_core::{HookRegistry, NodeState, Outcome, RunContext, Status};
use arbor_tools::{tags, TraceEvent, TraceSink};

use crate::config::EngineConfig;
use crate::node::{Node, NodeKind};
use crate::tree::{NodeId, Tree};

/// Everything a run needs besides the tree itself.
pub struct Env<'a, O> {
    pub owner: &'a mut O,
    pub hooks: &'a mut HookRegistry<O>,
    pub evaluator_id: u64,
    pub config: EngineConfig,
    trace: Option<&'a mut (dyn TraceSink + 'static)>,
    depth: u32,
    pub(crate) tick: u64,
}

impl<'a, O> Env<'a, O> {
    pub fn new(owner: &'a mut O, hooks: &'a mut HookRegistry<O>) -> Self {
        Self {
            owner,
            hooks,
            evaluator_id: 0,
            config: EngineConfig::default(),
            trace: None,
            depth: 0,
            tick: 0,
        }
    }

    pub fn with_evaluator_id(mut self, evaluator_id: u64) -> Self {
        self.evaluator_id = evaluator_id;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Number of enclosing subtrees.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sink for node trace events; only used when `config.trace_nodes` is set.
    pub fn with_trace(mut self, sink: &'a mut (dyn TraceSink + 'static)) -> Self {
        self.trace = Some(sink);
        self
    }

    pub(crate) fn emit(&mut self, tag: &'static str, node: NodeId, payload: u64) {
        if !self.config.trace_nodes {
            return;
        }
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.emit(TraceEvent::node(self.tick, tag, node.index(), payload));
        }
    }

    pub(crate) fn start_hook(&mut self, id: &str) -> bool {
        self.hooks.start(id, self.owner)
    }

    pub(crate) fn evaluate_hook(&mut self, id: &str, ctx: &RunContext) -> Status {
        self.hooks.evaluate(id, self.owner, ctx)
    }

    pub(crate) fn end_hook(&mut self, id: &str) {
        self.hooks.end(id, self.owner);
    }

    pub(crate) fn force_stop_hook(&mut self, id: &str) {
        self.hooks.force_stop(id, self.owner);
    }

    pub(crate) fn check(&mut self, id: &str) -> bool {
        self.hooks.check(id, self.owner)
    }

    pub(crate) fn notify_result(&mut self, id: &str, outcome: Outcome) -> usize {
        self.hooks.notify_result(id, self.owner, outcome)
    }

    /// Runs `f` one subtree level deeper. Returns `None` past `max_subtree_depth`.
    pub(crate) fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if self.depth >= self.config.max_subtree_depth {
            tracing::warn!(
                depth = self.depth,
                max = self.config.max_subtree_depth,
                "subtree nesting limit reached"
            );
            return None;
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        Some(result)
    }
}

/// View handed to a node while it runs: the rest of the tree, the
/// environment and the node's own id.
pub(crate) struct NodeCx<'c, 'a, O> {
    pub tree: &'c mut Tree,
    pub env: &'c mut Env<'a, O>,
    pub id: NodeId,
}

impl<O> NodeCx<'_, '_, O> {
    pub fn children(&self) -> Vec<NodeId> {
        self.tree.children(self.id)
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.children().first().copied()
    }

    pub fn run_child(&mut self, child: NodeId, ctx: &RunContext) -> Status {
        run_node(self.tree, child, self.env, ctx)
    }

    pub fn pool_weight(&self, child: NodeId) -> f32 {
        self.tree.node(child).map_or(0.0, Node::pool_weight)
    }
}

/// Per-type behaviour hooks. Defaults are the no-op / always-succeeding forms.
pub(crate) trait Behaviour {
    /// Observer hook run before `start`.
    fn on_node_start<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) {}

    fn start<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) -> bool {
        true
    }

    fn evaluate<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status;

    fn end<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) {}

    fn force_stop<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) {}

    /// Observer hook run after `end`.
    fn on_node_end<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) {}

    /// Clears transient run fields, keeping configuration.
    fn reset(&mut self) {}
}

impl Behaviour for NodeKind {
    fn on_node_start<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        match self {
            NodeKind::Composite(node) => node.on_node_start(cx),
            NodeKind::Decorator(node) => node.on_node_start(cx),
            NodeKind::Action(node) => node.on_node_start(cx),
        }
    }

    fn start<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) -> bool {
        match self {
            NodeKind::Composite(node) => node.start(cx),
            NodeKind::Decorator(node) => node.start(cx),
            NodeKind::Action(node) => node.start(cx),
        }
    }

    fn evaluate<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
        match self {
            NodeKind::Composite(node) => node.evaluate(cx, ctx),
            NodeKind::Decorator(node) => node.evaluate(cx, ctx),
            NodeKind::Action(node) => node.evaluate(cx, ctx),
        }
    }

    fn end<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        match self {
            NodeKind::Composite(node) => node.end(cx),
            NodeKind::Decorator(node) => node.end(cx),
            NodeKind::Action(node) => node.end(cx),
        }
    }

    fn force_stop<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        match self {
            NodeKind::Composite(node) => node.force_stop(cx),
            NodeKind::Decorator(node) => node.force_stop(cx),
            NodeKind::Action(node) => node.force_stop(cx),
        }
    }

    fn on_node_end<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        match self {
            NodeKind::Composite(node) => node.on_node_end(cx),
            NodeKind::Decorator(node) => node.on_node_end(cx),
            NodeKind::Action(node) => node.on_node_end(cx),
        }
    }

    fn reset(&mut self) {
        match self {
            NodeKind::Composite(node) => node.reset(),
            NodeKind::Decorator(node) => node.reset(),
            NodeKind::Action(node) => node.reset(),
        }
    }
}

/// Runs node `id` for one tick.
///
/// The node is taken out of its slot for the duration of the run so that it
/// can drive its children through the same tree.
pub(crate) fn run_node<O>(
    tree: &mut Tree,
    id: NodeId,
    env: &mut Env<'_, O>,
    ctx: &RunContext,
) -> Status {
    let Some(mut node) = tree.take_node(id) else {
        tracing::debug!(node = %id, "run requested for a missing node");
        return Status::Failure;
    };
    env.tick = ctx.tick;

    let status = {
        let mut cx = NodeCx {
            tree: &mut *tree,
            env: &mut *env,
            id,
        };
        drive(&mut node, &mut cx, ctx)
    };

    tree.put_node(id, node);
    status
}

fn drive<O>(node: &mut Node, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
    if !node.run.started {
        node.kind.on_node_start(cx);
        cx.env.emit(tags::NODE_START, cx.id, 0);
        if !node.kind.start(cx) {
            node.run.state = NodeState::Failure;
            cx.env.emit(tags::NODE_START_FAILED, cx.id, Status::Failure.code());
            return Status::Failure;
        }
        for child in cx.children() {
            cx.tree.reset_display_state(child);
        }
        node.run.started = true;
        node.run.state = NodeState::Running;
    }

    let status = node.kind.evaluate(cx, ctx);
    node.run.state = status.into();

    if status.is_terminal() {
        node.run.started = false;
        node.kind.end(cx);
        for child in cx.children() {
            if cx.tree.is_started(child) {
                force_stop_subtree(cx.tree, child, cx.env);
            }
        }
        node.kind.on_node_end(cx);
        cx.env.emit(tags::NODE_END, cx.id, status.code());
    }

    status
}

/// Force-stops `id` and every started descendant, breadth-first.
pub(crate) fn force_stop_subtree<O>(tree: &mut Tree, id: NodeId, env: &mut Env<'_, O>) {
    let mut queue = VecDeque::from([id]);
    while let Some(next) = queue.pop_front() {
        let Some(mut node) = tree.take_node(next) else {
            continue;
        };
        if !node.run.started {
            tree.put_node(next, node);
            continue;
        }

        queue.extend(
            tree.children(next)
                .into_iter()
                .filter(|child| tree.is_started(*child)),
        );

        node.run.started = false;
        {
            let mut cx = NodeCx {
                tree: &mut *tree,
                env: &mut *env,
                id: next,
            };
            node.kind.force_stop(&mut cx);
        }
        env.emit(tags::NODE_FORCE_STOP, next, 0);
        tree.put_node(next, node);
    }
}

impl Tree {
    /// Runs the root for one tick. A tree without a root fails.
    pub fn run<O>(&mut self, env: &mut Env<'_, O>, ctx: &RunContext) -> Status {
        let root = self.root();
        if !self.contains(root) {
            return Status::Failure;
        }
        run_node(self, root, env, ctx)
    }

    /// Aborts a run in progress. Does nothing when the root is not started.
    pub fn force_stop<O>(&mut self, env: &mut Env<'_, O>) {
        let root = self.root();
        if self.is_started(root) {
            force_stop_subtree(self, root, env);
        }
    }
}
