use arbor_core::{RunContext, SeedMode, Status, WeightedSelector};
use serde::{Deserialize, Serialize};

use crate::engine::{Behaviour, NodeCx};
use crate::property::FieldValue;
use crate::tree::NodeId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeNode {
    Sequence(Sequence),
    Selector(Selector),
    Parallel(Parallel),
    RandomSequence(WeightedPool),
    RandomSelector(WeightedPool),
}

impl CompositeNode {
    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            CompositeNode::RandomSequence(pool) | CompositeNode::RandomSelector(pool) => {
                pool.field(name)
            }
            _ => None,
        }
    }

    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        match self {
            CompositeNode::RandomSequence(pool) | CompositeNode::RandomSelector(pool) => {
                pool.store_field(name, value)
            }
            _ => false,
        }
    }

    pub(crate) fn field_names(&self) -> &'static [&'static str] {
        match self {
            CompositeNode::RandomSequence(_) | CompositeNode::RandomSelector(_) => &["seed_mode"],
            _ => &[],
        }
    }
}

impl Behaviour for CompositeNode {
    fn on_node_start<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        if let CompositeNode::RandomSequence(pool) | CompositeNode::RandomSelector(pool) = self {
            pool.seed(cx);
        }
    }

    fn start<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) -> bool {
        match self {
            CompositeNode::Sequence(node) => node.index = 0,
            CompositeNode::Selector(node) => node.index = 0,
            CompositeNode::Parallel(node) => node.begin(cx.children().len()),
            CompositeNode::RandomSequence(pool) | CompositeNode::RandomSelector(pool) => {
                pool.shuffle(cx)
            }
        }
        true
    }

    fn evaluate<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
        match self {
            CompositeNode::Sequence(node) => {
                let children = cx.children();
                step_ordered(cx, &children, &mut node.index, ctx, Ordered::Sequence)
            }
            CompositeNode::Selector(node) => {
                let children = cx.children();
                step_ordered(cx, &children, &mut node.index, ctx, Ordered::Selector)
            }
            CompositeNode::Parallel(node) => node.step(cx, ctx),
            CompositeNode::RandomSequence(pool) => {
                step_ordered(cx, &pool.order, &mut pool.index, ctx, Ordered::Sequence)
            }
            CompositeNode::RandomSelector(pool) => {
                step_ordered(cx, &pool.order, &mut pool.index, ctx, Ordered::Selector)
            }
        }
    }

    fn reset(&mut self) {
        match self {
            CompositeNode::Sequence(node) => *node = Sequence::default(),
            CompositeNode::Selector(node) => *node = Selector::default(),
            CompositeNode::Parallel(node) => *node = Parallel::default(),
            CompositeNode::RandomSequence(pool) | CompositeNode::RandomSelector(pool) => {
                *pool = WeightedPool::new(pool.seed_mode)
            }
        }
    }
}

/// Runs children in order; fails on the first failing child.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(skip)]
    index: usize,
}

/// Runs children in order; succeeds on the first succeeding child.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Selector {
    #[serde(skip)]
    index: usize,
}

#[derive(Clone, Copy)]
enum Ordered {
    Sequence,
    Selector,
}

impl Ordered {
    /// Child result that ends the composite immediately.
    fn decisive(self) -> Status {
        match self {
            Ordered::Sequence => Status::Failure,
            Ordered::Selector => Status::Success,
        }
    }

    /// Result once every child has been tried.
    fn exhausted(self) -> Status {
        match self {
            Ordered::Sequence => Status::Success,
            Ordered::Selector => Status::Failure,
        }
    }
}

/// Advances an ordered composite by at most one child per tick.
fn step_ordered<O>(
    cx: &mut NodeCx<'_, '_, O>,
    order: &[NodeId],
    index: &mut usize,
    ctx: &RunContext,
    mode: Ordered,
) -> Status {
    let Some(&child) = order.get(*index) else {
        return mode.exhausted();
    };

    let status = cx.run_child(child, ctx);
    if status == mode.decisive() {
        return status;
    }
    if status.is_terminal() {
        *index += 1;
        if *index >= order.len() {
            return mode.exhausted();
        }
    }
    Status::Running
}

/// Runs every child each tick until all have finished.
///
/// Succeeds only if every child succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parallel {
    #[serde(skip)]
    complete: Vec<bool>,
    #[serde(skip)]
    remaining: usize,
    #[serde(skip)]
    all_succeeded: bool,
}

impl Parallel {
    fn begin(&mut self, children: usize) {
        self.complete = vec![false; children];
        self.remaining = children;
        self.all_succeeded = true;
    }

    fn step<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
        for (i, child) in cx.children().into_iter().enumerate() {
            if self.remaining == 0 {
                break;
            }
            // Children added mid-run are not part of this run.
            let Some(done) = self.complete.get_mut(i) else {
                break;
            };
            if *done {
                continue;
            }

            let status = cx.run_child(child, ctx);
            if status.is_terminal() {
                *done = true;
                self.remaining -= 1;
                self.all_succeeded &= status == Status::Success;
            }
        }

        match (self.remaining, self.all_succeeded) {
            (0, true) => Status::Success,
            (0, false) => Status::Failure,
            _ => Status::Running,
        }
    }
}

/// Shared state of the random composites: a weighted draw order fixed at start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightedPool {
    #[serde(default)]
    pub seed_mode: SeedMode,
    #[serde(skip)]
    selector: Option<WeightedSelector>,
    #[serde(skip)]
    order: Vec<NodeId>,
    #[serde(skip)]
    index: usize,
}

impl WeightedPool {
    pub fn new(seed_mode: SeedMode) -> Self {
        Self {
            seed_mode,
            ..Self::default()
        }
    }

    /// Draw order of the current run.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Pools in nested subtrees share the evaluator, so the stream is keyed on
    /// subtree depth as well as the slot.
    fn per_evaluator<O>(cx: &NodeCx<'_, '_, O>) -> WeightedSelector {
        let stream = (u64::from(cx.env.depth()) << 32) | cx.id.index() as u64;
        WeightedSelector::per_evaluator(cx.env.config.global_seed, cx.env.evaluator_id, stream)
    }

    fn seed<O>(&mut self, cx: &NodeCx<'_, '_, O>) {
        match self.seed_mode {
            SeedMode::PerEvaluator => {
                if self.selector.is_none() {
                    self.selector = Some(Self::per_evaluator(cx));
                }
            }
            SeedMode::RandomOnStart => self.selector = Some(WeightedSelector::from_entropy()),
        }
    }

    fn shuffle<O>(&mut self, cx: &NodeCx<'_, '_, O>) {
        let children = cx.children();
        let weights: Vec<f32> = children.iter().map(|c| cx.pool_weight(*c)).collect();
        let selector = self
            .selector
            .get_or_insert_with(|| Self::per_evaluator(cx));

        self.order = selector
            .permutation(&weights)
            .into_iter()
            .map(|i| children[i])
            .collect();
        self.index = 0;
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "seed_mode" => Some(FieldValue::SeedMode(self.seed_mode)),
            _ => None,
        }
    }

    fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("seed_mode", FieldValue::SeedMode(mode)) => {
                self.seed_mode = mode;
                true
            }
            _ => false,
        }
    }
}
