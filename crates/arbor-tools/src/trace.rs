#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Tags emitted by the tree engine.
pub mod tags {
    /// A node started; `a` is the node id.
    pub const NODE_START: &str = "bt.node.start";
    /// A node's start hook refused; `a` is the node id, `b` the failure code.
    pub const NODE_START_FAILED: &str = "bt.node.start_failed";
    /// A node finished; `a` is the node id, `b` the status code.
    pub const NODE_END: &str = "bt.node.end";
    /// A running node was aborted; `a` is the node id.
    pub const NODE_FORCE_STOP: &str = "bt.node.force_stop";
    /// A runner rebuilt its instance from a changed blueprint.
    pub const TREE_REINSTANTIATE: &str = "bt.tree.reinstantiate";
}

/// One recorded engine event.
///
/// `a` and `b` are tag-specific payloads; node events carry the node id in `a`
/// and a status code in `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub a: u64,
    pub b: u64,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            a: 0,
            b: 0,
        }
    }

    /// Node event: `node` goes in `a`, `code` in `b`.
    pub fn node(tick: u64, tag: &'static str, node: usize, code: u64) -> Self {
        Self::new(tick, tag).with_a(node as u64).with_b(code)
    }

    pub fn with_a(mut self, a: u64) -> Self {
        self.a = a;
        self
    }

    pub fn with_b(mut self, b: u64) -> Self {
        self.b = b;
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl VecTraceSink {
    /// Events carrying `tag`, in emission order.
    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.is(tag))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Serializable event list, e.g. for saving a run to disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    /// Node ids of every event tagged `tag`, in order.
    pub fn nodes_tagged(&self, tag: &str) -> Vec<u64> {
        self.events.iter().filter(|e| e.is(tag)).map(|e| e.a).collect()
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// A [`TraceLog`] that stays readable after a clone is boxed into an evaluator.
#[derive(Debug, Default, Clone)]
pub struct SharedTraceLog(Rc<RefCell<TraceLog>>);

impl SharedTraceLog {
    pub fn snapshot(&self) -> TraceLog {
        self.0.borrow().clone()
    }

    /// Moves every recorded event out, leaving the log empty.
    pub fn take(&self) -> TraceLog {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceSink for SharedTraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}
