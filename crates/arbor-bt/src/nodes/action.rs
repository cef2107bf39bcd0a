use arbor_core::{RunContext, Status};
use serde::{Deserialize, Serialize};

use crate::engine::{Behaviour, NodeCx};
use crate::property::FieldValue;
use crate::runner::TreeRunner;

pub const DEFAULT_WAIT_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionNode {
    /// Succeeds immediately.
    Empty,
    Wait(Wait),
    ActionFunction(ActionFunction),
    Subtree(Subtree),
}

/// Runs until `duration` seconds of tick time have accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wait {
    #[serde(default = "default_duration")]
    pub duration: f32,
    #[serde(skip)]
    elapsed: f32,
}

fn default_duration() -> f32 {
    DEFAULT_WAIT_SECONDS
}

impl Wait {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_SECONDS)
    }
}

/// Delegates its whole lifecycle to the hooks bound to `action_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFunction {
    pub action_id: String,
}

/// Runs an instance of another tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subtree {
    pub runner: TreeRunner,
}

impl ActionNode {
    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match (self, name) {
            (ActionNode::Wait(w), "duration") => Some(FieldValue::Float(w.duration)),
            (ActionNode::ActionFunction(a), "action_id") => {
                Some(FieldValue::Text(a.action_id.clone()))
            }
            _ => None,
        }
    }

    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (self, name, value) {
            (ActionNode::Wait(w), "duration", FieldValue::Float(v)) => w.duration = v,
            (ActionNode::ActionFunction(a), "action_id", FieldValue::Text(v)) => a.action_id = v,
            _ => return false,
        }
        true
    }

    pub(crate) fn field_names(&self) -> &'static [&'static str] {
        match self {
            ActionNode::Wait(_) => &["duration"],
            ActionNode::ActionFunction(_) => &["action_id"],
            _ => &[],
        }
    }
}

impl Behaviour for ActionNode {
    fn start<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) -> bool {
        match self {
            ActionNode::Wait(wait) => {
                wait.elapsed = 0.0;
                true
            }
            ActionNode::ActionFunction(a) => cx.env.start_hook(&a.action_id),
            _ => true,
        }
    }

    fn evaluate<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
        match self {
            ActionNode::Empty => Status::Success,
            ActionNode::Wait(wait) => {
                wait.elapsed += ctx.dt_seconds;
                if wait.elapsed >= wait.duration {
                    Status::Success
                } else {
                    Status::Running
                }
            }
            ActionNode::ActionFunction(a) => cx.env.evaluate_hook(&a.action_id, ctx),
            ActionNode::Subtree(subtree) => {
                let runner = &mut subtree.runner;
                cx.env
                    .nested(|env| runner.run(env, ctx))
                    .unwrap_or(Status::Failure)
            }
        }
    }

    fn end<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        if let ActionNode::ActionFunction(a) = self {
            cx.env.end_hook(&a.action_id);
        }
    }

    fn force_stop<O>(&mut self, cx: &mut NodeCx<'_, '_, O>) {
        match self {
            ActionNode::ActionFunction(a) => cx.env.force_stop_hook(&a.action_id),
            ActionNode::Subtree(subtree) => {
                let runner = &mut subtree.runner;
                cx.env.nested(|env| runner.force_stop(env));
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        match self {
            ActionNode::Wait(wait) => wait.elapsed = 0.0,
            ActionNode::Subtree(subtree) => subtree.runner.discard_instance(),
            _ => {}
        }
    }
}
