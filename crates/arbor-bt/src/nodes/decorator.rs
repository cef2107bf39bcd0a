use arbor_core::{RunContext, Status};
use serde::{Deserialize, Serialize};

use crate::engine::{Behaviour, NodeCx};
use crate::property::FieldValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoratorNode {
    Condition(Condition),
    ConditionFunction(ConditionFunction),
    CallbackFunction(CallbackFunction),
    Weight(WeightDecorator),
    Inverse,
    AlwaysSucceed,
    AlwaysFail,
    RepeatInfinite,
    RepeatFixed(RepeatFixed),
    RepeatUntil(RepeatUntil),
}

/// Runs the child only while `enabled` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub enabled: bool,
}

/// Runs the child only while the predicate hook `condition_id` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFunction {
    pub condition_id: String,
}

/// Passes the child's result through and reports terminal results to the
/// result callbacks bound to `callback_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackFunction {
    pub callback_id: String,
}

/// Passes the child's result through; declares a draw weight to pool composites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightDecorator {
    pub weight: f32,
}

/// Repeats the child until it has succeeded `iterations` times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatFixed {
    pub iterations: i32,
    #[serde(skip)]
    completed: i32,
}

impl RepeatFixed {
    pub fn new(iterations: i32) -> Self {
        Self {
            iterations,
            completed: 0,
        }
    }

    /// Successful child completions in the current run.
    pub fn completed(&self) -> i32 {
        self.completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UntilCondition {
    /// Any terminal result.
    #[default]
    Complete,
    Succeed,
    Fail,
}

impl UntilCondition {
    pub fn is_met(self, status: Status) -> bool {
        match self {
            UntilCondition::Complete => status.is_terminal(),
            UntilCondition::Succeed => status == Status::Success,
            UntilCondition::Fail => status == Status::Failure,
        }
    }
}

/// Repeats the child until its result meets `until`, then succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatUntil {
    pub until: UntilCondition,
}

impl DecoratorNode {
    pub(crate) fn field(&self, name: &str) -> Option<FieldValue> {
        match (self, name) {
            (DecoratorNode::Condition(c), "enabled") => Some(FieldValue::Bool(c.enabled)),
            (DecoratorNode::ConditionFunction(c), "condition_id") => {
                Some(FieldValue::Text(c.condition_id.clone()))
            }
            (DecoratorNode::CallbackFunction(c), "callback_id") => {
                Some(FieldValue::Text(c.callback_id.clone()))
            }
            (DecoratorNode::Weight(w), "weight") => Some(FieldValue::Float(w.weight)),
            (DecoratorNode::RepeatFixed(r), "iterations") => Some(FieldValue::Int(r.iterations)),
            (DecoratorNode::RepeatUntil(r), "until") => Some(FieldValue::Until(r.until)),
            _ => None,
        }
    }

    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (self, name, value) {
            (DecoratorNode::Condition(c), "enabled", FieldValue::Bool(v)) => c.enabled = v,
            (DecoratorNode::ConditionFunction(c), "condition_id", FieldValue::Text(v)) => {
                c.condition_id = v
            }
            (DecoratorNode::CallbackFunction(c), "callback_id", FieldValue::Text(v)) => {
                c.callback_id = v
            }
            (DecoratorNode::Weight(w), "weight", FieldValue::Float(v)) => w.weight = v,
            (DecoratorNode::RepeatFixed(r), "iterations", FieldValue::Int(v)) => r.iterations = v,
            (DecoratorNode::RepeatUntil(r), "until", FieldValue::Until(v)) => r.until = v,
            _ => return false,
        }
        true
    }

    pub(crate) fn field_names(&self) -> &'static [&'static str] {
        match self {
            DecoratorNode::Condition(_) => &["enabled"],
            DecoratorNode::ConditionFunction(_) => &["condition_id"],
            DecoratorNode::CallbackFunction(_) => &["callback_id"],
            DecoratorNode::Weight(_) => &["weight"],
            DecoratorNode::RepeatFixed(_) => &["iterations"],
            DecoratorNode::RepeatUntil(_) => &["until"],
            _ => &[],
        }
    }
}

impl Behaviour for DecoratorNode {
    fn start<O>(&mut self, _cx: &mut NodeCx<'_, '_, O>) -> bool {
        if let DecoratorNode::RepeatFixed(repeat) = self {
            repeat.completed = 0;
        }
        true
    }

    fn evaluate<O>(&mut self, cx: &mut NodeCx<'_, '_, O>, ctx: &RunContext) -> Status {
        let Some(child) = cx.first_child() else {
            return Status::Failure;
        };

        match self {
            DecoratorNode::Condition(c) => {
                if !c.enabled {
                    return Status::Failure;
                }
                cx.run_child(child, ctx)
            }
            DecoratorNode::ConditionFunction(c) => {
                if !cx.env.check(&c.condition_id) {
                    return Status::Failure;
                }
                cx.run_child(child, ctx)
            }
            DecoratorNode::CallbackFunction(c) => {
                let status = cx.run_child(child, ctx);
                if let Some(outcome) = status.outcome() {
                    cx.env.notify_result(&c.callback_id, outcome);
                }
                status
            }
            DecoratorNode::Weight(_) => cx.run_child(child, ctx),
            DecoratorNode::Inverse => cx.run_child(child, ctx).invert(),
            DecoratorNode::AlwaysSucceed => match cx.run_child(child, ctx) {
                Status::Running => Status::Running,
                _ => Status::Success,
            },
            DecoratorNode::AlwaysFail => match cx.run_child(child, ctx) {
                Status::Running => Status::Running,
                _ => Status::Failure,
            },
            DecoratorNode::RepeatInfinite => match cx.run_child(child, ctx) {
                Status::Failure => Status::Failure,
                _ => Status::Running,
            },
            DecoratorNode::RepeatFixed(repeat) => match cx.run_child(child, ctx) {
                Status::Failure => Status::Failure,
                Status::Success => {
                    repeat.completed += 1;
                    if repeat.completed >= repeat.iterations {
                        Status::Success
                    } else {
                        Status::Running
                    }
                }
                Status::Running => Status::Running,
            },
            DecoratorNode::RepeatUntil(repeat) => {
                if repeat.until.is_met(cx.run_child(child, ctx)) {
                    Status::Success
                } else {
                    Status::Running
                }
            }
        }
    }

    fn reset(&mut self) {
        if let DecoratorNode::RepeatFixed(repeat) = self {
            repeat.completed = 0;
        }
    }
}
