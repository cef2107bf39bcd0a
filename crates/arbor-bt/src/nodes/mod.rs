//! Built-in node catalog.

mod action;
mod composite;
mod decorator;

pub use action::{ActionFunction, ActionNode, Subtree, Wait, DEFAULT_WAIT_SECONDS};
pub use composite::{CompositeNode, Parallel, Selector, Sequence, WeightedPool};
pub use decorator::{
    CallbackFunction, Condition, ConditionFunction, DecoratorNode, RepeatFixed, RepeatUntil,
    UntilCondition, WeightDecorator,
};
