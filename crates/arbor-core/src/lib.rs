//! Kernel primitives for the arbor behaviour tree engine.
//!
//! Nothing here knows about tree structure: this crate holds the result types,
//! the per-tick context, seeding, weighted sampling and the registry that maps
//! string ids to host-supplied behaviour.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod context;
pub mod hooks;
pub mod owner;
pub mod rng;
pub mod status;
pub mod weighted;

pub use context::RunContext;
pub use hooks::{Handler, HookKind, HookProvider, HookRegistry};
pub use owner::OwnerId;
pub use rng::{derive_seed, DeterministicRng, SplitMix64};
pub use status::{NodeState, Outcome, Status};
pub use weighted::{sanitize_weight, SeedMode, WeightedSelector, DEFAULT_WEIGHT};
