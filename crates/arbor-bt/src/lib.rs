//! Behaviour tree store and runtime built on `arbor-core`.
//!
//! A [`Tree`] is an editable arena of [`Node`]s. Blueprints are shared as
//! [`TreeHandle`]s; each [`Evaluator`] runs a private instance through a
//! [`TreeRunner`], which rebuilds the instance whenever the blueprint's
//! [`Version`] changes.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod clipboard;
pub mod config;
pub mod engine;
pub mod evaluator;
pub mod layout;
pub mod naming;
pub mod node;
pub mod nodes;
pub mod property;
pub mod registry;
pub mod runner;
pub mod tree;

pub use clipboard::Clipboard;
pub use config::EngineConfig;
pub use engine::Env;
pub use evaluator::Evaluator;
pub use layout::{LayoutError, TreeLayout};
pub use naming::unique_name;
pub use node::{Category, Node, NodeKind};
pub use nodes::UntilCondition;
pub use property::{FieldInfo, FieldType, FieldValue, Property, PropertyError, PropertyValue};
pub use registry::NodeRegistry;
pub use runner::{share, TreeHandle, TreeRunner};
pub use tree::{NodeId, Tree, Version};
