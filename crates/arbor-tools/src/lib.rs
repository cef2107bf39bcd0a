//! Tracing primitives for the arbor behaviour tree engine.
//!
//! Events are plain data so they can be recorded during a tick and rendered
//! later by debuggers or inspectors.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{tags, NullTraceSink, SharedTraceLog, TraceEvent, TraceLog, TraceSink, VecTraceSink};
