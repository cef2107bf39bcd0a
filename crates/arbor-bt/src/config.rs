//! Engine configuration

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Mixed into every per-evaluator random stream
    pub global_seed: u64,
    /// Emit node start/end/force-stop trace events
    pub trace_nodes: bool,
    /// Maximum nesting of subtree instances
    pub max_subtree_depth: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_seed: 0,
            trace_nodes: false,
            max_subtree_depth: 16,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(source: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(source).context("parse engine config")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        Self::from_yaml_str(&source).with_context(|| format!("load {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = EngineConfig::from_yaml_str("global_seed: 42\n").unwrap();
        assert_eq!(config.global_seed, 42);
        assert!(!config.trace_nodes);
        assert_eq!(config.max_subtree_depth, 16);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(EngineConfig::from_yaml_str("global_seed: [").is_err());
    }
}
