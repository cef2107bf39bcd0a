#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of evaluating a node for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    Running,
    Success,
    Failure,
}

/// Terminal result of a node run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Outcome {
    Success,
    Failure,
}

impl From<Outcome> for Status {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Success => Status::Success,
            Outcome::Failure => Status::Failure,
        }
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

impl Status {
    pub fn outcome(self) -> Option<Outcome> {
        match self {
            Status::Running => None,
            Status::Success => Some(Outcome::Success),
            Status::Failure => Some(Outcome::Failure),
        }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_running()
    }

    /// Swaps `Success` and `Failure`; `Running` passes through.
    pub fn invert(self) -> Self {
        match self {
            Status::Running => Status::Running,
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
        }
    }

    /// Small stable code used in trace payloads.
    pub fn code(self) -> u64 {
        match self {
            Status::Running => 0,
            Status::Success => 1,
            Status::Failure => 2,
        }
    }
}

/// Cached per-node display state, read by debugging tools.
///
/// `Idle` means the node has not produced a result since its parent last started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeState {
    #[default]
    Idle,
    Running,
    Success,
    Failure,
}

impl From<Status> for NodeState {
    fn from(value: Status) -> Self {
        match value {
            Status::Running => NodeState::Running,
            Status::Success => NodeState::Success,
            Status::Failure => NodeState::Failure,
        }
    }
}
