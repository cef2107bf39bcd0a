use core::fmt::Debug;

/// Stable identity of whoever drives a tree instance.
///
/// `stable_id` seeds per-evaluator random streams, so it must not change
/// between runs of the same owner.
pub trait OwnerId: Copy + Eq + Debug {
    fn stable_id(self) -> u64;
}

impl OwnerId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl OwnerId for u32 {
    fn stable_id(self) -> u64 {
        self as u64
    }
}

impl OwnerId for usize {
    fn stable_id(self) -> u64 {
        self as u64
    }
}
