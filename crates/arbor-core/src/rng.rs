//! Seeded random streams for weighted pools.
//!
//! Pools seeded per evaluator must replay the same draws on every platform, so
//! they run on SplitMix64 rather than an OS generator. Not cryptographic.

pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    /// Uniform in `[0, 1)` from the top 53 bits.
    fn next_f64_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream seeded from OS entropy; draws are not reproducible.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        finalize(self.state)
    }
}

/// SplitMix64 output function: a bijective avalanche over `u64`.
fn finalize(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed for the stream `stream` (usually a node id) owned by `owner_id`,
/// shifted by the engine-wide `global_seed`.
///
/// Same derivation as the cyntra `ai-core` kernel's per-agent seeds, so a
/// `(global, owner, stream)` triple yields the same stream in both.
pub fn derive_seed(global_seed: u64, owner_id: u64, stream: u64) -> u64 {
    finalize(global_seed ^ finalize(owner_id.wrapping_add(GOLDEN_GAMMA)) ^ finalize(stream))
}
