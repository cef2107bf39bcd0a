/// Per-tick input handed to every node evaluation.
///
/// Drivers build a fresh value each tick; nodes only read it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl RunContext {
    pub fn new(dt_seconds: f32) -> Self {
        Self {
            tick: 0,
            dt_seconds,
        }
    }

    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = tick;
        self
    }
}
