use crate::state::{MAX_CATCH_UP_TICKS, TICK_MS};

/// Converts elapsed wall-clock time into logical ticks.
///
/// Leftover milliseconds carry into the next frame; a long stall yields at
/// most [`MAX_CATCH_UP_TICKS`] ticks and the excess whole ticks are dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    accumulator_ms: u32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, elapsed_ms: u32) -> u32 {
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        let ticks = self.accumulator_ms / TICK_MS;
        self.accumulator_ms %= TICK_MS;
        ticks.min(MAX_CATCH_UP_TICKS)
    }

    pub fn pending_ms(&self) -> u32 {
        self.accumulator_ms
    }
}
