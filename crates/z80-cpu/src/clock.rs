//! Running T-state counter.

use z80_bus::Ticks;

/// Accumulates the T-states reported by every step.
///
/// Only a hard reset brings it back to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    elapsed: Ticks,
}

impl Clock {
    #[must_use]
    pub const fn new() -> Self {
        Self { elapsed: Ticks::ZERO }
    }

    pub fn advance(&mut self, cycles: u32) {
        self.elapsed += cycles;
    }

    #[must_use]
    pub const fn now(&self) -> Ticks {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Ticks::ZERO;
    }
}
