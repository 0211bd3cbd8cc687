//! CPU core trait.

use crate::{IoBus, Ticks};

/// A CPU core driven one step at a time by its host.
///
/// The bus is passed in on every step rather than owned, so the host can
/// swap or inspect it between steps but never in the middle of one.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Run one step and return the T-states it consumed.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Total T-states elapsed since the last hard reset.
    fn clock(&self) -> Ticks;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Drive the maskable interrupt line.
    fn set_int_line(&mut self, asserted: bool);

    /// Drive the non-maskable interrupt line.
    fn set_nmi_line(&mut self, asserted: bool);

    /// Drive the reset line.
    fn set_reset_line(&mut self, asserted: bool);

    /// Hard reset without going through the reset line.
    fn reset(&mut self);
}
