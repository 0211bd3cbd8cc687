//! Host-side contract for the Z80 execution engine.
//!
//! The CPU reaches memory and I/O space only through the traits defined here.
//! Timing is counted in T-states and never wraps within a realistic run.

mod bus;
mod cpu;
mod observable;
mod simple_bus;
mod ticks;

pub use bus::{Bus, IoBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use simple_bus::SimpleBus;
pub use ticks::Ticks;
