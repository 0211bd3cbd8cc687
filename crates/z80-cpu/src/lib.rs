//! Instruction-stepped Zilog Z80 execution engine.
//!
//! Each call to `step()` consumes exactly one opcode byte and reports the
//! T-states it took. Multi-byte opcodes span several steps; an interrupt can
//! never split one.

mod alu;
mod clock;
mod config;
mod cpu;
mod error;
mod flags;
mod observer;
mod registers;
mod signals;
mod tables;

pub use clock::Clock;
pub use config::{Config, Variant};
pub use cpu::Z80;
pub use error::CpuError;
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use observer::{
    BranchEvent, IndexMode, Observer, Operation, PrefixMode, StackEvent, StackPointerEvent,
};
pub use registers::{Reg8, Reg16, Registers};
pub use signals::InterruptMode;
pub use z80_bus::{Bus, Cpu, IoBus, Observable, SimpleBus, Ticks, Value};
