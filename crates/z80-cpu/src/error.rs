//! Errors for host-facing conversions.
//!
//! Stepping the CPU never fails. These only arise when a host hands the
//! engine a raw value it cannot map, such as a restored snapshot or a
//! debugger command.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("interrupt mode {0} does not exist (expected 0, 1 or 2)")]
    InvalidInterruptMode(u8),

    #[error("unknown register name `{0}`")]
    UnknownRegister(String),
}
