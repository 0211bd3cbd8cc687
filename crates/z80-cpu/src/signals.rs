//! Reset, NMI and maskable interrupt bookkeeping.
//!
//! The controller only decides which signal wins a step. Servicing it
//! (pushing PC, picking the vector) needs the bus and lives on the CPU.

use std::fmt;

use crate::error::CpuError;

/// How a maskable interrupt resolves its service address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InterruptMode {
    /// The device supplies an instruction. Without one this behaves as IM 1.
    #[default]
    Im0,
    /// Restart at 0x0038.
    Im1,
    /// Vector through the table at `I:device byte`.
    Im2,
}

impl TryFrom<u8> for InterruptMode {
    type Error = CpuError;

    fn try_from(mode: u8) -> Result<Self, Self::Error> {
        match mode {
            0 => Ok(Self::Im0),
            1 => Ok(Self::Im1),
            2 => Ok(Self::Im2),
            _ => Err(CpuError::InvalidInterruptMode(mode)),
        }
    }
}

impl From<InterruptMode> for u8 {
    fn from(mode: InterruptMode) -> Self {
        match mode {
            InterruptMode::Im0 => 0,
            InterruptMode::Im1 => 1,
            InterruptMode::Im2 => 2,
        }
    }
}

impl fmt::Display for InterruptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IM {}", u8::from(*self))
    }
}

/// The signal chosen to preempt a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Reset,
    Nmi,
    Int,
}

/// Pending requests, enable flip-flops and the interrupt mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalController {
    reset_pending: bool,
    nmi_line: bool,
    nmi_pending: bool,
    int_line: bool,
    pub iff1: bool,
    pub iff2: bool,
    pub mode: InterruptMode,
    /// Set for the step after a prefix byte or `EI`.
    pub blocked: bool,
}

impl SignalController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reset_line(&mut self, asserted: bool) {
        if asserted {
            self.reset_pending = true;
        }
    }

    /// NMI latches on the rising edge. Holding the line does not retrigger.
    pub fn set_nmi_line(&mut self, asserted: bool) {
        if asserted && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = asserted;
    }

    pub fn set_int_line(&mut self, asserted: bool) {
        self.int_line = asserted;
    }

    #[must_use]
    pub fn int_line(&self) -> bool {
        self.int_line
    }

    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Restore a latched NMI without producing a line edge.
    pub fn set_nmi_pending(&mut self, pending: bool) {
        self.nmi_pending = pending;
    }

    pub fn set_reset_pending(&mut self, pending: bool) {
        self.reset_pending = pending;
    }

    /// Pick the signal to service this step, in priority order.
    ///
    /// The blocked latch is consumed here whatever the outcome. Reset and NMI
    /// requests are consumed when returned; the INT line is a level and stays
    /// asserted.
    pub fn poll(&mut self) -> Option<Signal> {
        let blocked = std::mem::take(&mut self.blocked);

        if self.reset_pending {
            self.reset_pending = false;
            Some(Signal::Reset)
        } else if self.nmi_pending {
            self.nmi_pending = false;
            Some(Signal::Nmi)
        } else if self.int_line && self.iff1 && !blocked {
            Some(Signal::Int)
        } else {
            None
        }
    }

    /// Clear the state a hard reset defines. Line levels are left to the
    /// host, but latched requests are dropped.
    pub fn reset(&mut self) {
        self.reset_pending = false;
        self.nmi_pending = false;
        self.iff1 = false;
        self.iff2 = false;
        self.mode = InterruptMode::Im0;
        self.blocked = false;
    }
}
