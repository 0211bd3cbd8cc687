//! Notification hooks for debuggers and tracers.
//!
//! Observers see state but cannot change it. A CPU with no observer runs
//! exactly like one with an observer attached.

use z80_bus::{IoBus, Ticks};

use crate::registers::Registers;
use crate::signals::InterruptMode;

/// Which decode table an opcode byte was looked up in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrefixMode {
    #[default]
    None,
    /// After `ED`.
    Extended,
    /// After `CB`.
    Bit,
}

/// Which index register replaces HL for the current instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexMode {
    #[default]
    None,
    /// After `DD`.
    Ix,
    /// After `FD`.
    Iy,
}

/// A decoded instruction about to run, or just completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Address of the instruction's first byte, prefixes included.
    pub address: u16,
    pub prefix: PrefixMode,
    pub index: IndexMode,
    /// The byte that selected the handler. For `DD CB d op` this is `op`.
    pub opcode: u8,
}

/// `JP`, `JR` or `DJNZ` moving PC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchEvent {
    /// Address of the jump instruction.
    pub source: u16,
    pub target: u16,
}

/// SP loaded or adjusted by something other than a push or pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPointerEvent {
    pub source: u16,
    pub old: u16,
    pub new: u16,
}

/// A word pushed or popped.
///
/// `source` is the instruction doing it, or the return address when an
/// interrupt pushes PC. `sp` is the address of the word on the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackEvent {
    pub source: u16,
    pub sp: u16,
    pub value: u16,
}

/// Receives notifications from the CPU. Every method defaults to a no-op.
pub trait Observer {
    /// Called at the start of every step, before signals are checked.
    fn step_starting(&mut self, _registers: &Registers, _clock: Ticks) {}

    /// Called after an opcode byte (prefix or not) is fetched.
    fn opcode_fetched(&mut self, _address: u16, _opcode: u8) {}

    /// Called just before a handler runs.
    fn operation_executing(&mut self, _operation: &Operation) {}

    /// Called once the handler has finished, with the resulting registers.
    fn operation_executed(&mut self, _operation: &Operation, _registers: &Registers) {}

    /// A maskable interrupt is being acknowledged. PC is still the return
    /// address.
    fn interrupt_executing(&mut self, _mode: InterruptMode) {}

    fn nmi_executing(&mut self) {}

    /// Data read from memory. Opcode fetches are reported through
    /// `opcode_fetched` instead.
    fn memory_read(&mut self, _address: u16, _value: u8) {}

    fn memory_written(&mut self, _address: u16, _value: u8) {}

    fn port_read(&mut self, _port: u16, _value: u8) {}

    fn port_written(&mut self, _port: u16, _value: u8) {}

    fn branch_taken(&mut self, _event: &BranchEvent) {}

    fn stack_pointer_changed(&mut self, _event: &StackPointerEvent) {}

    fn stack_pushed(&mut self, _event: &StackEvent) {}

    fn stack_popped(&mut self, _event: &StackEvent) {}
}

/// The host bus for the duration of one step, paired with the observer.
///
/// Every data access goes through here so the observer sees it.
pub(crate) struct ObservedBus<'a, B> {
    bus: &'a mut B,
    observer: Option<&'a mut (dyn Observer + 'static)>,
}

impl<'a, B: IoBus> ObservedBus<'a, B> {
    pub(crate) fn new(bus: &'a mut B, observer: Option<&'a mut (dyn Observer + 'static)>) -> Self {
        Self { bus, observer }
    }

    pub(crate) fn notify(&mut self, event: impl FnOnce(&mut (dyn Observer + 'static))) {
        if let Some(observer) = self.observer.as_deref_mut() {
            event(observer);
        }
    }

    /// M1 read.
    pub(crate) fn fetch(&mut self, address: u16) -> u8 {
        let opcode = self.bus.read(address);
        self.notify(|observer| observer.opcode_fetched(address, opcode));
        opcode
    }

    pub(crate) fn read(&mut self, address: u16) -> u8 {
        let value = self.bus.read(address);
        self.notify(|observer| observer.memory_read(address, value));
        value
    }

    pub(crate) fn write(&mut self, address: u16, value: u8) {
        self.bus.write(address, value);
        self.notify(|observer| observer.memory_written(address, value));
    }

    pub(crate) fn read_io(&mut self, port: u16) -> u8 {
        let value = self.bus.read_io(port);
        self.notify(|observer| observer.port_read(port, value));
        value
    }

    pub(crate) fn write_io(&mut self, port: u16, value: u8) {
        self.bus.write_io(port, value);
        self.notify(|observer| observer.port_written(port, value));
    }

    pub(crate) fn interrupt_vector(&mut self) -> Option<u8> {
        self.bus.interrupt_vector()
    }
}
