//! Memory and I/O bus interface.

/// Memory bus interface.
///
/// The CPU reads opcodes, operands and data through this trait. The host
/// handles address decoding, paging and any memory-mapped devices.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// A bus that also supports the separate Z80 I/O port space.
///
/// `IN` and `OUT` place a full 16-bit address on the bus: the low byte is the
/// port number and the high byte comes from `A` or `B` depending on the form.
pub trait IoBus: Bus {
    /// Read a byte from the given I/O port.
    fn read_io(&mut self, port: u16) -> u8;

    /// Write a byte to the given I/O port.
    fn write_io(&mut self, port: u16, value: u8);

    /// Byte placed on the data bus by the interrupting device during a
    /// maskable interrupt acknowledge.
    ///
    /// `None` means no device drives the bus. The CPU then treats IM 0 like
    /// IM 1 and uses a low byte of 0x00 for the IM 2 table pointer.
    fn interrupt_vector(&mut self) -> Option<u8> {
        None
    }
}
