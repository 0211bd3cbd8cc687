//! DD CB d op / FD CB d op.
//!
//! Every slot addresses `(IX+d)`. Outside the BIT group, a register field
//! other than 6 also receives a copy of the result. H and L here are the
//! real registers.

use z80_bus::IoBus;

use crate::alu;
use crate::flags::CF;
use crate::observer::ObservedBus;
use crate::registers::Reg8;

use super::Z80;

impl Z80 {
    /// Execute the final byte of an indexed bit instruction on `address`
    /// (already in MEMPTR). Returns the T-states of the memory access cycles.
    pub(super) fn execute_indexed_bit<B: IoBus>(
        &mut self,
        bus: &mut ObservedBus<'_, B>,
        op: u8,
        address: u16,
    ) -> u32 {
        let y = (op >> 3) & 7;
        let code = op & 7;
        let value = bus.read(address);

        let result = match op >> 6 {
            // BIT y, (IX+d): X/Y from the address high byte, no write
            1 => {
                self.set_f(alu::bit(y, value, (address >> 8) as u8, self.regs.f()));
                return 4;
            }
            0 => {
                let result = alu::shift(y, value, self.flag(CF));
                self.set_f(result.flags);
                result.value
            }
            2 => value & !(1 << y),
            _ => value | (1 << y),
        };

        bus.write(address, result);
        if code != 6 {
            self.regs.set8(Reg8::from_code(code), result);
        }
        7
    }
}
