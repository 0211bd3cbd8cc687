//! ED-prefixed instructions.
//!
//! Slots 0x40-0x7F and the block group at 0xA0-0xBB are populated. Every
//! other slot behaves as an 8-T no-operation, which is what the silicon does.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]

use z80_bus::IoBus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, flag_if, parity, sz53, sz53p};
use crate::observer::ObservedBus;
use crate::registers::{Reg8, Reg16};
use crate::signals::InterruptMode;

use super::Z80;

/// Direction of a block instruction's HL/DE walk.
#[derive(Clone, Copy)]
enum Step {
    Up,
    Down,
}

impl Step {
    fn from_opcode(op: u8) -> Self {
        if op & 0x08 == 0 { Self::Up } else { Self::Down }
    }

    fn apply(self, value: u16) -> u16 {
        match self {
            Self::Up => value.wrapping_add(1),
            Self::Down => value.wrapping_sub(1),
        }
    }
}

impl Z80 {
    /// Execute an ED-prefixed opcode. Returns T-states beyond the 4-T fetch.
    pub(super) fn execute_extended<B: IoBus>(
        &mut self,
        bus: &mut ObservedBus<'_, B>,
        op: u8,
    ) -> u32 {
        match op {
            // IN F, (C): flags only
            0x70 => {
                self.input_c(bus);
                4
            }

            // IN r, (C)
            0x40 | 0x48 | 0x50 | 0x58 | 0x60 | 0x68 | 0x78 => {
                let value = self.input_c(bus);
                self.regs.set8(Reg8::from_code((op >> 3) & 7), value);
                4
            }

            // OUT (C), 0
            0x71 => {
                let value = self.config.out_zero_value();
                self.output_c(bus, value);
                4
            }

            // OUT (C), r
            0x41 | 0x49 | 0x51 | 0x59 | 0x61 | 0x69 | 0x79 => {
                let value = self.regs.get8(Reg8::from_code((op >> 3) & 7));
                self.output_c(bus, value);
                4
            }

            // SBC HL, rr
            0x42 | 0x52 | 0x62 | 0x72 => {
                let hl = self.regs.hl;
                let rr = self.regs.get16(Reg16::from_pair_code((op >> 4) & 3));
                let (result, flags) = alu::sbc16(hl, rr, self.flag(CF));
                self.regs.wz = hl.wrapping_add(1);
                self.regs.hl = result;
                self.set_f(flags);
                7
            }

            // ADC HL, rr
            0x4A | 0x5A | 0x6A | 0x7A => {
                let hl = self.regs.hl;
                let rr = self.regs.get16(Reg16::from_pair_code((op >> 4) & 3));
                let (result, flags) = alu::adc16(hl, rr, self.flag(CF));
                self.regs.wz = hl.wrapping_add(1);
                self.regs.hl = result;
                self.set_f(flags);
                7
            }

            // LD (nn), rr (ED 63 duplicates LD (nn), HL)
            0x43 | 0x53 | 0x63 | 0x73 => {
                let address = self.read_imm16(bus);
                let value = self.regs.get16(Reg16::from_pair_code((op >> 4) & 3));
                self.write16(bus, address, value);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // LD rr, (nn)
            0x4B | 0x5B | 0x6B | 0x7B => {
                let address = self.read_imm16(bus);
                let value = self.read16(bus, address);
                self.regs.set16(Reg16::from_pair_code((op >> 4) & 3), value);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // NEG and its mirrors
            0x44 | 0x4C | 0x54 | 0x5C | 0x64 | 0x6C | 0x74 | 0x7C => {
                let result = alu::neg8(self.regs.a());
                self.regs.set_a(result.value);
                self.set_f(result.flags);
                0
            }

            // RETN, RETI and mirrors: all copy IFF2 into IFF1
            0x45 | 0x4D | 0x55 | 0x5D | 0x65 | 0x6D | 0x75 | 0x7D => {
                self.return_from_interrupt(bus);
                6
            }

            // IM 0/1/2 and mirrors
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x76 | 0x7E => {
                let mode = match (op >> 3) & 3 {
                    0 | 1 => InterruptMode::Im0,
                    2 => InterruptMode::Im1,
                    _ => InterruptMode::Im2,
                };
                self.set_interrupt_mode(mode);
                0
            }

            // LD I, A
            0x47 => {
                let a = self.regs.a();
                self.regs.set_i(a);
                1
            }

            // LD R, A
            0x4F => {
                let a = self.regs.a();
                self.regs.set_r(a);
                1
            }

            // LD A, I
            0x57 => {
                let i = self.regs.i();
                self.regs.set_a(i);
                self.set_f(self.load_ir_flags(i));
                1
            }

            // LD A, R
            0x5F => {
                let r = self.regs.r();
                self.regs.set_a(r);
                self.set_f(self.load_ir_flags(r));
                1
            }

            // RRD
            0x67 => {
                let hl = self.regs.hl;
                let memory = bus.read(hl);
                let a = self.regs.a();
                bus.write(hl, (a << 4) | (memory >> 4));
                let a = (a & 0xF0) | (memory & 0x0F);
                self.finish_digit_rotate(a);
                10
            }

            // RLD
            0x6F => {
                let hl = self.regs.hl;
                let memory = bus.read(hl);
                let a = self.regs.a();
                bus.write(hl, (memory << 4) | (a & 0x0F));
                let a = (a & 0xF0) | (memory >> 4);
                self.finish_digit_rotate(a);
                10
            }

            // LDI / LDD / LDIR / LDDR
            0xA0 | 0xA8 | 0xB0 | 0xB8 => self.block_load(bus, op),

            // CPI / CPD / CPIR / CPDR
            0xA1 | 0xA9 | 0xB1 | 0xB9 => self.block_compare(bus, op),

            // INI / IND / INIR / INDR
            0xA2 | 0xAA | 0xB2 | 0xBA => self.block_input(bus, op),

            // OUTI / OUTD / OTIR / OTDR
            0xA3 | 0xAB | 0xB3 | 0xBB => self.block_output(bus, op),

            // Undefined: two-fetch NOP
            _ => 0,
        }
    }

    /// `IN r,(C)` core: reads port BC and sets flags from the value.
    fn input_c<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u8 {
        let port = self.regs.bc;
        let value = bus.read_io(port);
        self.regs.wz = port.wrapping_add(1);
        self.set_f((self.regs.f() & CF) | sz53p(value));
        value
    }

    fn output_c<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, value: u8) {
        let port = self.regs.bc;
        bus.write_io(port, value);
        self.regs.wz = port.wrapping_add(1);
    }

    fn finish_digit_rotate(&mut self, a: u8) {
        self.regs.set_a(a);
        self.regs.wz = self.regs.hl.wrapping_add(1);
        self.set_f((self.regs.f() & CF) | sz53p(a));
    }

    /// Rewind PC onto the `ED` byte so the instruction runs again.
    ///
    /// X and Y then come from the high byte of the rewound PC.
    fn repeat_block(&mut self) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(2);
        self.regs.wz = self.regs.pc.wrapping_add(1);
        (self.regs.pc >> 8) as u8 & (YF | XF)
    }

    fn block_load<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, op: u8) -> u32 {
        let step = Step::from_opcode(op);
        let value = bus.read(self.regs.hl);
        bus.write(self.regs.de, value);
        self.regs.hl = step.apply(self.regs.hl);
        self.regs.de = step.apply(self.regs.de);
        self.regs.bc = self.regs.bc.wrapping_sub(1);

        // X is bit 3 and Y is bit 1 of value + A
        let n = value.wrapping_add(self.regs.a());
        let mut flags = (self.regs.f() & (SF | ZF | CF))
            | flag_if(self.regs.bc != 0, PF)
            | (n & XF)
            | ((n & 0x02) << 4);

        let repeating = op & 0x10 != 0;
        if repeating && self.regs.bc != 0 {
            flags = (flags & !(YF | XF)) | self.repeat_block();
            self.set_f(flags);
            13
        } else {
            self.set_f(flags);
            8
        }
    }

    fn block_compare<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, op: u8) -> u32 {
        let step = Step::from_opcode(op);
        let value = bus.read(self.regs.hl);
        let a = self.regs.a();
        let result = a.wrapping_sub(value);
        let half = (a & 0x0F) < (value & 0x0F);

        self.regs.hl = step.apply(self.regs.hl);
        self.regs.wz = step.apply(self.regs.wz);
        self.regs.bc = self.regs.bc.wrapping_sub(1);

        let n = result.wrapping_sub(u8::from(half));
        let mut flags = (self.regs.f() & CF)
            | NF
            | (sz53(result) & (SF | ZF))
            | flag_if(half, HF)
            | flag_if(self.regs.bc != 0, PF)
            | (n & XF)
            | ((n & 0x02) << 4);

        let repeating = op & 0x10 != 0;
        if repeating && self.regs.bc != 0 && result != 0 {
            flags = (flags & !(YF | XF)) | self.repeat_block();
            self.set_f(flags);
            13
        } else {
            self.set_f(flags);
            8
        }
    }

    fn block_input<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, op: u8) -> u32 {
        let step = Step::from_opcode(op);
        let port = self.regs.bc;
        let value = bus.read_io(port);
        self.regs.wz = step.apply(port);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        bus.write(self.regs.hl, value);
        self.regs.hl = step.apply(self.regs.hl);

        let c = step.apply(u16::from(self.regs.c())) as u8;
        let k = u16::from(value) + u16::from(c);
        self.finish_block_io(op, value, k)
    }

    fn block_output<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, op: u8) -> u32 {
        let step = Step::from_opcode(op);
        let value = bus.read(self.regs.hl);
        let b = self.regs.b().wrapping_sub(1);
        self.regs.set_b(b);
        let port = self.regs.bc;
        self.regs.wz = step.apply(port);
        bus.write_io(port, value);
        self.regs.hl = step.apply(self.regs.hl);

        let k = u16::from(value) + u16::from(self.regs.l());
        self.finish_block_io(op, value, k)
    }

    /// Shared flag logic for INI/IND/OUTI/OUTD and their repeating forms.
    ///
    /// `k` is the transferred byte plus the adjusted C (input) or the new
    /// L (output).
    fn finish_block_io(&mut self, op: u8, value: u8, k: u16) -> u32 {
        let b = self.regs.b();
        let carry = k > 0xFF;
        let mut flags = sz53(b)
            | flag_if(value & 0x80 != 0, NF)
            | flag_if(carry, HF | CF)
            | flag_if(parity(((k as u8) & 7) ^ b), PF);

        let repeating = op & 0x10 != 0;
        if !(repeating && b != 0) {
            self.set_f(flags);
            return 8;
        }

        flags = (flags & !(YF | XF)) | self.repeat_block();
        if carry {
            flags &= !HF;
            let adjusted = if value & 0x80 != 0 {
                if b & 0x0F == 0x00 {
                    flags |= HF;
                }
                b.wrapping_sub(1)
            } else {
                if b & 0x0F == 0x0F {
                    flags |= HF;
                }
                b.wrapping_add(1)
            };
            if !parity(adjusted & 7) {
                flags ^= PF;
            }
        } else if !parity(b & 7) {
            flags ^= PF;
        }
        self.set_f(flags);
        13
    }
}
