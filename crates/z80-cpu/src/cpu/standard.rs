//! Unprefixed instructions.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]

use z80_bus::IoBus;

use crate::alu;
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::observer::ObservedBus;
use crate::registers::{Reg8, Reg16};
use crate::tables;

use super::Z80;

impl Z80 {
    /// Execute an unprefixed opcode. Returns T-states beyond the 4-T fetch.
    ///
    /// `CB`, `DD`, `ED` and `FD` never arrive here; the step loop turns them
    /// into prefix state.
    pub(super) fn execute_standard<B: IoBus>(
        &mut self,
        bus: &mut ObservedBus<'_, B>,
        op: u8,
    ) -> u32 {
        match op {
            // NOP
            0x00 => 0,

            // LD rr, nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.read_imm16(bus);
                self.regs.set16(Reg16::from_pair_code(op >> 4), value);
                6
            }

            // LD (BC), A / LD (DE), A
            0x02 | 0x12 => {
                let address = if op == 0x02 { self.regs.bc } else { self.regs.de };
                let a = self.regs.a();
                bus.write(address, a);
                self.regs.wz = (u16::from(a) << 8) | (address.wrapping_add(1) & 0xFF);
                3
            }

            // INC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = Reg16::from_pair_code(op >> 4);
                self.regs.set16(rp, self.regs.get16(rp).wrapping_add(1));
                2
            }

            // DEC rr
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = Reg16::from_pair_code(op >> 4);
                self.regs.set16(rp, self.regs.get16(rp).wrapping_sub(1));
                2
            }

            // INC (HL)
            0x34 => {
                let address = self.regs.hl;
                let result = alu::inc8(bus.read(address));
                bus.write(address, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                7
            }

            // DEC (HL)
            0x35 => {
                let address = self.regs.hl;
                let result = alu::dec8(bus.read(address));
                bus.write(address, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                7
            }

            // INC r
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x3C => {
                let r = Reg8::from_code((op >> 3) & 7);
                let result = alu::inc8(self.regs.get8(r));
                self.regs.set8(r, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                0
            }

            // DEC r
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x3D => {
                let r = Reg8::from_code((op >> 3) & 7);
                let result = alu::dec8(self.regs.get8(r));
                self.regs.set8(r, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                0
            }

            // LD (HL), n
            0x36 => {
                let value = self.read_imm8(bus);
                bus.write(self.regs.hl, value);
                6
            }

            // LD r, n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                let value = self.read_imm8(bus);
                self.regs.set8(Reg8::from_code((op >> 3) & 7), value);
                3
            }

            // RLCA / RRCA / RLA / RRA
            0x07 | 0x0F | 0x17 | 0x1F => {
                let result = alu::rotate_accumulator(op >> 3, self.regs.a(), self.regs.f());
                self.regs.set_a(result.value);
                self.set_f(result.flags);
                0
            }

            // EX AF, AF'
            0x08 => {
                self.regs.exchange_af();
                0
            }

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let hl = self.regs.hl;
                let rr = self.regs.get16(Reg16::from_pair_code(op >> 4));
                self.regs.wz = hl.wrapping_add(1);
                let (result, flags) = alu::add16(hl, rr);
                self.regs.hl = result;
                self.set_f((self.regs.f() & (SF | ZF | PF)) | flags);
                7
            }

            // LD A, (BC) / LD A, (DE)
            0x0A | 0x1A => {
                let address = if op == 0x0A { self.regs.bc } else { self.regs.de };
                let value = bus.read(address);
                self.regs.set_a(value);
                self.regs.wz = address.wrapping_add(1);
                3
            }

            // DJNZ e
            0x10 => {
                let offset = self.read_imm8(bus) as i8;
                let b = self.regs.b().wrapping_sub(1);
                self.regs.set_b(b);
                if b == 0 {
                    4
                } else {
                    self.relative_jump(bus, offset);
                    9
                }
            }

            // JR e
            0x18 => {
                let offset = self.read_imm8(bus) as i8;
                self.relative_jump(bus, offset);
                8
            }

            // JR NZ/Z/NC/C, e
            0x20 | 0x28 | 0x30 | 0x38 => {
                let offset = self.read_imm8(bus) as i8;
                if self.condition((op >> 3) & 3) {
                    self.relative_jump(bus, offset);
                    8
                } else {
                    3
                }
            }

            // LD (nn), HL
            0x22 => {
                let address = self.read_imm16(bus);
                let hl = self.regs.hl;
                self.write16(bus, address, hl);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // LD HL, (nn)
            0x2A => {
                let address = self.read_imm16(bus);
                self.regs.hl = self.read16(bus, address);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // DAA
            0x27 => {
                let (a, f) = tables::daa(self.regs.a(), self.regs.f());
                self.regs.set_a(a);
                self.set_f(f);
                0
            }

            // CPL
            0x2F => {
                let a = !self.regs.a();
                self.regs.set_a(a);
                self.set_f((self.regs.f() & (SF | ZF | PF | CF)) | HF | NF | (a & (XF | YF)));
                0
            }

            // LD (nn), A
            0x32 => {
                let address = self.read_imm16(bus);
                let a = self.regs.a();
                bus.write(address, a);
                self.regs.wz = (u16::from(a) << 8) | (address.wrapping_add(1) & 0xFF);
                9
            }

            // LD A, (nn)
            0x3A => {
                let address = self.read_imm16(bus);
                let value = bus.read(address);
                self.regs.set_a(value);
                self.regs.wz = address.wrapping_add(1);
                9
            }

            // SCF
            0x37 => {
                let xy = self.carry_flag_xy();
                self.set_f((self.regs.f() & (SF | ZF | PF)) | xy | CF);
                0
            }

            // CCF: H takes the old carry
            0x3F => {
                let f = self.regs.f();
                let xy = self.carry_flag_xy();
                let h = if f & CF != 0 { HF } else { 0 };
                self.set_f((f & (SF | ZF | PF)) | xy | h | ((f & CF) ^ CF));
                0
            }

            // HALT
            0x76 => {
                self.halt();
                0
            }

            // LD (HL), r
            0x70..=0x77 => {
                let value = self.regs.get8(Reg8::from_code(op & 7));
                bus.write(self.regs.hl, value);
                3
            }

            // LD r, (HL)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
                let value = bus.read(self.regs.hl);
                self.regs.set8(Reg8::from_code((op >> 3) & 7), value);
                3
            }

            // LD r, r'
            0x40..=0x7F => {
                let value = self.regs.get8(Reg8::from_code(op & 7));
                self.regs.set8(Reg8::from_code((op >> 3) & 7), value);
                0
            }

            // ALU A, r / ALU A, (HL)
            0x80..=0xBF => {
                let code = op & 7;
                let value = self.read_operand(bus, code);
                self.alu_a(op >> 3, value);
                if code == 6 { 3 } else { 0 }
            }

            // RET cc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition(op >> 3) {
                    self.ret(bus);
                    7
                } else {
                    1
                }
            }

            // POP qq
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop16(bus);
                self.regs.set16(Reg16::from_stack_code((op >> 4) & 3), value);
                6
            }

            // JP cc, nn
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let address = self.read_imm16(bus);
                self.regs.wz = address;
                if self.condition(op >> 3) {
                    self.jump(bus, address);
                }
                6
            }

            // JP nn
            0xC3 => {
                let address = self.read_imm16(bus);
                self.regs.wz = address;
                self.jump(bus, address);
                6
            }

            // CALL cc, nn
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let address = self.read_imm16(bus);
                self.regs.wz = address;
                if self.condition(op >> 3) {
                    self.call(bus, address);
                    13
                } else {
                    6
                }
            }

            // PUSH qq
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.regs.get16(Reg16::from_stack_code((op >> 4) & 3));
                self.push16(bus, value);
                7
            }

            // ALU A, n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.read_imm8(bus);
                self.alu_a(op >> 3, value);
                3
            }

            // RST p
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = u16::from(op & 0x38);
                self.call(bus, target);
                self.regs.wz = target;
                7
            }

            // RET
            0xC9 => {
                self.ret(bus);
                6
            }

            // CALL nn
            0xCD => {
                let address = self.read_imm16(bus);
                self.regs.wz = address;
                self.call(bus, address);
                13
            }

            // OUT (n), A
            0xD3 => {
                let n = self.read_imm8(bus);
                let a = self.regs.a();
                bus.write_io(u16::from_le_bytes([n, a]), a);
                self.regs.wz = u16::from_le_bytes([n.wrapping_add(1), a]);
                7
            }

            // IN A, (n)
            0xDB => {
                let n = self.read_imm8(bus);
                let port = u16::from_le_bytes([n, self.regs.a()]);
                let value = bus.read_io(port);
                self.regs.set_a(value);
                self.regs.wz = port.wrapping_add(1);
                7
            }

            // EXX
            0xD9 => {
                self.regs.exchange_main();
                0
            }

            // EX (SP), HL
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read16(bus, sp);
                let hl = self.regs.hl;
                self.write16(bus, sp, hl);
                self.regs.hl = value;
                self.regs.wz = value;
                15
            }

            // JP (HL)
            0xE9 => {
                let target = self.regs.hl;
                self.jump(bus, target);
                0
            }

            // EX DE, HL
            0xEB => {
                core::mem::swap(&mut self.regs.de, &mut self.regs.hl);
                0
            }

            // DI
            0xF3 => {
                self.disable_interrupts();
                0
            }

            // LD SP, HL
            0xF9 => {
                self.regs.sp = self.regs.hl;
                2
            }

            // EI
            0xFB => {
                self.enable_interrupts();
                0
            }

            // Prefixes are consumed by the step loop.
            0xCB | 0xDD | 0xED | 0xFD => 0,
        }
    }

    /// One of `ADD ADC SUB SBC AND XOR OR CP` into A.
    pub(super) fn alu_a(&mut self, op: u8, value: u8) {
        let result = alu::accumulator(op, self.regs.a(), value, self.flag(CF));
        self.regs.set_a(result.value);
        self.set_f(result.flags);
    }

    /// PC-relative jump from the end of the instruction. Sets MEMPTR.
    pub(super) fn relative_jump<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, offset: i8) {
        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        self.regs.wz = target;
        self.jump(bus, target);
    }

    pub(super) fn call<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, address: u16) {
        let pc = self.regs.pc;
        self.push16(bus, pc);
        self.regs.pc = address;
    }

    pub(super) fn ret<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) {
        let address = self.pop16(bus);
        self.regs.pc = address;
        self.regs.wz = address;
    }
}
