//! DD- and FD-prefixed instructions.
//!
//! The prefix swaps HL for IX or IY. Opcodes that never touch HL, H or L
//! run exactly as unprefixed, with the prefix's 4 T already paid.

#![allow(clippy::too_many_lines)]
#![allow(clippy::match_same_arms)]

use z80_bus::IoBus;

use crate::alu;
use crate::flags::{CF, PF, SF, ZF};
use crate::observer::ObservedBus;
use crate::registers::{Reg8, Reg16};

use super::Z80;

impl Z80 {
    /// Execute an opcode under an index prefix. Returns T-states beyond the
    /// 4-T fetch of this byte.
    pub(super) fn execute_indexed<B: IoBus>(
        &mut self,
        bus: &mut ObservedBus<'_, B>,
        op: u8,
    ) -> u32 {
        match op {
            // ADD IX, rr (rr = BC, DE, IX, SP)
            0x09 | 0x19 | 0x29 | 0x39 => {
                let index = self.index_value();
                let rr = match (op >> 4) & 3 {
                    2 => index,
                    code => self.regs.get16(Reg16::from_pair_code(code)),
                };
                self.regs.wz = index.wrapping_add(1);
                let (result, flags) = alu::add16(index, rr);
                self.set_index_value(result);
                self.set_f((self.regs.f() & (SF | ZF | PF)) | flags);
                7
            }

            // LD IX, nn
            0x21 => {
                let value = self.read_imm16(bus);
                self.set_index_value(value);
                6
            }

            // LD (nn), IX
            0x22 => {
                let address = self.read_imm16(bus);
                let value = self.index_value();
                self.write16(bus, address, value);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // INC IX
            0x23 => {
                self.set_index_value(self.index_value().wrapping_add(1));
                2
            }

            // LD IX, (nn)
            0x2A => {
                let address = self.read_imm16(bus);
                let value = self.read16(bus, address);
                self.set_index_value(value);
                self.regs.wz = address.wrapping_add(1);
                12
            }

            // DEC IX
            0x2B => {
                self.set_index_value(self.index_value().wrapping_sub(1));
                2
            }

            // INC IXH / INC IXL
            0x24 | 0x2C => {
                let r = self.index_reg8((op >> 3) & 7);
                let result = alu::inc8(self.regs.get8(r));
                self.regs.set8(r, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                0
            }

            // DEC IXH / DEC IXL
            0x25 | 0x2D => {
                let r = self.index_reg8((op >> 3) & 7);
                let result = alu::dec8(self.regs.get8(r));
                self.regs.set8(r, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                0
            }

            // LD IXH, n / LD IXL, n
            0x26 | 0x2E => {
                let value = self.read_imm8(bus);
                self.regs.set8(self.index_reg8((op >> 3) & 7), value);
                3
            }

            // INC (IX+d)
            0x34 => {
                let address = self.indexed_address(bus);
                let result = alu::inc8(bus.read(address));
                bus.write(address, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                15
            }

            // DEC (IX+d)
            0x35 => {
                let address = self.indexed_address(bus);
                let result = alu::dec8(bus.read(address));
                bus.write(address, result.value);
                self.set_f((self.regs.f() & CF) | result.flags);
                15
            }

            // LD (IX+d), n: n is read during the address computation
            0x36 => {
                let address = self.indexed_address(bus);
                let value = self.read_imm8(bus);
                bus.write(address, value);
                11
            }

            // HALT is unaffected
            0x76 => {
                self.halt();
                0
            }

            // LD (IX+d), r: r is the real register, H and L included
            0x70..=0x77 => {
                let address = self.indexed_address(bus);
                let value = self.regs.get8(Reg8::from_code(op & 7));
                bus.write(address, value);
                11
            }

            // LD r, (IX+d)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
                let address = self.indexed_address(bus);
                let value = bus.read(address);
                self.regs.set8(Reg8::from_code((op >> 3) & 7), value);
                11
            }

            // LD r, r' with H/L replaced by IXH/IXL
            0x40..=0x7F => {
                let value = self.regs.get8(self.index_reg8(op & 7));
                self.regs.set8(self.index_reg8((op >> 3) & 7), value);
                0
            }

            // ALU A, (IX+d)
            0x86 | 0x8E | 0x96 | 0x9E | 0xA6 | 0xAE | 0xB6 | 0xBE => {
                let address = self.indexed_address(bus);
                let value = bus.read(address);
                self.alu_a(op >> 3, value);
                11
            }

            // ALU A, r with H/L replaced by IXH/IXL
            0x80..=0xBF => {
                let value = self.regs.get8(self.index_reg8(op & 7));
                self.alu_a(op >> 3, value);
                0
            }

            // POP IX
            0xE1 => {
                let value = self.pop16(bus);
                self.set_index_value(value);
                6
            }

            // EX (SP), IX
            0xE3 => {
                let sp = self.regs.sp;
                let value = self.read16(bus, sp);
                let index = self.index_value();
                self.write16(bus, sp, index);
                self.set_index_value(value);
                self.regs.wz = value;
                15
            }

            // PUSH IX
            0xE5 => {
                let value = self.index_value();
                self.push16(bus, value);
                7
            }

            // JP (IX)
            0xE9 => {
                let target = self.index_value();
                self.jump(bus, target);
                0
            }

            // LD SP, IX
            0xF9 => {
                self.regs.sp = self.index_value();
                2
            }

            // Everything else ignores the prefix, EX DE,HL and EXX included
            _ => self.execute_standard(bus, op),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Z80;
    use crate::flags::{CF, HF, NF, PF, SF, ZF};
    use z80_bus::SimpleBus;

    fn run(program: &[u8], setup: impl FnOnce(&mut Z80, &mut SimpleBus)) -> (Z80, SimpleBus, u32) {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0, program);
        setup(&mut cpu, &mut bus);
        let cycles = cpu.run_instruction(&mut bus);
        (cpu, bus, cycles)
    }

    #[test]
    fn ld_ix_nn() {
        let (cpu, _, cycles) = run(&[0xDD, 0x21, 0x01, 0x11], |_, _| {});
        assert_eq!(cpu.regs().ix, 0x1101);
        assert_eq!(cycles, 14);
    }

    #[test]
    fn ld_iy_nn_leaves_ix_alone() {
        let (cpu, _, _) = run(&[0xFD, 0x21, 0x34, 0x12], |_, _| {});
        assert_eq!(cpu.regs().iy, 0x1234);
        assert_eq!(cpu.regs().ix, 0);
        assert_eq!(cpu.regs().hl, 0);
    }

    #[test]
    fn add_ix_ix() {
        let (cpu, _, cycles) = run(&[0xDD, 0x29], |cpu, _| cpu.regs_mut().ix = 0x8001);
        assert_eq!(cpu.regs().ix, 0x0002);
        assert_ne!(cpu.regs().f() & CF, 0);
        assert_eq!(cpu.regs().wz, 0x8002);
        assert_eq!(cycles, 15);
    }

    #[test]
    fn index_halves() {
        let (cpu, _, cycles) = run(&[0xFD, 0x2C], |cpu, _| {
            cpu.regs_mut().iy = 0x12FF;
            cpu.regs_mut().set_f(0);
        });
        assert_eq!(cpu.regs().iy, 0x1200, "INC IYL does not carry into IYH");
        assert_eq!(cpu.regs().f(), ZF | HF);
        assert_eq!(cycles, 8);

        let (cpu, _, cycles) = run(&[0xDD, 0x26, 0x99], |_, _| {});
        assert_eq!(cpu.regs().ix, 0x9900);
        assert_eq!(cycles, 11);
    }

    #[test]
    fn ld_between_index_halves_and_registers() {
        // LD IXH, B
        let (cpu, _, cycles) = run(&[0xDD, 0x60], |cpu, _| cpu.regs_mut().set_b(0x42));
        assert_eq!(cpu.regs().ix, 0x4200);
        assert_eq!(cpu.regs().hl, 0);
        assert_eq!(cycles, 8);

        // LD IXL, IXH
        let (cpu, _, _) = run(&[0xDD, 0x6C], |cpu, _| cpu.regs_mut().ix = 0xAB00);
        assert_eq!(cpu.regs().ix, 0xABAB);
    }

    #[test]
    fn indexed_memory_uses_real_h_and_l() {
        // LD H, (IX+2)
        let (cpu, _, cycles) = run(&[0xDD, 0x66, 0x02], |cpu, bus| {
            cpu.regs_mut().ix = 0x8000;
            bus.load(0x8002, &[0x5A]);
        });
        assert_eq!(cpu.regs().hl, 0x5A00);
        assert_eq!(cpu.regs().ix, 0x8000);
        assert_eq!(cpu.regs().wz, 0x8002);
        assert_eq!(cycles, 19);

        // LD (IY-1), L
        let (_, bus, cycles) = run(&[0xFD, 0x75, 0xFF], |cpu, _| {
            cpu.regs_mut().iy = 0x8000;
            cpu.regs_mut().hl = 0x0033;
        });
        assert_eq!(bus.peek(0x7FFF), 0x33);
        assert_eq!(cycles, 19);
    }

    #[test]
    fn ld_indexed_immediate() {
        let (_, bus, cycles) = run(&[0xDD, 0x36, 0x05, 0x77], |cpu, _| cpu.regs_mut().ix = 0x8000);
        assert_eq!(bus.peek(0x8005), 0x77);
        assert_eq!(cycles, 19);
    }

    #[test]
    fn inc_indexed_memory() {
        let (cpu, bus, cycles) = run(&[0xDD, 0x34, 0x10], |cpu, bus| {
            cpu.regs_mut().ix = 0x8000;
            cpu.regs_mut().set_f(CF);
            bus.load(0x8010, &[0x7F]);
        });
        assert_eq!(bus.peek(0x8010), 0x80);
        assert_eq!(cpu.regs().f(), SF | HF | PF | CF);
        assert_eq!(cycles, 23);
    }

    #[test]
    fn alu_with_index_operands() {
        let (cpu, _, cycles) = run(&[0xDD, 0x94], |cpu, _| {
            cpu.regs_mut().set_a(0x10);
            cpu.regs_mut().ix = 0x0100;
        });
        assert_eq!(cpu.regs().a(), 0x0F);
        assert_ne!(cpu.regs().f() & NF, 0);
        assert_eq!(cycles, 8);

        let (cpu, _, cycles) = run(&[0xFD, 0xAE, 0x00], |cpu, bus| {
            cpu.regs_mut().set_a(0xFF);
            cpu.regs_mut().iy = 0x8000;
            bus.load(0x8000, &[0x0F]);
        });
        assert_eq!(cpu.regs().a(), 0xF0);
        assert_eq!(cycles, 19);
    }

    #[test]
    fn stack_and_jump_forms() {
        let (cpu, bus, cycles) = run(&[0xDD, 0xE5], |cpu, _| {
            cpu.regs_mut().ix = 0xBEEF;
            cpu.regs_mut().sp = 0x8000;
        });
        assert_eq!(bus.peek16(0x7FFE), 0xBEEF);
        assert_eq!(cpu.regs().sp, 0x7FFE);
        assert_eq!(cycles, 15);

        let (cpu, _, cycles) = run(&[0xFD, 0xE1], |cpu, bus| {
            cpu.regs_mut().sp = 0x8000;
            bus.load(0x8000, &[0x34, 0x12]);
        });
        assert_eq!(cpu.regs().iy, 0x1234);
        assert_eq!(cycles, 14);

        let (cpu, bus, cycles) = run(&[0xDD, 0xE3], |cpu, bus| {
            cpu.regs_mut().ix = 0x1111;
            cpu.regs_mut().sp = 0x8000;
            bus.load(0x8000, &[0x22, 0x22]);
        });
        assert_eq!(cpu.regs().ix, 0x2222);
        assert_eq!(bus.peek16(0x8000), 0x1111);
        assert_eq!(cycles, 23);

        let (cpu, _, cycles) = run(&[0xFD, 0xF9], |cpu, _| cpu.regs_mut().iy = 0x4000);
        assert_eq!(cpu.regs().sp, 0x4000);
        assert_eq!(cycles, 10);
    }

    #[test]
    fn prefix_ignored_by_unrelated_opcodes() {
        // EX DE, HL swaps the real HL
        let (cpu, _, cycles) = run(&[0xDD, 0xEB], |cpu, _| {
            cpu.regs_mut().de = 0x1111;
            cpu.regs_mut().hl = 0x2222;
            cpu.regs_mut().ix = 0x3333;
        });
        assert_eq!(cpu.regs().de, 0x2222);
        assert_eq!(cpu.regs().hl, 0x1111);
        assert_eq!(cpu.regs().ix, 0x3333);
        assert_eq!(cycles, 8);

        // LD B, n
        let (cpu, _, cycles) = run(&[0xFD, 0x06, 0x42], |_, _| {});
        assert_eq!(cpu.regs().b(), 0x42);
        assert_eq!(cycles, 11);
    }

    #[test]
    fn ld_nn_ix_round_trip_through_memory() {
        let (_, bus, cycles) = run(&[0xDD, 0x22, 0x00, 0x80], |cpu, _| cpu.regs_mut().ix = 0xCAFE);
        assert_eq!(bus.peek16(0x8000), 0xCAFE);
        assert_eq!(cycles, 20);

        let (cpu, _, cycles) = run(&[0xFD, 0x2A, 0x00, 0x80], |_, bus| bus.load(0x8000, &[0xFE, 0xCA]));
        assert_eq!(cpu.regs().iy, 0xCAFE);
        assert_eq!(cycles, 20);
    }
}
