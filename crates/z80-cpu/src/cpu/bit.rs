//! CB-prefixed instructions: rotates, shifts, BIT, RES and SET.

use z80_bus::IoBus;

use crate::alu;
use crate::flags::CF;
use crate::observer::ObservedBus;

use super::Z80;

impl Z80 {
    /// Execute a CB-prefixed opcode. Returns T-states beyond the 4-T fetch.
    ///
    /// Bits 6..7 pick the group, bits 3..5 the operation or bit number and
    /// bits 0..2 the operand, where 6 means `(HL)`.
    pub(super) fn execute_bit<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, op: u8) -> u32 {
        let y = (op >> 3) & 7;
        let code = op & 7;
        let memory = code == 6;
        let value = self.read_operand(bus, code);

        match op >> 6 {
            // BIT y, r
            1 => {
                let xy_source = if memory { (self.regs.wz >> 8) as u8 } else { value };
                self.set_f(alu::bit(y, value, xy_source, self.regs.f()));
                if memory { 4 } else { 0 }
            }
            group => {
                let result = match group {
                    // Rotate/shift group
                    0 => {
                        let result = alu::shift(y, value, self.flag(CF));
                        self.set_f(result.flags);
                        result.value
                    }
                    // RES y, r
                    2 => value & !(1 << y),
                    // SET y, r
                    _ => value | (1 << y),
                };
                self.write_operand(bus, code, result);
                if memory { 7 } else { 0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Z80;
    use crate::flags::{CF, HF, PF, SF, XF, YF, ZF};
    use z80_bus::SimpleBus;

    fn run(program: &[u8], setup: impl FnOnce(&mut Z80)) -> (Z80, SimpleBus, u32) {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0, program);
        setup(&mut cpu);
        let cycles = cpu.run_instruction(&mut bus);
        (cpu, bus, cycles)
    }

    #[test]
    fn rlc_register() {
        let (cpu, _, cycles) = run(&[0xCB, 0x00], |cpu| cpu.regs_mut().set_b(0x81));
        assert_eq!(cpu.regs().b(), 0x03);
        assert_eq!(cpu.regs().f(), PF | CF);
        assert_eq!(cycles, 8);
    }

    #[test]
    fn sll_shifts_in_a_one() {
        let (cpu, _, _) = run(&[0xCB, 0x37], |cpu| cpu.regs_mut().set_a(0x80));
        assert_eq!(cpu.regs().a(), 0x01);
        assert_ne!(cpu.regs().f() & CF, 0);
    }

    #[test]
    fn shift_memory_operand() {
        let (_, bus, cycles) = run(&[0xCB, 0x3E], |cpu| cpu.regs_mut().hl = 0x8000);
        // (0x8000) was 0; SRL of 0 stays 0
        assert_eq!(bus.peek(0x8000), 0);
        assert_eq!(cycles, 15);
    }

    #[test]
    fn bit_register_takes_xy_from_operand() {
        let (cpu, _, cycles) = run(&[0xCB, 0x7F], |cpu| {
            cpu.regs_mut().set_a(0xA8);
            cpu.regs_mut().set_f(CF);
        });
        assert_eq!(cpu.regs().f(), SF | HF | YF | XF | CF);
        assert_eq!(cycles, 8);
    }

    #[test]
    fn bit_memory_takes_xy_from_memptr() {
        let (cpu, _, cycles) = run(&[0xCB, 0x46], |cpu| {
            cpu.regs_mut().hl = 0x8000;
            cpu.regs_mut().wz = 0x2800;
            cpu.regs_mut().set_f(0);
        });
        assert_eq!(cpu.regs().f(), ZF | PF | HF | YF | XF);
        assert_eq!(cycles, 12);
    }

    #[test]
    fn res_and_set() {
        let (cpu, _, _) = run(&[0xCB, 0x87], |cpu| cpu.regs_mut().set_a(0xFF));
        assert_eq!(cpu.regs().a(), 0xFE);

        let (cpu, bus, cycles) = run(&[0xCB, 0xFE], |cpu| {
            cpu.regs_mut().hl = 0x8000;
            cpu.regs_mut().set_f(ZF);
        });
        assert_eq!(bus.peek(0x8000), 0x80);
        assert_eq!(cpu.regs().f(), ZF, "SET leaves flags alone");
        assert_eq!(cycles, 15);
    }

    #[test]
    fn cb_prefix_is_its_own_step() {
        let mut cpu = Z80::new();
        let mut bus = SimpleBus::new();
        bus.load(0, &[0xCB, 0x00]);
        assert_eq!(cpu.step(&mut bus), 4);
        assert!(cpu.interrupt_blocked());
        assert!(!cpu.at_instruction_boundary());
        assert_eq!(cpu.step(&mut bus), 4);
        assert!(cpu.at_instruction_boundary());
        assert_eq!(cpu.regs().r(), 2);
    }
}
