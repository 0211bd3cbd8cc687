//! Z80 CPU core stepped one opcode byte at a time.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.
#![allow(clippy::cast_possible_wrap)] // Intentional i8 casts for displacements.

mod bit;
mod extended;
mod indexed;
mod indexed_bit;
mod standard;

use z80_bus::{Bus, Cpu, IoBus, Observable, Ticks, Value};

use crate::clock::Clock;
use crate::config::Config;
use crate::flags::{CF, HF, NF, PF, SF, ZF};
use crate::observer::{
    BranchEvent, IndexMode, ObservedBus, Observer, Operation, PrefixMode, StackEvent,
    StackPointerEvent,
};
use crate::registers::{Reg8, Reg16, Registers};
use crate::signals::{InterruptMode, Signal, SignalController};

/// NMI service address.
const NMI_VECTOR: u16 = 0x0066;

/// IM 1 restart address, also used by IM 0 when no device drives the bus.
const IM1_VECTOR: u16 = 0x0038;

/// T-states charged for a reset step.
const RESET_CYCLES: u32 = 3;

/// Steps `run_instruction` takes before giving up on a prefix chain.
const MAX_INSTRUCTION_STEPS: usize = 16;

/// Zilog Z80 CPU.
///
/// The CPU does not own the bus. The host passes it to `step()` each time,
/// which is also the only point where the memory and port hooks can change.
/// Each step consumes exactly one opcode byte: a prefix, a complete
/// instruction's final opcode byte, a halted refresh cycle or a serviced
/// signal.
pub struct Z80 {
    pub(crate) regs: Registers,
    halted: bool,
    signals: SignalController,

    prefix: PrefixMode,
    index: IndexMode,
    /// Address of the first byte of the instruction being decoded.
    instruction_start: u16,

    /// Flags written by the instruction in flight.
    q: u8,
    /// Flags written by the previous instruction, read by `SCF`/`CCF`.
    prev_q: u8,

    /// SP when the current handler started.
    operation_sp: u16,
    /// Set when the current handler pushed or popped.
    stack_touched: bool,

    clock: Clock,
    config: Config,
    observer: Option<Box<dyn Observer>>,
}

impl Z80 {
    /// Create a Z80 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            regs: Registers::default(),
            halted: false,
            signals: SignalController::new(),
            prefix: PrefixMode::None,
            index: IndexMode::None,
            instruction_start: 0,
            q: 0,
            prev_q: 0,
            operation_sp: 0,
            stack_touched: false,
            clock: Clock::new(),
            config,
            observer: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    #[must_use]
    pub const fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Mutable register access for snapshot restore and test setup.
    pub fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    #[must_use]
    pub fn iff1(&self) -> bool {
        self.signals.iff1
    }

    #[must_use]
    pub fn iff2(&self) -> bool {
        self.signals.iff2
    }

    /// Set both interrupt flip-flops directly.
    pub fn set_iff(&mut self, iff1: bool, iff2: bool) {
        self.signals.iff1 = iff1;
        self.signals.iff2 = iff2;
    }

    #[must_use]
    pub fn interrupt_mode(&self) -> InterruptMode {
        self.signals.mode
    }

    pub fn set_interrupt_mode(&mut self, mode: InterruptMode) {
        if self.signals.mode != mode {
            log::debug!("interrupt mode {} -> {}", self.signals.mode, mode);
        }
        self.signals.mode = mode;
    }

    /// Total T-states since power-on or the last hard reset.
    #[must_use]
    pub const fn clock(&self) -> Ticks {
        self.clock.now()
    }

    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Force the halted state, as a snapshot loader would.
    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    #[must_use]
    pub const fn prefix_mode(&self) -> PrefixMode {
        self.prefix
    }

    /// Restore a half-decoded prefix, as a snapshot loader would.
    pub fn set_prefix_mode(&mut self, prefix: PrefixMode) {
        self.prefix = prefix;
    }

    #[must_use]
    pub const fn index_mode(&self) -> IndexMode {
        self.index
    }

    pub fn set_index_mode(&mut self, index: IndexMode) {
        self.index = index;
    }

    /// Address of the first byte of the instruction being decoded. While
    /// a prefix is pending, this is where the instruction restarts if a
    /// signal is taken.
    #[must_use]
    pub const fn instruction_start(&self) -> u16 {
        self.instruction_start
    }

    pub fn set_instruction_start(&mut self, address: u16) {
        self.instruction_start = address;
    }

    /// Reset requested and not yet serviced.
    #[must_use]
    pub fn reset_pending(&self) -> bool {
        self.signals.reset_pending()
    }

    pub fn set_reset_pending(&mut self, pending: bool) {
        self.signals.set_reset_pending(pending);
    }

    /// NMI latched and not yet serviced.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.signals.nmi_pending()
    }

    /// Restore a latched NMI without toggling the line.
    pub fn set_nmi_pending(&mut self, pending: bool) {
        self.signals.set_nmi_pending(pending);
    }

    #[must_use]
    pub fn int_line(&self) -> bool {
        self.signals.int_line()
    }

    /// True while an interrupt cannot be accepted on the next step.
    #[must_use]
    pub fn interrupt_blocked(&self) -> bool {
        self.signals.blocked
    }

    /// Restore the blocked latch, e.g. a snapshot taken right after `EI`.
    pub fn set_interrupt_blocked(&mut self, blocked: bool) {
        self.signals.blocked = blocked;
    }

    /// True when no multi-byte opcode is half-decoded.
    #[must_use]
    pub fn at_instruction_boundary(&self) -> bool {
        self.prefix == PrefixMode::None && self.index == IndexMode::None
    }

    /// Flags written by the last completed instruction.
    #[must_use]
    pub const fn q(&self) -> u8 {
        self.prev_q
    }

    /// Restore the flag latch, as a snapshot loader or test harness would.
    pub fn set_q(&mut self, q: u8) {
        self.prev_q = q;
    }

    /// Attach an observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: Box<dyn Observer>) {
        log::debug!("observer attached");
        self.observer = Some(observer);
    }

    /// Detach and return the current observer.
    pub fn take_observer(&mut self) -> Option<Box<dyn Observer>> {
        let observer = self.observer.take();
        if observer.is_some() {
            log::debug!("observer detached");
        }
        observer
    }

    /// Hard reset: the subset of state the RESET pin defines.
    ///
    /// Clears halt, both flip-flops, the interrupt mode, the blocked latch,
    /// any half-decoded prefix, PC, I and R, pending requests and the clock.
    /// Other registers keep their values.
    pub fn hard_reset(&mut self) {
        self.halted = false;
        self.signals.reset();
        self.prefix = PrefixMode::None;
        self.index = IndexMode::None;
        self.instruction_start = 0;
        self.regs.pc = 0;
        self.regs.ir = 0;
        self.q = 0;
        self.prev_q = 0;
        self.clock.reset();
    }

    /// Run one step: service a signal, or consume one opcode byte.
    ///
    /// Returns the T-states consumed.
    pub fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let mut observer = self.observer.take();
        let mut bus = ObservedBus::new(bus, observer.as_deref_mut());
        bus.notify(|observer| observer.step_starting(&self.regs, self.clock.now()));

        let cycles = match self.signals.poll() {
            Some(signal) => self.service(signal, &mut bus),
            None => self.fetch_and_execute(&mut bus),
        };

        self.observer = observer;
        self.prev_q = self.q;
        self.q = 0;
        self.clock.advance(cycles);
        cycles
    }

    /// Step until the current instruction completes, including any prefix
    /// bytes. Returns the summed T-states.
    ///
    /// An unbroken run of `DD`/`FD` bytes never completes, so this gives up
    /// after a fixed number of steps and leaves the prefix pending. The next
    /// call carries on from there.
    pub fn run_instruction<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        let mut cycles = self.step(bus);
        for _ in 1..MAX_INSTRUCTION_STEPS {
            if self.at_instruction_boundary() {
                break;
            }
            cycles += self.step(bus);
        }
        cycles
    }

    /// Length of the instruction at PC when a debugger should step over it
    /// rather than into it, otherwise 0.
    ///
    /// Covers `CALL`, `CALL cc`, `RST`, `HALT`, `DJNZ` and the repeating
    /// block instructions. Mid-instruction the answer is always 0.
    pub fn call_instruction_length<B: Bus>(&self, bus: &mut B) -> u16 {
        if !self.at_instruction_boundary() || self.halted {
            return 0;
        }
        let pc = self.regs.pc;
        match bus.read(pc) {
            0xCD => 3,
            op if op & 0xC7 == 0xC4 => 3,
            op if op & 0xC7 == 0xC7 => 1,
            0x76 => 1,
            0x10 => 2,
            // LDIR LDDR CPIR CPDR INIR INDR OTIR OTDR
            0xED if bus.read(pc.wrapping_add(1)) & 0xF4 == 0xB0 => 2,
            _ => 0,
        }
    }

    fn service<B: IoBus>(&mut self, signal: Signal, bus: &mut ObservedBus<'_, B>) -> u32 {
        // Taken between a prefix and its opcode: the whole instruction runs
        // again after the handler returns.
        if !self.at_instruction_boundary() {
            self.regs.pc = self.instruction_start;
            self.finish_instruction();
        }

        match signal {
            Signal::Reset => {
                log::trace!("reset at PC={:04X}", self.regs.pc);
                self.hard_reset();
                RESET_CYCLES
            }
            Signal::Nmi => {
                bus.notify(|observer| observer.nmi_executing());
                self.leave_halt();
                self.signals.iff1 = false;
                self.regs.increment_r();
                let pc = self.regs.pc;
                self.instruction_start = pc;
                self.push16(bus, pc);
                self.regs.pc = NMI_VECTOR;
                self.regs.wz = NMI_VECTOR;
                log::trace!("NMI taken, return address {pc:04X}");
                11
            }
            Signal::Int => self.accept_interrupt(bus),
        }
    }

    fn accept_interrupt<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u32 {
        let mode = self.signals.mode;
        bus.notify(|observer| observer.interrupt_executing(mode));
        self.leave_halt();
        self.signals.iff1 = false;
        self.signals.iff2 = false;
        self.regs.increment_r();

        let data = bus.interrupt_vector();
        let pc = self.regs.pc;
        self.instruction_start = pc;
        self.push16(bus, pc);
        let (target, cycles) = match mode {
            InterruptMode::Im0 => {
                let target = match data {
                    // RST p
                    Some(opcode) if opcode & 0xC7 == 0xC7 => u16::from(opcode & 0x38),
                    Some(opcode) => {
                        log::warn!(
                            "IM 0 bus byte {opcode:02X} is not an RST, restarting at {IM1_VECTOR:04X}"
                        );
                        IM1_VECTOR
                    }
                    None => IM1_VECTOR,
                };
                (target, 13)
            }
            InterruptMode::Im1 => (IM1_VECTOR, 13),
            InterruptMode::Im2 => {
                let pointer = (u16::from(self.regs.i()) << 8) | u16::from(data.unwrap_or(0));
                (self.read16(bus, pointer), 19)
            }
        };

        self.regs.pc = target;
        self.regs.wz = target;
        log::trace!("{mode} interrupt taken, return address {pc:04X}, target {target:04X}");
        cycles
    }

    /// HALT leaves PC on the HALT opcode; taking a signal moves past it.
    fn leave_halt(&mut self) {
        if self.halted {
            self.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    fn fetch_and_execute<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u32 {
        if self.halted {
            self.regs.increment_r();
            return 4;
        }

        if self.at_instruction_boundary() {
            self.instruction_start = self.regs.pc;
        }

        let opcode = self.fetch_opcode(bus);

        match self.prefix {
            PrefixMode::Bit => {
                let operation = self.begin_operation(bus, opcode);
                let cycles = self.execute_bit(bus, opcode);
                self.end_operation(bus, &operation);
                4 + cycles
            }
            PrefixMode::Extended => {
                let operation = self.begin_operation(bus, opcode);
                let cycles = self.execute_extended(bus, opcode);
                self.end_operation(bus, &operation);
                4 + cycles
            }
            PrefixMode::None => match opcode {
                0xDD | 0xFD => {
                    self.index = if opcode == 0xDD {
                        IndexMode::Ix
                    } else {
                        IndexMode::Iy
                    };
                    self.signals.blocked = true;
                    4
                }
                0xED => {
                    // An index prefix has no effect on the ED table.
                    self.index = IndexMode::None;
                    self.prefix = PrefixMode::Extended;
                    self.signals.blocked = true;
                    4
                }
                0xCB if self.index != IndexMode::None => {
                    // d, then the opcode byte (not an M1 cycle), then 2 internal.
                    let address = self.indexed_address(bus);
                    let op = self.read_imm8(bus);
                    self.prefix = PrefixMode::Bit;
                    let operation = self.begin_operation(bus, op);
                    let cycles = self.execute_indexed_bit(bus, op, address);
                    self.end_operation(bus, &operation);
                    4 + 3 + 3 + 2 + cycles
                }
                0xCB => {
                    self.prefix = PrefixMode::Bit;
                    self.signals.blocked = true;
                    4
                }
                _ => {
                    let operation = self.begin_operation(bus, opcode);
                    let cycles = if self.index == IndexMode::None {
                        self.execute_standard(bus, opcode)
                    } else {
                        self.execute_indexed(bus, opcode)
                    };
                    self.end_operation(bus, &operation);
                    4 + cycles
                }
            },
        }
    }

    /// M1 cycle: read at PC, advance PC, refresh.
    fn fetch_opcode<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u8 {
        let address = self.regs.pc;
        let opcode = bus.fetch(address);
        self.regs.pc = address.wrapping_add(1);
        self.regs.increment_r();
        opcode
    }

    fn begin_operation<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, opcode: u8) -> Operation {
        let operation = Operation {
            address: self.instruction_start,
            prefix: self.prefix,
            index: self.index,
            opcode,
        };
        self.operation_sp = self.regs.sp;
        self.stack_touched = false;
        bus.notify(|observer| observer.operation_executing(&operation));
        operation
    }

    fn end_operation<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, operation: &Operation) {
        self.finish_instruction();
        if !self.stack_touched && self.regs.sp != self.operation_sp {
            let event = StackPointerEvent {
                source: operation.address,
                old: self.operation_sp,
                new: self.regs.sp,
            };
            bus.notify(|observer| observer.stack_pointer_changed(&event));
        }
        bus.notify(|observer| observer.operation_executed(operation, &self.regs));
    }

    fn finish_instruction(&mut self) {
        self.prefix = PrefixMode::None;
        self.index = IndexMode::None;
    }

    // =========================================================================
    // Bus helpers
    // =========================================================================

    fn read_imm8<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn read_imm16<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u16 {
        let lo = self.read_imm8(bus);
        let hi = self.read_imm8(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn read16<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, address: u16) -> u16 {
        let lo = bus.read(address);
        let hi = bus.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write16<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, address: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        bus.write(address, lo);
        bus.write(address.wrapping_add(1), hi);
    }

    /// Push high byte first, as the hardware does.
    fn push16<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, lo);

        self.stack_touched = true;
        let event = StackEvent { source: self.instruction_start, sp: self.regs.sp, value };
        bus.notify(|observer| observer.stack_pushed(&event));
    }

    fn pop16<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u16 {
        let sp = self.regs.sp;
        let value = self.read16(bus, sp);
        self.regs.sp = sp.wrapping_add(2);

        self.stack_touched = true;
        let event = StackEvent { source: self.instruction_start, sp, value };
        bus.notify(|observer| observer.stack_popped(&event));
        value
    }

    /// Load PC from a jump and report the branch.
    fn jump<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, target: u16) {
        self.regs.pc = target;
        let event = BranchEvent { source: self.instruction_start, target };
        bus.notify(|observer| observer.branch_taken(&event));
    }

    /// Read the displacement byte and form `IX+d`/`IY+d`. Sets MEMPTR.
    fn indexed_address<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) -> u16 {
        let displacement = self.read_imm8(bus) as i8;
        let address = self.index_value().wrapping_add_signed(i16::from(displacement));
        self.regs.wz = address;
        address
    }

    // =========================================================================
    // Register helpers
    // =========================================================================

    /// Write F and record it in the Q latch.
    fn set_f(&mut self, flags: u8) {
        self.regs.set_f(flags);
        self.q = flags;
    }

    fn flag(&self, mask: u8) -> bool {
        self.regs.f() & mask != 0
    }

    /// Condition codes `NZ Z NC C PO PE P M` from opcode bits 3..5.
    fn condition(&self, cc: u8) -> bool {
        match cc & 7 {
            0 => !self.flag(ZF),
            1 => self.flag(ZF),
            2 => !self.flag(CF),
            3 => self.flag(CF),
            4 => !self.flag(PF),
            5 => self.flag(PF),
            6 => !self.flag(SF),
            _ => self.flag(SF),
        }
    }

    fn index_reg(&self) -> Reg16 {
        match self.index {
            IndexMode::Iy => Reg16::Iy,
            _ => Reg16::Ix,
        }
    }

    fn index_value(&self) -> u16 {
        self.regs.get16(self.index_reg())
    }

    fn set_index_value(&mut self, value: u16) {
        self.regs.set16(self.index_reg(), value);
    }

    /// Decode an operand field under an index prefix: H and L become the
    /// halves of the active index register.
    fn index_reg8(&self, code: u8) -> Reg8 {
        match (code, self.index) {
            (4, IndexMode::Iy) => Reg8::Iyh,
            (5, IndexMode::Iy) => Reg8::Iyl,
            (4, _) => Reg8::Ixh,
            (5, _) => Reg8::Ixl,
            _ => Reg8::from_code(code),
        }
    }

    /// Read an operand field where code 6 means `(HL)`.
    fn read_operand<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, code: u8) -> u8 {
        if code == 6 {
            bus.read(self.regs.hl)
        } else {
            self.regs.get8(Reg8::from_code(code))
        }
    }

    fn write_operand<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>, code: u8, value: u8) {
        if code == 6 {
            bus.write(self.regs.hl, value);
        } else {
            self.regs.set8(Reg8::from_code(code), value);
        }
    }

    /// `SCF`/`CCF` X and Y: from A, or'ed with F when the previous
    /// instruction did not write the flags.
    fn carry_flag_xy(&self) -> u8 {
        ((self.prev_q ^ self.regs.f()) | self.regs.a()) & 0x28
    }

    /// Shared tail of `RETN`/`RETI`.
    fn return_from_interrupt<B: IoBus>(&mut self, bus: &mut ObservedBus<'_, B>) {
        self.signals.iff1 = self.signals.iff2;
        let address = self.pop16(bus);
        self.regs.pc = address;
        self.regs.wz = address;
    }

    /// `HALT`: PC stays on the opcode until a signal is taken.
    fn halt(&mut self) {
        self.halted = true;
        self.regs.pc = self.regs.pc.wrapping_sub(1);
    }

    /// `EI`: the next step cannot take an interrupt.
    fn enable_interrupts(&mut self) {
        self.signals.iff1 = true;
        self.signals.iff2 = true;
        self.signals.blocked = true;
    }

    fn disable_interrupts(&mut self) {
        self.signals.iff1 = false;
        self.signals.iff2 = false;
    }

    /// Flags for `LD A,I`/`LD A,R`: P/V reports IFF2.
    fn load_ir_flags(&self, value: u8) -> u8 {
        (self.regs.f() & CF)
            | crate::flags::sz53(value)
            | crate::flags::flag_if(self.signals.iff2, PF)
    }
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Z80 {
    type Registers = Registers;

    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32 {
        Z80::step(self, bus)
    }

    fn clock(&self) -> Ticks {
        self.clock.now()
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        self.halted
    }

    fn set_int_line(&mut self, asserted: bool) {
        self.signals.set_int_line(asserted);
    }

    fn set_nmi_line(&mut self, asserted: bool) {
        self.signals.set_nmi_line(asserted);
    }

    fn set_reset_line(&mut self, asserted: bool) {
        self.signals.set_reset_line(asserted);
    }

    fn reset(&mut self) {
        self.hard_reset();
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc", "sp", "af", "bc", "de", "hl", "ix", "iy", "i", "r", "wz", "a", "f", "b", "c", "d",
    "e", "h", "l", "ixh", "ixl", "iyh", "iyl", "af'", "bc'", "de'", "hl'", "iff1", "iff2", "im",
    "halted", "clock", "flags.s", "flags.z", "flags.h", "flags.pv", "flags.n", "flags.c",
];

impl Observable for Z80 {
    fn query(&self, path: &str) -> Option<Value> {
        let r = &self.regs;
        match path {
            "af'" => Some(r.af_alt.into()),
            "bc'" => Some(r.bc_alt.into()),
            "de'" => Some(r.de_alt.into()),
            "hl'" => Some(r.hl_alt.into()),

            "iff1" => Some(self.signals.iff1.into()),
            "iff2" => Some(self.signals.iff2.into()),
            "im" => Some(u8::from(self.signals.mode).into()),
            "halted" => Some(self.halted.into()),
            "clock" => Some(self.clock.now().get().into()),

            "flags.s" => Some(self.flag(SF).into()),
            "flags.z" => Some(self.flag(ZF).into()),
            "flags.h" => Some(self.flag(HF).into()),
            "flags.pv" => Some(self.flag(PF).into()),
            "flags.n" => Some(self.flag(NF).into()),
            "flags.c" => Some(self.flag(CF).into()),

            // Register names shared with the debugger lookup
            _ => {
                if let Ok(reg) = Reg8::try_from(path) {
                    Some(r.get8(reg).into())
                } else if let Ok(reg) = Reg16::try_from(path) {
                    Some(r.get16(reg).into())
                } else {
                    None
                }
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
