//! Z80 register file.
//!
//! Every pair is stored as a single `u16`. The 8-bit halves are views built
//! by shifting and masking, so writing one half never disturbs the other and
//! writing the pair always replaces both.

use crate::error::CpuError;

/// An 8-bit register or register half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    Ixh,
    Ixl,
    Iyh,
    Iyl,
    I,
    R,
}

impl Reg8 {
    /// Decode the 3-bit register field of an opcode (`B C D E H L - A`).
    ///
    /// # Panics
    ///
    /// Code 6 selects the memory operand `(HL)`, not a register. Passing it
    /// (or anything above 7) is a decoder bug.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::B,
            1 => Self::C,
            2 => Self::D,
            3 => Self::E,
            4 => Self::H,
            5 => Self::L,
            7 => Self::A,
            6 => panic!("register code 6 is the (HL) operand, not a register"),
            _ => panic!("register code {code} out of range"),
        }
    }
}

impl TryFrom<&str> for Reg8 {
    type Error = CpuError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "a" => Self::A,
            "f" => Self::F,
            "b" => Self::B,
            "c" => Self::C,
            "d" => Self::D,
            "e" => Self::E,
            "h" => Self::H,
            "l" => Self::L,
            "ixh" | "xh" => Self::Ixh,
            "ixl" | "xl" => Self::Ixl,
            "iyh" | "yh" => Self::Iyh,
            "iyl" | "yl" => Self::Iyl,
            "i" => Self::I,
            "r" => Self::R,
            _ => return Err(CpuError::UnknownRegister(name.to_string())),
        })
    }
}

/// A 16-bit register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg16 {
    Af,
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Ir,
    Sp,
    Pc,
    Wz,
}

impl Reg16 {
    /// Decode the 2-bit `ss`/`dd` field used by LD/INC/DEC/ADD (`BC DE HL SP`).
    ///
    /// # Panics
    ///
    /// Panics if `code` is above 3.
    #[must_use]
    pub fn from_pair_code(code: u8) -> Self {
        match code {
            0 => Self::Bc,
            1 => Self::De,
            2 => Self::Hl,
            3 => Self::Sp,
            _ => panic!("register pair code {code} out of range"),
        }
    }

    /// Decode the 2-bit `qq` field used by PUSH/POP (`BC DE HL AF`).
    ///
    /// # Panics
    ///
    /// Panics if `code` is above 3.
    #[must_use]
    pub fn from_stack_code(code: u8) -> Self {
        match code {
            0 => Self::Bc,
            1 => Self::De,
            2 => Self::Hl,
            3 => Self::Af,
            _ => panic!("stack pair code {code} out of range"),
        }
    }
}

impl TryFrom<&str> for Reg16 {
    type Error = CpuError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Ok(match name.to_ascii_lowercase().as_str() {
            "af" => Self::Af,
            "bc" => Self::Bc,
            "de" => Self::De,
            "hl" => Self::Hl,
            "ix" => Self::Ix,
            "iy" => Self::Iy,
            "ir" => Self::Ir,
            "sp" => Self::Sp,
            "pc" => Self::Pc,
            "wz" | "memptr" => Self::Wz,
            _ => return Err(CpuError::UnknownRegister(name.to_string())),
        })
    }
}

#[inline]
const fn hi(pair: u16) -> u8 {
    (pair >> 8) as u8
}

#[inline]
const fn lo(pair: u16) -> u8 {
    pair as u8
}

#[inline]
fn with_hi(pair: u16, value: u8) -> u16 {
    (pair & 0x00FF) | (u16::from(value) << 8)
}

#[inline]
fn with_lo(pair: u16, value: u8) -> u16 {
    (pair & 0xFF00) | u16::from(value)
}

/// Z80 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    // Main set
    pub af: u16,
    pub bc: u16,
    pub de: u16,
    pub hl: u16,

    // Shadow set
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    /// Interrupt vector base (high) and refresh counter (low).
    pub ir: u16,
    pub pc: u16,
    pub sp: u16,

    /// WZ/MEMPTR - internal temporary register.
    /// Leaks into the undocumented X/Y flags of `BIT n,(HL)` and friends.
    pub wz: u16,
}

impl Default for Registers {
    /// Power-on values: AF and SP read back as 0xFFFF, everything else 0.
    fn default() -> Self {
        Self {
            af: 0xFFFF,
            bc: 0,
            de: 0,
            hl: 0,
            af_alt: 0,
            bc_alt: 0,
            de_alt: 0,
            hl_alt: 0,
            ix: 0,
            iy: 0,
            ir: 0,
            pc: 0,
            sp: 0xFFFF,
            wz: 0,
        }
    }
}

impl Registers {
    #[must_use]
    pub const fn a(&self) -> u8 {
        hi(self.af)
    }

    #[must_use]
    pub const fn f(&self) -> u8 {
        lo(self.af)
    }

    #[must_use]
    pub const fn b(&self) -> u8 {
        hi(self.bc)
    }

    #[must_use]
    pub const fn c(&self) -> u8 {
        lo(self.bc)
    }

    #[must_use]
    pub const fn d(&self) -> u8 {
        hi(self.de)
    }

    #[must_use]
    pub const fn e(&self) -> u8 {
        lo(self.de)
    }

    #[must_use]
    pub const fn h(&self) -> u8 {
        hi(self.hl)
    }

    #[must_use]
    pub const fn l(&self) -> u8 {
        lo(self.hl)
    }

    /// Interrupt vector base register.
    #[must_use]
    pub const fn i(&self) -> u8 {
        hi(self.ir)
    }

    /// Memory refresh register.
    #[must_use]
    pub const fn r(&self) -> u8 {
        lo(self.ir)
    }

    pub fn set_a(&mut self, value: u8) {
        self.af = with_hi(self.af, value);
    }

    pub fn set_f(&mut self, value: u8) {
        self.af = with_lo(self.af, value);
    }

    pub fn set_b(&mut self, value: u8) {
        self.bc = with_hi(self.bc, value);
    }

    pub fn set_c(&mut self, value: u8) {
        self.bc = with_lo(self.bc, value);
    }

    pub fn set_i(&mut self, value: u8) {
        self.ir = with_hi(self.ir, value);
    }

    pub fn set_r(&mut self, value: u8) {
        self.ir = with_lo(self.ir, value);
    }

    /// Read an 8-bit register.
    #[must_use]
    pub fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => hi(self.af),
            Reg8::F => lo(self.af),
            Reg8::B => hi(self.bc),
            Reg8::C => lo(self.bc),
            Reg8::D => hi(self.de),
            Reg8::E => lo(self.de),
            Reg8::H => hi(self.hl),
            Reg8::L => lo(self.hl),
            Reg8::Ixh => hi(self.ix),
            Reg8::Ixl => lo(self.ix),
            Reg8::Iyh => hi(self.iy),
            Reg8::Iyl => lo(self.iy),
            Reg8::I => hi(self.ir),
            Reg8::R => lo(self.ir),
        }
    }

    /// Write an 8-bit register, leaving the other half of its pair intact.
    pub fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.af = with_hi(self.af, value),
            Reg8::F => self.af = with_lo(self.af, value),
            Reg8::B => self.bc = with_hi(self.bc, value),
            Reg8::C => self.bc = with_lo(self.bc, value),
            Reg8::D => self.de = with_hi(self.de, value),
            Reg8::E => self.de = with_lo(self.de, value),
            Reg8::H => self.hl = with_hi(self.hl, value),
            Reg8::L => self.hl = with_lo(self.hl, value),
            Reg8::Ixh => self.ix = with_hi(self.ix, value),
            Reg8::Ixl => self.ix = with_lo(self.ix, value),
            Reg8::Iyh => self.iy = with_hi(self.iy, value),
            Reg8::Iyl => self.iy = with_lo(self.iy, value),
            Reg8::I => self.ir = with_hi(self.ir, value),
            Reg8::R => self.ir = with_lo(self.ir, value),
        }
    }

    /// Read a 16-bit register pair.
    #[must_use]
    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Af => self.af,
            Reg16::Bc => self.bc,
            Reg16::De => self.de,
            Reg16::Hl => self.hl,
            Reg16::Ix => self.ix,
            Reg16::Iy => self.iy,
            Reg16::Ir => self.ir,
            Reg16::Sp => self.sp,
            Reg16::Pc => self.pc,
            Reg16::Wz => self.wz,
        }
    }

    /// Write a 16-bit register pair.
    pub fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Af => self.af = value,
            Reg16::Bc => self.bc = value,
            Reg16::De => self.de = value,
            Reg16::Hl => self.hl = value,
            Reg16::Ix => self.ix = value,
            Reg16::Iy => self.iy = value,
            Reg16::Ir => self.ir = value,
            Reg16::Sp => self.sp = value,
            Reg16::Pc => self.pc = value,
            Reg16::Wz => self.wz = value,
        }
    }

    /// `EX AF,AF'`.
    pub fn exchange_af(&mut self) {
        core::mem::swap(&mut self.af, &mut self.af_alt);
    }

    /// `EXX`: swap BC, DE and HL with their shadows.
    pub fn exchange_main(&mut self) {
        core::mem::swap(&mut self.bc, &mut self.bc_alt);
        core::mem::swap(&mut self.de, &mut self.de_alt);
        core::mem::swap(&mut self.hl, &mut self.hl_alt);
    }

    /// Advance the low 7 bits of R; bit 7 keeps whatever `LD R,A` stored.
    pub fn increment_r(&mut self) {
        let r = self.r();
        self.set_r((r & 0x80) | (r.wrapping_add(1) & 0x7F));
    }
}
