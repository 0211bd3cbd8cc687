//! ALU operations for the Z80.
//!
//! Each function returns the result and the full set of flags it defines.
//! Callers merge in any flags the instruction leaves untouched.

use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF, flag_if, sz53, sz53p};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Add two bytes with optional carry.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let wide = u16::from(a) + u16::from(b) + u16::from(c);
    let result = wide as u8;

    // Overflow: both operands share a sign the result does not
    let overflow = (a ^ b) & 0x80 == 0 && (a ^ result) & 0x80 != 0;
    let flags = sz53(result)
        | flag_if((a & 0x0F) + (b & 0x0F) + c > 0x0F, HF)
        | flag_if(overflow, PF)
        | flag_if(wide > 0xFF, CF);

    AluResult { value: result, flags }
}

/// Subtract two bytes with optional borrow.
#[must_use]
pub fn sub8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(c);

    let overflow = (a ^ b) & 0x80 != 0 && (a ^ result) & 0x80 != 0;
    let flags = NF
        | sz53(result)
        | flag_if(u16::from(a & 0x0F) < u16::from(b & 0x0F) + u16::from(c), HF)
        | flag_if(overflow, PF)
        | flag_if(u16::from(a) < u16::from(b) + u16::from(c), CF);

    AluResult { value: result, flags }
}

#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let result = a & b;
    AluResult { value: result, flags: sz53p(result) | HF }
}

#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let result = a | b;
    AluResult { value: result, flags: sz53p(result) }
}

#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let result = a ^ b;
    AluResult { value: result, flags: sz53p(result) }
}

/// Compare: a subtraction whose X/Y flags come from the operand.
#[must_use]
pub fn cp8(a: u8, b: u8) -> AluResult {
    let mut result = sub8(a, b, false);
    result.flags = (result.flags & !(YF | XF)) | (b & (YF | XF));
    result.value = a;
    result
}

/// Dispatch one of the eight accumulator operations selected by opcode bits
/// 3..5 (`ADD ADC SUB SBC AND XOR OR CP`).
#[must_use]
pub fn accumulator(op: u8, a: u8, value: u8, carry: bool) -> AluResult {
    match op & 7 {
        0 => add8(a, value, false),
        1 => add8(a, value, carry),
        2 => sub8(a, value, false),
        3 => sub8(a, value, carry),
        4 => and8(a, value),
        5 => xor8(a, value),
        6 => or8(a, value),
        _ => cp8(a, value),
    }
}

/// Increment. Carry is not produced; the caller keeps the old one.
#[must_use]
pub fn inc8(a: u8) -> AluResult {
    let result = a.wrapping_add(1);
    let flags = sz53(result) | flag_if(a & 0x0F == 0x0F, HF) | flag_if(a == 0x7F, PF);
    AluResult { value: result, flags }
}

/// Decrement. Carry is not produced; the caller keeps the old one.
#[must_use]
pub fn dec8(a: u8) -> AluResult {
    let result = a.wrapping_sub(1);
    let flags = NF | sz53(result) | flag_if(a & 0x0F == 0x00, HF) | flag_if(a == 0x80, PF);
    AluResult { value: result, flags }
}

/// `NEG`: 0 - a.
#[must_use]
pub fn neg8(a: u8) -> AluResult {
    sub8(0, a, false)
}

fn shifted(result: u8, carry: bool) -> AluResult {
    AluResult { value: result, flags: sz53p(result) | flag_if(carry, CF) }
}

/// Apply one of the eight CB-table shift/rotate operations selected by
/// opcode bits 3..5 (`RLC RRC RL RR SLA SRA SLL SRL`).
#[must_use]
pub fn shift(op: u8, value: u8, carry: bool) -> AluResult {
    match op & 7 {
        // RLC
        0 => shifted(value.rotate_left(1), value & 0x80 != 0),
        // RRC
        1 => shifted(value.rotate_right(1), value & 0x01 != 0),
        // RL
        2 => shifted((value << 1) | u8::from(carry), value & 0x80 != 0),
        // RR
        3 => shifted((value >> 1) | (u8::from(carry) << 7), value & 0x01 != 0),
        // SLA
        4 => shifted(value << 1, value & 0x80 != 0),
        // SRA
        5 => shifted((value >> 1) | (value & 0x80), value & 0x01 != 0),
        // SLL (undocumented): shifts a 1 into bit 0
        6 => shifted((value << 1) | 0x01, value & 0x80 != 0),
        // SRL
        _ => shifted(value >> 1, value & 0x01 != 0),
    }
}

/// Accumulator rotates (`RLCA RRCA RLA RRA`, selected by opcode bits 3..4).
///
/// S, Z and P/V are preserved from `f`; H and N are cleared.
#[must_use]
pub fn rotate_accumulator(op: u8, a: u8, f: u8) -> AluResult {
    let full = shift(op & 3, a, f & CF != 0);
    AluResult {
        value: full.value,
        flags: (f & (SF | ZF | PF)) | (full.value & (YF | XF)) | (full.flags & CF),
    }
}

/// `BIT n,value`. X/Y come from `xy_source`, which differs by addressing
/// mode (the operand for registers, MEMPTR's high byte for memory).
#[must_use]
pub fn bit(n: u8, value: u8, xy_source: u8, f: u8) -> u8 {
    let tested = value & (1 << n);
    HF | (f & CF)
        | flag_if(tested == 0, ZF | PF)
        | (tested & SF)
        | (xy_source & (YF | XF))
}

/// `ADD HL,rr`: returns the sum and the H, N, C, X, Y flags. The caller keeps
/// S, Z and P/V.
#[must_use]
pub fn add16(a: u16, b: u16) -> (u16, u8) {
    let wide = u32::from(a) + u32::from(b);
    let result = wide as u16;
    let flags = flag_if((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF, HF)
        | flag_if(wide > 0xFFFF, CF)
        | ((result >> 8) as u8 & (YF | XF));
    (result, flags)
}

/// `ADC HL,rr` with every flag defined.
#[must_use]
pub fn adc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u32::from(carry);
    let wide = u32::from(a) + u32::from(b) + c;
    let result = wide as u16;
    let high = (result >> 8) as u8;

    let overflow = (a ^ b) & 0x8000 == 0 && (a ^ result) & 0x8000 != 0;
    let flags = (high & (SF | YF | XF))
        | flag_if(result == 0, ZF)
        | flag_if(u32::from(a & 0x0FFF) + u32::from(b & 0x0FFF) + c > 0x0FFF, HF)
        | flag_if(overflow, PF)
        | flag_if(wide > 0xFFFF, CF);
    (result, flags)
}

/// `SBC HL,rr` with every flag defined.
#[must_use]
pub fn sbc16(a: u16, b: u16, carry: bool) -> (u16, u8) {
    let c = u32::from(carry);
    let result = a.wrapping_sub(b).wrapping_sub(carry.into());
    let high = (result >> 8) as u8;

    let overflow = (a ^ b) & 0x8000 != 0 && (a ^ result) & 0x8000 != 0;
    let flags = NF
        | (high & (SF | YF | XF))
        | flag_if(result == 0, ZF)
        | flag_if(u32::from(a & 0x0FFF) < u32::from(b & 0x0FFF) + c, HF)
        | flag_if(overflow, PF)
        | flag_if(u32::from(a) < u32::from(b) + c, CF);
    (result, flags)
}
