//! Precomputed lookup tables.

use crate::flags::{CF, HF, NF, sz53p};

/// Result of `DAA` for every combination of A and the H, N and C flags.
///
/// Index: `H << 10 | N << 9 | C << 8 | A`. Entry: `A << 8 | F`.
pub static DAA: [u16; 0x800] = build_daa();

/// Correction added to (or subtracted from) A, and the carry it produces,
/// following Zilog's nibble-range table.
const fn daa_correction(hi: u8, lo: u8, h: bool, c: bool) -> (u8, bool) {
    if c {
        let diff = if lo <= 9 && !h { 0x60 } else { 0x66 };
        return (diff, true);
    }
    if hi <= 9 && lo <= 9 {
        (if h { 0x06 } else { 0x00 }, false)
    } else if hi <= 8 && lo >= 0x0A {
        (0x06, false)
    } else if hi >= 0x0A && lo <= 9 {
        (if h { 0x66 } else { 0x60 }, true)
    } else {
        // hi 9..=F, lo A..=F
        (0x66, true)
    }
}

const fn build_daa() -> [u16; 0x800] {
    let mut table = [0u16; 0x800];
    let mut index = 0;
    while index < 0x800 {
        let a = (index & 0xFF) as u8;
        let c = index & 0x100 != 0;
        let n = index & 0x200 != 0;
        let h = index & 0x400 != 0;

        let hi = a >> 4;
        let lo = a & 0x0F;
        let (diff, carry) = daa_correction(hi, lo, h, c);
        let half = if n { h && lo <= 5 } else { lo >= 0x0A };
        let result = if n { a.wrapping_sub(diff) } else { a.wrapping_add(diff) };

        let mut f = sz53p(result);
        if n {
            f |= NF;
        }
        if half {
            f |= HF;
        }
        if carry {
            f |= CF;
        }
        table[index] = ((result as u16) << 8) | f as u16;
        index += 1;
    }
    table
}

/// Look up the `DAA` result for the given accumulator and flags.
#[must_use]
pub fn daa(a: u8, f: u8) -> (u8, u8) {
    let index = (usize::from(f & HF) << 6) | (usize::from(f & (NF | CF)) << 8) | usize::from(a);
    let entry = DAA[index];
    ((entry >> 8) as u8, entry as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alu;
    use crate::flags::{PF, ZF};

    /// Binary add then DAA must equal decimal add for every BCD pair.
    #[test]
    fn add_then_daa_is_decimal_addition() {
        for x in 0..100u8 {
            for y in 0..100u8 {
                let bx = (x / 10) << 4 | (x % 10);
                let by = (y / 10) << 4 | (y % 10);
                let sum = alu::add8(bx, by, false);
                let (a, f) = daa(sum.value, sum.flags);
                let expected = (x + y) % 100;
                assert_eq!(a, (expected / 10) << 4 | (expected % 10), "{x} + {y}");
                assert_eq!(f & CF != 0, x + y >= 100, "carry for {x} + {y}");
                assert_eq!(f & NF, 0);
            }
        }
    }

    /// Binary subtract then DAA must equal decimal subtract for every BCD pair.
    #[test]
    fn sub_then_daa_is_decimal_subtraction() {
        for x in 0..100u8 {
            for y in 0..100u8 {
                let bx = (x / 10) << 4 | (x % 10);
                let by = (y / 10) << 4 | (y % 10);
                let diff = alu::sub8(bx, by, false);
                let (a, f) = daa(diff.value, diff.flags);
                let expected = (100 + u16::from(x) - u16::from(y)) % 100;
                let expected = expected as u8;
                assert_eq!(a, (expected / 10) << 4 | (expected % 10), "{x} - {y}");
                assert_eq!(f & CF != 0, x < y, "borrow for {x} - {y}");
                assert_ne!(f & NF, 0);
            }
        }
    }

    /// INC/DEC then DAA keeps BCD counting correct (carry is untouched by
    /// INC/DEC, so it starts clear).
    #[test]
    fn inc_dec_then_daa_count_in_decimal() {
        for x in 0..99u8 {
            let bx = (x / 10) << 4 | (x % 10);
            let inc = alu::inc8(bx);
            let (a, _) = daa(inc.value, inc.flags);
            let next = x + 1;
            assert_eq!(a, (next / 10) << 4 | (next % 10), "{x} + 1");
        }
        for x in 1..100u8 {
            let bx = (x / 10) << 4 | (x % 10);
            let dec = alu::dec8(bx);
            let (a, _) = daa(dec.value, dec.flags);
            let prev = x - 1;
            assert_eq!(a, (prev / 10) << 4 | (prev % 10), "{x} - 1");
        }
    }

    #[test]
    fn documented_rows() {
        // ADD, C=0, upper 0-9, H=1, lower 0-3: add 06
        assert_eq!(daa(0x12, HF).0, 0x18);
        // ADC, C=0, upper 9-F, lower A-F: add 66, C after
        let (a, f) = daa(0x9A, 0);
        assert_eq!(a, 0x00);
        assert_eq!(f & (CF | ZF | PF), CF | ZF | PF);
        // SBC, C=0, upper 0-8, H=1, lower 6-F: add FA
        assert_eq!(daa(0x0F, NF | HF).0, 0x09);
        // DEC, C=1, upper 7-F, H=0, lower 0-9: add A0
        let (a, f) = daa(0x75, NF | CF);
        assert_eq!(a, 0x15);
        assert_ne!(f & CF, 0);
        // NEG, C=1, upper 6-7, H=1, lower 6-F: add 9A
        assert_eq!(daa(0x66, NF | CF | HF).0, 0x00);
    }
}
