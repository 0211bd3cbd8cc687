//! Construction-time options.

/// Silicon family. Only `OUT (C),0` differs between them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Original NMOS part: `OUT (C),0` drives 0x00.
    #[default]
    Nmos,
    /// CMOS part: `OUT (C),0` drives 0xFF.
    Cmos,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub variant: Variant,
}

impl Config {
    #[must_use]
    pub const fn new(variant: Variant) -> Self {
        Self { variant }
    }

    /// Byte driven by the undocumented `OUT (C),0`.
    #[must_use]
    pub const fn out_zero_value(&self) -> u8 {
        match self.variant {
            Variant::Nmos => 0x00,
            Variant::Cmos => 0xFF,
        }
    }
}
