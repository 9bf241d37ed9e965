/// Mask applied to the 4-bit accumulator and memory data register.
pub const NIBBLE_MASK: u8 = 0x0F;

/// Architecturally visible Micro4 register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Registers {
    pc: u8,
    acc: u8,
    zero: bool,
    ir: u8,
    mar: u8,
    mdr: u8,
}

impl Registers {
    /// Program counter.
    #[must_use]
    pub const fn pc(&self) -> u8 {
        self.pc
    }

    pub(crate) const fn set_pc(&mut self, value: u8) {
        self.pc = value;
    }

    /// Accumulator (4-bit).
    #[must_use]
    pub const fn acc(&self) -> u8 {
        self.acc
    }

    /// Writes the accumulator and recomputes the zero flag.
    pub(crate) const fn set_acc(&mut self, value: u8) {
        self.acc = value & NIBBLE_MASK;
        self.zero = self.acc == 0;
    }

    /// Zero flag.
    #[must_use]
    pub const fn zero(&self) -> bool {
        self.zero
    }

    /// Instruction register (`opcode << 4 | operand`).
    #[must_use]
    pub const fn ir(&self) -> u8 {
        self.ir
    }

    pub(crate) const fn set_ir(&mut self, value: u8) {
        self.ir = value;
    }

    /// Memory address register.
    #[must_use]
    pub const fn mar(&self) -> u8 {
        self.mar
    }

    pub(crate) const fn set_mar(&mut self, value: u8) {
        self.mar = value;
    }

    /// Memory data register (4-bit).
    #[must_use]
    pub const fn mdr(&self) -> u8 {
        self.mdr
    }

    pub(crate) const fn set_mdr(&mut self, value: u8) {
        self.mdr = value & NIBBLE_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::Registers;

    #[test]
    fn default_register_file_is_zeroed() {
        let regs = Registers::default();
        assert_eq!(regs.pc(), 0);
        assert_eq!(regs.acc(), 0);
        assert!(!regs.zero());
        assert_eq!((regs.ir(), regs.mar(), regs.mdr()), (0, 0, 0));
    }

    #[test]
    fn accumulator_writes_mask_and_track_zero() {
        let mut regs = Registers::default();
        regs.set_acc(0x13);
        assert_eq!(regs.acc(), 0x3);
        assert!(!regs.zero());
        regs.set_acc(0x10);
        assert_eq!(regs.acc(), 0);
        assert!(regs.zero());
    }

    #[test]
    fn mdr_is_masked_to_a_nibble() {
        let mut regs = Registers::default();
        regs.set_mdr(0xFE);
        assert_eq!(regs.mdr(), 0xE);
    }
}
