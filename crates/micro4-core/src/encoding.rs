/// Operand form carried after the opcode nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OperandKind {
    /// Operand nibble is ignored.
    None,
    /// Operand nibble is a 4-bit immediate.
    Immediate,
    /// Instruction is followed by an 8-bit address (two nibbles, high first).
    Address,
}

impl OperandKind {
    /// Instruction length in memory cells for this operand form.
    #[must_use]
    pub const fn instruction_cells(self) -> u8 {
        match self {
            Self::None | Self::Immediate => 2,
            Self::Address => 4,
        }
    }
}

/// Micro4 opcodes (high nibble of the instruction byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Opcode {
    /// Stop execution.
    Hlt = 0x0,
    /// `A <- M[addr]`.
    Lda = 0x1,
    /// `M[addr] <- A`.
    Sta = 0x2,
    /// `A <- A + M[addr]`.
    Add = 0x3,
    /// `A <- A - M[addr]`.
    Sub = 0x4,
    /// `PC <- addr`.
    Jmp = 0x5,
    /// `PC <- addr` when the zero flag is set.
    Jz = 0x6,
    /// `A <- imm`.
    Ldi = 0x7,
}

impl Opcode {
    /// Every assigned opcode in nibble order.
    pub const ALL: [Self; 8] = [
        Self::Hlt,
        Self::Lda,
        Self::Sta,
        Self::Add,
        Self::Sub,
        Self::Jmp,
        Self::Jz,
        Self::Ldi,
    ];

    /// Converts an opcode nibble into an assigned opcode.
    #[must_use]
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Self::Hlt),
            0x1 => Some(Self::Lda),
            0x2 => Some(Self::Sta),
            0x3 => Some(Self::Add),
            0x4 => Some(Self::Sub),
            0x5 => Some(Self::Jmp),
            0x6 => Some(Self::Jz),
            0x7 => Some(Self::Ldi),
            _ => None,
        }
    }

    /// Opcode nibble value.
    #[must_use]
    pub const fn nibble(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Hlt => "HLT",
            Self::Lda => "LDA",
            Self::Sta => "STA",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Jmp => "JMP",
            Self::Jz => "JZ",
            Self::Ldi => "LDI",
        }
    }

    /// Operand form for this opcode.
    #[must_use]
    pub const fn operand_kind(self) -> OperandKind {
        match self {
            Self::Hlt => OperandKind::None,
            Self::Ldi => OperandKind::Immediate,
            Self::Lda | Self::Sta | Self::Add | Self::Sub | Self::Jmp | Self::Jz => {
                OperandKind::Address
            }
        }
    }
}

/// Single source-of-truth opcode table: nibble, opcode, mnemonic.
///
/// Any nibble not present here is an invalid opcode.
pub const OPCODE_TABLE: &[(u8, Opcode, &str)] = &[
    (0x0, Opcode::Hlt, "HLT"),
    (0x1, Opcode::Lda, "LDA"),
    (0x2, Opcode::Sta, "STA"),
    (0x3, Opcode::Add, "ADD"),
    (0x4, Opcode::Sub, "SUB"),
    (0x5, Opcode::Jmp, "JMP"),
    (0x6, Opcode::Jz, "JZ"),
    (0x7, Opcode::Ldi, "LDI"),
];

/// Splits an instruction byte into `(opcode nibble, operand nibble)`.
#[must_use]
pub const fn split_instruction_byte(byte: u8) -> (u8, u8) {
    ((byte >> 4) & 0x0F, byte & 0x0F)
}

/// Packs two nibbles, high first, into one byte.
#[must_use]
pub const fn pack_nibbles(high: u8, low: u8) -> u8 {
    ((high & 0x0F) << 4) | (low & 0x0F)
}
