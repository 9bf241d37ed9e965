//! Three-valued logic used on every wire bit.
//!
//! `Undefined` models an unknown level. Controlling values win over it: a
//! definite `0` on any AND input forces `0`, a definite `1` on any OR input
//! forces `1`. XOR has no controlling value, so any unknown input makes the
//! result unknown.

use std::fmt;

/// A single wire level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bit {
    /// Logic low.
    #[default]
    Zero,
    /// Logic high.
    One,
    /// Unknown level.
    Undefined,
}

impl Bit {
    /// Converts a definite boolean level.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value {
            Self::One
        } else {
            Self::Zero
        }
    }

    /// The definite level, or `None` when undefined.
    #[must_use]
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Self::Zero => Some(false),
            Self::One => Some(true),
            Self::Undefined => None,
        }
    }

    /// True for `Zero` and `One`.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Single-character rendering: `0`, `1` or `X`.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Zero => '0',
            Self::One => '1',
            Self::Undefined => 'X',
        }
    }

    /// Inversion; unknown stays unknown.
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
            Self::Undefined => Self::Undefined,
        }
    }

    /// Two-input AND.
    #[must_use]
    pub const fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Zero, _) | (_, Self::Zero) => Self::Zero,
            (Self::One, Self::One) => Self::One,
            _ => Self::Undefined,
        }
    }

    /// Two-input OR.
    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::One, _) | (_, Self::One) => Self::One,
            (Self::Zero, Self::Zero) => Self::Zero,
            _ => Self::Undefined,
        }
    }

    /// Two-input XOR.
    #[must_use]
    pub const fn xor(self, other: Self) -> Self {
        match (self, other) {
            (Self::Undefined, _) | (_, Self::Undefined) => Self::Undefined,
            (Self::Zero, Self::Zero) | (Self::One, Self::One) => Self::Zero,
            _ => Self::One,
        }
    }
}

impl std::ops::Not for Bit {
    type Output = Self;

    fn not(self) -> Self {
        self.invert()
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// N-input AND; an empty input list is `One`.
pub fn and_all(inputs: impl IntoIterator<Item = Bit>) -> Bit {
    inputs.into_iter().fold(Bit::One, Bit::and)
}

/// N-input OR; an empty input list is `Zero`.
pub fn or_all(inputs: impl IntoIterator<Item = Bit>) -> Bit {
    inputs.into_iter().fold(Bit::Zero, Bit::or)
}

/// N-input XOR (odd parity); an empty input list is `Zero`.
pub fn xor_all(inputs: impl IntoIterator<Item = Bit>) -> Bit {
    inputs.into_iter().fold(Bit::Zero, Bit::xor)
}
