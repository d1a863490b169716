//! The erased calling-convention alphabet.

use crate::Ty;

/// Basic type of a name in a form.
///
/// Ordinals are stable and small (they are packed into transform keys).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[repr(u8)]
pub enum BasicType {
    /// Any reference.
    L = 0,
    /// `int` and every subword primitive (`boolean`, `byte`, `short`, `char`).
    I = 1,
    J = 2,
    F = 3,
    D = 4,
    /// No value. Only valid as a result type.
    V = 5,
}

/// Basic types that can be carried by a parameter.
pub const ARG_TYPES: [BasicType; 5] = [
    BasicType::L,
    BasicType::I,
    BasicType::J,
    BasicType::F,
    BasicType::D,
];

impl BasicType {
    pub const ALL: [BasicType; 6] = [
        BasicType::L,
        BasicType::I,
        BasicType::J,
        BasicType::F,
        BasicType::D,
        BasicType::V,
    ];

    /// Number of distinct basic types; wrapper keys start here.
    pub const LIMIT: u8 = 6;

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Single-letter code used in dumps and species keys.
    pub fn char(self) -> char {
        match self {
            BasicType::L => 'L',
            BasicType::I => 'I',
            BasicType::J => 'J',
            BasicType::F => 'F',
            BasicType::D => 'D',
            BasicType::V => 'V',
        }
    }

    /// Parse a basic type letter. Subword descriptor letters fold to `I`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'L' => Some(BasicType::L),
            'I' | 'Z' | 'B' | 'S' | 'C' => Some(BasicType::I),
            'J' => Some(BasicType::J),
            'F' => Some(BasicType::F),
            'D' => Some(BasicType::D),
            'V' => Some(BasicType::V),
            _ => None,
        }
    }

    /// Interpreter slots occupied by a value of this type.
    #[inline]
    pub fn slots(self) -> usize {
        match self {
            BasicType::J | BasicType::D => 2,
            BasicType::V => 0,
            _ => 1,
        }
    }

    #[inline]
    pub fn is_double_width(self) -> bool {
        self.slots() == 2
    }

    #[inline]
    pub fn is_arg(self) -> bool {
        self != BasicType::V
    }

    /// Basic type of a language type; subword primitives fold to `I`.
    pub fn from_ty(ty: &Ty) -> Self {
        ty.basic_type()
    }

    /// The language type that represents this basic type.
    pub fn ty(self) -> Ty {
        match self {
            BasicType::L => Ty::object(),
            BasicType::I => Ty::Int,
            BasicType::J => Ty::Long,
            BasicType::F => Ty::Float,
            BasicType::D => Ty::Double,
            BasicType::V => Ty::Void,
        }
    }

    /// Render a list of basic types as letters, e.g. `"LLI"`.
    pub fn chars(types: &[BasicType]) -> String {
        types.iter().map(|t| t.char()).collect()
    }

    /// Parse letters into basic types. Returns `None` on any unknown letter.
    pub fn parse_chars(s: &str) -> Option<Vec<BasicType>> {
        s.chars().map(BasicType::from_char).collect()
    }
}

impl std::fmt::Display for BasicType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.char())
    }
}
