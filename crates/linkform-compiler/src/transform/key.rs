//! Transform keys: compact, hashable descriptions of an edit.

use std::fmt;

/// The edit a key describes. Ordinals are stable and never zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransformKind {
    BindArg = 1,
    AddArg = 2,
    DupArg = 3,
    SpreadArgs = 4,
    FilterArg = 5,
    FilterReturn = 6,
    FilterReturnToZero = 7,
    CollectArgs = 8,
    CollectArgsToVoid = 9,
    FoldArgs = 10,
    FoldArgsToVoid = 11,
    PermuteArgs = 12,
}

impl TransformKind {
    const ALL: [TransformKind; 12] = [
        TransformKind::BindArg,
        TransformKind::AddArg,
        TransformKind::DupArg,
        TransformKind::SpreadArgs,
        TransformKind::FilterArg,
        TransformKind::FilterReturn,
        TransformKind::FilterReturnToZero,
        TransformKind::CollectArgs,
        TransformKind::CollectArgsToVoid,
        TransformKind::FoldArgs,
        TransformKind::FoldArgsToVoid,
        TransformKind::PermuteArgs,
    ];

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Self::ALL.get(ordinal.checked_sub(1)? as usize).copied()
    }
}

/// Nibbles available in the packed form; the top nibble holds the length.
const PACKED_MAX_LEN: usize = 15;
const NIBBLE: u32 = 4;
const NIBBLE_MASK: u8 = 0x0F;

/// A kind byte followed by operand bytes.
///
/// Keys whose bytes all fit in a nibble are packed into a `u64`; the rest
/// keep the byte array. Packing is canonical, so derived equality and
/// hashing agree across both representations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TransformKey {
    Packed(u64),
    Bytes(Box<[u8]>),
}

impl TransformKey {
    pub fn new(kind: TransformKind, operands: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(operands.len() + 1);
        bytes.push(kind as u8);
        bytes.extend_from_slice(operands);
        Self::from_bytes(bytes)
    }

    /// Key for an edit whose operands are small integers (positions, ordinals).
    ///
    /// # Panics
    /// If an operand does not fit in a byte.
    pub fn of(kind: TransformKind, operands: &[usize]) -> Self {
        let bytes: Vec<u8> = operands
            .iter()
            .map(|&v| u8::try_from(v).unwrap_or_else(|_| panic!("operand {v} of {kind:?}")))
            .collect();
        Self::new(kind, &bytes)
    }

    fn from_bytes(bytes: Vec<u8>) -> Self {
        match pack(&bytes) {
            Some(packed) => TransformKey::Packed(packed),
            None => TransformKey::Bytes(bytes.into_boxed_slice()),
        }
    }

    /// The key's bytes, kind first.
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            TransformKey::Packed(packed) => {
                let len = (packed >> (NIBBLE * PACKED_MAX_LEN as u32)) as usize;
                (0..len)
                    .map(|i| ((packed >> (NIBBLE * i as u32)) as u8) & NIBBLE_MASK)
                    .collect()
            }
            TransformKey::Bytes(bytes) => bytes.to_vec(),
        }
    }

    pub fn kind(&self) -> TransformKind {
        let first = match self {
            TransformKey::Packed(packed) => (*packed as u8) & NIBBLE_MASK,
            TransformKey::Bytes(bytes) => bytes[0],
        };
        TransformKind::from_ordinal(first)
            .unwrap_or_else(|| unreachable!("keys always start with a kind"))
    }

    pub fn is_packed(&self) -> bool {
        matches!(self, TransformKey::Packed(_))
    }
}

fn pack(bytes: &[u8]) -> Option<u64> {
    if bytes.len() > PACKED_MAX_LEN || bytes.iter().any(|b| b & !NIBBLE_MASK != 0) {
        return None;
    }
    let mut packed = (bytes.len() as u64) << (NIBBLE * PACKED_MAX_LEN as u32);
    for (i, &b) in bytes.iter().enumerate() {
        packed |= (b as u64) << (NIBBLE * i as u32);
    }
    Some(packed)
}

impl fmt::Debug for TransformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.bytes();
        write!(f, "{:?}{:?}", self.kind(), &bytes[1..])
    }
}
