//! Language-level types.

use std::fmt;
use std::sync::Arc;

use crate::BasicType;

/// Stable identity of a class.
///
/// Cheap to clone; compares and hashes by name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey(Arc<str>);

impl ClassKey {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The root reference type every reference erases to.
    pub fn object() -> Self {
        Self::new(Ty::OBJECT)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_object(&self) -> bool {
        &*self.0 == Ty::OBJECT
    }
}

impl fmt::Debug for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parameter or return type as written in a signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Ref(ClassKey),
    Array(Arc<Ty>),
}

impl Ty {
    pub const OBJECT: &'static str = "Object";

    pub fn object() -> Self {
        Ty::Ref(ClassKey::object())
    }

    pub fn class(name: &str) -> Self {
        Ty::Ref(ClassKey::new(name))
    }

    pub fn array_of(element: Ty) -> Self {
        Ty::Array(Arc::new(element))
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self, Ty::Void)
    }

    /// Primitives include `void`, as in the host VM's reflection.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        !self.is_reference()
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Ref(_) | Ty::Array(_))
    }

    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Ty::Ref(c) if c.is_object())
    }

    /// Primitives narrower than `int`.
    #[inline]
    pub fn is_subword(&self) -> bool {
        matches!(self, Ty::Boolean | Ty::Byte | Ty::Short | Ty::Char)
    }

    #[inline]
    pub fn is_double_width(&self) -> bool {
        matches!(self, Ty::Long | Ty::Double)
    }

    pub fn basic_type(&self) -> BasicType {
        match self {
            Ty::Void => BasicType::V,
            Ty::Boolean | Ty::Byte | Ty::Short | Ty::Char | Ty::Int => BasicType::I,
            Ty::Long => BasicType::J,
            Ty::Float => BasicType::F,
            Ty::Double => BasicType::D,
            Ty::Ref(_) | Ty::Array(_) => BasicType::L,
        }
    }

    /// Fold every reference type to `Object`; primitives are unchanged.
    pub fn erase(&self) -> Ty {
        if self.is_reference() {
            Ty::object()
        } else {
            self.clone()
        }
    }

    /// Erase, then fold subword primitives to `int`.
    pub fn basic(&self) -> Ty {
        self.basic_type().ty()
    }

    pub fn component_type(&self) -> Option<&Ty> {
        match self {
            Ty::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Single descriptor letter (`L` for every reference, `[` prefix is not used).
    pub fn descriptor_char(&self) -> char {
        match self {
            Ty::Void => 'V',
            Ty::Boolean => 'Z',
            Ty::Byte => 'B',
            Ty::Short => 'S',
            Ty::Char => 'C',
            Ty::Int => 'I',
            Ty::Long => 'J',
            Ty::Float => 'F',
            Ty::Double => 'D',
            Ty::Ref(_) | Ty::Array(_) => 'L',
        }
    }

    /// Parse a readable type name: `int`, `Object`, `String[]`.
    pub fn parse_word(word: &str) -> Option<Ty> {
        let word = word.trim();
        if word.is_empty() {
            return None;
        }
        if let Some(elem) = word.strip_suffix("[]") {
            return Ty::parse_word(elem).filter(|t| !t.is_void()).map(Ty::array_of);
        }
        let ty = match word {
            "void" => Ty::Void,
            "boolean" => Ty::Boolean,
            "byte" => Ty::Byte,
            "short" => Ty::Short,
            "char" => Ty::Char,
            "int" => Ty::Int,
            "long" => Ty::Long,
            "float" => Ty::Float,
            "double" => Ty::Double,
            name if name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') => {
                Ty::class(name)
            }
            _ => return None,
        };
        Some(ty)
    }

    /// Parse one descriptor letter (with optional `[` prefixes).
    pub fn parse_descriptor(desc: &str) -> Option<Ty> {
        if let Some(rest) = desc.strip_prefix('[') {
            return Ty::parse_descriptor(rest)
                .filter(|t| !t.is_void())
                .map(Ty::array_of);
        }
        let ty = match desc {
            "L" => Ty::object(),
            "V" => Ty::Void,
            "Z" => Ty::Boolean,
            "B" => Ty::Byte,
            "S" => Ty::Short,
            "C" => Ty::Char,
            "I" => Ty::Int,
            "J" => Ty::Long,
            "F" => Ty::Float,
            "D" => Ty::Double,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => f.write_str("void"),
            Ty::Boolean => f.write_str("boolean"),
            Ty::Byte => f.write_str("byte"),
            Ty::Short => f.write_str("short"),
            Ty::Char => f.write_str("char"),
            Ty::Int => f.write_str("int"),
            Ty::Long => f.write_str("long"),
            Ty::Float => f.write_str("float"),
            Ty::Double => f.write_str("double"),
            Ty::Ref(class) => write!(f, "{class}"),
            Ty::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

impl fmt::Debug for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
