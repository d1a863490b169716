//! Runtime values manipulated by forms.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use linkform_compiler::Constant;
use linkform_core::{BasicType, ClassKey, MethodType, Ty};

use super::direct::MemberName;
use super::error::{Result, RuntimeError};
use super::handle::MethodHandle;

/// A value flowing through a form.
///
/// Subword primitives travel as `Int`, the way forms see them. Reference
/// variants compare by identity except strings and method types.
#[derive(Clone)]
pub enum Value {
    /// Result of an expression that produces nothing.
    Void,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Str(Arc<str>),
    Array(Arc<Array>),
    Handle(Arc<MethodHandle>),
    Type(MethodType),
    Member(Arc<MemberName>),
    Class(ClassKey),
    Object(Arc<Instance>),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    pub fn array(element: Ty, values: Vec<Value>) -> Self {
        Value::Array(Arc::new(Array { element, values }))
    }

    pub fn basic_type(&self) -> BasicType {
        match self {
            Value::Void => BasicType::V,
            Value::Int(_) => BasicType::I,
            Value::Long(_) => BasicType::J,
            Value::Float(_) => BasicType::F,
            Value::Double(_) => BasicType::D,
            Value::Null
            | Value::Str(_)
            | Value::Array(_)
            | Value::Handle(_)
            | Value::Type(_)
            | Value::Member(_)
            | Value::Class(_)
            | Value::Object(_) => BasicType::L,
        }
    }

    /// Default value of a basic type: zero, or `null` for references.
    pub fn zero(bt: BasicType) -> Self {
        match bt {
            BasicType::L => Value::Null,
            BasicType::I => Value::Int(0),
            BasicType::J => Value::Long(0),
            BasicType::F => Value::Float(0.0),
            BasicType::D => Value::Double(0.0),
            BasicType::V => Value::Void,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Null => "null",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Handle(_) => "method handle",
            Value::Type(_) => "method type",
            Value::Member(_) => "member",
            Value::Class(_) => "class",
            Value::Object(_) => "object",
        }
    }

    fn cast_error(&self, expected: &'static str) -> RuntimeError {
        if self.is_null() {
            return RuntimeError::NullPointer {
                operation: expected,
            };
        }
        RuntimeError::ClassCast {
            expected,
            found: self.type_name().to_string(),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            other => Err(other.cast_error("int")),
        }
    }

    pub fn as_long(&self) -> Result<i64> {
        match self {
            Value::Long(v) => Ok(*v),
            other => Err(other.cast_error("long")),
        }
    }

    pub fn as_handle(&self) -> Result<&Arc<MethodHandle>> {
        match self {
            Value::Handle(h) => Ok(h),
            other => Err(other.cast_error("method handle")),
        }
    }

    pub fn as_type(&self) -> Result<&MethodType> {
        match self {
            Value::Type(t) => Ok(t),
            other => Err(other.cast_error("method type")),
        }
    }

    pub fn as_member(&self) -> Result<&Arc<MemberName>> {
        match self {
            Value::Member(m) => Ok(m),
            other => Err(other.cast_error("member")),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.cast_error("string")),
        }
    }

    pub fn as_object(&self) -> Result<&Arc<Instance>> {
        match self {
            Value::Object(o) => Ok(o),
            other => Err(other.cast_error("object")),
        }
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Int(v) => Value::Int(*v),
            Constant::Long(v) => Value::Long(*v),
            Constant::Float(v) => Value::Float(*v),
            Constant::Double(v) => Value::Double(*v),
            Constant::Str(s) => Value::Str(Arc::clone(s)),
            Constant::MethodType(mt) => Value::Type(mt.clone()),
            Constant::Class(c) => Value::Class(c.clone()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Handle(a), Value::Handle(b)) => Arc::ptr_eq(a, b),
            (Value::Member(a), Value::Member(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Float(v) => write!(f, "{v:?}F"),
            Value::Double(v) => write!(f, "{v:?}D"),
            Value::Null => f.write_str("null"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Array(a) => {
                write!(f, "{}[", a.element)?;
                for (i, v) in a.values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Handle(h) => write!(f, "MethodHandle{}", h.ty()),
            Value::Type(t) => write!(f, "{t}"),
            Value::Member(m) => write!(f, "{m}"),
            Value::Class(c) => write!(f, "{c}.class"),
            Value::Object(o) => write!(f, "{}@{:x}", o.class(), Arc::as_ptr(o) as usize),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A fixed-length array with a declared element type.
pub struct Array {
    element: Ty,
    values: Vec<Value>,
}

impl Array {
    pub fn element_type(&self) -> &Ty {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: i64) -> Result<&Value> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .ok_or(RuntimeError::IndexOutOfBounds {
                index,
                length: self.values.len(),
            })
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// An object allocated by the host, with named mutable fields.
pub struct Instance {
    class: ClassKey,
    fields: RwLock<IndexMap<String, Value>>,
}

impl Instance {
    pub fn new(class: ClassKey) -> Self {
        Self {
            class,
            fields: RwLock::new(IndexMap::new()),
        }
    }

    pub fn class(&self) -> &ClassKey {
        &self.class
    }

    /// Field value, or `null` if never set.
    pub fn field(&self, name: &str) -> Value {
        let fields = self.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn set_field(&self, name: &str, value: Value) {
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        fields.insert(name.to_string(), value);
    }

    /// Field names in first-assignment order.
    pub fn field_names(&self) -> Vec<String> {
        let fields = self.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields.keys().cloned().collect()
    }
}
