//! Runtime values.
//!
//! Scalars are stored inline. Strings are immutable `Arc<str>`. Arrays,
//! lists and objects are reference types: cloning a `Value` clones the
//! `Arc`, and mutation through one clone (array store, list add, field set)
//! is visible through every other. This is what lets `ListBinding` and
//! nested `MemberBinding` mutate a member object in place.
//!
//! # Thread Safety
//!
//! Every heap value uses `Arc` plus `parking_lot::RwLock`, so values (and the
//! delegates that capture them) are `Send + Sync`. Separate calls to one
//! compiled callable may run on different threads.

mod delegate;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::node::Node;
use crate::types::{BuiltinClass, ClassType, NumericKind, Type};

pub use delegate::{Delegate, DelegateFn};

/// Field name under which exception objects store their message.
pub const MESSAGE_FIELD: &str = "Message";

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    /// The result of a void expression.
    Void,
    /// The null reference.
    Null,
    Bool(bool),
    Char(char),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Str(Arc<str>),
    Array(Arc<ArrayValue>),
    List(Arc<ListValue>),
    Object(Arc<ObjectValue>),
    Delegate(Delegate),
    /// A quoted expression tree.
    Expr(Node),
}

/// Fixed-length array; elements are mutable in place.
pub struct ArrayValue {
    element_type: Type,
    items: RwLock<Vec<Value>>,
}

impl ArrayValue {
    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Bounds-checked read.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Bounds-checked write. Returns `false` if `index` is out of range.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }
}

/// Growable list.
pub struct ListValue {
    element_type: Type,
    items: RwLock<Vec<Value>>,
}

impl ListValue {
    pub fn element_type(&self) -> &Type {
        &self.element_type
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn push(&self, value: Value) {
        self.items.write().push(value);
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.items.write().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read().clone()
    }
}

/// An instance of a host class: a class tag plus named fields.
pub struct ObjectValue {
    class: ClassType,
    fields: RwLock<FxHashMap<Arc<str>, Value>>,
}

impl ObjectValue {
    pub fn class(&self) -> &ClassType {
        &self.class
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.write().insert(Arc::from(name), value);
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.read().contains_key(name)
    }

    /// Field names in sorted order (for deterministic rendering).
    pub fn field_names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.fields.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(element_type: Type, items: Vec<Value>) -> Self {
        Value::Array(Arc::new(ArrayValue {
            element_type,
            items: RwLock::new(items),
        }))
    }

    pub fn list(element_type: Type, items: Vec<Value>) -> Self {
        Value::List(Arc::new(ListValue {
            element_type,
            items: RwLock::new(items),
        }))
    }

    /// A fresh object of `class` with the given fields.
    pub fn object<I, K>(class: &ClassType, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Arc<str>>,
    {
        let fields = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Arc::new(ObjectValue {
            class: class.clone(),
            fields: RwLock::new(fields),
        }))
    }

    /// A fresh exception object of `class` carrying `message`.
    pub fn exception(class: &ClassType, message: impl Into<Arc<str>>) -> Self {
        Self::object(class, [(MESSAGE_FIELD, Value::Str(message.into()))])
    }

    pub fn builtin_exception(class: BuiltinClass, message: impl Into<Arc<str>>) -> Self {
        Self::exception(class.class(), message)
    }

    /// The zero value of a type: `0` for numerics, `false`, `'\0'`, `null`
    /// for references and `void` for `Void`.
    pub fn zero(ty: &Type) -> Self {
        match ty {
            Type::Void => Value::Void,
            Type::Bool => Value::Bool(false),
            Type::Char => Value::Char('\0'),
            Type::Int8 => Value::Int8(0),
            Type::UInt8 => Value::UInt8(0),
            Type::Int16 => Value::Int16(0),
            Type::UInt16 => Value::UInt16(0),
            Type::Int32 => Value::Int32(0),
            Type::UInt32 => Value::UInt32(0),
            Type::Int64 => Value::Int64(0),
            Type::UInt64 => Value::UInt64(0),
            Type::Float32 => Value::Float32(0.0),
            Type::Float64 => Value::Float64(0.0),
            Type::Decimal => Value::Decimal(Decimal::ZERO),
            Type::Object
            | Type::Str
            | Type::Array(_)
            | Type::List(_)
            | Type::Function(_)
            | Type::Class(_)
            | Type::Expr => Value::Null,
        }
    }

    /// The dynamic type of this value. `Null` reports `Object`.
    pub fn runtime_type(&self) -> Type {
        match self {
            Value::Void => Type::Void,
            Value::Null => Type::Object,
            Value::Bool(_) => Type::Bool,
            Value::Char(_) => Type::Char,
            Value::Int8(_) => Type::Int8,
            Value::UInt8(_) => Type::UInt8,
            Value::Int16(_) => Type::Int16,
            Value::UInt16(_) => Type::UInt16,
            Value::Int32(_) => Type::Int32,
            Value::UInt32(_) => Type::UInt32,
            Value::Int64(_) => Type::Int64,
            Value::UInt64(_) => Type::UInt64,
            Value::Float32(_) => Type::Float32,
            Value::Float64(_) => Type::Float64,
            Value::Decimal(_) => Type::Decimal,
            Value::Str(_) => Type::Str,
            Value::Array(a) => Type::array_of(a.element_type().clone()),
            Value::List(l) => Type::list_of(l.element_type().clone()),
            Value::Object(o) => Type::Class(o.class().clone()),
            Value::Delegate(d) => Type::Function(Arc::clone(d.signature())),
            Value::Expr(_) => Type::Expr,
        }
    }

    /// Short name of the value's kind for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Int8(_) => "i8",
            Value::UInt8(_) => "u8",
            Value::Int16(_) => "i16",
            Value::UInt16(_) => "u16",
            Value::Int32(_) => "i32",
            Value::UInt32(_) => "u32",
            Value::Int64(_) => "i64",
            Value::UInt64(_) => "u64",
            Value::Float32(_) => "f32",
            Value::Float64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Delegate(_) => "delegate",
            Value::Expr(_) => "expr",
        }
    }

    pub fn numeric_kind(&self) -> Option<NumericKind> {
        Some(match self {
            Value::Int8(_) => NumericKind::Int8,
            Value::UInt8(_) => NumericKind::UInt8,
            Value::Int16(_) => NumericKind::Int16,
            Value::UInt16(_) => NumericKind::UInt16,
            Value::Int32(_) => NumericKind::Int32,
            Value::UInt32(_) => NumericKind::UInt32,
            Value::Int64(_) => NumericKind::Int64,
            Value::UInt64(_) => NumericKind::UInt64,
            Value::Float32(_) => NumericKind::Float32,
            Value::Float64(_) => NumericKind::Float64,
            Value::Decimal(_) => NumericKind::Decimal,
            _ => return None,
        })
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectValue>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether this value is an exception object.
    pub fn is_exception(&self) -> bool {
        self.as_object().is_some_and(|o| o.class().is_exception())
    }

    /// The `Message` field of an exception object.
    pub fn exception_message(&self) -> Option<String> {
        let message = self.as_object()?.get_field(MESSAGE_FIELD)?;
        Some(message.as_str()?.to_string())
    }

    /// Reference identity for heap values, value equality for everything
    /// else.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Delegate(a), Value::Delegate(b)) => a.ptr_eq(b),
            (Value::Expr(a), Value::Expr(b)) => a.same(b),
            _ => false,
        }
    }
}

/// Scalars and strings compare by value (same kind only; `Int32(1)` is not
/// equal to `Int64(1)`); heap values compare by reference.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::UInt8(a), Value::UInt8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::UInt16(a), Value::UInt16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::UInt32(a), Value::UInt32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::UInt64(a), Value::UInt64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => self.same_reference(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Int8(n) => write!(f, "{n}"),
            Value::UInt8(n) => write!(f, "{n}"),
            Value::Int16(n) => write!(f, "{n}"),
            Value::UInt16(n) => write!(f, "{n}"),
            Value::Int32(n) => write!(f, "{n}"),
            Value::UInt32(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::UInt64(n) => write!(f, "{n}"),
            Value::Float32(n) => write!(f, "{n}"),
            Value::Float64(n) => write!(f, "{n}"),
            Value::Decimal(n) => write!(f, "{n}"),
            Value::Str(s) => f.write_str(s),
            Value::Array(a) => {
                f.write_str("[")?;
                for (i, item) in a.to_vec().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::List(l) => write!(f, "List<{}>({})", l.element_type(), l.len()),
            Value::Object(o) => {
                if let Some(message) = self.exception_message() {
                    write!(f, "{}: {message}", o.class().name())
                } else {
                    write!(f, "{} {{ .. }}", o.class().name())
                }
            }
            Value::Delegate(d) => write!(f, "<delegate {}>", d.signature()),
            Value::Expr(node) => write!(f, "{node}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Void | Value::Null => fmt::Display::fmt(self, f),
            _ => write!(f, "{}({self})", self.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

#[cfg(test)]
mod tests;
