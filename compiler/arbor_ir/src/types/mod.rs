//! Static and runtime type descriptors.
//!
//! Every node carries a `Type` (its `value_type`), and every runtime value
//! reports one through `Value::runtime_type`. The evaluator only consults
//! types to pick a rule (numeric kind, instance-of checks for handlers and
//! casts, zero values); no inference happens here.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// A type in the hosted type system.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// No value (statements, void method calls).
    Void,
    /// The top reference type; every value is an instance of it.
    Object,
    Bool,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    Str,
    /// Single-dimension array with the given element type.
    Array(Arc<Type>),
    /// Growable list with the given element type.
    List(Arc<Type>),
    /// Callable delegate with a fixed signature.
    Function(Arc<FunctionType>),
    /// A host class (user object or exception).
    Class(ClassType),
    /// A quoted expression tree.
    Expr,
}

/// Numeric kinds the native operator rules dispatch on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
}

impl NumericKind {
    /// Whether this is one of the eight integer kinds.
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64 | Self::Decimal)
    }

    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
    }

    pub fn to_type(self) -> Type {
        match self {
            Self::Int8 => Type::Int8,
            Self::UInt8 => Type::UInt8,
            Self::Int16 => Type::Int16,
            Self::UInt16 => Type::UInt16,
            Self::Int32 => Type::Int32,
            Self::UInt32 => Type::UInt32,
            Self::Int64 => Type::Int64,
            Self::UInt64 => Type::UInt64,
            Self::Float32 => Type::Float32,
            Self::Float64 => Type::Float64,
            Self::Decimal => Type::Decimal,
        }
    }
}

impl Type {
    pub fn array_of(element: Type) -> Self {
        Type::Array(Arc::new(element))
    }

    pub fn list_of(element: Type) -> Self {
        Type::List(Arc::new(element))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Self {
        Type::Function(Arc::new(FunctionType::new(params, ret)))
    }

    /// The numeric kind of this type, if it has one.
    pub fn numeric_kind(&self) -> Option<NumericKind> {
        Some(match self {
            Type::Int8 => NumericKind::Int8,
            Type::UInt8 => NumericKind::UInt8,
            Type::Int16 => NumericKind::Int16,
            Type::UInt16 => NumericKind::UInt16,
            Type::Int32 => NumericKind::Int32,
            Type::UInt32 => NumericKind::UInt32,
            Type::Int64 => NumericKind::Int64,
            Type::UInt64 => NumericKind::UInt64,
            Type::Float32 => NumericKind::Float32,
            Type::Float64 => NumericKind::Float64,
            Type::Decimal => NumericKind::Decimal,
            _ => return None,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_kind().is_some()
    }

    pub fn is_integer(&self) -> bool {
        self.numeric_kind().is_some_and(NumericKind::is_integer)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    /// Reference types default to null and may hold null.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Object
                | Type::Str
                | Type::Array(_)
                | Type::List(_)
                | Type::Function(_)
                | Type::Class(_)
                | Type::Expr
        )
    }

    /// Element type of an array or list.
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(elem) | Type::List(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Whether a value of type `other` may be stored where `self` is expected.
    ///
    /// Identity, `Object` accepting everything, and class inheritance. No
    /// numeric widening: those go through an explicit `Convert` node.
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Object, _) => !other.is_void(),
            (Type::Class(target), Type::Class(source)) => source.is_subclass_of(target),
            _ => false,
        }
    }

    /// Whether this type names an exception class (or `Object`, which
    /// catches everything).
    pub fn is_catchable(&self) -> bool {
        match self {
            Type::Object => true,
            Type::Class(class) => class.is_exception(),
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::Object => f.write_str("object"),
            Type::Bool => f.write_str("bool"),
            Type::Char => f.write_str("char"),
            Type::Int8 => f.write_str("i8"),
            Type::UInt8 => f.write_str("u8"),
            Type::Int16 => f.write_str("i16"),
            Type::UInt16 => f.write_str("u16"),
            Type::Int32 => f.write_str("i32"),
            Type::UInt32 => f.write_str("u32"),
            Type::Int64 => f.write_str("i64"),
            Type::UInt64 => f.write_str("u64"),
            Type::Float32 => f.write_str("f32"),
            Type::Float64 => f.write_str("f64"),
            Type::Decimal => f.write_str("decimal"),
            Type::Str => f.write_str("str"),
            Type::Array(elem) => write!(f, "{elem}[]"),
            Type::List(elem) => write!(f, "List<{elem}>"),
            Type::Function(sig) => write!(f, "{sig}"),
            Type::Class(class) => f.write_str(class.name()),
            Type::Expr => f.write_str("Expr"),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Signature of a delegate: ordered parameter types and a return type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionType {
    params: Vec<Type>,
    ret: Type,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }

    pub fn params(&self) -> &[Type] {
        &self.params
    }

    pub fn ret(&self) -> &Type {
        &self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") -> {}", self.ret)
    }
}

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

struct ClassInfo {
    id: u64,
    name: String,
    base: Option<ClassType>,
}

/// A nominal class with single inheritance.
///
/// Equality is identity: two classes declared with the same name are
/// distinct types.
#[derive(Clone)]
pub struct ClassType(Arc<ClassInfo>);

impl ClassType {
    /// Declare a new class deriving from `base` (or from nothing).
    pub fn new(name: impl Into<String>, base: Option<&ClassType>) -> Self {
        ClassType(Arc::new(ClassInfo {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            base: base.cloned(),
        }))
    }

    /// Declare a new exception class deriving from `base`, or from the
    /// root `Exception` class when `base` is `None`.
    pub fn exception(name: impl Into<String>, base: Option<&ClassType>) -> Self {
        Self::new(name, Some(base.unwrap_or(BuiltinClass::Exception.class())))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn base(&self) -> Option<&ClassType> {
        self.0.base.as_ref()
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_subclass_of(&self, other: &ClassType) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.base();
        }
        false
    }

    pub fn is_exception(&self) -> bool {
        self.is_subclass_of(BuiltinClass::Exception.class())
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for ClassType {}

impl Hash for ClassType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}#{}", self.0.name, self.0.id)
    }
}

/// Exception classes raised by the interpreter and the host adapters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinClass {
    /// Root of every exception class.
    Exception,
    /// Null receiver, null delegate, rethrow outside a handler.
    InvalidOperation,
    /// Throwing or unboxing null.
    NullReference,
    IndexOutOfRange,
    DivideByZero,
    /// Checked arithmetic, checked conversions, negative array sizes.
    Overflow,
    /// Reference conversion to an incompatible type.
    InvalidCast,
}

static EXCEPTION: LazyLock<ClassType> = LazyLock::new(|| ClassType::new("Exception", None));
static INVALID_OPERATION: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("InvalidOperationException", Some(&*EXCEPTION)));
static NULL_REFERENCE: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("NullReferenceException", Some(&*EXCEPTION)));
static INDEX_OUT_OF_RANGE: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("IndexOutOfRangeException", Some(&*EXCEPTION)));
static ARITHMETIC: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("ArithmeticException", Some(&*EXCEPTION)));
static DIVIDE_BY_ZERO: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("DivideByZeroException", Some(&*ARITHMETIC)));
static OVERFLOW: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("OverflowException", Some(&*ARITHMETIC)));
static INVALID_CAST: LazyLock<ClassType> =
    LazyLock::new(|| ClassType::new("InvalidCastException", Some(&*EXCEPTION)));

impl BuiltinClass {
    pub fn class(self) -> &'static ClassType {
        match self {
            Self::Exception => &*EXCEPTION,
            Self::InvalidOperation => &*INVALID_OPERATION,
            Self::NullReference => &*NULL_REFERENCE,
            Self::IndexOutOfRange => &*INDEX_OUT_OF_RANGE,
            Self::DivideByZero => &*DIVIDE_BY_ZERO,
            Self::Overflow => &*OVERFLOW,
            Self::InvalidCast => &*INVALID_CAST,
        }
    }

    pub fn to_type(self) -> Type {
        Type::Class(self.class().clone())
    }

    /// Shared base of `DivideByZero` and `Overflow`.
    pub fn arithmetic() -> &'static ClassType {
        &*ARITHMETIC
    }
}
