//! Leaf nodes and identity-keyed sentinels.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::BuildError;
use crate::types::Type;
use crate::value::Value;

static NEXT_PARAMETER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LABEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a parameter or block variable.
///
/// Two parameters with the same name and type are distinct slots; the
/// interpreter keys its environment frames on this id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ParameterId(u64);

impl ParameterId {
    fn fresh() -> Self {
        ParameterId(NEXT_PARAMETER_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A named, typed environment slot.
#[derive(Debug)]
pub struct ParameterNode {
    id: ParameterId,
    name: Option<Arc<str>>,
    ty: Type,
}

impl ParameterNode {
    /// A fresh parameter. Each call yields a distinct identity.
    pub fn new(name: Option<&str>, ty: Type) -> Result<Arc<Self>, BuildError> {
        if ty.is_void() {
            return Err(BuildError::Invalid("parameters cannot have type void"));
        }
        Ok(Arc::new(ParameterNode {
            id: ParameterId::fresh(),
            name: name.map(Arc::from),
            ty,
        }))
    }

    #[inline]
    pub fn id(&self) -> ParameterId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    /// Name for diagnostics: the declared name, or `p<id>`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("p{}", self.id.0),
        }
    }
}

struct LabelInfo {
    id: u64,
    name: Option<Arc<str>>,
    ty: Type,
}

/// Identity-keyed jump target shared by `Label`, `Goto` and `Loop` nodes.
///
/// Referenced, never owned: many nodes may hold the same target.
#[derive(Clone)]
pub struct LabelTarget(Arc<LabelInfo>);

impl LabelTarget {
    pub fn new(name: Option<&str>, ty: Type) -> Self {
        LabelTarget(Arc::new(LabelInfo {
            id: NEXT_LABEL_ID.fetch_add(1, Ordering::Relaxed),
            name: name.map(Arc::from),
            ty,
        }))
    }

    pub fn void(name: Option<&str>) -> Self {
        Self::new(name, Type::Void)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Type of the value a jump to this target carries.
    pub fn value_type(&self) -> &Type {
        &self.0.ty
    }
}

impl PartialEq for LabelTarget {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for LabelTarget {}

impl Hash for LabelTarget {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.name {
            Some(name) => f.write_str(name),
            None => write!(f, "L{}", self.0.id),
        }
    }
}

impl fmt::Debug for LabelTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelTarget({self}: {})", self.0.ty)
    }
}

/// A literal value.
#[derive(Debug)]
pub struct ConstantNode {
    value: Value,
    ty: Type,
}

impl ConstantNode {
    /// A constant whose static type is the value's runtime type.
    pub fn make(value: Value) -> Arc<Self> {
        let ty = value.runtime_type();
        Arc::new(ConstantNode { value, ty })
    }

    /// A constant with an explicit static type (`null` of a reference type,
    /// a derived object typed as its base).
    pub fn make_typed(value: Value, ty: Type) -> Result<Arc<Self>, BuildError> {
        let ok = match &value {
            Value::Null => ty.is_reference(),
            other => ty.is_assignable_from(&other.runtime_type()),
        };
        if !ok {
            return Err(BuildError::TypeMismatch {
                context: "constant",
                expected: ty,
                found: value.runtime_type(),
            });
        }
        Ok(Arc::new(ConstantNode { value, ty }))
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }
}

/// The zero value of a type.
#[derive(Debug)]
pub struct DefaultNode {
    ty: Type,
}

impl DefaultNode {
    pub fn make(ty: Type) -> Arc<Self> {
        Arc::new(DefaultNode { ty })
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }
}
