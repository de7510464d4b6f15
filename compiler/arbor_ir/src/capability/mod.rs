//! Capability handles: the host type system as the interpreter sees it.
//!
//! Methods, constructors, members and indexers are opaque trait objects.
//! The interpreter only calls through them (`invoke`, `construct`, `get`,
//! `set`) and reads their declared types; it never inspects how a host
//! implements them. Failures a handle raises (`ControlAction::Throw`)
//! propagate unchanged into the interpreted `Try` machinery.
//!
//! The `native` submodule provides closure-backed implementations so
//! embedders and tests can build handles without a reflection layer.

mod native;

use std::fmt;
use std::sync::Arc;

use crate::errors::{ControlAction, EvalResult};
use crate::types::Type;
use crate::value::Value;

pub use native::{
    list_add, list_constructor, object_constructor, FieldMember, NativeConstructor,
    NativeIndexer, NativeMethod, NativeProperty, StaticField,
};

/// A callable method (static or instance).
pub trait Method: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn parameter_types(&self) -> &[Type];
    fn return_type(&self) -> &Type;
    fn is_static(&self) -> bool;
    /// Invoke with an evaluated receiver (`None` for static methods).
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> EvalResult;
}

/// A constructor for a host type.
pub trait Constructor: fmt::Debug + Send + Sync {
    fn declaring_type(&self) -> &Type;
    fn parameter_types(&self) -> &[Type];
    fn construct(&self, args: &[Value]) -> EvalResult;
}

/// Field or property.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
}

/// A readable (and possibly writable) field or property.
pub trait Member: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> MemberKind;
    fn member_type(&self) -> &Type;
    fn is_static(&self) -> bool;
    fn can_write(&self) -> bool;
    /// Read through `target` (`None` for static members).
    fn get(&self, target: Option<&Value>) -> EvalResult;
    fn set(&self, target: Option<&Value>, value: Value) -> Result<(), ControlAction>;
}

/// An indexed property: `target[args...]`.
pub trait Indexer: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn item_type(&self) -> &Type;
    fn parameter_types(&self) -> &[Type];
    fn get(&self, target: &Value, args: &[Value]) -> EvalResult;
    fn set(&self, target: &Value, args: &[Value], value: Value) -> Result<(), ControlAction>;
}

pub type MethodRef = Arc<dyn Method>;
pub type ConstructorRef = Arc<dyn Constructor>;
pub type MemberRef = Arc<dyn Member>;
pub type IndexerRef = Arc<dyn Indexer>;

/// Handle identity: the same allocation, not merely an equal description.
#[inline]
pub fn same_handle<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b)
}

#[cfg(test)]
mod tests;
