//! Closure-backed capability handles.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{
    Constructor, ConstructorRef, Indexer, IndexerRef, Member, MemberKind, MemberRef, Method,
    MethodRef,
};
use crate::errors::{invalid_operation, type_mismatch, ControlAction, EvalResult};
use crate::types::{ClassType, Type};
use crate::value::Value;

type MethodFn = dyn Fn(Option<&Value>, &[Value]) -> EvalResult + Send + Sync;
type ConstructFn = dyn Fn(&[Value]) -> EvalResult + Send + Sync;
type GetterFn = dyn Fn(Option<&Value>) -> EvalResult + Send + Sync;
type SetterFn = dyn Fn(Option<&Value>, Value) -> Result<(), ControlAction> + Send + Sync;
type IndexGetFn = dyn Fn(&Value, &[Value]) -> EvalResult + Send + Sync;
type IndexSetFn = dyn Fn(&Value, &[Value], Value) -> Result<(), ControlAction> + Send + Sync;

/// A method implemented by a Rust closure.
pub struct NativeMethod {
    name: String,
    params: Vec<Type>,
    ret: Type,
    is_static: bool,
    body: Box<MethodFn>,
}

impl NativeMethod {
    /// A static method; the closure receives `None` as receiver.
    pub fn new_static<F>(name: &str, params: Vec<Type>, ret: Type, body: F) -> MethodRef
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            params,
            ret,
            is_static: true,
            body: Box::new(move |_, args| body(args)),
        })
    }

    /// An instance method; the closure receives the evaluated receiver.
    pub fn new_instance<F>(name: &str, params: Vec<Type>, ret: Type, body: F) -> MethodRef
    where
        F: Fn(&Value, &[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            params,
            ret,
            is_static: false,
            body: Box::new(move |receiver, args| match receiver {
                Some(receiver) => body(receiver, args),
                None => Err(invalid_operation("instance method called without a receiver")),
            }),
        })
    }
}

impl Method for NativeMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameter_types(&self) -> &[Type] {
        &self.params
    }

    fn return_type(&self) -> &Type {
        &self.ret
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> EvalResult {
        (self.body)(receiver, args)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeMethod({}/{})", self.name, self.params.len())
    }
}

/// A constructor implemented by a Rust closure.
pub struct NativeConstructor {
    ty: Type,
    params: Vec<Type>,
    body: Box<ConstructFn>,
}

impl NativeConstructor {
    pub fn new<F>(ty: Type, params: Vec<Type>, body: F) -> ConstructorRef
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            ty,
            params,
            body: Box::new(body),
        })
    }
}

impl Constructor for NativeConstructor {
    fn declaring_type(&self) -> &Type {
        &self.ty
    }

    fn parameter_types(&self) -> &[Type] {
        &self.params
    }

    fn construct(&self, args: &[Value]) -> EvalResult {
        (self.body)(args)
    }
}

impl fmt::Debug for NativeConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeConstructor({}/{})", self.ty, self.params.len())
    }
}

/// Constructor for `class` whose parameters initialise `fields` in order.
pub fn object_constructor(class: &ClassType, fields: &[(&str, Type)]) -> ConstructorRef {
    let class_for_body = class.clone();
    let names: Vec<String> = fields.iter().map(|(name, _)| (*name).to_string()).collect();
    let params = fields.iter().map(|(_, ty)| ty.clone()).collect();
    NativeConstructor::new(Type::Class(class.clone()), params, move |args| {
        Ok(Value::object(
            &class_for_body,
            names.iter().map(String::as_str).zip(args.iter().cloned()),
        ))
    })
}

/// Parameterless constructor for an empty `List<element>`.
pub fn list_constructor(element: Type) -> ConstructorRef {
    let ty = Type::list_of(element.clone());
    NativeConstructor::new(ty, Vec::new(), move |_| Ok(Value::list(element.clone(), Vec::new())))
}

/// `List<element>.Add(item)`.
pub fn list_add(element: Type) -> MethodRef {
    NativeMethod::new_instance("Add", vec![element], Type::Void, |receiver, args| {
        match (receiver, args) {
            (Value::List(list), [item]) => {
                list.push(item.clone());
                Ok(Value::Void)
            }
            (Value::Null, _) => Err(invalid_operation("Add called on a null list")),
            (other, _) => Err(type_mismatch("list", other.type_name()).into()),
        }
    })
}

/// An instance field stored on `Value::Object`.
#[derive(Debug)]
pub struct FieldMember {
    name: String,
    ty: Type,
    read_only: bool,
}

impl FieldMember {
    pub fn new(name: &str, ty: Type) -> MemberRef {
        Arc::new(Self {
            name: name.to_string(),
            ty,
            read_only: false,
        })
    }

    pub fn read_only(name: &str, ty: Type) -> MemberRef {
        Arc::new(Self {
            name: name.to_string(),
            ty,
            read_only: true,
        })
    }

    fn object<'v>(&self, target: Option<&'v Value>) -> Result<&'v Value, ControlAction> {
        match target {
            Some(Value::Null) | None => Err(invalid_operation(format!(
                "field `{}` accessed on a null reference",
                self.name
            ))),
            Some(value @ Value::Object(_)) => Ok(value),
            Some(other) => Err(type_mismatch("object", other.type_name()).into()),
        }
    }
}

impl Member for FieldMember {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MemberKind {
        MemberKind::Field
    }

    fn member_type(&self) -> &Type {
        &self.ty
    }

    fn is_static(&self) -> bool {
        false
    }

    fn can_write(&self) -> bool {
        !self.read_only
    }

    fn get(&self, target: Option<&Value>) -> EvalResult {
        let object = self.object(target)?;
        Ok(object
            .as_object()
            .and_then(|o| o.get_field(&self.name))
            .unwrap_or_else(|| Value::zero(&self.ty)))
    }

    fn set(&self, target: Option<&Value>, value: Value) -> Result<(), ControlAction> {
        if let Some(object) = self.object(target)?.as_object() {
            object.set_field(&self.name, value);
        }
        Ok(())
    }
}

/// A static field holding its own storage.
#[derive(Debug)]
pub struct StaticField {
    name: String,
    ty: Type,
    slot: RwLock<Value>,
}

impl StaticField {
    pub fn new(name: &str, ty: Type, initial: Value) -> MemberRef {
        Arc::new(Self {
            name: name.to_string(),
            ty,
            slot: RwLock::new(initial),
        })
    }
}

impl Member for StaticField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MemberKind {
        MemberKind::Field
    }

    fn member_type(&self) -> &Type {
        &self.ty
    }

    fn is_static(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn get(&self, _target: Option<&Value>) -> EvalResult {
        Ok(self.slot.read().clone())
    }

    fn set(&self, _target: Option<&Value>, value: Value) -> Result<(), ControlAction> {
        *self.slot.write() = value;
        Ok(())
    }
}

/// A property backed by getter and optional setter closures.
pub struct NativeProperty {
    name: String,
    ty: Type,
    is_static: bool,
    getter: Box<GetterFn>,
    setter: Option<Box<SetterFn>>,
}

impl NativeProperty {
    pub fn read_only<G>(name: &str, ty: Type, is_static: bool, getter: G) -> MemberRef
    where
        G: Fn(Option<&Value>) -> EvalResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            ty,
            is_static,
            getter: Box::new(getter),
            setter: None,
        })
    }

    pub fn read_write<G, S>(name: &str, ty: Type, is_static: bool, getter: G, setter: S) -> MemberRef
    where
        G: Fn(Option<&Value>) -> EvalResult + Send + Sync + 'static,
        S: Fn(Option<&Value>, Value) -> Result<(), ControlAction> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            ty,
            is_static,
            getter: Box::new(getter),
            setter: Some(Box::new(setter)),
        })
    }
}

impl Member for NativeProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MemberKind {
        MemberKind::Property
    }

    fn member_type(&self) -> &Type {
        &self.ty
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    fn get(&self, target: Option<&Value>) -> EvalResult {
        (self.getter)(target)
    }

    fn set(&self, target: Option<&Value>, value: Value) -> Result<(), ControlAction> {
        match &self.setter {
            Some(setter) => setter(target, value),
            None => Err(invalid_operation(format!(
                "property `{}` has no setter",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for NativeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeProperty({}: {})", self.name, self.ty)
    }
}

/// An indexed property backed by closures.
pub struct NativeIndexer {
    name: String,
    item_type: Type,
    params: Vec<Type>,
    getter: Box<IndexGetFn>,
    setter: Option<Box<IndexSetFn>>,
}

impl NativeIndexer {
    pub fn read_only<G>(name: &str, item_type: Type, params: Vec<Type>, getter: G) -> IndexerRef
    where
        G: Fn(&Value, &[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            item_type,
            params,
            getter: Box::new(getter),
            setter: None,
        })
    }

    pub fn read_write<G, S>(
        name: &str,
        item_type: Type,
        params: Vec<Type>,
        getter: G,
        setter: S,
    ) -> IndexerRef
    where
        G: Fn(&Value, &[Value]) -> EvalResult + Send + Sync + 'static,
        S: Fn(&Value, &[Value], Value) -> Result<(), ControlAction> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.to_string(),
            item_type,
            params,
            getter: Box::new(getter),
            setter: Some(Box::new(setter)),
        })
    }
}

impl Indexer for NativeIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    fn item_type(&self) -> &Type {
        &self.item_type
    }

    fn parameter_types(&self) -> &[Type] {
        &self.params
    }

    fn get(&self, target: &Value, args: &[Value]) -> EvalResult {
        (self.getter)(target, args)
    }

    fn set(&self, target: &Value, args: &[Value], value: Value) -> Result<(), ControlAction> {
        match &self.setter {
            Some(setter) => setter(target, args, value),
            None => Err(invalid_operation(format!(
                "indexer `{}` has no setter",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for NativeIndexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeIndexer({}/{})", self.name, self.params.len())
    }
}
