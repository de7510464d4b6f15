//! Materializing a lambda as a callable.
//!
//! There is no code generation: a [`Callable`] holds the lambda and an
//! [`InterpreterBuilder`], and every call builds a fresh [`Interpreter`]
//! over the tree. Calls never share evaluation state, so one `Callable`
//! (or the delegate made from it) may be called from several threads.
//!
//! Only arities `0..=MAX_ARITY` compile; the typed adapters check the
//! lambda's declared parameter and return types against the Rust types
//! when the adapter is built.
//!
//! [`Interpreter`]: crate::Interpreter

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use arbor_ir::{
    arity_mismatch, arity_not_supported, type_mismatch, Delegate, EvalError, EvalResult,
    FunctionType, LambdaNode, Type, Value,
};

use crate::InterpreterBuilder;

/// Largest parameter count `compile` accepts.
pub const MAX_ARITY: usize = 4;

/// Compile a lambda to a [`Callable`].
pub trait Compile {
    /// Compile with default interpreter settings.
    fn compile(&self) -> Result<Callable, EvalError>;

    /// Compile with the given settings; each call builds its interpreter
    /// from `builder`.
    fn compile_with(&self, builder: InterpreterBuilder) -> Result<Callable, EvalError>;
}

impl Compile for Arc<LambdaNode> {
    fn compile(&self) -> Result<Callable, EvalError> {
        self.compile_with(InterpreterBuilder::new())
    }

    fn compile_with(&self, builder: InterpreterBuilder) -> Result<Callable, EvalError> {
        let arity = self.parameters().len();
        if arity > MAX_ARITY {
            return Err(arity_not_supported(arity, MAX_ARITY));
        }
        tracing::debug!(
            name = self.name().unwrap_or("lambda"),
            arity,
            signature = %self.signature(),
            "compiled lambda for interpretation"
        );
        Ok(Callable::new(Arc::clone(self), builder))
    }
}

/// A compiled lambda.
#[derive(Clone)]
pub struct Callable {
    lambda: Arc<LambdaNode>,
    builder: InterpreterBuilder,
}

impl Callable {
    pub(crate) fn new(lambda: Arc<LambdaNode>, builder: InterpreterBuilder) -> Self {
        Callable { lambda, builder }
    }

    pub fn lambda(&self) -> &Arc<LambdaNode> {
        &self.lambda
    }

    pub fn signature(&self) -> &Arc<FunctionType> {
        self.lambda.signature()
    }

    pub fn arity(&self) -> usize {
        self.lambda.parameters().len()
    }

    /// Call with positional arguments. A void lambda returns `Value::Void`.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        self.builder.build(&self.lambda).interpret(args)
    }

    /// Call, keeping a thrown exception catchable by an enclosing tree.
    fn run(&self, args: &[Value]) -> EvalResult {
        self.builder.build(&self.lambda).run(args)
    }

    /// This callable as a first-class delegate value.
    pub fn to_delegate(&self) -> Delegate {
        let callable = self.clone();
        Delegate::new(self.signature().as_ref().clone(), move |args| {
            callable.run(args)
        })
    }

    fn check_signature(&self, params: &[Check], ret: Check) -> Result<(), EvalError> {
        let declared = self.signature();
        if declared.arity() != params.len() {
            return Err(arity_mismatch("typed adapter", declared.arity(), params.len()));
        }
        for (ty, (accepts, rust)) in declared.params().iter().zip(params) {
            if !accepts(ty) {
                return Err(type_mismatch(ty.to_string(), *rust));
            }
        }
        let (accepts, rust) = ret;
        if !accepts(declared.ret()) {
            return Err(type_mismatch(declared.ret().to_string(), rust));
        }
        Ok(())
    }

    pub fn typed0<R>(&self) -> Result<impl Fn() -> Result<R, EvalError>, EvalError>
    where
        R: FromValue,
    {
        self.check_signature(&[], ret::<R>())?;
        let callable = self.clone();
        Ok(move || R::from_value(callable.call(&[])?))
    }

    pub fn typed1<A, R>(&self) -> Result<impl Fn(A) -> Result<R, EvalError>, EvalError>
    where
        A: IntoValue,
        R: FromValue,
    {
        self.check_signature(&[param::<A>()], ret::<R>())?;
        let callable = self.clone();
        Ok(move |a: A| R::from_value(callable.call(&[a.into_value()])?))
    }

    pub fn typed2<A, B, R>(&self) -> Result<impl Fn(A, B) -> Result<R, EvalError>, EvalError>
    where
        A: IntoValue,
        B: IntoValue,
        R: FromValue,
    {
        self.check_signature(&[param::<A>(), param::<B>()], ret::<R>())?;
        let callable = self.clone();
        Ok(move |a: A, b: B| R::from_value(callable.call(&[a.into_value(), b.into_value()])?))
    }

    pub fn typed3<A, B, C, R>(
        &self,
    ) -> Result<impl Fn(A, B, C) -> Result<R, EvalError>, EvalError>
    where
        A: IntoValue,
        B: IntoValue,
        C: IntoValue,
        R: FromValue,
    {
        self.check_signature(&[param::<A>(), param::<B>(), param::<C>()], ret::<R>())?;
        let callable = self.clone();
        Ok(move |a: A, b: B, c: C| {
            R::from_value(callable.call(&[a.into_value(), b.into_value(), c.into_value()])?)
        })
    }

    pub fn typed4<A, B, C, D, R>(
        &self,
    ) -> Result<impl Fn(A, B, C, D) -> Result<R, EvalError>, EvalError>
    where
        A: IntoValue,
        B: IntoValue,
        C: IntoValue,
        D: IntoValue,
        R: FromValue,
    {
        self.check_signature(
            &[param::<A>(), param::<B>(), param::<C>(), param::<D>()],
            ret::<R>(),
        )?;
        let callable = self.clone();
        Ok(move |a: A, b: B, c: C, d: D| {
            R::from_value(callable.call(&[
                a.into_value(),
                b.into_value(),
                c.into_value(),
                d.into_value(),
            ])?)
        })
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("signature", self.signature())
            .field("builder", &self.builder)
            .finish()
    }
}

/// A declared-type predicate and the Rust type name it stands for.
type Check = (fn(&Type) -> bool, &'static str);

fn param<A: IntoValue>() -> Check {
    (A::accepts, type_name::<A>())
}

fn ret<R: FromValue>() -> Check {
    (R::accepts, type_name::<R>())
}

/// A Rust type that can be passed as a typed-adapter argument.
pub trait IntoValue {
    /// Whether a parameter declared as `declared` takes this Rust type.
    fn accepts(declared: &Type) -> bool;

    fn into_value(self) -> Value;
}

/// A Rust type a typed adapter can return.
pub trait FromValue: Sized {
    /// Whether a lambda declared to return `declared` can produce this
    /// Rust type.
    fn accepts(declared: &Type) -> bool;

    fn from_value(value: Value) -> Result<Self, EvalError>;
}

macro_rules! scalar_conversions {
    ($($rust:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $rust {
                fn accepts(declared: &Type) -> bool {
                    *declared == Type::$variant
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $rust {
                fn accepts(declared: &Type) -> bool {
                    *declared == Type::$variant
                }

                fn from_value(value: Value) -> Result<Self, EvalError> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(type_mismatch(stringify!($rust), other.type_name())),
                    }
                }
            }
        )*
    };
}

scalar_conversions! {
    bool => Bool,
    char => Char,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
}

impl IntoValue for String {
    fn accepts(declared: &Type) -> bool {
        *declared == Type::Str
    }

    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for &str {
    fn accepts(declared: &Type) -> bool {
        *declared == Type::Str
    }

    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl FromValue for String {
    fn accepts(declared: &Type) -> bool {
        *declared == Type::Str
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(type_mismatch("String", other.type_name())),
        }
    }
}

/// Untyped: accepts any declared type.
impl IntoValue for Value {
    fn accepts(_declared: &Type) -> bool {
        true
    }

    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn accepts(_declared: &Type) -> bool {
        true
    }

    fn from_value(value: Value) -> Result<Self, EvalError> {
        Ok(value)
    }
}

/// Drops the result.
impl FromValue for () {
    fn accepts(_declared: &Type) -> bool {
        true
    }

    fn from_value(_value: Value) -> Result<Self, EvalError> {
        Ok(())
    }
}
