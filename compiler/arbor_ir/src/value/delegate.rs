//! Callable values.

use std::fmt;
use std::sync::Arc;

use crate::errors::{arity_mismatch, EvalResult};
use crate::types::FunctionType;
use crate::value::Value;

/// Body of a delegate: positional arguments in, result out.
pub type DelegateFn = dyn Fn(&[Value]) -> EvalResult + Send + Sync;

/// A first-class function value.
///
/// Produced by evaluating a nested `Lambda` node, by `Callable::to_delegate`,
/// or directly by a host. `Invoke` nodes call through it.
#[derive(Clone)]
pub struct Delegate {
    signature: Arc<FunctionType>,
    body: Arc<DelegateFn>,
}

impl Delegate {
    pub fn new<F>(signature: FunctionType, body: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    {
        Self {
            signature: Arc::new(signature),
            body: Arc::new(body),
        }
    }

    pub fn signature(&self) -> &Arc<FunctionType> {
        &self.signature
    }

    /// Call the delegate; the argument count must match the signature.
    pub fn invoke(&self, args: &[Value]) -> EvalResult {
        if args.len() != self.signature.arity() {
            return Err(arity_mismatch("delegate", self.signature.arity(), args.len()).into());
        }
        (self.body)(args)
    }

    pub fn ptr_eq(&self, other: &Delegate) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delegate({})", self.signature)
    }
}
