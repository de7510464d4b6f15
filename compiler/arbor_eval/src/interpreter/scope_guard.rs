//! RAII scope guards for environment frames.
//!
//! [`ScopedInterpreter`] pops the frame it pushed when dropped, so every
//! early return through `?` (a thrown exception, a jump, a fatal error)
//! leaves the frame stack balanced.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use arbor_ir::{ParameterId, ParameterNode, Value};

use super::Interpreter;

/// Guard that owns one pushed frame. Derefs to the interpreter.
pub struct ScopedInterpreter<'guard> {
    interpreter: &'guard mut Interpreter,
}

impl Drop for ScopedInterpreter<'_> {
    fn drop(&mut self) {
        self.interpreter.env.pop_scope();
    }
}

impl Deref for ScopedInterpreter<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl Interpreter {
    /// Push a frame that is popped when the guard drops.
    pub fn scoped(&mut self) -> ScopedInterpreter<'_> {
        self.env.push_scope();
        ScopedInterpreter { interpreter: self }
    }

    /// Run `f` inside a fresh frame.
    pub fn with_env_scope<T, F>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        let mut scoped = self.scoped();
        f(&mut scoped)
    }

    /// Run `f` inside a fresh frame seeded with `bindings`.
    pub fn with_bindings<T, F, I>(&mut self, bindings: I, f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
        I: IntoIterator<Item = (ParameterId, Value)>,
    {
        self.with_env_scope(|scoped| {
            for (id, value) in bindings {
                scoped.env.define(id, value);
            }
            f(scoped)
        })
    }

    /// Run `f` with block variables bound to their zero values.
    pub(super) fn with_variables<T, F>(&mut self, variables: &[Arc<ParameterNode>], f: F) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        self.with_bindings(
            variables
                .iter()
                .map(|v| (v.id(), Value::zero(v.value_type()))),
            f,
        )
    }

    /// Run `f` with a single binding, or in a bare frame when `variable`
    /// is absent.
    pub(super) fn with_binding<T, F>(
        &mut self,
        variable: Option<&Arc<ParameterNode>>,
        value: Value,
        f: F,
    ) -> T
    where
        F: FnOnce(&mut ScopedInterpreter<'_>) -> T,
    {
        self.with_bindings(variable.map(|v| (v.id(), value)), f)
    }
}
