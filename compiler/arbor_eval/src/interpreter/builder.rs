//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use arbor_ir::{LambdaNode, ParameterId, Value};

use super::Interpreter;
use crate::Environment;

/// Evaluation limits shared by an interpreter and every nested delegate it
/// creates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Limits {
    pub(crate) max_steps: Option<u64>,
    pub(crate) stack_guard: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_steps: None,
            stack_guard: true,
        }
    }
}

/// Builder for creating Interpreter instances.
///
/// Cheap to clone and `Send + Sync`, so a compiled `Callable` keeps one and
/// builds a fresh interpreter for every call.
#[derive(Clone, Debug, Default)]
pub struct InterpreterBuilder {
    limits: Limits,
    captures: Option<Arc<FxHashMap<ParameterId, Value>>>,
}

impl InterpreterBuilder {
    /// Unlimited steps, stack guard on, no captured values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `BudgetExceeded` after `steps` node evaluations per call.
    #[must_use]
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.limits.max_steps = Some(steps);
        self
    }

    /// Grow the native stack on demand during deep recursion.
    #[must_use]
    pub fn stack_guard(mut self, enabled: bool) -> Self {
        self.limits.stack_guard = enabled;
        self
    }

    /// Values visible to the lambda body besides its parameters.
    #[must_use]
    pub(crate) fn captures(mut self, captures: FxHashMap<ParameterId, Value>) -> Self {
        self.captures = Some(Arc::new(captures));
        self
    }

    #[must_use]
    pub(crate) fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Build an interpreter over `lambda`.
    pub fn build(&self, lambda: &Arc<LambdaNode>) -> Interpreter {
        let env = match &self.captures {
            Some(captures) => Environment::from_captures(captures.iter()),
            None => Environment::new(),
        };
        Interpreter {
            lambda: Arc::clone(lambda),
            env,
            handling: SmallVec::new(),
            steps: 0,
            limits: self.limits,
        }
    }
}
