//! Tree-walking interpreter for Arbor expression trees.
//!
//! One `Interpreter` evaluates one lambda. Exceptions, jumps and fatal
//! errors all travel on the error side of `EvalResult` as a
//! `ControlAction`; the constructs that intercept them (`Block`, `Loop`,
//! `Label`, `Try`) match on it explicitly, so no pending-jump state is
//! shared between recursive calls.
//!
//! Evaluation is split by concern:
//! - `operator_eval`: binary, unary and type-test nodes
//! - `assign`: assignment targets and read-modify-write
//! - `control`: conditionals, blocks, loops, labels, jumps, switches
//! - `exceptions`: throw, rethrow and try/catch/finally/fault
//! - `calls`: calls, construction, member and index access, initializers,
//!   nested lambdas

mod assign;
mod builder;
mod calls;
mod control;
mod exceptions;
mod operator_eval;
mod scope_guard;

use std::sync::Arc;

use smallvec::SmallVec;

use arbor_ir::{
    arity_mismatch, budget_exceeded, invalid_reduction, unbound_parameter, unresolved_goto,
    ControlAction, EvalError, EvalResult, LambdaNode, Node, Value,
};
use arbor_stack::ensure_sufficient_stack;

use crate::Environment;

pub(crate) use builder::Limits;
pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

/// Positional argument buffer for calls, constructors and indexers.
pub(crate) type Args = SmallVec<[Value; 4]>;

/// Evaluates a lambda's body against bound arguments.
pub struct Interpreter {
    lambda: Arc<LambdaNode>,
    pub(crate) env: Environment,
    /// Exceptions whose handlers are running, innermost last.
    handling: SmallVec<[Value; 2]>,
    steps: u64,
    limits: Limits,
}

impl Interpreter {
    /// An interpreter with default limits.
    pub fn new(lambda: &Arc<LambdaNode>) -> Self {
        InterpreterBuilder::new().build(lambda)
    }

    pub fn lambda(&self) -> &Arc<LambdaNode> {
        &self.lambda
    }

    /// Evaluate the lambda with positional `args`.
    ///
    /// An exception escaping the body becomes `Unhandled`; a jump no
    /// construct intercepted becomes `UnresolvedGoto`.
    pub fn interpret(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        self.run(args).map_err(ControlAction::into_eval_error)
    }

    /// Like [`interpret`](Self::interpret), but a thrown exception stays a
    /// `ControlAction::Throw` so an enclosing tree can catch it.
    pub(crate) fn run(&mut self, args: &[Value]) -> EvalResult {
        let lambda = Arc::clone(&self.lambda);
        let parameters = lambda.parameters();
        if parameters.len() != args.len() {
            return Err(arity_mismatch(
                lambda.name().unwrap_or("lambda"),
                parameters.len(),
                args.len(),
            )
            .into());
        }
        self.steps = 0;
        self.handling.clear();

        let bindings = parameters.iter().map(|p| p.id()).zip(args.iter().cloned());
        let result = self.with_bindings(bindings, |scoped| scoped.eval(lambda.body()));
        match result {
            Ok(_) if lambda.return_type().is_void() => Ok(Value::Void),
            Ok(value) => Ok(value),
            Err(ControlAction::Goto { target, .. }) => {
                tracing::warn!(label = %target, "jump escaped the lambda body unresolved");
                Err(unresolved_goto(target.to_string()).into())
            }
            Err(other) => Err(other),
        }
    }

    /// Evaluate one node in the current environment.
    #[tracing::instrument(level = "trace", skip_all, fields(kind = ?node.node_type()))]
    pub fn eval(&mut self, node: &Node) -> EvalResult {
        self.tick()?;
        if self.limits.stack_guard {
            ensure_sufficient_stack(|| self.eval_node(node))
        } else {
            self.eval_node(node)
        }
    }

    fn eval_node(&mut self, node: &Node) -> EvalResult {
        match node {
            Node::Constant(n) => Ok(n.value().clone()),
            Node::Default(n) => Ok(Value::zero(n.value_type())),
            Node::Parameter(p) => self
                .env
                .lookup(p.id())
                .ok_or_else(|| unbound_parameter(p.display_name()).into()),
            Node::Binary(n) => self.eval_binary(n),
            Node::Unary(n) => self.eval_unary(n),
            Node::TypeBinary(n) => self.eval_type_binary(n),
            Node::Conditional(n) => self.eval_conditional(n),
            Node::Call(n) => self.eval_call(n),
            Node::Invoke(n) => self.eval_invoke(n),
            Node::New(n) => self.eval_new(n),
            Node::NewArray(n) => self.eval_new_array(n),
            Node::Member(n) => self.eval_member(n),
            Node::Index(n) => self.eval_index(n),
            Node::Lambda(n) => Ok(self.closure(n)),
            Node::Block(n) => self.eval_block(n),
            Node::Loop(n) => self.eval_loop(n),
            Node::Label(n) => self.eval_label(n),
            Node::Goto(n) => self.eval_goto(n),
            Node::Switch(n) => self.eval_switch(n),
            Node::Try(n) => self.eval_try(n),
            Node::ListInit(n) => self.eval_list_init(n),
            Node::MemberInit(n) => self.eval_member_init(n),
            Node::Extension(ext) => {
                let reduced = ext
                    .reduce()
                    .map_err(|e| invalid_reduction(ext.name(), &e))?;
                self.eval(&reduced)
            }
        }
    }

    /// Evaluate `nodes` left to right.
    pub(crate) fn eval_all(&mut self, nodes: &[Node]) -> Result<Args, ControlAction> {
        let mut values = Args::with_capacity(nodes.len());
        for node in nodes {
            values.push(self.eval(node)?);
        }
        Ok(values)
    }

    /// Count one evaluation step against the budget.
    #[inline]
    fn tick(&mut self) -> Result<(), ControlAction> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(limit) if self.steps > limit => Err(budget_exceeded(limit).into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests;
