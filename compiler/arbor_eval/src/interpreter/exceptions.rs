//! Throw, rethrow and try/catch/finally/fault.

use arbor_ir::node::{CatchClause, TryNode};
use arbor_ir::{
    invalid_operation, not_an_exception, throw, BuiltinClass, ControlAction, EvalResult, Node,
    Value,
};

use super::Interpreter;
use crate::is_instance_of;

impl Interpreter {
    /// `throw operand`, or a rethrow of the handled exception when there is
    /// no operand.
    pub(super) fn eval_throw(&mut self, operand: Option<&Node>) -> EvalResult {
        let Some(operand) = operand else {
            return match self.handling.last() {
                Some(exception) => Err(ControlAction::Throw(exception.clone())),
                None => Err(invalid_operation("rethrow outside of a catch handler")),
            };
        };
        let exception = self.eval(operand)?;
        if exception.is_null() {
            return Err(throw(BuiltinClass::NullReference, "the thrown value is null"));
        }
        if !exception.is_exception() {
            return Err(not_an_exception(exception.type_name()).into());
        }
        Err(ControlAction::Throw(exception))
    }

    /// Handlers see only thrown exceptions; jumps and fatal errors pass
    /// through them. The finally body runs for every outcome, and an error
    /// it raises replaces the outcome in flight.
    pub(super) fn eval_try(&mut self, node: &TryNode) -> EvalResult {
        let outcome = match self.eval(node.body()) {
            Err(ControlAction::Throw(exception)) => self.handle(node, exception),
            other => other,
        };
        if let Some(finally) = node.finally() {
            self.eval(finally)?;
        }
        let value = outcome?;
        Ok(if node.value_type().is_void() {
            Value::Void
        } else {
            value
        })
    }

    fn handle(&mut self, node: &TryNode, exception: Value) -> EvalResult {
        for handler in node.handlers().iter() {
            if !is_instance_of(&exception, handler.test()) || !self.accepts(handler, &exception)? {
                continue;
            }
            tracing::debug!(handler = %handler.test(), %exception, "exception handler selected");
            self.handling.push(exception.clone());
            let result =
                self.with_binding(handler.variable(), exception, |scoped| scoped.eval(handler.body()));
            self.handling.pop();
            return result;
        }
        if let Some(fault) = node.fault() {
            self.eval(fault)?;
        }
        Err(ControlAction::Throw(exception))
    }

    /// Run the handler's filter with the exception bound. Only `true`
    /// accepts; a thrown exception or any other value rejects. Fatal errors
    /// propagate.
    fn accepts(&mut self, handler: &CatchClause, exception: &Value) -> Result<bool, ControlAction> {
        let Some(filter) = handler.filter() else {
            return Ok(true);
        };
        let verdict =
            self.with_binding(handler.variable(), exception.clone(), |scoped| scoped.eval(filter));
        match verdict {
            Ok(Value::Bool(accepted)) => Ok(accepted),
            Ok(_) | Err(ControlAction::Throw(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }
}
