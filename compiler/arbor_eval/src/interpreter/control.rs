//! Conditionals, blocks, loops, labels, jumps and switches.
//!
//! A `Goto` evaluates to `Err(ControlAction::Goto)`. It unwinds until one
//! of these intercepts it:
//! - a `Block` with the target label as a direct child (execution resumes
//!   at that label, forward or backward);
//! - a `Loop` whose break or continue label is the target;
//! - a `Label` whose default-value expression performed the jump.

use arbor_ir::capability::MethodRef;
use arbor_ir::node::{
    BlockNode, ConditionalNode, GotoNode, LabelNode, LabelTarget, LoopNode, SwitchNode,
};
use arbor_ir::{type_mismatch, ControlAction, EvalResult, Node, Type, Value};

use super::Interpreter;
use crate::values_equal;

/// Position of the label for `target` among a block's direct children.
fn label_position(expressions: &[Node], target: &LabelTarget) -> Option<usize> {
    expressions
        .iter()
        .position(|e| matches!(e, Node::Label(label) if label.target() == target))
}

/// `Void` for statement-typed nodes, the computed value otherwise.
#[inline]
fn typed(ty: &Type, value: Value) -> Value {
    if ty.is_void() {
        Value::Void
    } else {
        value
    }
}

impl Interpreter {
    pub(super) fn eval_bool(&mut self, node: &Node) -> Result<bool, ControlAction> {
        let value = self.eval(node)?;
        value
            .as_bool()
            .ok_or_else(|| type_mismatch("bool", value.type_name()).into())
    }

    pub(super) fn eval_conditional(&mut self, node: &ConditionalNode) -> EvalResult {
        let branch = if self.eval_bool(node.test())? {
            node.if_true()
        } else {
            node.if_false()
        };
        let value = self.eval(branch)?;
        Ok(typed(node.value_type(), value))
    }

    pub(super) fn eval_block(&mut self, node: &BlockNode) -> EvalResult {
        let value = if node.variables().is_empty() {
            self.run_sequence(node.expressions())?
        } else {
            self.with_variables(node.variables(), |scoped| {
                scoped.run_sequence(node.expressions())
            })?
        };
        Ok(typed(node.value_type(), value))
    }

    /// Evaluate `expressions` in order, resuming at a child label when a
    /// jump targets one.
    fn run_sequence(&mut self, expressions: &[Node]) -> EvalResult {
        let mut last = Value::Void;
        let mut index = 0;
        // Value carried by a jump to the label at `index`.
        let mut arrived: Option<Value> = None;
        while let Some(expression) = expressions.get(index) {
            let outcome = match (arrived.take(), expression) {
                (Some(value), Node::Label(_)) => Ok(value),
                _ => self.eval(expression),
            };
            match outcome {
                Ok(value) => {
                    last = value;
                    index += 1;
                }
                Err(ControlAction::Goto { target, value }) => {
                    let Some(position) = label_position(expressions, &target) else {
                        return Err(ControlAction::Goto { target, value });
                    };
                    tracing::debug!(label = %target, position, "jump resolved in block");
                    index = position;
                    arrived = Some(value);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(last)
    }

    pub(super) fn eval_loop(&mut self, node: &LoopNode) -> EvalResult {
        loop {
            match self.eval(node.body()) {
                Ok(_) => {}
                Err(ControlAction::Goto { target, value }) => {
                    if node.break_label() == Some(&target) {
                        tracing::debug!(label = %target, "loop exited through its break label");
                        return Ok(typed(node.value_type(), value));
                    }
                    if node.continue_label() != Some(&target) {
                        return Err(ControlAction::Goto { target, value });
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// A label reached by normal flow yields its default value; a jump
    /// raised inside that default and aimed at this label yields the
    /// jump's value.
    pub(super) fn eval_label(&mut self, node: &LabelNode) -> EvalResult {
        let Some(default) = node.default_value() else {
            return Ok(Value::zero(node.target().value_type()));
        };
        match self.eval(default) {
            Err(ControlAction::Goto { target, value }) if &target == node.target() => {
                tracing::debug!(label = %target, "jump resolved at its label");
                Ok(value)
            }
            other => other,
        }
    }

    pub(super) fn eval_goto(&mut self, node: &GotoNode) -> EvalResult {
        let value = match node.value() {
            Some(value) => self.eval(value)?,
            None => Value::Void,
        };
        Err(ControlAction::Goto {
            target: node.target().clone(),
            value,
        })
    }

    /// First matching test value wins; no fallthrough.
    pub(super) fn eval_switch(&mut self, node: &SwitchNode) -> EvalResult {
        let value = self.eval(node.switch_value())?;
        let mut body = node.default_body();
        'cases: for case in node.cases().iter() {
            for test in case.test_values().iter() {
                let candidate = self.eval(test)?;
                if switch_matches(node.comparer(), &value, candidate)? {
                    body = Some(case.body());
                    break 'cases;
                }
            }
        }
        match body {
            Some(body) => {
                let result = self.eval(body)?;
                Ok(typed(node.value_type(), result))
            }
            None => Ok(Value::zero(node.value_type())),
        }
    }
}

fn switch_matches(
    comparer: Option<&MethodRef>,
    value: &Value,
    candidate: Value,
) -> Result<bool, ControlAction> {
    let Some(comparer) = comparer else {
        return Ok(values_equal(value, &candidate));
    };
    let result = comparer.invoke(None, &[value.clone(), candidate])?;
    result
        .as_bool()
        .ok_or_else(|| type_mismatch("bool", result.type_name()).into())
}
