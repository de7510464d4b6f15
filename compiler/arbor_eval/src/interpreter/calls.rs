//! Calls, construction, member and index access, initializers and nested
//! lambdas.
//!
//! Receivers and arguments are evaluated left to right before the
//! capability handle is called. A null receiver, delegate or array raises
//! `InvalidOperationException`.

use std::sync::Arc;

use arbor_ir::node::{
    CallNode, ElementInit, IndexNode, InvokeNode, LambdaNode, ListInitNode, MemberBinding,
    MemberInitNode, MemberNode, NewArrayNode, NewNode,
};
use arbor_ir::{
    arity_mismatch, index_out_of_range, invalid_operation, overflow, type_mismatch,
    unsupported_operand, ArrayValue, ControlAction, Delegate, EvalResult, Node, NodeType, Value,
};

use super::{Interpreter, InterpreterBuilder};
use crate::compile::Callable;
use crate::conversions::integer_value;

/// The array and in-range position addressed by `array[index]`.
pub(super) fn element_slot(
    array: Value,
    index: &Value,
) -> Result<(Arc<ArrayValue>, usize), ControlAction> {
    let array = match array {
        Value::Array(array) => array,
        Value::Null => return Err(invalid_operation("cannot index a null array")),
        other => return Err(type_mismatch("array", other.type_name()).into()),
    };
    let Some(raw) = integer_value(index) else {
        return Err(type_mismatch("integer index", index.type_name()).into());
    };
    match usize::try_from(raw) {
        Ok(position) if position < array.len() => Ok((array, position)),
        _ => Err(index_out_of_range(raw, array.len())),
    }
}

pub(super) fn read_element(array: Value, index: &Value) -> EvalResult {
    let (array, position) = element_slot(array, index)?;
    match array.get(position) {
        Some(value) => Ok(value),
        None => Err(index_out_of_range(
            i64::try_from(position).unwrap_or(i64::MAX),
            array.len(),
        )),
    }
}

impl Interpreter {
    /// Evaluate a receiver expression, rejecting null.
    pub(super) fn receiver(&mut self, object: &Node, member: &str) -> EvalResult {
        let value = self.eval(object)?;
        if value.is_null() {
            return Err(invalid_operation(format!(
                "`{member}` accessed through a null reference"
            )));
        }
        Ok(value)
    }

    pub(super) fn eval_call(&mut self, node: &CallNode) -> EvalResult {
        let method = node.method();
        let receiver = match node.object() {
            Some(object) => Some(self.receiver(object, method.name())?),
            None => None,
        };
        let args = self.eval_all(node.arguments())?;
        method.invoke(receiver.as_ref(), &args)
    }

    pub(super) fn eval_invoke(&mut self, node: &InvokeNode) -> EvalResult {
        let target = self.eval(node.expression())?;
        let args = self.eval_all(node.arguments())?;
        match target {
            Value::Delegate(delegate) => delegate.invoke(&args),
            Value::Null => Err(invalid_operation("cannot invoke a null delegate")),
            other => Err(type_mismatch("delegate", other.type_name()).into()),
        }
    }

    pub(super) fn eval_new(&mut self, node: &NewNode) -> EvalResult {
        let args = self.eval_all(node.arguments())?;
        node.constructor().construct(&args)
    }

    pub(super) fn eval_new_array(&mut self, node: &NewArrayNode) -> EvalResult {
        let element = node.element_type();
        let values = self.eval_all(node.expressions())?;
        if node.node_type() == NodeType::NewArrayInit {
            return Ok(Value::array(element.clone(), values.into_vec()));
        }
        let [size] = values.as_slice() else {
            return Err(unsupported_operand(
                NodeType::NewArrayBounds,
                format!("{}-dimensional arrays", values.len()),
            )
            .into());
        };
        let Some(raw) = integer_value(size) else {
            return Err(type_mismatch("integer array size", size.type_name()).into());
        };
        let len = usize::try_from(raw).map_err(|_| overflow("negative array size"))?;
        Ok(Value::array(element.clone(), vec![Value::zero(element); len]))
    }

    pub(super) fn eval_member(&mut self, node: &MemberNode) -> EvalResult {
        let member = node.member();
        match node.expression() {
            Some(expression) => {
                let target = self.receiver(expression, member.name())?;
                member.get(Some(&target))
            }
            None => member.get(None),
        }
    }

    pub(super) fn eval_index(&mut self, node: &IndexNode) -> EvalResult {
        let object = self.eval(node.object())?;
        let args = self.eval_all(node.arguments())?;
        match node.indexer() {
            Some(indexer) => {
                if object.is_null() {
                    return Err(invalid_operation(format!(
                        "indexer `{}` accessed through a null reference",
                        indexer.name()
                    )));
                }
                indexer.get(&object, &args)
            }
            None => match args.as_slice() {
                [index] => read_element(object, index),
                _ => Err(arity_mismatch("array index", 1, args.len()).into()),
            },
        }
    }

    pub(super) fn eval_list_init(&mut self, node: &ListInitNode) -> EvalResult {
        let collection = self.eval_new(node.new_expression())?;
        self.apply_initializers(&collection, node.initializers())?;
        Ok(collection)
    }

    pub(super) fn eval_member_init(&mut self, node: &MemberInitNode) -> EvalResult {
        let object = self.eval_new(node.new_expression())?;
        self.apply_bindings(&object, node.bindings())?;
        Ok(object)
    }

    fn apply_initializers(
        &mut self,
        collection: &Value,
        initializers: &[Arc<ElementInit>],
    ) -> Result<(), ControlAction> {
        for initializer in initializers {
            let args = self.eval_all(initializer.arguments())?;
            let add = initializer.add_method();
            let receiver = (!add.is_static()).then_some(collection);
            add.invoke(receiver, &args)?;
        }
        Ok(())
    }

    /// Apply bindings in declaration order. Nested bindings work on the
    /// member's current value rather than replacing it.
    fn apply_bindings(
        &mut self,
        target: &Value,
        bindings: &[Arc<MemberBinding>],
    ) -> Result<(), ControlAction> {
        for binding in bindings {
            let member = binding.member_handle();
            let receiver = (!member.is_static()).then_some(target);
            match binding.as_ref() {
                MemberBinding::Assignment { expression, .. } => {
                    let value = self.eval(expression)?;
                    member.set(receiver, value)?;
                }
                MemberBinding::Member { bindings, .. } => {
                    let nested = member.get(receiver)?;
                    if nested.is_null() {
                        return Err(invalid_operation(format!(
                            "member `{}` is null and cannot be initialized",
                            member.name()
                        )));
                    }
                    self.apply_bindings(&nested, bindings)?;
                }
                MemberBinding::List { initializers, .. } => {
                    let collection = member.get(receiver)?;
                    if collection.is_null() {
                        return Err(invalid_operation(format!(
                            "collection `{}` is null and cannot be initialized",
                            member.name()
                        )));
                    }
                    self.apply_initializers(&collection, initializers)?;
                }
            }
        }
        Ok(())
    }

    /// A nested lambda as a value: a delegate over a snapshot of the
    /// visible environment.
    pub(super) fn closure(&self, lambda: &Arc<LambdaNode>) -> Value {
        Value::Delegate(self.delegate_for(lambda))
    }

    fn delegate_for(&self, lambda: &Arc<LambdaNode>) -> Delegate {
        let builder = InterpreterBuilder::new()
            .limits(self.limits)
            .captures(self.env.capture());
        Callable::new(Arc::clone(lambda), builder).to_delegate()
    }

    /// Call a conversion lambda attached to an operator node.
    pub(super) fn apply_lambda(&self, lambda: &Arc<LambdaNode>, args: &[Value]) -> EvalResult {
        self.delegate_for(lambda).invoke(args)
    }
}
