//! Binary, unary and type-test nodes.

use arbor_ir::node::{BinaryNode, TypeBinaryNode, UnaryNode};
use arbor_ir::{invalid_operation, unsupported_node, EvalResult, NodeType, Value};

use super::calls::read_element;
use super::Interpreter;
use crate::conversions::{convert, has_exact_type, is_instance_of, type_as, unbox};
use crate::{evaluate_binary, evaluate_unary};

impl Interpreter {
    pub(super) fn eval_binary(&mut self, node: &BinaryNode) -> EvalResult {
        let op = node.node_type();
        if op.is_assignment() {
            return self.eval_assignment(node);
        }
        match op {
            NodeType::AndAlso | NodeType::OrElse => {
                let left = self.eval_bool(node.left())?;
                // `false && _` and `true || _` are decided by the left side.
                if left == (op == NodeType::OrElse) {
                    return Ok(Value::Bool(left));
                }
                self.eval_bool(node.right()).map(Value::Bool)
            }
            NodeType::Coalesce => {
                let left = self.eval(node.left())?;
                if left.is_null() {
                    return self.eval(node.right());
                }
                match node.conversion() {
                    Some(conversion) => self.apply_lambda(conversion, &[left]),
                    None => Ok(left),
                }
            }
            NodeType::ArrayIndex => {
                let array = self.eval(node.left())?;
                let index = self.eval(node.right())?;
                read_element(array, &index)
            }
            _ => {
                let left = self.eval(node.left())?;
                let right = self.eval(node.right())?;
                match node.method() {
                    Some(method) => method.invoke(None, &[left, right]),
                    None => evaluate_binary(left, right, op),
                }
            }
        }
    }

    pub(super) fn eval_unary(&mut self, node: &UnaryNode) -> EvalResult {
        let op = node.node_type();
        match op {
            NodeType::Throw => return self.eval_throw(node.operand()),
            NodeType::Quote => {
                return node
                    .operand()
                    .map(|quoted| Value::Expr(quoted.clone()))
                    .ok_or_else(|| unsupported_node(op).into());
            }
            _ if op.is_increment_assignment() => return self.eval_increment(node),
            _ => {}
        }

        let Some(operand) = node.operand() else {
            return Err(unsupported_node(op).into());
        };
        let value = self.eval(operand)?;
        if let Some(method) = node.method() {
            return method.invoke(None, &[value]);
        }
        let ty = node.value_type();
        match op {
            NodeType::Convert => convert(value, ty, false),
            NodeType::ConvertChecked => convert(value, ty, true),
            NodeType::TypeAs => Ok(type_as(value, ty)),
            NodeType::Unbox => unbox(value, ty),
            NodeType::ArrayLength if value.is_null() => {
                Err(invalid_operation("cannot read the length of a null array"))
            }
            _ => evaluate_unary(value, op),
        }
    }

    pub(super) fn eval_type_binary(&mut self, node: &TypeBinaryNode) -> EvalResult {
        let value = self.eval(node.expression())?;
        let ty = node.type_operand();
        let result = match node.node_type() {
            NodeType::TypeEqual => has_exact_type(&value, ty),
            _ => is_instance_of(&value, ty),
        };
        Ok(Value::Bool(result))
    }
}
