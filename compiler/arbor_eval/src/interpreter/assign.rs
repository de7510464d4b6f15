//! Assignment targets and read-modify-write.
//!
//! `Assign`, every compound assignment and the four increment/decrement
//! assignments resolve their target to a [`Place`] first, evaluating the
//! receiver and index arguments exactly once. The target is never evaluated
//! as a value.

use std::sync::Arc;

use arbor_ir::capability::{IndexerRef, MemberRef};
use arbor_ir::node::{BinaryNode, ParameterNode, UnaryNode};
use arbor_ir::{
    arity_mismatch, index_out_of_range, invalid_operation, not_assignable, unbound_parameter,
    unsupported_node, ArrayValue, ControlAction, EvalResult, Node, NodeType, Value,
};

use super::calls::element_slot;
use super::{Args, Interpreter};
use crate::{evaluate_binary, evaluate_unary};

/// An assignable location.
enum Place {
    Slot(Arc<ParameterNode>),
    Member {
        target: Option<Value>,
        member: MemberRef,
    },
    Element {
        array: Arc<ArrayValue>,
        position: usize,
    },
    Indexed {
        target: Value,
        indexer: IndexerRef,
        args: Args,
    },
}

fn element_out_of_range(array: &ArrayValue, position: usize) -> ControlAction {
    index_out_of_range(i64::try_from(position).unwrap_or(i64::MAX), array.len())
}

impl Interpreter {
    fn resolve_place(&mut self, node: &Node) -> Result<Place, ControlAction> {
        match node {
            Node::Parameter(parameter) => Ok(Place::Slot(Arc::clone(parameter))),
            Node::Member(access) => {
                let member = access.member();
                let target = match access.expression() {
                    Some(expression) => Some(self.receiver(expression, member.name())?),
                    None => None,
                };
                Ok(Place::Member {
                    target,
                    member: Arc::clone(member),
                })
            }
            Node::Index(access) => {
                let object = self.eval(access.object())?;
                let args = self.eval_all(access.arguments())?;
                if let Some(indexer) = access.indexer() {
                    if object.is_null() {
                        return Err(invalid_operation(format!(
                            "indexer `{}` accessed through a null reference",
                            indexer.name()
                        )));
                    }
                    return Ok(Place::Indexed {
                        target: object,
                        indexer: Arc::clone(indexer),
                        args,
                    });
                }
                let [index] = args.as_slice() else {
                    return Err(arity_mismatch("array index", 1, args.len()).into());
                };
                let (array, position) = element_slot(object, index)?;
                Ok(Place::Element { array, position })
            }
            other => Err(not_assignable(other.node_type()).into()),
        }
    }

    fn read_place(&self, place: &Place) -> EvalResult {
        match place {
            Place::Slot(parameter) => self
                .env
                .lookup(parameter.id())
                .ok_or_else(|| unbound_parameter(parameter.display_name()).into()),
            Place::Member { target, member } => member.get(target.as_ref()),
            Place::Element { array, position } => array
                .get(*position)
                .ok_or_else(|| element_out_of_range(array, *position)),
            Place::Indexed {
                target,
                indexer,
                args,
            } => indexer.get(target, args),
        }
    }

    fn write_place(&mut self, place: &Place, value: Value) -> Result<(), ControlAction> {
        match place {
            Place::Slot(parameter) => {
                if self.env.assign(parameter.id(), value) {
                    Ok(())
                } else {
                    Err(unbound_parameter(parameter.display_name()).into())
                }
            }
            Place::Member { target, member } => member.set(target.as_ref(), value),
            Place::Element { array, position } => {
                if array.set(*position, value) {
                    Ok(())
                } else {
                    Err(element_out_of_range(array, *position))
                }
            }
            Place::Indexed {
                target,
                indexer,
                args,
            } => indexer.set(target, args, value),
        }
    }

    /// `Assign` and the compound assignments. Evaluates to the stored value.
    pub(super) fn eval_assignment(&mut self, node: &BinaryNode) -> EvalResult {
        let place = self.resolve_place(node.left())?;
        let value = match node.node_type().compound_operator() {
            None => self.eval(node.right())?,
            Some(op) => {
                let current = self.read_place(&place)?;
                let right = self.eval(node.right())?;
                match node.method() {
                    Some(method) => {
                        let result = method.invoke(None, &[current, right])?;
                        match node.conversion() {
                            Some(conversion) => self.apply_lambda(conversion, &[result])?,
                            None => result,
                        }
                    }
                    None => evaluate_binary(current, right, op)?,
                }
            }
        };
        self.write_place(&place, value.clone())?;
        Ok(value)
    }

    /// Pre-forms evaluate to the new value, post-forms to the old one.
    pub(super) fn eval_increment(&mut self, node: &UnaryNode) -> EvalResult {
        let op = node.node_type();
        let Some(target) = node.operand() else {
            return Err(unsupported_node(op).into());
        };
        let place = self.resolve_place(target)?;
        let old = self.read_place(&place)?;
        let new = match node.method() {
            Some(method) => method.invoke(None, &[old.clone()])?,
            None => {
                let step = match op {
                    NodeType::PreIncrementAssign | NodeType::PostIncrementAssign => {
                        NodeType::Increment
                    }
                    _ => NodeType::Decrement,
                };
                evaluate_unary(old.clone(), step)?
            }
        };
        self.write_place(&place, new.clone())?;
        match op {
            NodeType::PreIncrementAssign | NodeType::PreDecrementAssign => Ok(new),
            _ => Ok(old),
        }
    }
}
