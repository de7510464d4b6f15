//! Binary, unary and type-test nodes.

use std::sync::Arc;

use super::{check_arguments, expect_assignable, Identity, LambdaNode, Node, NodeType};
use crate::capability::MethodRef;
use crate::errors::BuildError;
use crate::types::Type;

/// Whether the native operator table has a rule for `op` on `ty`.
///
/// `Object` operands are dispatched on their runtime kind, so they are
/// always accepted here.
fn native_operand(op: NodeType, ty: &Type) -> bool {
    if matches!(ty, Type::Object) {
        return true;
    }
    match op {
        NodeType::Add
        | NodeType::AddChecked
        | NodeType::Subtract
        | NodeType::SubtractChecked
        | NodeType::Multiply
        | NodeType::MultiplyChecked
        | NodeType::Divide
        | NodeType::Modulo
        | NodeType::Power
        | NodeType::Negate
        | NodeType::NegateChecked
        | NodeType::UnaryPlus
        | NodeType::Increment
        | NodeType::Decrement
        | NodeType::PreIncrementAssign
        | NodeType::PreDecrementAssign
        | NodeType::PostIncrementAssign
        | NodeType::PostDecrementAssign => ty.is_numeric(),
        NodeType::And | NodeType::Or | NodeType::ExclusiveOr | NodeType::Not => {
            ty.is_integer() || ty.is_bool()
        }
        NodeType::LeftShift | NodeType::RightShift | NodeType::OnesComplement => ty.is_integer(),
        NodeType::LessThan
        | NodeType::LessThanOrEqual
        | NodeType::GreaterThan
        | NodeType::GreaterThanOrEqual => {
            ty.is_numeric() || matches!(ty, Type::Char | Type::Str)
        }
        NodeType::AndAlso | NodeType::OrElse | NodeType::IsTrue | NodeType::IsFalse => {
            ty.is_bool()
        }
        _ => true,
    }
}

fn undefined(node_type: NodeType, operand: &Type) -> BuildError {
    BuildError::UndefinedOperator {
        node_type,
        operand: operand.clone(),
    }
}

/// An operator method must be static and accept the operands in order.
fn check_operator_method(
    context: &'static str,
    method: &MethodRef,
    args: &[Node],
) -> Result<(), BuildError> {
    if !method.is_static() {
        return Err(BuildError::Invalid("operator methods must be static"));
    }
    check_arguments(context, method.parameter_types(), args)
}

/// A node with two operands.
#[derive(Debug)]
pub struct BinaryNode {
    node_type: NodeType,
    left: Node,
    right: Node,
    method: Option<MethodRef>,
    conversion: Option<Arc<LambdaNode>>,
    ty: Type,
}

impl BinaryNode {
    pub fn make(
        node_type: NodeType,
        left: Node,
        right: Node,
        method: Option<MethodRef>,
        conversion: Option<Arc<LambdaNode>>,
    ) -> Result<Arc<Self>, BuildError> {
        if !node_type.is_binary() {
            return Err(BuildError::WrongFamily {
                node_type,
                family: "binary",
            });
        }
        if conversion.is_some()
            && node_type != NodeType::Coalesce
            && node_type.compound_operator().is_none()
        {
            return Err(BuildError::ConversionNotAllowed { node_type });
        }
        if method.is_some()
            && matches!(
                node_type,
                NodeType::AndAlso
                    | NodeType::OrElse
                    | NodeType::Coalesce
                    | NodeType::ArrayIndex
                    | NodeType::Assign
            )
        {
            return Err(BuildError::MethodNotAllowed { node_type });
        }

        let left_ty = left.value_type();
        let right_ty = right.value_type();

        let ty = if node_type.is_assignment() {
            Self::assignment_type(
                node_type,
                &left,
                &right,
                method.as_ref(),
                conversion.as_ref(),
            )?
        } else {
            match node_type {
                NodeType::AndAlso | NodeType::OrElse => {
                    for operand in [&left_ty, &right_ty] {
                        if !operand.is_bool() {
                            return Err(undefined(node_type, operand));
                        }
                    }
                    Type::Bool
                }
                NodeType::Coalesce => {
                    if !left_ty.is_reference() {
                        return Err(undefined(node_type, &left_ty));
                    }
                    match &conversion {
                        Some(lambda) => {
                            check_arguments(
                                "coalesce conversion",
                                &lambda_params(lambda),
                                std::slice::from_ref(&left),
                            )?;
                            lambda.return_type().clone()
                        }
                        None => right_ty,
                    }
                }
                NodeType::ArrayIndex => {
                    let Type::Array(element) = &left_ty else {
                        return Err(undefined(node_type, &left_ty));
                    };
                    if !right_ty.is_integer() && !matches!(right_ty, Type::Object) {
                        return Err(undefined(node_type, &right_ty));
                    }
                    element.as_ref().clone()
                }
                _ => match &method {
                    Some(method) => {
                        check_operator_method(
                            "operator method",
                            method,
                            &[left.clone(), right.clone()],
                        )?;
                        method.return_type().clone()
                    }
                    None => Self::native_type(node_type, &left_ty, &right_ty)?,
                },
            }
        };

        Ok(Arc::new(BinaryNode {
            node_type,
            left,
            right,
            method,
            conversion,
            ty,
        }))
    }

    /// Result type of a native (method-less) non-assignment operator.
    fn native_type(node_type: NodeType, left: &Type, right: &Type) -> Result<Type, BuildError> {
        if node_type == NodeType::Add && (matches!(left, Type::Str) || matches!(right, Type::Str)) {
            return Ok(Type::Str);
        }
        if matches!(node_type, NodeType::Equal | NodeType::NotEqual) {
            return Ok(Type::Bool);
        }
        for operand in [left, right] {
            if !native_operand(node_type, operand) {
                return Err(undefined(node_type, operand));
            }
        }
        Ok(if node_type.is_comparison() {
            Type::Bool
        } else {
            left.clone()
        })
    }

    /// Assignments evaluate to the left operand's type.
    fn assignment_type(
        node_type: NodeType,
        left: &Node,
        right: &Node,
        method: Option<&MethodRef>,
        conversion: Option<&Arc<LambdaNode>>,
    ) -> Result<Type, BuildError> {
        check_target(left)?;
        let left_ty = left.value_type();
        let right_ty = right.value_type();

        let Some(op) = node_type.compound_operator() else {
            expect_assignable("assignment", &left_ty, &right_ty)?;
            return Ok(left_ty);
        };

        match method {
            Some(method) => {
                check_operator_method(
                    "compound assignment",
                    method,
                    &[left.clone(), right.clone()],
                )?;
                let produced = method.return_type();
                match conversion {
                    Some(lambda) => {
                        let params = lambda_params(lambda);
                        if params.len() != 1 || &params[0] != produced {
                            return Err(BuildError::TypeMismatch {
                                context: "compound assignment conversion",
                                expected: produced.clone(),
                                found: params.first().cloned().unwrap_or(Type::Void),
                            });
                        }
                        expect_assignable(
                            "compound assignment conversion",
                            &left_ty,
                            lambda.return_type(),
                        )?;
                    }
                    None => {
                        if produced != &left_ty {
                            return Err(BuildError::TypeMismatch {
                                context: "compound assignment operator",
                                expected: left_ty,
                                found: produced.clone(),
                            });
                        }
                    }
                }
            }
            None => {
                if conversion.is_some() {
                    return Err(BuildError::ConversionNotAllowed { node_type });
                }
                Self::native_type(op, &left_ty, &right_ty)?;
            }
        }
        Ok(left_ty)
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn left(&self) -> &Node {
        &self.left
    }

    pub fn right(&self) -> &Node {
        &self.right
    }

    pub fn method(&self) -> Option<&MethodRef> {
        self.method.as_ref()
    }

    pub fn conversion(&self) -> Option<&Arc<LambdaNode>> {
        self.conversion.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    /// Same node if every child is identical, else a rebuilt node.
    pub fn update(
        self: &Arc<Self>,
        left: Node,
        right: Node,
        conversion: Option<Arc<LambdaNode>>,
    ) -> Result<Arc<Self>, BuildError> {
        if self.left.same(&left) && self.right.same(&right) && self.conversion.same(&conversion) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.node_type, left, right, self.method.clone(), conversion)
    }
}

fn lambda_params(lambda: &LambdaNode) -> Vec<Type> {
    lambda
        .parameters()
        .iter()
        .map(|p| p.value_type().clone())
        .collect()
}

/// Parameters, writable members and index expressions can be assigned.
fn check_target(target: &Node) -> Result<(), BuildError> {
    match target {
        Node::Member(m) if !m.member().can_write() => Err(BuildError::ReadOnlyMember {
            member: m.member().name().to_string(),
        }),
        _ if target.is_assignable() => Ok(()),
        _ => Err(BuildError::NotAssignable {
            found: target.node_type(),
        }),
    }
}

/// A node with one operand.
///
/// `operand` is `None` only for a rethrow (`Throw` with no operand).
#[derive(Debug)]
pub struct UnaryNode {
    node_type: NodeType,
    operand: Option<Node>,
    method: Option<MethodRef>,
    ty: Type,
}

impl UnaryNode {
    /// `target` is the result type for `Convert`, `ConvertChecked`, `TypeAs`
    /// and `Unbox`, and the optional static type of a `Throw`.
    pub fn make(
        node_type: NodeType,
        operand: Option<Node>,
        target: Option<Type>,
        method: Option<MethodRef>,
    ) -> Result<Arc<Self>, BuildError> {
        if !node_type.is_unary() {
            return Err(BuildError::WrongFamily {
                node_type,
                family: "unary",
            });
        }

        if node_type == NodeType::Throw {
            if method.is_some() {
                return Err(BuildError::MethodNotAllowed { node_type });
            }
            if let Some(operand) = &operand {
                let operand_ty = operand.value_type();
                if !operand_ty.is_reference() {
                    return Err(undefined(node_type, &operand_ty));
                }
            }
            return Ok(Arc::new(UnaryNode {
                node_type,
                operand,
                method,
                ty: target.unwrap_or(Type::Void),
            }));
        }

        let Some(operand) = operand else {
            return Err(BuildError::Invalid("unary node requires an operand"));
        };
        let operand_ty = operand.value_type();
        let is_conversion = matches!(
            node_type,
            NodeType::Convert | NodeType::ConvertChecked | NodeType::TypeAs | NodeType::Unbox
        );
        if method.is_some()
            && matches!(
                node_type,
                NodeType::TypeAs | NodeType::Unbox | NodeType::Quote | NodeType::ArrayLength
            )
        {
            return Err(BuildError::MethodNotAllowed { node_type });
        }
        if target.is_some() && !is_conversion {
            return Err(BuildError::Invalid(
                "only conversions and throw take a target type",
            ));
        }

        let ty = match node_type {
            NodeType::Convert | NodeType::ConvertChecked => {
                let Some(target) = target else {
                    return Err(BuildError::Invalid("conversion requires a target type"));
                };
                if let Some(method) = &method {
                    check_operator_method(
                        "conversion method",
                        method,
                        std::slice::from_ref(&operand),
                    )?;
                    expect_assignable("conversion method", &target, method.return_type())?;
                }
                target
            }
            NodeType::TypeAs => {
                let Some(target) = target else {
                    return Err(BuildError::Invalid("type-as requires a target type"));
                };
                if !target.is_reference() {
                    return Err(undefined(node_type, &target));
                }
                target
            }
            NodeType::Unbox => {
                let Some(target) = target else {
                    return Err(BuildError::Invalid("unbox requires a target type"));
                };
                if !matches!(operand_ty, Type::Object) || target.is_reference() {
                    return Err(undefined(node_type, &operand_ty));
                }
                target
            }
            NodeType::Quote => {
                if !matches!(operand, Node::Lambda(_)) {
                    return Err(BuildError::Invalid("quote requires a lambda operand"));
                }
                Type::Expr
            }
            NodeType::ArrayLength => {
                if !matches!(operand_ty, Type::Array(_)) {
                    return Err(undefined(node_type, &operand_ty));
                }
                Type::Int32
            }
            NodeType::PreIncrementAssign
            | NodeType::PreDecrementAssign
            | NodeType::PostIncrementAssign
            | NodeType::PostDecrementAssign => {
                check_target(&operand)?;
                let produced = Self::operator_type(node_type, &operand, &operand_ty, method.as_ref())?;
                if produced != operand_ty {
                    return Err(BuildError::TypeMismatch {
                        context: "increment assignment operator",
                        expected: operand_ty,
                        found: produced,
                    });
                }
                operand_ty
            }
            NodeType::IsTrue | NodeType::IsFalse => {
                Self::operator_type(node_type, &operand, &operand_ty, method.as_ref())?;
                Type::Bool
            }
            _ => Self::operator_type(node_type, &operand, &operand_ty, method.as_ref())?,
        };

        Ok(Arc::new(UnaryNode {
            node_type,
            operand: Some(operand),
            method,
            ty,
        }))
    }

    fn operator_type(
        node_type: NodeType,
        operand: &Node,
        operand_ty: &Type,
        method: Option<&MethodRef>,
    ) -> Result<Type, BuildError> {
        match method {
            Some(method) => {
                check_operator_method("operator method", method, std::slice::from_ref(operand))?;
                Ok(method.return_type().clone())
            }
            None if native_operand(node_type, operand_ty) => Ok(operand_ty.clone()),
            None => Err(undefined(node_type, operand_ty)),
        }
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn operand(&self) -> Option<&Node> {
        self.operand.as_ref()
    }

    pub fn method(&self) -> Option<&MethodRef> {
        self.method.as_ref()
    }

    pub fn value_type(&self) -> &Type {
        &self.ty
    }

    pub fn update(self: &Arc<Self>, operand: Option<Node>) -> Result<Arc<Self>, BuildError> {
        if self.operand.same(&operand) {
            return Ok(Arc::clone(self));
        }
        let target = match self.node_type {
            NodeType::Convert
            | NodeType::ConvertChecked
            | NodeType::TypeAs
            | NodeType::Unbox
            | NodeType::Throw => Some(self.ty.clone()),
            _ => None,
        };
        Self::make(self.node_type, operand, target, self.method.clone())
    }
}

/// `TypeIs` / `TypeEqual`: a runtime type test yielding `bool`.
#[derive(Debug)]
pub struct TypeBinaryNode {
    node_type: NodeType,
    expression: Node,
    type_operand: Type,
}

impl TypeBinaryNode {
    pub fn make(
        node_type: NodeType,
        expression: Node,
        type_operand: Type,
    ) -> Result<Arc<Self>, BuildError> {
        if !matches!(node_type, NodeType::TypeIs | NodeType::TypeEqual) {
            return Err(BuildError::WrongFamily {
                node_type,
                family: "type test",
            });
        }
        Ok(Arc::new(TypeBinaryNode {
            node_type,
            expression,
            type_operand,
        }))
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn expression(&self) -> &Node {
        &self.expression
    }

    pub fn type_operand(&self) -> &Type {
        &self.type_operand
    }

    pub fn update(self: &Arc<Self>, expression: Node) -> Result<Arc<Self>, BuildError> {
        if self.expression.same(&expression) {
            return Ok(Arc::clone(self));
        }
        Self::make(self.node_type, expression, self.type_operand.clone())
    }
}
