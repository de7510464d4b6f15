//! Factory functions for assembling trees.
//!
//! Thin wrappers over the validating `make` constructors that return
//! `Node` directly. Fallible factories return `BuildError` eagerly; nothing
//! is checked later.

use std::sync::Arc;

use crate::capability::{ConstructorRef, IndexerRef, MemberRef, MethodRef};
use crate::errors::BuildError;
use crate::node::{
    BinaryNode, BlockNode, CallNode, CatchClause, ConditionalNode, ConstantNode, DefaultNode,
    ElementInit, GotoKind, GotoNode, IndexNode, InvokeNode, LabelNode, LabelTarget, LambdaNode,
    ListInitNode, LoopNode, MemberBinding, MemberInitNode, MemberNode, NewArrayNode, NewNode, Node,
    NodeType, ParameterNode, SwitchCase, SwitchNode, TryNode, TypeBinaryNode, UnaryNode,
};
use crate::types::Type;
use crate::value::Value;

type BuildResult = Result<Node, BuildError>;

// Leaves

pub fn constant(value: impl Into<Value>) -> Node {
    Node::Constant(ConstantNode::make(value.into()))
}

/// A constant with an explicit static type.
pub fn constant_typed(value: impl Into<Value>, ty: Type) -> BuildResult {
    ConstantNode::make_typed(value.into(), ty).map(Node::Constant)
}

/// `null` typed as the reference type `ty`.
pub fn null(ty: Type) -> BuildResult {
    constant_typed(Value::Null, ty)
}

pub fn default(ty: Type) -> Node {
    Node::Default(DefaultNode::make(ty))
}

pub fn parameter(name: &str, ty: Type) -> Result<Arc<ParameterNode>, BuildError> {
    ParameterNode::new(Some(name), ty)
}

/// A block-scoped variable. Same node kind as a parameter.
pub fn variable(name: &str, ty: Type) -> Result<Arc<ParameterNode>, BuildError> {
    ParameterNode::new(Some(name), ty)
}

pub fn label_target(name: &str, ty: Type) -> LabelTarget {
    LabelTarget::new(Some(name), ty)
}

// Operators

pub fn binary(node_type: NodeType, left: Node, right: Node) -> BuildResult {
    BinaryNode::make(node_type, left, right, None, None).map(Node::Binary)
}

/// A binary node dispatched through an operator method.
pub fn binary_with_method(
    node_type: NodeType,
    left: Node,
    right: Node,
    method: MethodRef,
) -> BuildResult {
    BinaryNode::make(node_type, left, right, Some(method), None).map(Node::Binary)
}

/// Compound assignment through `method`, whose result `conversion` maps
/// back to the left operand's type.
pub fn compound_assign_with_conversion(
    node_type: NodeType,
    left: Node,
    right: Node,
    method: MethodRef,
    conversion: Arc<LambdaNode>,
) -> BuildResult {
    BinaryNode::make(node_type, left, right, Some(method), Some(conversion)).map(Node::Binary)
}

/// `left ?? right` with `conversion` applied to a non-null left value.
pub fn coalesce_with_conversion(
    left: Node,
    right: Node,
    conversion: Arc<LambdaNode>,
) -> BuildResult {
    BinaryNode::make(NodeType::Coalesce, left, right, None, Some(conversion)).map(Node::Binary)
}

macro_rules! binary_factories {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(left: Node, right: Node) -> BuildResult {
                binary(NodeType::$kind, left, right)
            }
        )*
    };
}

binary_factories! {
    add => Add,
    add_checked => AddChecked,
    subtract => Subtract,
    subtract_checked => SubtractChecked,
    multiply => Multiply,
    multiply_checked => MultiplyChecked,
    divide => Divide,
    modulo => Modulo,
    power => Power,
    and => And,
    or => Or,
    exclusive_or => ExclusiveOr,
    left_shift => LeftShift,
    right_shift => RightShift,
    and_also => AndAlso,
    or_else => OrElse,
    equal => Equal,
    not_equal => NotEqual,
    less_than => LessThan,
    less_than_or_equal => LessThanOrEqual,
    greater_than => GreaterThan,
    greater_than_or_equal => GreaterThanOrEqual,
    coalesce => Coalesce,
    array_index => ArrayIndex,
    assign => Assign,
    add_assign => AddAssign,
    add_assign_checked => AddAssignChecked,
    subtract_assign => SubtractAssign,
    subtract_assign_checked => SubtractAssignChecked,
    multiply_assign => MultiplyAssign,
    multiply_assign_checked => MultiplyAssignChecked,
    divide_assign => DivideAssign,
    modulo_assign => ModuloAssign,
    power_assign => PowerAssign,
    and_assign => AndAssign,
    or_assign => OrAssign,
    exclusive_or_assign => ExclusiveOrAssign,
    left_shift_assign => LeftShiftAssign,
    right_shift_assign => RightShiftAssign,
}

pub fn unary(node_type: NodeType, operand: Node) -> BuildResult {
    UnaryNode::make(node_type, Some(operand), None, None).map(Node::Unary)
}

pub fn unary_with_method(node_type: NodeType, operand: Node, method: MethodRef) -> BuildResult {
    UnaryNode::make(node_type, Some(operand), None, Some(method)).map(Node::Unary)
}

macro_rules! unary_factories {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(operand: Node) -> BuildResult {
                unary(NodeType::$kind, operand)
            }
        )*
    };
}

unary_factories! {
    negate => Negate,
    negate_checked => NegateChecked,
    unary_plus => UnaryPlus,
    not => Not,
    ones_complement => OnesComplement,
    is_true => IsTrue,
    is_false => IsFalse,
    increment => Increment,
    decrement => Decrement,
    array_length => ArrayLength,
    quote => Quote,
    pre_increment_assign => PreIncrementAssign,
    pre_decrement_assign => PreDecrementAssign,
    post_increment_assign => PostIncrementAssign,
    post_decrement_assign => PostDecrementAssign,
}

pub fn convert(operand: Node, ty: Type) -> BuildResult {
    UnaryNode::make(NodeType::Convert, Some(operand), Some(ty), None).map(Node::Unary)
}

pub fn convert_checked(operand: Node, ty: Type) -> BuildResult {
    UnaryNode::make(NodeType::ConvertChecked, Some(operand), Some(ty), None).map(Node::Unary)
}

/// User-defined conversion through a static one-argument method.
pub fn convert_with_method(operand: Node, ty: Type, method: MethodRef) -> BuildResult {
    UnaryNode::make(NodeType::Convert, Some(operand), Some(ty), Some(method)).map(Node::Unary)
}

pub fn type_as(operand: Node, ty: Type) -> BuildResult {
    UnaryNode::make(NodeType::TypeAs, Some(operand), Some(ty), None).map(Node::Unary)
}

pub fn unbox(operand: Node, ty: Type) -> BuildResult {
    UnaryNode::make(NodeType::Unbox, Some(operand), Some(ty), None).map(Node::Unary)
}

pub fn throw(exception: Node) -> BuildResult {
    UnaryNode::make(NodeType::Throw, Some(exception), None, None).map(Node::Unary)
}

/// A throw whose expression type is `ty` (so it can stand in a typed
/// position).
pub fn throw_typed(exception: Node, ty: Type) -> BuildResult {
    UnaryNode::make(NodeType::Throw, Some(exception), Some(ty), None).map(Node::Unary)
}

/// Re-raise the exception being handled.
pub fn rethrow() -> BuildResult {
    UnaryNode::make(NodeType::Throw, None, None, None).map(Node::Unary)
}

pub fn type_is(expression: Node, ty: Type) -> BuildResult {
    TypeBinaryNode::make(NodeType::TypeIs, expression, ty).map(Node::TypeBinary)
}

pub fn type_equal(expression: Node, ty: Type) -> BuildResult {
    TypeBinaryNode::make(NodeType::TypeEqual, expression, ty).map(Node::TypeBinary)
}

// Control flow

/// `test ? if_true : if_false`, typed as `if_true`.
pub fn condition(test: Node, if_true: Node, if_false: Node) -> BuildResult {
    ConditionalNode::make(test, if_true, if_false, None).map(Node::Conditional)
}

/// Statement form: `if (test) { if_true }`.
pub fn if_then(test: Node, if_true: Node) -> BuildResult {
    ConditionalNode::make(test, if_true, empty(), Some(Type::Void)).map(Node::Conditional)
}

pub fn if_then_else(test: Node, if_true: Node, if_false: Node) -> BuildResult {
    ConditionalNode::make(test, if_true, if_false, Some(Type::Void)).map(Node::Conditional)
}

/// The void expression.
pub fn empty() -> Node {
    default(Type::Void)
}

pub fn block(expressions: impl Into<Arc<[Node]>>) -> BuildResult {
    BlockNode::make(Vec::<Arc<ParameterNode>>::new(), expressions, None).map(Node::Block)
}

pub fn block_with_variables(
    variables: impl Into<Arc<[Arc<ParameterNode>]>>,
    expressions: impl Into<Arc<[Node]>>,
) -> BuildResult {
    BlockNode::make(variables, expressions, None).map(Node::Block)
}

pub fn block_typed(
    ty: Type,
    variables: impl Into<Arc<[Arc<ParameterNode>]>>,
    expressions: impl Into<Arc<[Node]>>,
) -> BuildResult {
    BlockNode::make(variables, expressions, Some(ty)).map(Node::Block)
}

/// `loop { body }` with optional break and continue targets.
pub fn loop_with(
    body: Node,
    break_label: Option<LabelTarget>,
    continue_label: Option<LabelTarget>,
) -> BuildResult {
    LoopNode::make(body, break_label, continue_label).map(Node::Loop)
}

pub fn label(target: LabelTarget, default_value: Option<Node>) -> BuildResult {
    LabelNode::make(target, default_value).map(Node::Label)
}

pub fn jump(kind: GotoKind, target: LabelTarget, value: Option<Node>) -> BuildResult {
    GotoNode::make(kind, target, value, None).map(Node::Goto)
}

pub fn goto(target: LabelTarget) -> BuildResult {
    jump(GotoKind::Goto, target, None)
}

pub fn goto_with(target: LabelTarget, value: Node) -> BuildResult {
    jump(GotoKind::Goto, target, Some(value))
}

pub fn break_to(target: LabelTarget, value: Option<Node>) -> BuildResult {
    jump(GotoKind::Break, target, value)
}

pub fn continue_to(target: LabelTarget) -> BuildResult {
    jump(GotoKind::Continue, target, None)
}

pub fn return_to(target: LabelTarget, value: Option<Node>) -> BuildResult {
    jump(GotoKind::Return, target, value)
}

pub fn switch_case(
    test_values: impl Into<Arc<[Node]>>,
    body: Node,
) -> Result<Arc<SwitchCase>, BuildError> {
    SwitchCase::make(test_values, body)
}

pub fn switch(
    switch_value: Node,
    cases: impl Into<Arc<[Arc<SwitchCase>]>>,
    default_body: Option<Node>,
) -> BuildResult {
    SwitchNode::make(switch_value, cases, default_body, None, None).map(Node::Switch)
}

/// A switch whose case values are matched by `comparer(switch_value, test)`.
pub fn switch_with_comparer(
    switch_value: Node,
    cases: impl Into<Arc<[Arc<SwitchCase>]>>,
    default_body: Option<Node>,
    comparer: MethodRef,
) -> BuildResult {
    SwitchNode::make(switch_value, cases, default_body, Some(comparer), None).map(Node::Switch)
}

/// `catch (ty) { body }` without a bound variable.
pub fn catch(ty: Type, body: Node) -> Result<Arc<CatchClause>, BuildError> {
    CatchClause::make(ty, None, None, body)
}

/// `catch (T e) { body }`, catching the variable's type.
pub fn catch_var(variable: Arc<ParameterNode>, body: Node) -> Result<Arc<CatchClause>, BuildError> {
    let ty = variable.value_type().clone();
    CatchClause::make(ty, Some(variable), None, body)
}

/// `catch (T e) when (filter) { body }`
pub fn catch_when(
    ty: Type,
    variable: Option<Arc<ParameterNode>>,
    filter: Node,
    body: Node,
) -> Result<Arc<CatchClause>, BuildError> {
    CatchClause::make(ty, variable, Some(filter), body)
}

pub fn try_catch(body: Node, handlers: impl Into<Arc<[Arc<CatchClause>]>>) -> BuildResult {
    TryNode::make(body, handlers, None, None).map(Node::Try)
}

pub fn try_finally(body: Node, finally: Node) -> BuildResult {
    TryNode::make(body, Vec::<Arc<CatchClause>>::new(), Some(finally), None).map(Node::Try)
}

pub fn try_catch_finally(
    body: Node,
    handlers: impl Into<Arc<[Arc<CatchClause>]>>,
    finally: Node,
) -> BuildResult {
    TryNode::make(body, handlers, Some(finally), None).map(Node::Try)
}

pub fn try_fault(body: Node, fault: Node) -> BuildResult {
    TryNode::make(body, Vec::<Arc<CatchClause>>::new(), None, Some(fault)).map(Node::Try)
}

// Calls, members and construction

pub fn call(object: Node, method: MethodRef, arguments: impl Into<Arc<[Node]>>) -> BuildResult {
    CallNode::make(Some(object), method, arguments).map(Node::Call)
}

pub fn call_static(method: MethodRef, arguments: impl Into<Arc<[Node]>>) -> BuildResult {
    CallNode::make(None, method, arguments).map(Node::Call)
}

pub fn invoke(expression: Node, arguments: impl Into<Arc<[Node]>>) -> BuildResult {
    InvokeNode::make(expression, arguments).map(Node::Invoke)
}

pub fn new_expression(
    constructor: ConstructorRef,
    arguments: impl Into<Arc<[Node]>>,
) -> Result<Arc<NewNode>, BuildError> {
    NewNode::make(constructor, arguments)
}

pub fn new(constructor: ConstructorRef, arguments: impl Into<Arc<[Node]>>) -> BuildResult {
    new_expression(constructor, arguments).map(Node::New)
}

pub fn new_array_init(element_type: Type, items: impl Into<Arc<[Node]>>) -> BuildResult {
    NewArrayNode::make(NodeType::NewArrayInit, element_type, items).map(Node::NewArray)
}

pub fn new_array_bounds(element_type: Type, bounds: impl Into<Arc<[Node]>>) -> BuildResult {
    NewArrayNode::make(NodeType::NewArrayBounds, element_type, bounds).map(Node::NewArray)
}

/// Instance field or property read.
pub fn member(expression: Node, member: MemberRef) -> BuildResult {
    MemberNode::make(Some(expression), member).map(Node::Member)
}

pub fn static_member(member: MemberRef) -> BuildResult {
    MemberNode::make(None, member).map(Node::Member)
}

/// `array[index]` as an assignable index node.
pub fn array_access(array: Node, index: Node) -> BuildResult {
    IndexNode::make(array, None, vec![index]).map(Node::Index)
}

/// `object[arguments...]` through an indexed property.
pub fn index(object: Node, indexer: IndexerRef, arguments: impl Into<Arc<[Node]>>) -> BuildResult {
    IndexNode::make(object, Some(indexer), arguments).map(Node::Index)
}

pub fn lambda(
    body: Node,
    parameters: impl Into<Arc<[Arc<ParameterNode>]>>,
) -> Result<Arc<LambdaNode>, BuildError> {
    LambdaNode::make(None, body, parameters, None)
}

/// A lambda with an explicit return type (`void` discards the body value).
pub fn lambda_typed(
    body: Node,
    parameters: impl Into<Arc<[Arc<ParameterNode>]>>,
    return_type: Type,
) -> Result<Arc<LambdaNode>, BuildError> {
    LambdaNode::make(None, body, parameters, Some(return_type))
}

pub fn lambda_named(
    name: &str,
    body: Node,
    parameters: impl Into<Arc<[Arc<ParameterNode>]>>,
) -> Result<Arc<LambdaNode>, BuildError> {
    LambdaNode::make(Some(name), body, parameters, None)
}

pub fn element_init(
    add_method: MethodRef,
    arguments: impl Into<Arc<[Node]>>,
) -> Result<Arc<ElementInit>, BuildError> {
    ElementInit::make(add_method, arguments)
}

pub fn list_init(
    new_expression: Arc<NewNode>,
    initializers: impl Into<Arc<[Arc<ElementInit>]>>,
) -> BuildResult {
    ListInitNode::make(new_expression, initializers).map(Node::ListInit)
}

/// `member = expression` inside a member initializer.
pub fn bind(member: MemberRef, expression: Node) -> Result<Arc<MemberBinding>, BuildError> {
    MemberBinding::assignment(member, expression)
}

pub fn member_bind(
    member: MemberRef,
    bindings: impl Into<Arc<[Arc<MemberBinding>]>>,
) -> Result<Arc<MemberBinding>, BuildError> {
    MemberBinding::member(member, bindings)
}

pub fn list_bind(
    member: MemberRef,
    initializers: impl Into<Arc<[Arc<ElementInit>]>>,
) -> Result<Arc<MemberBinding>, BuildError> {
    MemberBinding::list(member, initializers)
}

pub fn member_init(
    new_expression: Arc<NewNode>,
    bindings: impl Into<Arc<[Arc<MemberBinding>]>>,
) -> BuildResult {
    MemberInitNode::make(new_expression, bindings).map(Node::MemberInit)
}
