//! The expression-tree node model.
//!
//! Nodes are immutable and reference-counted. A `Node` is a closed tagged
//! union over `Arc`'d variant structs, so cloning a node is a refcount bump
//! and identity is `Arc::ptr_eq`.
//!
//! # Construction
//!
//! Every variant is built through a validating `make` (or the free functions
//! in [`crate::build`]). Validation happens once, at build time: operand
//! types, argument counts, assignability of the left side of assignments and
//! static/instance agreement of members. The resulting `value_type` is stored
//! on the node.
//!
//! # Structural Sharing
//!
//! Every variant with children has an `update` taking the new children. When
//! each one is identical (by identity, not equality) to the current child,
//! `update` returns the same `Arc`. Otherwise it re-validates and builds a
//! fresh node. The rewriter relies on this to keep untouched subtrees shared.

mod call;
mod control;
mod display;
mod extension;
mod kind;
mod leaf;
mod operator;

use std::sync::Arc;

use crate::errors::BuildError;
use crate::types::Type;

pub use call::{
    CallNode, ElementInit, IndexNode, InvokeNode, LambdaNode, ListInitNode, MemberBinding,
    MemberInitNode, MemberNode, NewArrayNode, NewNode,
};
pub use control::{
    BlockNode, CatchClause, ConditionalNode, GotoKind, GotoNode, LabelNode, LoopNode, SwitchCase,
    SwitchNode, TryNode,
};
pub use extension::{ChildVisitor, Extension};
pub use kind::NodeType;
pub use leaf::{ConstantNode, DefaultNode, LabelTarget, ParameterId, ParameterNode};
pub use operator::{BinaryNode, TypeBinaryNode, UnaryNode};

/// One immutable fragment of an expression tree.
#[derive(Clone, Debug)]
pub enum Node {
    Constant(Arc<ConstantNode>),
    Default(Arc<DefaultNode>),
    Parameter(Arc<ParameterNode>),
    Binary(Arc<BinaryNode>),
    Unary(Arc<UnaryNode>),
    TypeBinary(Arc<TypeBinaryNode>),
    Conditional(Arc<ConditionalNode>),
    Call(Arc<CallNode>),
    Invoke(Arc<InvokeNode>),
    New(Arc<NewNode>),
    NewArray(Arc<NewArrayNode>),
    Member(Arc<MemberNode>),
    Index(Arc<IndexNode>),
    Lambda(Arc<LambdaNode>),
    Block(Arc<BlockNode>),
    Loop(Arc<LoopNode>),
    Label(Arc<LabelNode>),
    Goto(Arc<GotoNode>),
    Switch(Arc<SwitchNode>),
    Try(Arc<TryNode>),
    ListInit(Arc<ListInitNode>),
    MemberInit(Arc<MemberInitNode>),
    Extension(Arc<dyn Extension>),
}

impl Node {
    /// The discriminant of this node.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Constant(_) => NodeType::Constant,
            Node::Default(_) => NodeType::Default,
            Node::Parameter(_) => NodeType::Parameter,
            Node::Binary(n) => n.node_type(),
            Node::Unary(n) => n.node_type(),
            Node::TypeBinary(n) => n.node_type(),
            Node::Conditional(_) => NodeType::Conditional,
            Node::Call(_) => NodeType::Call,
            Node::Invoke(_) => NodeType::Invoke,
            Node::New(_) => NodeType::New,
            Node::NewArray(n) => n.node_type(),
            Node::Member(_) => NodeType::MemberAccess,
            Node::Index(_) => NodeType::Index,
            Node::Lambda(_) => NodeType::Lambda,
            Node::Block(_) => NodeType::Block,
            Node::Loop(_) => NodeType::Loop,
            Node::Label(_) => NodeType::Label,
            Node::Goto(_) => NodeType::Goto,
            Node::Switch(_) => NodeType::Switch,
            Node::Try(_) => NodeType::Try,
            Node::ListInit(_) => NodeType::ListInit,
            Node::MemberInit(_) => NodeType::MemberInit,
            Node::Extension(_) => NodeType::Extension,
        }
    }

    /// The static type this node evaluates to.
    pub fn value_type(&self) -> Type {
        match self {
            Node::Constant(n) => n.value_type().clone(),
            Node::Default(n) => n.value_type().clone(),
            Node::Parameter(n) => n.value_type().clone(),
            Node::Binary(n) => n.value_type().clone(),
            Node::Unary(n) => n.value_type().clone(),
            Node::TypeBinary(_) => Type::Bool,
            Node::Conditional(n) => n.value_type().clone(),
            Node::Call(n) => n.value_type().clone(),
            Node::Invoke(n) => n.value_type().clone(),
            Node::New(n) => n.value_type().clone(),
            Node::NewArray(n) => n.value_type().clone(),
            Node::Member(n) => n.value_type().clone(),
            Node::Index(n) => n.value_type().clone(),
            Node::Lambda(n) => n.value_type().clone(),
            Node::Block(n) => n.value_type().clone(),
            Node::Loop(n) => n.value_type().clone(),
            Node::Label(n) => n.value_type().clone(),
            Node::Goto(n) => n.value_type().clone(),
            Node::Switch(n) => n.value_type().clone(),
            Node::Try(n) => n.value_type().clone(),
            Node::ListInit(n) => n.value_type().clone(),
            Node::MemberInit(n) => n.value_type().clone(),
            Node::Extension(n) => n.value_type(),
        }
    }

    /// Identity comparison: both handles point at the same node.
    pub fn same(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Constant(a), Node::Constant(b)) => Arc::ptr_eq(a, b),
            (Node::Default(a), Node::Default(b)) => Arc::ptr_eq(a, b),
            (Node::Parameter(a), Node::Parameter(b)) => Arc::ptr_eq(a, b),
            (Node::Binary(a), Node::Binary(b)) => Arc::ptr_eq(a, b),
            (Node::Unary(a), Node::Unary(b)) => Arc::ptr_eq(a, b),
            (Node::TypeBinary(a), Node::TypeBinary(b)) => Arc::ptr_eq(a, b),
            (Node::Conditional(a), Node::Conditional(b)) => Arc::ptr_eq(a, b),
            (Node::Call(a), Node::Call(b)) => Arc::ptr_eq(a, b),
            (Node::Invoke(a), Node::Invoke(b)) => Arc::ptr_eq(a, b),
            (Node::New(a), Node::New(b)) => Arc::ptr_eq(a, b),
            (Node::NewArray(a), Node::NewArray(b)) => Arc::ptr_eq(a, b),
            (Node::Member(a), Node::Member(b)) => Arc::ptr_eq(a, b),
            (Node::Index(a), Node::Index(b)) => Arc::ptr_eq(a, b),
            (Node::Lambda(a), Node::Lambda(b)) => Arc::ptr_eq(a, b),
            (Node::Block(a), Node::Block(b)) => Arc::ptr_eq(a, b),
            (Node::Loop(a), Node::Loop(b)) => Arc::ptr_eq(a, b),
            (Node::Label(a), Node::Label(b)) => Arc::ptr_eq(a, b),
            (Node::Goto(a), Node::Goto(b)) => Arc::ptr_eq(a, b),
            (Node::Switch(a), Node::Switch(b)) => Arc::ptr_eq(a, b),
            (Node::Try(a), Node::Try(b)) => Arc::ptr_eq(a, b),
            (Node::ListInit(a), Node::ListInit(b)) => Arc::ptr_eq(a, b),
            (Node::MemberInit(a), Node::MemberInit(b)) => Arc::ptr_eq(a, b),
            (Node::Extension(a), Node::Extension(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }

    /// The parameter, if this is a parameter node.
    pub fn as_parameter(&self) -> Option<&Arc<ParameterNode>> {
        match self {
            Node::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<&Arc<LambdaNode>> {
        match self {
            Node::Lambda(l) => Some(l),
            _ => None,
        }
    }

    /// Whether this node may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        match self {
            Node::Parameter(_) | Node::Index(_) => true,
            Node::Member(m) => m.member().can_write(),
            _ => false,
        }
    }
}

macro_rules! node_from_arc {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<Arc<$ty>> for Node {
                #[inline]
                fn from(node: Arc<$ty>) -> Self {
                    Node::$variant(node)
                }
            }
        )*
    };
}

node_from_arc! {
    Constant => ConstantNode,
    Default => DefaultNode,
    Parameter => ParameterNode,
    Binary => BinaryNode,
    Unary => UnaryNode,
    TypeBinary => TypeBinaryNode,
    Conditional => ConditionalNode,
    Call => CallNode,
    Invoke => InvokeNode,
    New => NewNode,
    NewArray => NewArrayNode,
    Member => MemberNode,
    Index => IndexNode,
    Lambda => LambdaNode,
    Block => BlockNode,
    Loop => LoopNode,
    Label => LabelNode,
    Goto => GotoNode,
    Switch => SwitchNode,
    Try => TryNode,
    ListInit => ListInitNode,
    MemberInit => MemberInitNode,
}

/// A node variant that some parent requires by concrete type.
///
/// Lambda parameters, block variables and catch variables must stay
/// `ParameterNode`s through a rewrite; a conversion lambda must stay a
/// `LambdaNode`; an initializer's constructor call must stay a `NewNode`.
pub trait NodeVariant: Sized {
    const NAME: &'static str;

    fn into_node(this: Arc<Self>) -> Node;

    fn from_node(node: Node) -> Option<Arc<Self>>;
}

macro_rules! node_variant {
    ($($variant:ident => $ty:ty, $name:literal);* $(;)?) => {
        $(
            impl NodeVariant for $ty {
                const NAME: &'static str = $name;

                #[inline]
                fn into_node(this: Arc<Self>) -> Node {
                    Node::$variant(this)
                }

                #[inline]
                fn from_node(node: Node) -> Option<Arc<Self>> {
                    match node {
                        Node::$variant(n) => Some(n),
                        _ => None,
                    }
                }
            }
        )*
    };
}

node_variant! {
    Parameter => ParameterNode, "parameter";
    Lambda => LambdaNode, "lambda";
    New => NewNode, "new";
}

/// Identity for values stored in node child sequences.
pub trait Identity {
    fn same(&self, other: &Self) -> bool;
}

impl Identity for Node {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        Node::same(self, other)
    }
}

impl<T: ?Sized> Identity for Arc<T> {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(self), Arc::as_ptr(other))
    }
}

impl<T: Identity> Identity for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Element-wise identity of two child sequences.
pub fn same_seq<T: Identity>(a: &[T], b: &[T]) -> bool {
    std::ptr::eq(a, b) || (a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y)))
}

// Shared validation

/// `found` must be storable where `expected` is declared.
pub(crate) fn expect_assignable(
    context: &'static str,
    expected: &Type,
    found: &Type,
) -> Result<(), BuildError> {
    if expected.is_assignable_from(found) {
        Ok(())
    } else {
        Err(BuildError::TypeMismatch {
            context,
            expected: expected.clone(),
            found: found.clone(),
        })
    }
}

/// Argument count and per-argument assignability against `params`.
pub(crate) fn check_arguments(
    context: &'static str,
    params: &[Type],
    args: &[Node],
) -> Result<(), BuildError> {
    if params.len() != args.len() {
        return Err(BuildError::ArgumentCount {
            context,
            expected: params.len(),
            found: args.len(),
        });
    }
    for (param, arg) in params.iter().zip(args) {
        expect_assignable(context, param, &arg.value_type())?;
    }
    Ok(())
}

/// Static members take no instance; instance members require one.
pub(crate) fn check_instance(
    member: &str,
    is_static: bool,
    instance: Option<&Node>,
) -> Result<(), BuildError> {
    match (is_static, instance) {
        (true, Some(_)) => Err(BuildError::StaticWithInstance {
            member: member.to_string(),
        }),
        (false, None) => Err(BuildError::InstanceRequired {
            member: member.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Parameters and variables must be unique by identity.
pub(crate) fn check_unique(params: &[Arc<ParameterNode>]) -> Result<(), BuildError> {
    for (i, p) in params.iter().enumerate() {
        if params[..i].iter().any(|q| q.id() == p.id()) {
            return Err(BuildError::DuplicateParameter {
                name: p.display_name(),
            });
        }
    }
    Ok(())
}
