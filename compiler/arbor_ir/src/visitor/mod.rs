//! Tree rewriting.
//!
//! A single `Rewriter` trait. Every `visit_*` method defaults to the
//! matching `walk_*` function, which visits the node's children in order
//! and rebuilds the node through its `update`. Because `update` returns
//! the original `Arc` when nothing changed, the default rewriter is an
//! identity pass that allocates nothing.
//!
//! Override a `visit_*` method to transform one node kind; call the
//! `walk_*` function from the override to keep descending.
//!
//! ```text
//! struct FoldAdds;
//!
//! impl Rewriter for FoldAdds {
//!     fn visit_binary(&mut self, node: &Arc<BinaryNode>) -> Result<Node, RewriteError> {
//!         let node = walk_binary(self, node)?;
//!         // inspect the rebuilt node, return a folded constant ...
//!         Ok(node)
//!     }
//! }
//! ```
//!
//! The trait is object-safe; the walk functions are generic over `?Sized`
//! rewriters so they serve `dyn Rewriter` too.

use std::sync::Arc;

use arbor_stack::ensure_sufficient_stack;

use crate::errors::RewriteError;
use crate::node::{
    BinaryNode, BlockNode, CallNode, CatchClause, ConditionalNode, ConstantNode, DefaultNode,
    ElementInit, Extension, GotoNode, Identity, IndexNode, InvokeNode, LabelNode, LabelTarget,
    LambdaNode, ListInitNode, LoopNode, MemberBinding, MemberInitNode, MemberNode, NewArrayNode,
    NewNode, Node, NodeVariant, ParameterNode, SwitchCase, SwitchNode, TryNode, TypeBinaryNode,
    UnaryNode,
};

type VisitResult = Result<Node, RewriteError>;

/// Tree rewriter.
///
/// Override `visit_*` methods to rewrite specific node kinds. Returning a
/// different node from a `visit_*` method replaces that subtree.
pub trait Rewriter {
    /// Dispatch on the node's variant.
    fn visit(&mut self, node: &Node) -> VisitResult {
        walk_node(self, node)
    }

    fn visit_constant(&mut self, node: &Arc<ConstantNode>) -> VisitResult {
        Ok(Node::Constant(Arc::clone(node)))
    }

    fn visit_default(&mut self, node: &Arc<DefaultNode>) -> VisitResult {
        Ok(Node::Default(Arc::clone(node)))
    }

    fn visit_parameter(&mut self, node: &Arc<ParameterNode>) -> VisitResult {
        Ok(Node::Parameter(Arc::clone(node)))
    }

    fn visit_binary(&mut self, node: &Arc<BinaryNode>) -> VisitResult {
        walk_binary(self, node)
    }

    fn visit_unary(&mut self, node: &Arc<UnaryNode>) -> VisitResult {
        walk_unary(self, node)
    }

    fn visit_type_binary(&mut self, node: &Arc<TypeBinaryNode>) -> VisitResult {
        walk_type_binary(self, node)
    }

    fn visit_conditional(&mut self, node: &Arc<ConditionalNode>) -> VisitResult {
        walk_conditional(self, node)
    }

    fn visit_call(&mut self, node: &Arc<CallNode>) -> VisitResult {
        walk_call(self, node)
    }

    fn visit_invoke(&mut self, node: &Arc<InvokeNode>) -> VisitResult {
        walk_invoke(self, node)
    }

    fn visit_new(&mut self, node: &Arc<NewNode>) -> VisitResult {
        walk_new(self, node)
    }

    fn visit_new_array(&mut self, node: &Arc<NewArrayNode>) -> VisitResult {
        walk_new_array(self, node)
    }

    fn visit_member(&mut self, node: &Arc<MemberNode>) -> VisitResult {
        walk_member(self, node)
    }

    fn visit_index(&mut self, node: &Arc<IndexNode>) -> VisitResult {
        walk_index(self, node)
    }

    fn visit_lambda(&mut self, node: &Arc<LambdaNode>) -> VisitResult {
        walk_lambda(self, node)
    }

    fn visit_block(&mut self, node: &Arc<BlockNode>) -> VisitResult {
        walk_block(self, node)
    }

    fn visit_loop(&mut self, node: &Arc<LoopNode>) -> VisitResult {
        walk_loop(self, node)
    }

    fn visit_label(&mut self, node: &Arc<LabelNode>) -> VisitResult {
        walk_label(self, node)
    }

    fn visit_goto(&mut self, node: &Arc<GotoNode>) -> VisitResult {
        walk_goto(self, node)
    }

    fn visit_switch(&mut self, node: &Arc<SwitchNode>) -> VisitResult {
        walk_switch(self, node)
    }

    fn visit_try(&mut self, node: &Arc<TryNode>) -> VisitResult {
        walk_try(self, node)
    }

    fn visit_list_init(&mut self, node: &Arc<ListInitNode>) -> VisitResult {
        walk_list_init(self, node)
    }

    fn visit_member_init(&mut self, node: &Arc<MemberInitNode>) -> VisitResult {
        walk_member_init(self, node)
    }

    fn visit_extension(&mut self, node: &Arc<dyn Extension>) -> VisitResult {
        walk_extension(self, node)
    }

    /// Label targets are cross-references; the default keeps them as is.
    fn visit_label_target(&mut self, target: &LabelTarget) -> Result<LabelTarget, RewriteError> {
        Ok(target.clone())
    }

    fn visit_switch_case(
        &mut self,
        case: &Arc<SwitchCase>,
    ) -> Result<Arc<SwitchCase>, RewriteError> {
        walk_switch_case(self, case)
    }

    fn visit_catch_clause(
        &mut self,
        clause: &Arc<CatchClause>,
    ) -> Result<Arc<CatchClause>, RewriteError> {
        walk_catch_clause(self, clause)
    }

    fn visit_element_init(
        &mut self,
        init: &Arc<ElementInit>,
    ) -> Result<Arc<ElementInit>, RewriteError> {
        walk_element_init(self, init)
    }

    fn visit_member_binding(
        &mut self,
        binding: &Arc<MemberBinding>,
    ) -> Result<Arc<MemberBinding>, RewriteError> {
        walk_member_binding(self, binding)
    }
}

// Helpers

/// Visit an optional child; `None` maps to `None`.
pub fn visit_opt<V: Rewriter + ?Sized>(
    v: &mut V,
    node: Option<&Node>,
) -> Result<Option<Node>, RewriteError> {
    node.map(|n| v.visit(n)).transpose()
}

/// Visit a child that its parent requires to stay the same variant.
pub fn visit_as<T: NodeVariant, V: Rewriter + ?Sized>(
    v: &mut V,
    node: &Arc<T>,
    context: &'static str,
) -> Result<Arc<T>, RewriteError> {
    let visited = v.visit(&T::into_node(Arc::clone(node)))?;
    let found = visited.node_type();
    T::from_node(visited).ok_or(RewriteError::InvalidRewrite {
        context,
        expected: T::NAME,
        found,
    })
}

/// Visit each element of a child sequence.
///
/// The original sequence is returned (by identity) unless some element
/// changes; the copy is made lazily at the first changed element.
pub fn visit_seq<T, V, F>(v: &mut V, items: &Arc<[T]>, mut f: F) -> Result<Arc<[T]>, RewriteError>
where
    T: Identity + Clone,
    V: Rewriter + ?Sized,
    F: FnMut(&mut V, &T) -> Result<T, RewriteError>,
{
    let mut copy: Option<Vec<T>> = None;
    for (i, item) in items.iter().enumerate() {
        let visited = f(v, item)?;
        match copy.as_mut() {
            Some(changed) => changed.push(visited),
            None => {
                if !visited.same(item) {
                    let mut fresh = Vec::with_capacity(items.len());
                    fresh.extend_from_slice(&items[..i]);
                    fresh.push(visited);
                    copy = Some(fresh);
                }
            }
        }
    }
    Ok(match copy {
        Some(copy) => Arc::from(copy),
        None => Arc::clone(items),
    })
}

fn visit_nodes<V: Rewriter + ?Sized>(
    v: &mut V,
    nodes: &Arc<[Node]>,
) -> Result<Arc<[Node]>, RewriteError> {
    visit_seq(v, nodes, |v, n| v.visit(n))
}

fn visit_parameters<V: Rewriter + ?Sized>(
    v: &mut V,
    params: &Arc<[Arc<ParameterNode>]>,
    context: &'static str,
) -> Result<Arc<[Arc<ParameterNode>]>, RewriteError> {
    visit_seq(v, params, |v, p| visit_as(v, p, context))
}

fn visit_label_opt<V: Rewriter + ?Sized>(
    v: &mut V,
    target: Option<&LabelTarget>,
) -> Result<Option<LabelTarget>, RewriteError> {
    target.map(|t| v.visit_label_target(t)).transpose()
}

// Walk functions

pub fn walk_node<V: Rewriter + ?Sized>(v: &mut V, node: &Node) -> VisitResult {
    ensure_sufficient_stack(|| match node {
        Node::Constant(n) => v.visit_constant(n),
        Node::Default(n) => v.visit_default(n),
        Node::Parameter(n) => v.visit_parameter(n),
        Node::Binary(n) => v.visit_binary(n),
        Node::Unary(n) => v.visit_unary(n),
        Node::TypeBinary(n) => v.visit_type_binary(n),
        Node::Conditional(n) => v.visit_conditional(n),
        Node::Call(n) => v.visit_call(n),
        Node::Invoke(n) => v.visit_invoke(n),
        Node::New(n) => v.visit_new(n),
        Node::NewArray(n) => v.visit_new_array(n),
        Node::Member(n) => v.visit_member(n),
        Node::Index(n) => v.visit_index(n),
        Node::Lambda(n) => v.visit_lambda(n),
        Node::Block(n) => v.visit_block(n),
        Node::Loop(n) => v.visit_loop(n),
        Node::Label(n) => v.visit_label(n),
        Node::Goto(n) => v.visit_goto(n),
        Node::Switch(n) => v.visit_switch(n),
        Node::Try(n) => v.visit_try(n),
        Node::ListInit(n) => v.visit_list_init(n),
        Node::MemberInit(n) => v.visit_member_init(n),
        Node::Extension(n) => v.visit_extension(n),
    })
}

pub fn walk_binary<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<BinaryNode>) -> VisitResult {
    let left = v.visit(node.left())?;
    let right = v.visit(node.right())?;
    let conversion = node
        .conversion()
        .map(|c| visit_as(v, c, "binary conversion"))
        .transpose()?;
    Ok(Node::Binary(node.update(left, right, conversion)?))
}

pub fn walk_unary<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<UnaryNode>) -> VisitResult {
    let operand = visit_opt(v, node.operand())?;
    Ok(Node::Unary(node.update(operand)?))
}

pub fn walk_type_binary<V: Rewriter + ?Sized>(
    v: &mut V,
    node: &Arc<TypeBinaryNode>,
) -> VisitResult {
    let expression = v.visit(node.expression())?;
    Ok(Node::TypeBinary(node.update(expression)?))
}

pub fn walk_conditional<V: Rewriter + ?Sized>(
    v: &mut V,
    node: &Arc<ConditionalNode>,
) -> VisitResult {
    let test = v.visit(node.test())?;
    let if_true = v.visit(node.if_true())?;
    let if_false = v.visit(node.if_false())?;
    Ok(Node::Conditional(node.update(test, if_true, if_false)?))
}

pub fn walk_call<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<CallNode>) -> VisitResult {
    let object = visit_opt(v, node.object())?;
    let arguments = visit_nodes(v, node.arguments())?;
    Ok(Node::Call(node.update(object, arguments)?))
}

pub fn walk_invoke<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<InvokeNode>) -> VisitResult {
    let expression = v.visit(node.expression())?;
    let arguments = visit_nodes(v, node.arguments())?;
    Ok(Node::Invoke(node.update(expression, arguments)?))
}

pub fn walk_new<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<NewNode>) -> VisitResult {
    let arguments = visit_nodes(v, node.arguments())?;
    Ok(Node::New(node.update(arguments)?))
}

pub fn walk_new_array<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<NewArrayNode>) -> VisitResult {
    let expressions = visit_nodes(v, node.expressions())?;
    Ok(Node::NewArray(node.update(expressions)?))
}

pub fn walk_member<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<MemberNode>) -> VisitResult {
    let expression = visit_opt(v, node.expression())?;
    Ok(Node::Member(node.update(expression)?))
}

pub fn walk_index<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<IndexNode>) -> VisitResult {
    let object = v.visit(node.object())?;
    let arguments = visit_nodes(v, node.arguments())?;
    Ok(Node::Index(node.update(object, arguments)?))
}

pub fn walk_lambda<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<LambdaNode>) -> VisitResult {
    let body = v.visit(node.body())?;
    let parameters = visit_parameters(v, node.parameters(), "lambda parameter")?;
    Ok(Node::Lambda(node.update(body, parameters)?))
}

pub fn walk_block<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<BlockNode>) -> VisitResult {
    let variables = visit_parameters(v, node.variables(), "block variable")?;
    let expressions = visit_nodes(v, node.expressions())?;
    Ok(Node::Block(node.update(variables, expressions)?))
}

pub fn walk_loop<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<LoopNode>) -> VisitResult {
    let break_label = visit_label_opt(v, node.break_label())?;
    let continue_label = visit_label_opt(v, node.continue_label())?;
    let body = v.visit(node.body())?;
    Ok(Node::Loop(node.update(break_label, continue_label, body)?))
}

pub fn walk_label<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<LabelNode>) -> VisitResult {
    let target = v.visit_label_target(node.target())?;
    let default_value = visit_opt(v, node.default_value())?;
    Ok(Node::Label(node.update(target, default_value)?))
}

pub fn walk_goto<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<GotoNode>) -> VisitResult {
    let target = v.visit_label_target(node.target())?;
    let value = visit_opt(v, node.value())?;
    Ok(Node::Goto(node.update(target, value)?))
}

pub fn walk_switch<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<SwitchNode>) -> VisitResult {
    let switch_value = v.visit(node.switch_value())?;
    let cases = visit_seq(v, node.cases(), |v, c| v.visit_switch_case(c))?;
    let default_body = visit_opt(v, node.default_body())?;
    Ok(Node::Switch(node.update(switch_value, cases, default_body)?))
}

pub fn walk_switch_case<V: Rewriter + ?Sized>(
    v: &mut V,
    case: &Arc<SwitchCase>,
) -> Result<Arc<SwitchCase>, RewriteError> {
    let test_values = visit_nodes(v, case.test_values())?;
    let body = v.visit(case.body())?;
    Ok(case.update(test_values, body)?)
}

pub fn walk_try<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<TryNode>) -> VisitResult {
    let body = v.visit(node.body())?;
    let handlers = visit_seq(v, node.handlers(), |v, h| v.visit_catch_clause(h))?;
    let finally = visit_opt(v, node.finally())?;
    let fault = visit_opt(v, node.fault())?;
    Ok(Node::Try(node.update(body, handlers, finally, fault)?))
}

pub fn walk_catch_clause<V: Rewriter + ?Sized>(
    v: &mut V,
    clause: &Arc<CatchClause>,
) -> Result<Arc<CatchClause>, RewriteError> {
    let variable = clause
        .variable()
        .map(|p| visit_as(v, p, "catch variable"))
        .transpose()?;
    let filter = visit_opt(v, clause.filter())?;
    let body = v.visit(clause.body())?;
    Ok(clause.update(variable, filter, body)?)
}

pub fn walk_list_init<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<ListInitNode>) -> VisitResult {
    let new_expression = visit_as(v, node.new_expression(), "list initializer constructor")?;
    let initializers = visit_seq(v, node.initializers(), |v, i| v.visit_element_init(i))?;
    Ok(Node::ListInit(node.update(new_expression, initializers)?))
}

pub fn walk_element_init<V: Rewriter + ?Sized>(
    v: &mut V,
    init: &Arc<ElementInit>,
) -> Result<Arc<ElementInit>, RewriteError> {
    let arguments = visit_nodes(v, init.arguments())?;
    Ok(init.update(arguments)?)
}

pub fn walk_member_init<V: Rewriter + ?Sized>(
    v: &mut V,
    node: &Arc<MemberInitNode>,
) -> VisitResult {
    let new_expression = visit_as(v, node.new_expression(), "member initializer constructor")?;
    let bindings = visit_seq(v, node.bindings(), |v, b| v.visit_member_binding(b))?;
    Ok(Node::MemberInit(node.update(new_expression, bindings)?))
}

pub fn walk_member_binding<V: Rewriter + ?Sized>(
    v: &mut V,
    binding: &Arc<MemberBinding>,
) -> Result<Arc<MemberBinding>, RewriteError> {
    Ok(match binding.as_ref() {
        MemberBinding::Assignment { expression, .. } => {
            let expression = v.visit(expression)?;
            binding.update_assignment(expression)?
        }
        MemberBinding::Member { bindings, .. } => {
            let bindings = visit_seq(v, bindings, |v, b| v.visit_member_binding(b))?;
            binding.update_bindings(bindings)?
        }
        MemberBinding::List { initializers, .. } => {
            let initializers = visit_seq(v, initializers, |v, i| v.visit_element_init(i))?;
            binding.update_initializers(initializers)?
        }
    })
}

/// Extensions rewrite their own children through `visit_children`; an
/// extension that reports no change is kept as is.
pub fn walk_extension<V: Rewriter + ?Sized>(v: &mut V, node: &Arc<dyn Extension>) -> VisitResult {
    let rewritten = node.visit_children(&mut |child: &Node| v.visit(child))?;
    Ok(rewritten.unwrap_or_else(|| Node::Extension(Arc::clone(node))))
}
