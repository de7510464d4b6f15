//! Property-based tests for evaluation.
//!
//! Random `Int32` trees over one parameter verify:
//! 1. The interpreter agrees with wrapping Rust arithmetic
//! 2. A rewriter that overrides nothing preserves the result
//! 3. Folding constant subtrees with the native operators preserves the result
//! 4. A compiled callable agrees with a directly driven interpreter

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    reason = "Proptest macros generate code with these patterns"
)]

use std::sync::Arc;

use arbor_eval::{evaluate_binary, evaluate_unary, Compile, Interpreter};
use arbor_ir::build;
use arbor_ir::node::{BinaryNode, UnaryNode};
use arbor_ir::visitor::{walk_binary, walk_unary};
use arbor_ir::{LambdaNode, Node, NodeType, ParameterNode, RewriteError, Rewriter, Type, Value};
use proptest::prelude::*;

// -- Tree Generation Strategies --

#[derive(Clone, Debug)]
enum Shape {
    Const(i32),
    Param,
    Op(NodeType, Box<Shape>, Box<Shape>),
    Neg(Box<Shape>),
    Cond(Box<Shape>, Box<Shape>, Box<Shape>),
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        (-1_000i32..1_000).prop_map(Shape::Const),
        Just(Shape::Param),
    ];
    leaf.prop_recursive(6, 64, 3, |inner| {
        prop_oneof![
            (
                prop_oneof![
                    Just(NodeType::Add),
                    Just(NodeType::Subtract),
                    Just(NodeType::Multiply),
                    Just(NodeType::And),
                    Just(NodeType::Or),
                    Just(NodeType::ExclusiveOr),
                ],
                inner.clone(),
                inner.clone()
            )
                .prop_map(|(op, l, r)| Shape::Op(op, Box::new(l), Box::new(r))),
            inner.clone().prop_map(|s| Shape::Neg(Box::new(s))),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(t, a, b)| Shape::Cond(Box::new(t), Box::new(a), Box::new(b))),
        ]
    })
}

fn build_tree(shape: &Shape, x: &Arc<ParameterNode>) -> Node {
    match shape {
        Shape::Const(n) => build::constant(*n),
        Shape::Param => Node::from(Arc::clone(x)),
        Shape::Op(op, l, r) => build::binary(*op, build_tree(l, x), build_tree(r, x)).unwrap(),
        Shape::Neg(s) => build::negate(build_tree(s, x)).unwrap(),
        Shape::Cond(t, a, b) => {
            let test = build::less_than(build_tree(t, x), build::constant(0)).unwrap();
            build::condition(test, build_tree(a, x), build_tree(b, x)).unwrap()
        }
    }
}

fn reference(shape: &Shape, x: i32) -> i32 {
    match shape {
        Shape::Const(n) => *n,
        Shape::Param => x,
        Shape::Op(op, l, r) => {
            let (l, r) = (reference(l, x), reference(r, x));
            match op {
                NodeType::Add => l.wrapping_add(r),
                NodeType::Subtract => l.wrapping_sub(r),
                NodeType::Multiply => l.wrapping_mul(r),
                NodeType::And => l & r,
                NodeType::Or => l | r,
                NodeType::ExclusiveOr => l ^ r,
                other => panic!("operator {other:?} is not generated"),
            }
        }
        Shape::Neg(s) => reference(s, x).wrapping_neg(),
        Shape::Cond(t, a, b) => {
            if reference(t, x) < 0 {
                reference(a, x)
            } else {
                reference(b, x)
            }
        }
    }
}

fn function_of(shape: &Shape) -> Arc<LambdaNode> {
    let x = build::parameter("x", Type::Int32).unwrap();
    let body = build_tree(shape, &x);
    build::lambda(body, vec![x]).unwrap()
}

fn interpret(f: &Arc<LambdaNode>, x: i32) -> Value {
    Interpreter::new(f).interpret(&[Value::Int32(x)]).unwrap()
}

// -- Rewriters --

struct NoOp;

impl Rewriter for NoOp {}

/// Replaces operator nodes whose operands are all constants by their value.
struct ConstantFolder {
    folded: usize,
}

fn constant_value(node: &Node) -> Option<Value> {
    match node {
        Node::Constant(c) => Some(c.value().clone()),
        _ => None,
    }
}

impl Rewriter for ConstantFolder {
    fn visit_binary(&mut self, node: &Arc<BinaryNode>) -> Result<Node, RewriteError> {
        let walked = walk_binary(self, node)?;
        let Node::Binary(binary) = &walked else {
            return Ok(walked);
        };
        let (Some(l), Some(r)) = (constant_value(binary.left()), constant_value(binary.right()))
        else {
            return Ok(walked);
        };
        match evaluate_binary(l, r, binary.node_type()) {
            Ok(value) => {
                self.folded += 1;
                Ok(build::constant(value))
            }
            Err(_) => Ok(walked),
        }
    }

    fn visit_unary(&mut self, node: &Arc<UnaryNode>) -> Result<Node, RewriteError> {
        let walked = walk_unary(self, node)?;
        let Node::Unary(unary) = &walked else {
            return Ok(walked);
        };
        let Some(operand) = unary.operand().and_then(constant_value) else {
            return Ok(walked);
        };
        match evaluate_unary(operand, unary.node_type()) {
            Ok(value) => {
                self.folded += 1;
                Ok(build::constant(value))
            }
            Err(_) => Ok(walked),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn interpreter_matches_wrapping_arithmetic(shape in shape_strategy(), x in any::<i32>()) {
        let f = function_of(&shape);
        prop_assert_eq!(interpret(&f, x), Value::Int32(reference(&shape, x)));
    }

    #[test]
    fn no_op_rewrite_preserves_results(shape in shape_strategy(), x in -50i32..50) {
        let f = function_of(&shape);
        let rewritten = NoOp.visit(&Node::from(Arc::clone(&f))).unwrap();
        prop_assert!(rewritten.same(&Node::from(Arc::clone(&f))));
        let g = rewritten.as_lambda().unwrap();
        prop_assert_eq!(interpret(g, x), interpret(&f, x));
    }

    #[test]
    fn constant_folding_preserves_results(shape in shape_strategy(), x in any::<i32>()) {
        let f = function_of(&shape);
        let mut folder = ConstantFolder { folded: 0 };
        let rewritten = folder.visit(&Node::from(Arc::clone(&f))).unwrap();
        let g = rewritten.as_lambda().unwrap();
        if folder.folded == 0 {
            prop_assert!(Arc::ptr_eq(g, &f));
        }
        prop_assert_eq!(interpret(g, x), interpret(&f, x));
    }

    #[test]
    fn compiled_callable_matches_interpreter(shape in shape_strategy(), x in any::<i32>()) {
        let f = function_of(&shape);
        let typed = f.compile().unwrap().typed1::<i32, i32>().unwrap();
        prop_assert_eq!(Value::Int32(typed(x).unwrap()), interpret(&f, x));
    }
}

#[test]
fn folding_a_closed_tree_leaves_one_constant() {
    let tree = build::multiply(
        build::add(build::constant(2), build::constant(3)).unwrap(),
        build::negate(build::constant(4)).unwrap(),
    )
    .unwrap();
    let mut folder = ConstantFolder { folded: 0 };
    let folded = folder.visit(&tree).unwrap();
    assert_eq!(folder.folded, 3);
    assert_eq!(constant_value(&folded), Some(Value::Int32(-20)));
}
