#![allow(
    clippy::result_large_err,
    reason = "ControlAction carries exceptions and jumps by value on every evaluation path"
)]
//! Arbor IR - expression trees and their runtime values.
//!
//! This crate contains:
//! - The node model: an immutable, `Arc`-shared tree of typed nodes with
//!   validating constructors and identity-preserving `update`s
//! - Factory functions for building trees (`build`)
//! - The `Rewriter` visitor with lazy structural sharing (`visitor`)
//! - Runtime `Type` and `Value` models
//! - Capability traits through which the interpreter reaches host methods,
//!   constructors, members and indexers, plus closure-backed adapters
//! - Construction, rewrite and evaluation error types
//!
//! # Design
//!
//! - **Closed sum type**: `Node` is an enum; consumers match exhaustively.
//! - **Identity matters**: parameters and labels are keyed by identity, not
//!   by name. `update` and the rewriter preserve identity when nothing
//!   changed.
//! - **Fail at build time**: every factory validates its arguments and
//!   computes the node's static type once.

pub mod build;
pub mod capability;
mod errors;
pub mod node;
mod types;
mod value;
pub mod visitor;

pub use errors::{
    arity_mismatch, arity_not_supported, budget_exceeded, divide_by_zero, index_out_of_range,
    invalid_cast, invalid_operation, invalid_reduction, not_an_exception, not_assignable, overflow, throw,
    type_mismatch, unbound_parameter, unhandled, unresolved_goto, unsupported_node,
    unsupported_operand, BuildError, ControlAction, EvalError, EvalErrorKind, EvalResult,
    RewriteError,
};
pub use node::{
    GotoKind, LabelTarget, LambdaNode, Node, NodeType, ParameterId, ParameterNode,
};
pub use types::{BuiltinClass, ClassType, FunctionType, NumericKind, Type};
pub use value::{ArrayValue, Delegate, DelegateFn, ListValue, ObjectValue, Value, MESSAGE_FIELD};
pub use visitor::Rewriter;
