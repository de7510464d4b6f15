//! Error types for tree construction, rewriting and evaluation.
//!
//! Four categories, each with its own channel:
//!
//! - [`BuildError`]: a factory or `update` rejected its arguments. Raised at
//!   tree-build time, never deferred.
//! - [`RewriteError`]: a typed visit returned an incompatible node variant.
//! - [`EvalError`]: the interpreter has no rule for a node, operator or
//!   runtime value combination. Fatal; interpreted code cannot catch it.
//! - [`ControlAction::Throw`]: a target-language exception raised by a
//!   `Throw` node, a capability handle, or a built-in runtime check. The only
//!   category `Try` nodes observe.
//!
//! `ControlAction` also carries in-flight jumps (`Goto`), so a single `?`
//! propagates exceptions, jumps and fatal errors alike, and each construct
//! that can intercept one matches on it explicitly.

use std::fmt;

use crate::node::{LabelTarget, NodeType};
use crate::types::{BuiltinClass, Type};
use crate::value::Value;

/// Result of evaluating a node.
pub type EvalResult = Result<Value, ControlAction>;

// Construction errors

/// A node factory rejected its arguments.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: &'static str,
        expected: Type,
        found: Type,
    },
    #[error("{context}: expected {expected} argument(s), found {found}")]
    ArgumentCount {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("`{node_type:?}` is not a {family} node type")]
    WrongFamily {
        node_type: NodeType,
        family: &'static str,
    },
    #[error("`{node_type:?}` is not defined for operand type {operand}")]
    UndefinedOperator { node_type: NodeType, operand: Type },
    #[error("`{node_type:?}` does not accept an operator method")]
    MethodNotAllowed { node_type: NodeType },
    #[error("`{node_type:?}` does not accept a conversion lambda")]
    ConversionNotAllowed { node_type: NodeType },
    #[error("left-hand side `{found:?}` is not assignable")]
    NotAssignable { found: NodeType },
    #[error("member `{member}` is not writable")]
    ReadOnlyMember { member: String },
    #[error("member `{member}` requires an instance expression")]
    InstanceRequired { member: String },
    #[error("static member `{member}` cannot take an instance expression")]
    StaticWithInstance { member: String },
    #[error("parameter `{name}` appears more than once")]
    DuplicateParameter { name: String },
    #[error("{0}")]
    Invalid(&'static str),
}

// Rewrite errors

/// A rewriter produced a tree the node model cannot accept.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// A typed visit expected one node variant and got another.
    #[error("rewriting {context} must produce a {expected} node, got {found:?}")]
    InvalidRewrite {
        context: &'static str,
        expected: &'static str,
        found: NodeType,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
}

// Evaluation errors

/// Category of a fatal evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// No evaluation rule for this node kind.
    UnsupportedNode { node_type: NodeType },
    /// No native rule for this operator on these runtime kinds.
    UnsupportedOperand { node_type: NodeType, operand: String },
    /// Left side of an assignment is not a parameter, member or indexer.
    NotAssignable { node_type: NodeType },
    /// Compilation requested for more parameters than supported.
    ArityNotSupported { arity: usize, max: usize },
    /// A call received the wrong number of arguments.
    ArityMismatch {
        context: String,
        expected: usize,
        found: usize,
    },
    /// A value of the wrong runtime kind reached a rule.
    TypeMismatch { expected: String, found: String },
    /// A parameter node with no environment slot.
    UnboundParameter { name: String },
    /// A jump escaped every enclosing construct.
    UnresolvedGoto { label: String },
    /// `Throw` was given something that is not an exception object.
    NotAnException { found: String },
    /// The configured step budget ran out.
    BudgetExceeded { limit: u64 },
    /// An exception escaped the top-level call.
    Unhandled { exception: String },
    /// An extension node failed to reduce to built-in nodes.
    InvalidReduction { name: String, message: String },
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedNode { node_type } => {
                write!(f, "unsupported node kind `{node_type:?}`")
            }
            Self::UnsupportedOperand { node_type, operand } => {
                write!(f, "`{node_type:?}` is not supported for {operand}")
            }
            Self::NotAssignable { node_type } => {
                write!(f, "`{node_type:?}` is not an assignable location")
            }
            Self::ArityNotSupported { arity, max } => {
                write!(f, "lambdas with {arity} parameters are not supported (max {max})")
            }
            Self::ArityMismatch {
                context,
                expected,
                found,
            } => write!(f, "{context} expects {expected} argument(s), got {found}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, got {found}")
            }
            Self::UnboundParameter { name } => write!(f, "parameter `{name}` is not in scope"),
            Self::UnresolvedGoto { label } => write!(f, "jump to label `{label}` was not resolved"),
            Self::NotAnException { found } => write!(f, "cannot throw a non-exception value ({found})"),
            Self::BudgetExceeded { limit } => write!(f, "evaluation budget of {limit} steps exceeded"),
            Self::Unhandled { exception } => write!(f, "unhandled exception: {exception}"),
            Self::InvalidReduction { name, message } => {
                write!(f, "extension `{name}` did not reduce: {message}")
            }
        }
    }
}

/// A fatal evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
}

impl EvalError {
    fn from_kind(kind: EvalErrorKind) -> Self {
        let message = kind.to_string();
        Self { kind, message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

#[cold]
pub fn unsupported_node(node_type: NodeType) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedNode { node_type })
}

#[cold]
pub fn unsupported_operand(node_type: NodeType, operand: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnsupportedOperand {
        node_type,
        operand: operand.into(),
    })
}

#[cold]
pub fn not_assignable(node_type: NodeType) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAssignable { node_type })
}

#[cold]
pub fn arity_not_supported(arity: usize, max: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityNotSupported { arity, max })
}

#[cold]
pub fn arity_mismatch(context: impl Into<String>, expected: usize, found: usize) -> EvalError {
    EvalError::from_kind(EvalErrorKind::ArityMismatch {
        context: context.into(),
        expected,
        found,
    })
}

#[cold]
pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::TypeMismatch {
        expected: expected.into(),
        found: found.into(),
    })
}

#[cold]
pub fn unbound_parameter(name: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnboundParameter { name: name.into() })
}

#[cold]
pub fn unresolved_goto(label: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::UnresolvedGoto {
        label: label.into(),
    })
}

#[cold]
pub fn not_an_exception(found: impl Into<String>) -> EvalError {
    EvalError::from_kind(EvalErrorKind::NotAnException {
        found: found.into(),
    })
}

#[cold]
pub fn budget_exceeded(limit: u64) -> EvalError {
    EvalError::from_kind(EvalErrorKind::BudgetExceeded { limit })
}

#[cold]
pub fn unhandled(exception: &Value) -> EvalError {
    EvalError::from_kind(EvalErrorKind::Unhandled {
        exception: exception.to_string(),
    })
}

#[cold]
pub fn invalid_reduction(name: impl Into<String>, error: &BuildError) -> EvalError {
    EvalError::from_kind(EvalErrorKind::InvalidReduction {
        name: name.into(),
        message: error.to_string(),
    })
}

// Control transfer

/// Everything that leaves a node other than a normal value.
#[derive(Clone, Debug)]
pub enum ControlAction {
    /// Fatal error; unwinds to the caller of `interpret`.
    Error(EvalError),
    /// A target-language exception in flight.
    Throw(Value),
    /// A jump to `target` carrying `value`.
    Goto { target: LabelTarget, value: Value },
}

impl ControlAction {
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, ControlAction::Error(_))
    }

    /// The exception object, if this is a throw.
    pub fn exception(&self) -> Option<&Value> {
        match self {
            ControlAction::Throw(value) => Some(value),
            _ => None,
        }
    }

    /// Collapse into a fatal error, as the top-level caller sees it.
    pub fn into_eval_error(self) -> EvalError {
        match self {
            ControlAction::Error(e) => e,
            ControlAction::Throw(exception) => unhandled(&exception),
            ControlAction::Goto { target, .. } => unresolved_goto(target.to_string()),
        }
    }
}

impl From<EvalError> for ControlAction {
    fn from(error: EvalError) -> Self {
        ControlAction::Error(error)
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Error(e) => write!(f, "{e}"),
            ControlAction::Throw(exception) => write!(f, "thrown: {exception}"),
            ControlAction::Goto { target, value } => write!(f, "goto {target} ({value})"),
        }
    }
}

// Built-in exceptions

/// Raise a built-in exception with `message`.
#[cold]
pub fn throw(class: BuiltinClass, message: impl Into<String>) -> ControlAction {
    ControlAction::Throw(Value::builtin_exception(class, message.into()))
}

/// Null receiver, null delegate, null member target.
#[cold]
pub fn invalid_operation(message: impl Into<String>) -> ControlAction {
    throw(BuiltinClass::InvalidOperation, message)
}

#[cold]
pub fn index_out_of_range(index: i64, len: usize) -> ControlAction {
    throw(
        BuiltinClass::IndexOutOfRange,
        format!("index {index} is outside the bounds of a length-{len} array"),
    )
}

#[cold]
pub fn divide_by_zero() -> ControlAction {
    throw(BuiltinClass::DivideByZero, "attempted to divide by zero")
}

#[cold]
pub fn overflow(operation: &str) -> ControlAction {
    throw(
        BuiltinClass::Overflow,
        format!("arithmetic operation resulted in an overflow ({operation})"),
    )
}

#[cold]
pub fn invalid_cast(from: &Type, to: &Type) -> ControlAction {
    throw(
        BuiltinClass::InvalidCast,
        format!("unable to cast a value of type {from} to {to}"),
    )
}
