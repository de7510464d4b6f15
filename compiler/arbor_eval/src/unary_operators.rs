//! Native unary operator rules.
//!
//! Conversions, type tests, `Quote`, `Throw` and the increment/decrement
//! assignments need the interpreter and are handled there.

use arbor_ir::{overflow, unsupported_operand, EvalResult, NodeType, Value};
use rust_decimal::Decimal;

macro_rules! int_unary {
    ($op:expr, $n:expr, $variant:ident, $name:literal) => {{
        let n = $n;
        match $op {
            NodeType::Negate => Ok(Value::$variant(n.wrapping_neg())),
            NodeType::NegateChecked => n
                .checked_neg()
                .map(Value::$variant)
                .ok_or_else(|| overflow(concat!($name, " negation"))),
            NodeType::UnaryPlus => Ok(Value::$variant(n)),
            NodeType::Not | NodeType::OnesComplement => Ok(Value::$variant(!n)),
            NodeType::Increment => Ok(Value::$variant(n.wrapping_add(1))),
            NodeType::Decrement => Ok(Value::$variant(n.wrapping_sub(1))),
            op => Err(unsupported_operand(op, $name).into()),
        }
    }};
}

macro_rules! float_unary {
    ($op:expr, $f:expr, $variant:ident, $name:literal) => {{
        let f = $f;
        match $op {
            NodeType::Negate | NodeType::NegateChecked => Ok(Value::$variant(-f)),
            NodeType::UnaryPlus => Ok(Value::$variant(f)),
            NodeType::Increment => Ok(Value::$variant(f + 1.0)),
            NodeType::Decrement => Ok(Value::$variant(f - 1.0)),
            op => Err(unsupported_operand(op, $name).into()),
        }
    }};
}

/// Evaluate a native unary operator on an evaluated operand.
pub fn evaluate_unary(value: Value, op: NodeType) -> EvalResult {
    match value {
        Value::Int8(n) => int_unary!(op, n, Int8, "i8"),
        Value::UInt8(n) => int_unary!(op, n, UInt8, "u8"),
        Value::Int16(n) => int_unary!(op, n, Int16, "i16"),
        Value::UInt16(n) => int_unary!(op, n, UInt16, "u16"),
        Value::Int32(n) => int_unary!(op, n, Int32, "i32"),
        Value::UInt32(n) => int_unary!(op, n, UInt32, "u32"),
        Value::Int64(n) => int_unary!(op, n, Int64, "i64"),
        Value::UInt64(n) => int_unary!(op, n, UInt64, "u64"),
        Value::Float32(f) => float_unary!(op, f, Float32, "f32"),
        Value::Float64(f) => float_unary!(op, f, Float64, "f64"),
        Value::Decimal(d) => eval_decimal_unary(d, op),
        Value::Bool(b) => match op {
            NodeType::Not => Ok(Value::Bool(!b)),
            NodeType::IsTrue => Ok(Value::Bool(b)),
            NodeType::IsFalse => Ok(Value::Bool(!b)),
            op => Err(unsupported_operand(op, "bool").into()),
        },
        Value::Array(array) if op == NodeType::ArrayLength => {
            let len = i32::try_from(array.len()).map_err(|_| overflow("array length"))?;
            Ok(Value::Int32(len))
        }
        other => Err(unsupported_operand(op, other.type_name()).into()),
    }
}

fn eval_decimal_unary(d: Decimal, op: NodeType) -> EvalResult {
    match op {
        NodeType::Negate | NodeType::NegateChecked => Ok(Value::Decimal(-d)),
        NodeType::UnaryPlus => Ok(Value::Decimal(d)),
        NodeType::Increment => d
            .checked_add(Decimal::ONE)
            .map(Value::Decimal)
            .ok_or_else(|| overflow("decimal increment")),
        NodeType::Decrement => d
            .checked_sub(Decimal::ONE)
            .map(Value::Decimal)
            .ok_or_else(|| overflow("decimal decrement")),
        op => Err(unsupported_operand(op, "decimal").into()),
    }
}
