//! Native binary operator rules.
//!
//! Dispatch is on the left operand's runtime kind. A numeric right operand
//! of another kind is first converted to the left operand's kind; shift
//! counts are always read as `i32`. String `+` (either side a string) is
//! concatenation and is recognized before numeric dispatch.
//!
//! Short-circuit operators, `Coalesce`, `ArrayIndex` and the assignment
//! family never reach this module: the interpreter handles them before
//! both operands are evaluated.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use arbor_ir::{divide_by_zero, overflow, unsupported_operand, EvalResult, NodeType, NumericKind, Value};

use crate::conversions::{coerce, numeric_equal};

/// Integer rules for one kind. Unchecked operators wrap.
macro_rules! int_binary {
    ($op:expr, $a:expr, $b:expr, $variant:ident, $name:literal) => {{
        let (a, b) = ($a, $b);
        let checked = |result: Option<_>, what: &str| {
            result
                .map(Value::$variant)
                .ok_or_else(|| overflow(&format!("{} {what}", $name)))
        };
        match $op {
            NodeType::Add => Ok(Value::$variant(a.wrapping_add(b))),
            NodeType::Subtract => Ok(Value::$variant(a.wrapping_sub(b))),
            NodeType::Multiply => Ok(Value::$variant(a.wrapping_mul(b))),
            NodeType::AddChecked => checked(a.checked_add(b), "addition"),
            NodeType::SubtractChecked => checked(a.checked_sub(b), "subtraction"),
            NodeType::MultiplyChecked => checked(a.checked_mul(b), "multiplication"),
            NodeType::Divide if b == 0 => Err(divide_by_zero()),
            NodeType::Divide => checked(a.checked_div(b), "division"),
            NodeType::Modulo if b == 0 => Err(divide_by_zero()),
            NodeType::Modulo => checked(a.checked_rem(b), "remainder"),
            NodeType::Power => match u32::try_from(b) {
                Ok(exponent) => Ok(Value::$variant(a.wrapping_pow(exponent))),
                Err(_) => Err(overflow(concat!($name, " power with an out-of-range exponent"))),
            },
            NodeType::And => Ok(Value::$variant(a & b)),
            NodeType::Or => Ok(Value::$variant(a | b)),
            NodeType::ExclusiveOr => Ok(Value::$variant(a ^ b)),
            _ => compare($op, a.cmp(&b), $name),
        }
    }};
}

macro_rules! float_binary {
    ($op:expr, $a:expr, $b:expr, $variant:ident, $name:literal) => {{
        let (a, b) = ($a, $b);
        match $op {
            NodeType::Add | NodeType::AddChecked => Ok(Value::$variant(a + b)),
            NodeType::Subtract | NodeType::SubtractChecked => Ok(Value::$variant(a - b)),
            NodeType::Multiply | NodeType::MultiplyChecked => Ok(Value::$variant(a * b)),
            NodeType::Divide => Ok(Value::$variant(a / b)),
            NodeType::Modulo => Ok(Value::$variant(a % b)),
            NodeType::Power => Ok(Value::$variant(a.powf(b))),
            _ => match a.partial_cmp(&b) {
                Some(ordering) => compare($op, ordering, $name),
                // NaN is unordered: every ordered comparison is false.
                None if $op.is_comparison() => Ok(Value::Bool(false)),
                None => Err(unsupported_operand($op, $name).into()),
            },
        }
    }};
}

/// Evaluate a native binary operator on two evaluated operands.
pub fn evaluate_binary(left: Value, right: Value, op: NodeType) -> EvalResult {
    if op == NodeType::Add && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_))) {
        return Ok(concat(&left, &right));
    }
    if matches!(op, NodeType::LeftShift | NodeType::RightShift) {
        return eval_shift(op, left, right);
    }
    if matches!(op, NodeType::Equal | NodeType::NotEqual) {
        let equal = values_equal(&left, &right);
        return Ok(Value::Bool(equal == (op == NodeType::Equal)));
    }

    let right = match left.numeric_kind() {
        Some(kind) => coerce(right, kind)?,
        None => right,
    };

    match (left, right) {
        (Value::Int8(a), Value::Int8(b)) => int_binary!(op, a, b, Int8, "i8"),
        (Value::UInt8(a), Value::UInt8(b)) => int_binary!(op, a, b, UInt8, "u8"),
        (Value::Int16(a), Value::Int16(b)) => int_binary!(op, a, b, Int16, "i16"),
        (Value::UInt16(a), Value::UInt16(b)) => int_binary!(op, a, b, UInt16, "u16"),
        (Value::Int32(a), Value::Int32(b)) => int_binary!(op, a, b, Int32, "i32"),
        (Value::UInt32(a), Value::UInt32(b)) => int_binary!(op, a, b, UInt32, "u32"),
        (Value::Int64(a), Value::Int64(b)) => int_binary!(op, a, b, Int64, "i64"),
        (Value::UInt64(a), Value::UInt64(b)) => int_binary!(op, a, b, UInt64, "u64"),
        (Value::Float32(a), Value::Float32(b)) => float_binary!(op, a, b, Float32, "f32"),
        (Value::Float64(a), Value::Float64(b)) => float_binary!(op, a, b, Float64, "f64"),
        (Value::Decimal(a), Value::Decimal(b)) => eval_decimal_binary(op, a, b),
        (Value::Bool(a), Value::Bool(b)) => eval_bool_binary(op, a, b),
        (Value::Char(a), Value::Char(b)) => compare(op, a.cmp(&b), "char"),
        (Value::Str(a), Value::Str(b)) => compare(op, a.cmp(&b), "str"),
        (left, right) => Err(unsupported_operand(
            op,
            format!("{} and {}", left.type_name(), right.type_name()),
        )
        .into()),
    }
}

/// Default equality as used by `Equal`, `NotEqual` and `Switch`.
///
/// Numeric operands of different kinds compare by value, without
/// conversion loss, so the relation is symmetric. Heap values compare by
/// reference.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.numeric_kind(), right.numeric_kind()) {
        (Some(kind), Some(other)) if kind != other => numeric_equal(left, right).unwrap_or(false),
        _ => left == right,
    }
}

fn concat(left: &Value, right: &Value) -> Value {
    fn text(value: &Value) -> String {
        match value {
            Value::Null | Value::Void => String::new(),
            other => other.to_string(),
        }
    }
    let mut out = text(left);
    out.push_str(&text(right));
    Value::string(out)
}

#[inline]
fn compare(op: NodeType, ordering: Ordering, operand: &str) -> EvalResult {
    let result = match op {
        NodeType::LessThan => ordering.is_lt(),
        NodeType::LessThanOrEqual => ordering.is_le(),
        NodeType::GreaterThan => ordering.is_gt(),
        NodeType::GreaterThanOrEqual => ordering.is_ge(),
        _ => return Err(unsupported_operand(op, operand).into()),
    };
    Ok(Value::Bool(result))
}

fn eval_decimal_binary(op: NodeType, a: Decimal, b: Decimal) -> EvalResult {
    let checked = |result: Option<Decimal>, what: &str| {
        result
            .map(Value::Decimal)
            .ok_or_else(|| overflow(&format!("decimal {what}")))
    };
    match op {
        NodeType::Add | NodeType::AddChecked => checked(a.checked_add(b), "addition"),
        NodeType::Subtract | NodeType::SubtractChecked => checked(a.checked_sub(b), "subtraction"),
        NodeType::Multiply | NodeType::MultiplyChecked => {
            checked(a.checked_mul(b), "multiplication")
        }
        NodeType::Divide if b.is_zero() => Err(divide_by_zero()),
        NodeType::Divide => checked(a.checked_div(b), "division"),
        NodeType::Modulo if b.is_zero() => Err(divide_by_zero()),
        NodeType::Modulo => checked(a.checked_rem(b), "remainder"),
        NodeType::Power => decimal_power(a, b),
        _ => compare(op, a.cmp(&b), "decimal"),
    }
}

/// Decimal power for integral exponents.
fn decimal_power(base: Decimal, exponent: Decimal) -> EvalResult {
    if !exponent.fract().is_zero() {
        return Err(unsupported_operand(NodeType::Power, "decimal with a fractional exponent").into());
    }
    let magnitude = exponent.abs().to_u64().ok_or_else(|| overflow("decimal power"))?;
    let power = checked_powu(base, magnitude).ok_or_else(|| overflow("decimal power"))?;
    if !exponent.is_sign_negative() {
        return Ok(Value::Decimal(power));
    }
    if power.is_zero() {
        return Err(divide_by_zero());
    }
    Decimal::ONE
        .checked_div(power)
        .map(Value::Decimal)
        .ok_or_else(|| overflow("decimal power"))
}

/// Exponentiation by squaring.
fn checked_powu(mut base: Decimal, mut exponent: u64) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        exponent >>= 1;
        if exponent > 0 {
            base = base.checked_mul(base)?;
        }
    }
    Some(result)
}

fn eval_bool_binary(op: NodeType, a: bool, b: bool) -> EvalResult {
    match op {
        NodeType::And | NodeType::AndAlso => Ok(Value::Bool(a & b)),
        NodeType::Or | NodeType::OrElse => Ok(Value::Bool(a | b)),
        NodeType::ExclusiveOr => Ok(Value::Bool(a ^ b)),
        _ => Err(unsupported_operand(op, "bool").into()),
    }
}

/// Shifts take an `i32` count, masked to the operand width.
fn eval_shift(op: NodeType, left: Value, right: Value) -> EvalResult {
    let Value::Int32(count) = coerce(right, NumericKind::Int32)? else {
        return Err(unsupported_operand(op, "a non-integer shift count").into());
    };
    #[expect(clippy::cast_sign_loss, reason = "the count is masked by wrapping_shl/shr")]
    let count = count as u32;
    let left_shift = op == NodeType::LeftShift;
    macro_rules! shift {
        ($variant:ident, $a:expr) => {
            Ok(Value::$variant(if left_shift {
                $a.wrapping_shl(count)
            } else {
                $a.wrapping_shr(count)
            }))
        };
    }
    match left {
        Value::Int8(a) => shift!(Int8, a),
        Value::UInt8(a) => shift!(UInt8, a),
        Value::Int16(a) => shift!(Int16, a),
        Value::UInt16(a) => shift!(UInt16, a),
        Value::Int32(a) => shift!(Int32, a),
        Value::UInt32(a) => shift!(UInt32, a),
        Value::Int64(a) => shift!(Int64, a),
        Value::UInt64(a) => shift!(UInt64, a),
        other => Err(unsupported_operand(op, other.type_name()).into()),
    }
}
