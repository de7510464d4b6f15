//! Numeric and reference conversions.
//!
//! `Convert` truncates (and wraps) out-of-range integers; `ConvertChecked`
//! raises `OverflowException` instead. Conversions out of `decimal` are
//! always checked. Reference conversions either return the value unchanged
//! or raise `InvalidCastException`.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "unchecked numeric conversions truncate and wrap by definition"
)]

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use arbor_ir::{invalid_cast, overflow, throw, BuiltinClass, ControlAction, EvalResult, NumericKind, Type, Value};

/// A numeric value widened for conversion.
#[derive(Copy, Clone, Debug)]
enum Wide {
    Int(i128),
    Float(f64),
    Decimal(Decimal),
}

fn widen(value: &Value) -> Option<Wide> {
    Some(match *value {
        Value::Char(c) => Wide::Int(i128::from(u32::from(c))),
        Value::Int8(n) => Wide::Int(n.into()),
        Value::UInt8(n) => Wide::Int(n.into()),
        Value::Int16(n) => Wide::Int(n.into()),
        Value::UInt16(n) => Wide::Int(n.into()),
        Value::Int32(n) => Wide::Int(n.into()),
        Value::UInt32(n) => Wide::Int(n.into()),
        Value::Int64(n) => Wide::Int(n.into()),
        Value::UInt64(n) => Wide::Int(n.into()),
        Value::Float32(f) => Wide::Float(f.into()),
        Value::Float64(f) => Wide::Float(f),
        Value::Decimal(d) => Wide::Decimal(d),
        _ => return None,
    })
}

/// The integer part of `wide`, plus whether the range check is mandatory.
fn integral(wide: Wide, checked: bool, target: &str) -> Result<(i128, bool), ControlAction> {
    match wide {
        Wide::Int(n) => Ok((n, checked)),
        Wide::Float(f) if checked && !f.is_finite() => Err(overflow(target)),
        Wide::Float(f) => Ok((f.trunc() as i128, checked)),
        Wide::Decimal(d) => d
            .trunc()
            .to_i128()
            .map(|n| (n, true))
            .ok_or_else(|| overflow(target)),
    }
}

macro_rules! to_integer {
    ($wide:expr, $checked:expr, $ty:ty, $variant:ident) => {{
        let name = concat!("conversion to ", stringify!($ty));
        let (n, checked) = integral($wide, $checked, name)?;
        if checked {
            <$ty>::try_from(n)
                .map(Value::$variant)
                .map_err(|_| overflow(name))
        } else {
            Ok(Value::$variant(n as $ty))
        }
    }};
}

fn to_numeric(wide: Wide, kind: NumericKind, checked: bool) -> EvalResult {
    match kind {
        NumericKind::Int8 => to_integer!(wide, checked, i8, Int8),
        NumericKind::UInt8 => to_integer!(wide, checked, u8, UInt8),
        NumericKind::Int16 => to_integer!(wide, checked, i16, Int16),
        NumericKind::UInt16 => to_integer!(wide, checked, u16, UInt16),
        NumericKind::Int32 => to_integer!(wide, checked, i32, Int32),
        NumericKind::UInt32 => to_integer!(wide, checked, u32, UInt32),
        NumericKind::Int64 => to_integer!(wide, checked, i64, Int64),
        NumericKind::UInt64 => to_integer!(wide, checked, u64, UInt64),
        NumericKind::Float32 => Ok(Value::Float32(to_float(wide) as f32)),
        NumericKind::Float64 => Ok(Value::Float64(to_float(wide))),
        NumericKind::Decimal => {
            let converted = match wide {
                Wide::Int(n) => Decimal::from_i128(n),
                Wide::Float(f) => Decimal::from_f64(f),
                Wide::Decimal(d) => Some(d),
            };
            converted
                .map(Value::Decimal)
                .ok_or_else(|| overflow("conversion to decimal"))
        }
    }
}

fn to_float(wide: Wide) -> f64 {
    match wide {
        Wide::Int(n) => n as f64,
        Wide::Float(f) => f,
        Wide::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
    }
}

fn to_char(wide: Wide, checked: bool) -> EvalResult {
    let name = "conversion to char";
    let (n, checked) = integral(wide, checked, name)?;
    let code = if checked {
        u16::try_from(n).map_err(|_| overflow(name))?
    } else {
        n as u16
    };
    char::from_u32(u32::from(code))
        .map(Value::Char)
        .ok_or_else(|| overflow(name))
}

/// Convert `value` to `target`, as `Convert` / `ConvertChecked` do.
pub fn convert(value: Value, target: &Type, checked: bool) -> EvalResult {
    if target.is_void() {
        return Ok(Value::Void);
    }
    if let Some(wide) = widen(&value) {
        if let Some(kind) = target.numeric_kind() {
            return to_numeric(wide, kind, checked);
        }
        if matches!(target, Type::Char) {
            return to_char(wide, checked);
        }
    }
    if value.is_null() {
        if target.is_reference() {
            return Ok(Value::Null);
        }
        return Err(throw(
            BuiltinClass::NullReference,
            format!("cannot convert null to {target}"),
        ));
    }
    if is_instance_of(&value, target) {
        return Ok(value);
    }
    Err(invalid_cast(&value.runtime_type(), target))
}

/// Unchecked numeric conversion to `kind`; non-numeric values pass
/// through unchanged. Decimal targets still raise on overflow.
pub(crate) fn coerce(value: Value, kind: NumericKind) -> EvalResult {
    if value.numeric_kind() == Some(kind) {
        return Ok(value);
    }
    match value.numeric_kind().and_then(|_| widen(&value)) {
        Some(wide) => to_numeric(wide, kind, false),
        None => Ok(value),
    }
}

/// Whether two numeric values of any kinds denote the same number.
///
/// Both sides are widened; nothing is truncated. `None` when either side
/// is not numeric.
pub(crate) fn numeric_equal(left: &Value, right: &Value) -> Option<bool> {
    left.numeric_kind()?;
    right.numeric_kind()?;
    Some(match (widen(left)?, widen(right)?) {
        (Wide::Int(a), Wide::Int(b)) => a == b,
        (Wide::Decimal(a), Wide::Decimal(b)) => a == b,
        (Wide::Float(a), Wide::Float(b)) => a == b,
        (Wide::Int(n), Wide::Decimal(d)) | (Wide::Decimal(d), Wide::Int(n)) => {
            Decimal::try_from_i128_with_scale(n, 0).is_ok_and(|n| n == d)
        }
        (Wide::Int(n), Wide::Float(f)) | (Wide::Float(f), Wide::Int(n)) => int_equals_float(n, f),
        (Wide::Decimal(d), Wide::Float(f)) | (Wide::Float(f), Wide::Decimal(d)) => {
            Decimal::from_f64(f).is_some_and(|f| f == d) && d.to_f64() == Some(f)
        }
    })
}

fn int_equals_float(n: i128, f: f64) -> bool {
    // 2^127: every integral float below it converts to i128 exactly.
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    f.is_finite() && f.fract() == 0.0 && f.abs() < LIMIT && f as i128 == n
}

/// The value of an integer-kinded index or size.
pub(crate) fn integer_value(value: &Value) -> Option<i64> {
    if !value.numeric_kind().is_some_and(NumericKind::is_integer) {
        return None;
    }
    match widen(value)? {
        Wide::Int(n) => Some(n.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64),
        Wide::Float(_) | Wide::Decimal(_) => None,
    }
}

/// Whether `value` is a non-null instance of `ty`.
///
/// Runtime types are exact, so this is assignability of the value's
/// runtime type: identity, class inheritance, or `Object`.
pub fn is_instance_of(value: &Value, ty: &Type) -> bool {
    match value {
        Value::Null | Value::Void => false,
        _ => ty.is_assignable_from(&value.runtime_type()),
    }
}

/// `TypeAs`: the value itself when it is an instance of `ty`, else null.
pub(crate) fn type_as(value: Value, ty: &Type) -> Value {
    if is_instance_of(&value, ty) {
        value
    } else {
        Value::Null
    }
}

/// `Unbox`: the value when its runtime type is exactly `ty`.
pub(crate) fn unbox(value: Value, ty: &Type) -> EvalResult {
    if value.is_null() {
        return Err(throw(
            BuiltinClass::NullReference,
            format!("cannot unbox null as {ty}"),
        ));
    }
    let found = value.runtime_type();
    if &found == ty {
        Ok(value)
    } else {
        Err(invalid_cast(&found, ty))
    }
}

/// `TypeEqual`: exact runtime type, never a subclass.
pub(crate) fn has_exact_type(value: &Value, ty: &Type) -> bool {
    !matches!(value, Value::Null | Value::Void) && &value.runtime_type() == ty
}
