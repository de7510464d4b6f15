use super::*;
use pretty_assertions::assert_eq;

use crate::errors::ControlAction;
use crate::types::FunctionType;

#[test]
fn test_zero_values() {
    assert_eq!(Value::zero(&Type::Int32), Value::Int32(0));
    assert_eq!(Value::zero(&Type::Bool), Value::Bool(false));
    assert_eq!(Value::zero(&Type::Char), Value::Char('\0'));
    assert_eq!(Value::zero(&Type::Decimal), Value::Decimal(Decimal::ZERO));
    assert_eq!(Value::zero(&Type::Str), Value::Null);
    assert_eq!(Value::zero(&Type::array_of(Type::Int32)), Value::Null);
    assert_eq!(Value::zero(&Type::Void), Value::Void);
}

#[test]
fn test_equality_is_kind_sensitive() {
    assert_eq!(Value::Int32(1), Value::Int32(1));
    assert_ne!(Value::Int32(1), Value::Int64(1));
    assert_eq!(Value::from("abc"), Value::string("abc"));
}

#[test]
fn test_heap_values_compare_by_reference() {
    let a = Value::array(Type::Int32, vec![Value::Int32(1)]);
    let b = Value::array(Type::Int32, vec![Value::Int32(1)]);
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert!(a.same_reference(&a.clone()));
}

#[test]
fn test_array_is_shared_and_mutable() {
    let array = Value::array(Type::Int32, vec![Value::Int32(1), Value::Int32(2)]);
    let Value::Array(handle) = array.clone() else {
        panic!("expected array");
    };
    assert!(handle.set(1, Value::Int32(20)));
    assert!(!handle.set(2, Value::Int32(0)));
    let Value::Array(original) = array else {
        panic!("expected array");
    };
    assert_eq!(original.get(1), Some(Value::Int32(20)));
    assert_eq!(original.get(5), None);
    assert_eq!(original.len(), 2);
}

#[test]
fn test_list_push() {
    let list = Value::list(Type::Str, vec![]);
    let Value::List(handle) = &list else {
        panic!("expected list");
    };
    assert!(handle.is_empty());
    handle.push(Value::from("a"));
    handle.push(Value::from("b"));
    assert_eq!(handle.to_vec(), vec![Value::from("a"), Value::from("b")]);
    assert_eq!(list.runtime_type(), Type::list_of(Type::Str));
}

#[test]
fn test_object_fields() {
    let point = ClassType::new("Point", None);
    let value = Value::object(&point, [("X", Value::Int32(1)), ("Y", Value::Int32(2))]);
    let object = value.as_object().cloned();
    let Some(object) = object else {
        panic!("expected object");
    };
    assert_eq!(object.get_field("X"), Some(Value::Int32(1)));
    object.set_field("X", Value::Int32(10));
    assert_eq!(object.get_field("X"), Some(Value::Int32(10)));
    assert!(object.has_field("Y"));
    assert!(!object.has_field("Z"));
    assert_eq!(value.runtime_type(), Type::Class(point));
}

#[test]
fn test_exception_values() {
    let exception = Value::builtin_exception(BuiltinClass::Overflow, "too big");
    assert!(exception.is_exception());
    assert_eq!(exception.exception_message().as_deref(), Some("too big"));
    assert_eq!(exception.to_string(), "OverflowException: too big");

    let plain = Value::object(&ClassType::new("Plain", None), Vec::<(&str, Value)>::new());
    assert!(!plain.is_exception());
    assert_eq!(plain.exception_message(), None);
}

#[test]
fn test_runtime_type_of_null_is_object() {
    assert_eq!(Value::Null.runtime_type(), Type::Object);
    assert!(Value::Null.is_null());
}

#[test]
fn test_display() {
    let array = Value::array(Type::Int32, vec![Value::Int32(1), Value::Int32(2)]);
    assert_eq!(array.to_string(), "[1, 2]");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(format!("{:?}", Value::from("x")), "Str(\"x\")");
    assert_eq!(format!("{:?}", Value::Int64(3)), "i64(3)");
}

#[test]
fn test_delegate_invoke_checks_arity() {
    let add = Delegate::new(
        FunctionType::new(vec![Type::Int32, Type::Int32], Type::Int32),
        |args| match args {
            [Value::Int32(a), Value::Int32(b)] => Ok(Value::Int32(a + b)),
            _ => Ok(Value::Null),
        },
    );
    assert_eq!(
        add.invoke(&[Value::Int32(2), Value::Int32(3)]).ok(),
        Some(Value::Int32(5))
    );
    let Err(ControlAction::Error(error)) = add.invoke(&[Value::Int32(2)]) else {
        panic!("expected an arity error");
    };
    assert_eq!(error.message, "delegate expects 2 argument(s), got 1");
}

#[test]
fn test_delegate_identity() {
    let sig = FunctionType::new(vec![], Type::Void);
    let first = Delegate::new(sig.clone(), |_| Ok(Value::Void));
    let second = Delegate::new(sig, |_| Ok(Value::Void));
    assert!(first.ptr_eq(&first.clone()));
    assert!(!first.ptr_eq(&second));
    assert_ne!(Value::Delegate(first), Value::Delegate(second));
}
