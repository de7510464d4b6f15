use super::*;
use pretty_assertions::assert_eq;

use crate::types::{BuiltinClass, ClassType};

fn thrown_class(action: ControlAction) -> Type {
    match action {
        ControlAction::Throw(exception) => exception.runtime_type(),
        other => panic!("expected a throw, got {other}"),
    }
}

#[test]
fn test_static_method_ignores_receiver() {
    let twice = NativeMethod::new_static("Twice", vec![Type::Int32], Type::Int32, |args| {
        match args {
            [Value::Int32(n)] => Ok(Value::Int32(n * 2)),
            _ => Ok(Value::Null),
        }
    });
    assert!(twice.is_static());
    assert_eq!(twice.name(), "Twice");
    assert_eq!(twice.invoke(None, &[Value::Int32(4)]).ok(), Some(Value::Int32(8)));
}

#[test]
fn test_instance_method_without_receiver() {
    let len = NativeMethod::new_instance("Length", vec![], Type::Int32, |receiver, _| {
        Ok(Value::Int32(receiver.as_str().map_or(0, |s| s.len() as i32)))
    });
    assert!(!len.is_static());
    assert_eq!(
        len.invoke(Some(&Value::from("abc")), &[]).ok(),
        Some(Value::Int32(3))
    );
    let Err(action) = len.invoke(None, &[]) else {
        panic!("expected failure");
    };
    assert_eq!(thrown_class(action), BuiltinClass::InvalidOperation.to_type());
}

#[test]
fn test_object_constructor_assigns_fields_in_order() {
    let point = ClassType::new("Point", None);
    let ctor = object_constructor(&point, &[("X", Type::Int32), ("Y", Type::Int32)]);
    assert_eq!(ctor.parameter_types(), &[Type::Int32, Type::Int32]);
    assert_eq!(ctor.declaring_type(), &Type::Class(point));
    let Ok(value) = ctor.construct(&[Value::Int32(3), Value::Int32(4)]) else {
        panic!("construction failed");
    };
    let x = FieldMember::new("X", Type::Int32);
    let y = FieldMember::read_only("Y", Type::Int32);
    assert_eq!(x.get(Some(&value)).ok(), Some(Value::Int32(3)));
    assert_eq!(y.get(Some(&value)).ok(), Some(Value::Int32(4)));
    assert!(x.can_write());
    assert!(!y.can_write());
}

#[test]
fn test_field_on_null_throws() {
    let x = FieldMember::new("X", Type::Int32);
    let Err(action) = x.get(Some(&Value::Null)) else {
        panic!("expected failure");
    };
    assert_eq!(thrown_class(action), BuiltinClass::InvalidOperation.to_type());
}

#[test]
fn test_missing_field_reads_zero() {
    let empty = Value::object(&ClassType::new("Empty", None), Vec::<(&str, Value)>::new());
    let count = FieldMember::new("Count", Type::Int64);
    assert_eq!(count.get(Some(&empty)).ok(), Some(Value::Int64(0)));
    assert!(count.set(Some(&empty), Value::Int64(9)).is_ok());
    assert_eq!(count.get(Some(&empty)).ok(), Some(Value::Int64(9)));
}

#[test]
fn test_static_field_storage() {
    let counter = StaticField::new("Counter", Type::Int32, Value::Int32(1));
    assert!(counter.is_static());
    assert!(counter.set(None, Value::Int32(2)).is_ok());
    assert_eq!(counter.get(None).ok(), Some(Value::Int32(2)));
}

#[test]
fn test_read_only_property_rejects_set() {
    let answer = NativeProperty::read_only("Answer", Type::Int32, true, |_| Ok(Value::Int32(42)));
    assert_eq!(answer.kind(), MemberKind::Property);
    assert!(!answer.can_write());
    assert_eq!(answer.get(None).ok(), Some(Value::Int32(42)));
    assert!(answer.set(None, Value::Int32(0)).is_err());
}

#[test]
fn test_list_helpers() {
    let ctor = list_constructor(Type::Int32);
    let add = list_add(Type::Int32);
    let Ok(list) = ctor.construct(&[]) else {
        panic!("construction failed");
    };
    assert!(add.invoke(Some(&list), &[Value::Int32(1)]).is_ok());
    assert!(add.invoke(Some(&list), &[Value::Int32(2)]).is_ok());
    let Value::List(items) = &list else {
        panic!("expected list");
    };
    assert_eq!(items.to_vec(), vec![Value::Int32(1), Value::Int32(2)]);

    let Err(action) = add.invoke(Some(&Value::Null), &[Value::Int32(3)]) else {
        panic!("expected failure");
    };
    assert_eq!(thrown_class(action), BuiltinClass::InvalidOperation.to_type());
}

#[test]
fn test_indexer_read_write() {
    let indexer = NativeIndexer::read_write(
        "Item",
        Type::Int32,
        vec![Type::Int32],
        |target, args| match (target, args) {
            (Value::List(list), [Value::Int32(i)]) => {
                Ok(list.get(*i as usize).unwrap_or(Value::Null))
            }
            _ => Ok(Value::Null),
        },
        |target, args, value| {
            if let (Value::List(list), [Value::Int32(i)]) = (target, args) {
                list.set(*i as usize, value);
            }
            Ok(())
        },
    );
    let list = Value::list(Type::Int32, vec![Value::Int32(5)]);
    assert!(indexer.set(&list, &[Value::Int32(0)], Value::Int32(6)).is_ok());
    assert_eq!(
        indexer.get(&list, &[Value::Int32(0)]).ok(),
        Some(Value::Int32(6))
    );
}

#[test]
fn test_same_handle() {
    let a = FieldMember::new("A", Type::Int32);
    let b = FieldMember::new("A", Type::Int32);
    assert!(same_handle(&a, &a.clone()));
    assert!(!same_handle(&a, &b));
}
