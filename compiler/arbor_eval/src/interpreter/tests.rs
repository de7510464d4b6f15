#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use super::*;
use pretty_assertions::assert_eq;

use arbor_ir::build::{
    add, add_assign, add_assign_checked, and_also, array_access, array_length, assign, bind,
    block, block_typed, block_with_variables, break_to, call, call_static, catch, catch_var,
    catch_when, coalesce, condition, constant, constant_typed, continue_to, convert,
    convert_checked, default, divide, element_init, empty, equal, goto, goto_with,
    greater_than, greater_than_or_equal, if_then, invoke, label, label_target, lambda,
    less_than, list_init, loop_with, member, member_init, modulo, multiply, multiply_assign,
    new_array_bounds, new_array_init, new_expression, null, or_else, parameter,
    post_increment_assign, pre_decrement_assign, pre_increment_assign, quote, rethrow,
    subtract_assign, switch, switch_case, switch_with_comparer, throw, throw_typed, try_catch,
    try_fault, try_finally, type_equal, type_is, variable,
};
use arbor_ir::capability::{
    list_add, list_constructor, object_constructor, FieldMember, NativeMethod,
};
use arbor_ir::node::{Extension, ParameterNode, TryNode};
use arbor_ir::{BuildError, BuiltinClass, ClassType, EvalErrorKind, Type, MESSAGE_FIELD};

fn var(name: &str, ty: Type) -> (Arc<ParameterNode>, Node) {
    let p = variable(name, ty).unwrap();
    let node = Node::from(Arc::clone(&p));
    (p, node)
}

fn no_params() -> Vec<Arc<ParameterNode>> {
    Vec::new()
}

fn eval_body(body: Node) -> Result<Value, EvalError> {
    let f = lambda(body, no_params()).unwrap();
    Interpreter::new(&f).interpret(&[])
}

fn exception(class: BuiltinClass, message: &str) -> Node {
    constant(Value::builtin_exception(class, message))
}

fn exception_type() -> Type {
    BuiltinClass::Exception.to_type()
}

fn message() -> arbor_ir::capability::MemberRef {
    FieldMember::read_only(MESSAGE_FIELD, Type::Str)
}

// Leaves and conditionals

#[test]
fn test_constant_and_default() {
    assert_eq!(eval_body(constant(5)).unwrap(), Value::Int32(5));
    assert_eq!(eval_body(default(Type::Float64)).unwrap(), Value::Float64(0.0));
    assert_eq!(eval_body(default(Type::Str)).unwrap(), Value::Null);
}

#[test]
fn test_conditional_picks_branch() {
    let test = greater_than(constant(3), constant(2)).unwrap();
    let node = condition(test, constant("yes"), constant("no")).unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("yes"));
}

// Blocks

#[test]
fn test_block_variables_and_last_value() {
    let (x, xn) = var("x", Type::Int32);
    let node = block_with_variables(
        vec![x],
        vec![
            assign(xn.clone(), constant(4)).unwrap(),
            multiply(xn.clone(), xn).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(16));
}

#[test]
fn test_block_variables_start_at_zero() {
    let (n, nn) = var("n", Type::Int32);
    let (s, sn) = var("s", Type::Str);
    let node = block_with_variables(
        vec![n, s],
        vec![condition(equal(sn, null(Type::Str).unwrap()).unwrap(), nn, constant(-1)).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(0));
}

#[test]
fn test_void_block_discards_value() {
    let node = block_typed(Type::Void, no_params(), vec![constant(1)]).unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Void);
}

// Loops, labels and jumps

#[test]
fn test_loop_break_carries_value() {
    let (i, iv) = var("i", Type::Int32);
    let done = label_target("done", Type::Int32);
    let body = block(vec![
        if_then(
            greater_than_or_equal(iv.clone(), constant(5)).unwrap(),
            break_to(done.clone(), Some(iv.clone())).unwrap(),
        )
        .unwrap(),
        pre_increment_assign(iv).unwrap(),
    ])
    .unwrap();
    let node = block_with_variables(vec![i], vec![loop_with(body, Some(done), None).unwrap()])
        .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(5));
}

#[test]
fn test_continue_skips_rest_of_body() {
    let (i, iv) = var("i", Type::Int32);
    let (sum, sv) = var("sum", Type::Int32);
    let done = label_target("done", Type::Void);
    let next = label_target("next", Type::Void);
    let body = block(vec![
        pre_increment_assign(iv.clone()).unwrap(),
        if_then(
            greater_than(iv.clone(), constant(9)).unwrap(),
            break_to(done.clone(), None).unwrap(),
        )
        .unwrap(),
        if_then(
            equal(modulo(iv.clone(), constant(2)).unwrap(), constant(0)).unwrap(),
            continue_to(next.clone()).unwrap(),
        )
        .unwrap(),
        add_assign(sv.clone(), iv).unwrap(),
    ])
    .unwrap();
    let node = block_with_variables(
        vec![i, sum],
        vec![loop_with(body, Some(done), Some(next)).unwrap(), sv],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(25));
}

#[test]
fn test_goto_skips_forward() {
    let (x, xn) = var("x", Type::Int32);
    let skip = label_target("skip", Type::Void);
    let node = block_with_variables(
        vec![x],
        vec![
            assign(xn.clone(), constant(1)).unwrap(),
            goto(skip.clone()).unwrap(),
            assign(xn.clone(), constant(2)).unwrap(),
            label(skip, None).unwrap(),
            xn,
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(1));
}

#[test]
fn test_goto_backward_repeats() {
    let (n, nn) = var("n", Type::Int32);
    let top = label_target("top", Type::Void);
    let node = block_with_variables(
        vec![n],
        vec![
            label(top.clone(), None).unwrap(),
            pre_increment_assign(nn.clone()).unwrap(),
            if_then(less_than(nn.clone(), constant(3)).unwrap(), goto(top).unwrap()).unwrap(),
            nn,
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(3));
}

#[test]
fn test_goto_value_lands_on_label() {
    let out = label_target("out", Type::Int32);
    let node = block(vec![
        goto_with(out.clone(), constant(9)).unwrap(),
        constant(1),
        label(out, Some(constant(0))).unwrap(),
    ])
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(9));
}

#[test]
fn test_label_default_on_fallthrough() {
    let out = label_target("out", Type::Int32);
    let node = block(vec![label(out, Some(constant(3))).unwrap()]).unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(3));
}

#[test]
fn test_jump_from_label_default() {
    let out = label_target("out", Type::Int32);
    let default_value =
        block(vec![goto_with(out.clone(), constant(7)).unwrap(), constant(1)]).unwrap();
    let node = label(out, Some(default_value)).unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(7));
}

#[test]
fn test_goto_out_of_nested_loops() {
    let (i, iv) = var("i", Type::Int32);
    let (j, jv) = var("j", Type::Int32);
    let exit = label_target("exit", Type::Int32);
    let inner_done = label_target("inner_done", Type::Void);

    let found = and_also(
        equal(iv.clone(), constant(2)).unwrap(),
        equal(jv.clone(), constant(3)).unwrap(),
    )
    .unwrap();
    let inner = block(vec![
        pre_increment_assign(jv.clone()).unwrap(),
        if_then(
            found,
            goto_with(exit.clone(), multiply(iv.clone(), jv.clone()).unwrap()).unwrap(),
        )
        .unwrap(),
        if_then(
            equal(jv.clone(), constant(3)).unwrap(),
            break_to(inner_done.clone(), None).unwrap(),
        )
        .unwrap(),
    ])
    .unwrap();
    let outer = block(vec![
        pre_increment_assign(iv).unwrap(),
        assign(jv, constant(0)).unwrap(),
        loop_with(inner, Some(inner_done), None).unwrap(),
    ])
    .unwrap();
    let node = block_with_variables(
        vec![i, j],
        vec![
            loop_with(outer, None, None).unwrap(),
            label(exit, Some(constant(-1))).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(6));
}

#[test]
fn test_unresolved_goto_is_fatal() {
    let nowhere = label_target("nowhere", Type::Void);
    let err = eval_body(block(vec![goto(nowhere).unwrap()]).unwrap()).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::UnresolvedGoto {
            label: "nowhere".to_string()
        }
    );
}

// Switch

#[test]
fn test_switch_first_match_wins() {
    let build = |value: i32| {
        switch(
            constant(value),
            vec![
                switch_case(vec![constant(1)], constant("one")).unwrap(),
                switch_case(vec![constant(2), constant(3)], constant("two or three")).unwrap(),
                switch_case(vec![constant(2)], constant("late two")).unwrap(),
            ],
            Some(constant("other")),
        )
        .unwrap()
    };
    assert_eq!(eval_body(build(2)).unwrap(), Value::string("two or three"));
    assert_eq!(eval_body(build(9)).unwrap(), Value::string("other"));
}

#[test]
fn test_mixed_kind_equality_does_not_wrap() {
    let eq = |l: Value, r: Value| eval_body(equal(constant(l), constant(r)).unwrap()).unwrap();
    assert_eq!(eq(Value::Int8(1), Value::Int32(257)), Value::Bool(false));
    assert_eq!(eq(Value::Int32(257), Value::Int8(1)), Value::Bool(false));
    assert_eq!(eq(Value::Int32(1), Value::Float64(1.5)), Value::Bool(false));

    let boxed = constant_typed(Value::Int8(1), Type::Object).unwrap();
    let node = switch(
        boxed,
        vec![
            switch_case(vec![constant(257)], constant("wrapped")).unwrap(),
            switch_case(vec![constant(1)], constant("one")).unwrap(),
        ],
        None,
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("one"));
}

#[test]
fn test_switch_without_default_yields_zero() {
    let node = switch(
        constant(9),
        vec![switch_case(vec![constant(1)], constant(10)).unwrap()],
        None,
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(0));
}

#[test]
fn test_switch_stops_evaluating_tests_after_match() {
    let poisoned = throw_typed(exception(BuiltinClass::Exception, "evaluated"), Type::Int32).unwrap();
    let node = switch(
        constant(1),
        vec![
            switch_case(vec![constant(1)], constant("first")).unwrap(),
            switch_case(vec![poisoned], constant("second")).unwrap(),
        ],
        None,
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("first"));
}

#[test]
fn test_switch_with_comparer() {
    let comparer = NativeMethod::new_static(
        "same_ignoring_case",
        vec![Type::Str, Type::Str],
        Type::Bool,
        |args| match args {
            [Value::Str(a), Value::Str(b)] => Ok(Value::Bool(a.eq_ignore_ascii_case(b))),
            _ => Ok(Value::Bool(false)),
        },
    );
    let node = switch_with_comparer(
        constant("HELLO"),
        vec![switch_case(vec![constant("hello")], constant(1)).unwrap()],
        Some(constant(0)),
        comparer,
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(1));
}

// Exceptions

#[test]
fn test_catch_binds_exception() {
    let e = parameter("e", BuiltinClass::InvalidOperation.to_type()).unwrap();
    let handler = catch_var(
        Arc::clone(&e),
        member(Node::from(e), message()).unwrap(),
    )
    .unwrap();
    let body = throw_typed(exception(BuiltinClass::InvalidOperation, "bad state"), Type::Str).unwrap();
    let node = try_catch(body, vec![handler]).unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("bad state"));
}

#[test]
fn test_handlers_match_by_subclass_in_order() {
    let arithmetic = Type::Class(BuiltinClass::arithmetic().clone());
    let node = try_catch(
        divide(constant(1), constant(0)).unwrap(),
        vec![
            catch(BuiltinClass::InvalidCast.to_type(), constant(-1)).unwrap(),
            catch(arithmetic, constant(2)).unwrap(),
            catch(exception_type(), constant(3)).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(2));
}

#[test]
fn test_false_filter_falls_through() {
    let node = try_catch(
        throw_typed(exception(BuiltinClass::Exception, "x"), Type::Int32).unwrap(),
        vec![
            catch_when(exception_type(), None, constant(false), constant(1)).unwrap(),
            catch(exception_type(), constant(2)).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(2));
}

#[test]
fn test_throwing_filter_rejects_handler() {
    let filter = throw_typed(exception(BuiltinClass::Exception, "in filter"), Type::Bool).unwrap();
    let node = try_catch(
        throw_typed(exception(BuiltinClass::Exception, "x"), Type::Int32).unwrap(),
        vec![
            catch_when(exception_type(), None, filter, constant(1)).unwrap(),
            catch(exception_type(), constant(2)).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(2));
}

#[test]
fn test_filter_sees_exception_variable() {
    let e = parameter("e", exception_type()).unwrap();
    let en = Node::from(Arc::clone(&e));
    let filter = equal(member(en, message()).unwrap(), constant("wanted")).unwrap();
    let build = |text: &str| {
        try_catch(
            throw_typed(exception(BuiltinClass::Exception, text), Type::Int32).unwrap(),
            vec![
                catch_when(exception_type(), Some(Arc::clone(&e)), filter.clone(), constant(1))
                    .unwrap(),
                catch(exception_type(), constant(2)).unwrap(),
            ],
        )
        .unwrap()
    };
    assert_eq!(eval_body(build("wanted")).unwrap(), Value::Int32(1));
    assert_eq!(eval_body(build("other")).unwrap(), Value::Int32(2));
}

#[test]
fn test_finally_runs_on_success_and_throw() {
    let (log, lv) = var("log", Type::Int32);
    let thrown = try_finally(
        throw_typed(exception(BuiltinClass::Exception, "x"), Type::Int32).unwrap(),
        add_assign(lv.clone(), constant(10)).unwrap(),
    )
    .unwrap();
    let node = block_with_variables(
        vec![log],
        vec![
            try_finally(constant(1), add_assign(lv.clone(), constant(1)).unwrap()).unwrap(),
            try_catch(thrown, vec![catch(exception_type(), constant(0)).unwrap()]).unwrap(),
            lv,
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(11));
}

#[test]
fn test_finally_error_replaces_outcome() {
    let e = parameter("e", exception_type()).unwrap();
    let inner = try_finally(
        throw_typed(exception(BuiltinClass::Exception, "first"), Type::Str).unwrap(),
        throw(exception(BuiltinClass::Exception, "second")).unwrap(),
    )
    .unwrap();
    let node = try_catch(
        inner,
        vec![catch_var(Arc::clone(&e), member(Node::from(e), message()).unwrap()).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("second"));
}

#[test]
fn test_fault_runs_only_when_unhandled() {
    let (log, lv) = var("log", Type::Int32);
    let handled = TryNode::make(
        throw_typed(exception(BuiltinClass::Exception, "x"), Type::Int32).unwrap(),
        vec![catch(exception_type(), constant(0)).unwrap()],
        None,
        Some(assign(lv.clone(), constant(9)).unwrap()),
    )
    .map(Node::Try)
    .unwrap();
    let unhandled = try_fault(
        throw_typed(exception(BuiltinClass::Exception, "y"), Type::Int32).unwrap(),
        add_assign(lv.clone(), constant(5)).unwrap(),
    )
    .unwrap();
    let node = block_with_variables(
        vec![log],
        vec![
            try_fault(constant(1), assign(lv.clone(), constant(7)).unwrap()).unwrap(),
            handled,
            try_catch(unhandled, vec![catch(exception_type(), lv.clone()).unwrap()]).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(5));
}

#[test]
fn test_rethrow_preserves_identity() {
    let original = Value::builtin_exception(BuiltinClass::Overflow, "again");
    let inner = try_catch(
        throw_typed(constant(original.clone()), Type::Object).unwrap(),
        vec![catch(exception_type(), rethrow().unwrap()).unwrap()],
    )
    .unwrap();
    let e = parameter("e", exception_type()).unwrap();
    let node = try_catch(inner, vec![catch_var(Arc::clone(&e), Node::from(e)).unwrap()]).unwrap();
    let caught = eval_body(node).unwrap();
    assert!(caught.same_reference(&original));
}

#[test]
fn test_rethrow_outside_handler() {
    let err = eval_body(rethrow().unwrap()).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::Unhandled {
            exception: "InvalidOperationException: rethrow outside of a catch handler".to_string()
        }
    );
}

#[test]
fn test_throw_null_raises_null_reference() {
    let e = parameter("e", BuiltinClass::NullReference.to_type()).unwrap();
    let node = try_catch(
        throw_typed(null(exception_type()).unwrap(), Type::Str).unwrap(),
        vec![catch_var(Arc::clone(&e), member(Node::from(e), message()).unwrap()).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::string("the thrown value is null"));
}

#[test]
fn test_jump_out_of_try_runs_finally() {
    let (log, lv) = var("log", Type::Int32);
    let out = label_target("out", Type::Void);
    let node = block_with_variables(
        vec![log],
        vec![
            try_finally(goto(out.clone()).unwrap(), assign(lv.clone(), constant(10)).unwrap())
                .unwrap(),
            assign(lv.clone(), constant(-1)).unwrap(),
            label(out, None).unwrap(),
            lv,
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(10));
}

// Assignment

#[test]
fn test_compound_assignment_returns_stored_value() {
    let (x, xn) = var("x", Type::Int32);
    let node = block_with_variables(
        vec![x],
        vec![
            assign(xn.clone(), constant(10)).unwrap(),
            subtract_assign(xn.clone(), constant(3)).unwrap(),
            multiply_assign(xn, constant(2)).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(14));
}

#[test]
fn test_checked_compound_assignment_overflows() {
    let (x, xn) = var("x", Type::Int32);
    let wrapping = block_with_variables(
        vec![Arc::clone(&x)],
        vec![
            assign(xn.clone(), constant(i32::MAX)).unwrap(),
            add_assign(xn.clone(), constant(1)).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(wrapping).unwrap(), Value::Int32(i32::MIN));

    let checked = block_with_variables(
        vec![x],
        vec![
            assign(xn.clone(), constant(i32::MAX)).unwrap(),
            try_catch(
                add_assign_checked(xn.clone(), constant(1)).unwrap(),
                vec![catch(BuiltinClass::Overflow.to_type(), constant(-1)).unwrap()],
            )
            .unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(checked).unwrap(), Value::Int32(-1));
}

#[test]
fn test_increment_forms() {
    let (x, xn) = var("x", Type::Int32);
    let starting_at_five = |tail: Vec<Node>| {
        let mut steps = vec![assign(xn.clone(), constant(5)).unwrap()];
        steps.extend(tail);
        eval_body(block_with_variables(vec![Arc::clone(&x)], steps).unwrap()).unwrap()
    };
    assert_eq!(
        starting_at_five(vec![post_increment_assign(xn.clone()).unwrap()]),
        Value::Int32(5)
    );
    assert_eq!(
        starting_at_five(vec![post_increment_assign(xn.clone()).unwrap(), xn.clone()]),
        Value::Int32(6)
    );
    assert_eq!(
        starting_at_five(vec![pre_decrement_assign(xn.clone()).unwrap()]),
        Value::Int32(4)
    );
}

#[test]
fn test_assigning_to_a_constant_fails_at_build() {
    assert!(assign(constant(1), constant(2)).is_err());
}

// Arrays

#[test]
fn test_array_element_read_write() {
    let (arr, av) = var("arr", Type::array_of(Type::Int32));
    let node = block_with_variables(
        vec![arr],
        vec![
            assign(
                av.clone(),
                new_array_init(Type::Int32, vec![constant(1), constant(2), constant(3)]).unwrap(),
            )
            .unwrap(),
            assign(array_access(av.clone(), constant(1)).unwrap(), constant(20)).unwrap(),
            add_assign(array_access(av.clone(), constant(2)).unwrap(), constant(5)).unwrap(),
            add(
                array_access(av.clone(), constant(1)).unwrap(),
                array_access(av.clone(), constant(2)).unwrap(),
            )
            .unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(28));
}

#[test]
fn test_array_index_out_of_range_is_catchable() {
    let array = new_array_init(Type::Int32, vec![constant(1)]).unwrap();
    let node = try_catch(
        array_access(array, constant(3)).unwrap(),
        vec![catch(BuiltinClass::IndexOutOfRange.to_type(), constant(-1)).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(-1));
}

#[test]
fn test_new_array_bounds_is_zero_filled() {
    let array = new_array_bounds(Type::Int32, vec![constant(4)]).unwrap();
    assert_eq!(
        eval_body(array_length(array.clone()).unwrap()).unwrap(),
        Value::Int32(4)
    );
    assert_eq!(
        eval_body(array_access(array, constant(3)).unwrap()).unwrap(),
        Value::Int32(0)
    );
}

#[test]
fn test_negative_array_size_overflows() {
    let node = try_catch(
        array_length(new_array_bounds(Type::Int32, vec![constant(-1)]).unwrap()).unwrap(),
        vec![catch(BuiltinClass::Overflow.to_type(), constant(-1)).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(-1));
}

// Objects and collections

#[test]
fn test_member_init_and_field_read() {
    let point = ClassType::new("Point", None);
    let x = FieldMember::new("x", Type::Int32);
    let y = FieldMember::new("y", Type::Int32);
    let init = member_init(
        new_expression(object_constructor(&point, &[]), Vec::new()).unwrap(),
        vec![
            bind(Arc::clone(&x), constant(3)).unwrap(),
            bind(Arc::clone(&y), constant(4)).unwrap(),
        ],
    )
    .unwrap();
    let (p, pv) = var("p", Type::Class(point));
    let node = block_with_variables(
        vec![p],
        vec![
            assign(pv.clone(), init).unwrap(),
            add(member(pv.clone(), x).unwrap(), member(pv, y).unwrap()).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(7));
}

#[test]
fn test_list_init_adds_in_order() {
    let node = list_init(
        new_expression(list_constructor(Type::Int32), Vec::new()).unwrap(),
        vec![
            element_init(list_add(Type::Int32), vec![constant(1)]).unwrap(),
            element_init(list_add(Type::Int32), vec![constant(2)]).unwrap(),
        ],
    )
    .unwrap();
    let Value::List(list) = eval_body(node).unwrap() else {
        panic!("expected a list");
    };
    assert_eq!(list.to_vec(), vec![Value::Int32(1), Value::Int32(2)]);
}

#[test]
fn test_null_receiver_raises_invalid_operation() {
    let point = ClassType::new("Point", None);
    let x = FieldMember::new("x", Type::Int32);
    let node = try_catch(
        member(null(Type::Class(point)).unwrap(), x).unwrap(),
        vec![catch(BuiltinClass::InvalidOperation.to_type(), constant(-1)).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(-1));
}

#[test]
fn test_static_and_instance_calls() {
    let twice = NativeMethod::new_static("twice", vec![Type::Int32], Type::Int32, |args| {
        match args {
            [Value::Int32(n)] => Ok(Value::Int32(n * 2)),
            _ => Ok(Value::Null),
        }
    });
    let len = NativeMethod::new_instance("len", Vec::new(), Type::Int32, |receiver, _| {
        let n = receiver.as_str().map_or(0, str::len);
        Ok(Value::Int32(i32::try_from(n).unwrap_or(i32::MAX)))
    });
    let node = add(
        call_static(twice, vec![constant(20)]).unwrap(),
        call(constant("ab"), len, Vec::new()).unwrap(),
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(42));
}

// Lambdas

#[test]
fn test_nested_lambda_reads_enclosing_parameter() {
    let n = parameter("n", Type::Int32).unwrap();
    let y = parameter("y", Type::Int32).unwrap();
    let inner = lambda(
        add(Node::from(Arc::clone(&n)), Node::from(Arc::clone(&y))).unwrap(),
        vec![y],
    )
    .unwrap();
    let outer = lambda(invoke(Node::from(inner), vec![constant(5)]).unwrap(), vec![n]).unwrap();
    let result = Interpreter::new(&outer).interpret(&[Value::Int32(10)]).unwrap();
    assert_eq!(result, Value::Int32(15));
}

#[test]
fn test_closure_captures_a_snapshot() {
    let (x, xn) = var("x", Type::Int32);
    let inner = lambda(xn.clone(), no_params()).unwrap();
    let (f, fv) = var("f", inner.value_type().clone());
    let node = block_with_variables(
        vec![x, f],
        vec![
            assign(xn.clone(), constant(1)).unwrap(),
            assign(fv.clone(), Node::from(inner)).unwrap(),
            assign(xn, constant(2)).unwrap(),
            invoke(fv, Vec::new()).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(1));
}

#[test]
fn test_invoke_null_delegate() {
    let inner = lambda(constant(1), no_params()).unwrap();
    let node = try_catch(
        invoke(null(inner.value_type().clone()).unwrap(), Vec::new()).unwrap(),
        vec![catch(BuiltinClass::InvalidOperation.to_type(), constant(-1)).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(node).unwrap(), Value::Int32(-1));
}

#[test]
fn test_quote_yields_the_tree() {
    let inner = Node::from(lambda(constant(1), no_params()).unwrap());
    let Value::Expr(quoted) = eval_body(quote(inner.clone()).unwrap()).unwrap() else {
        panic!("expected a quoted tree");
    };
    assert!(quoted.same(&inner));
}

// Operators routed through the interpreter

#[test]
fn test_coalesce() {
    let fallback = coalesce(null(Type::Str).unwrap(), constant("fallback")).unwrap();
    assert_eq!(eval_body(fallback).unwrap(), Value::string("fallback"));
    let present = coalesce(constant("x"), constant("fallback")).unwrap();
    assert_eq!(eval_body(present).unwrap(), Value::string("x"));
}

#[test]
fn test_short_circuit_skips_right_side() {
    let poisoned = || throw_typed(exception(BuiltinClass::Exception, "evaluated"), Type::Bool).unwrap();
    let and = and_also(constant(false), poisoned()).unwrap();
    assert_eq!(eval_body(and).unwrap(), Value::Bool(false));
    let or = or_else(constant(true), poisoned()).unwrap();
    assert_eq!(eval_body(or).unwrap(), Value::Bool(true));
}

#[test]
fn test_type_tests() {
    let overflow = || {
        constant_typed(
            Value::builtin_exception(BuiltinClass::Overflow, "x"),
            Type::Object,
        )
        .unwrap()
    };
    let arithmetic = Type::Class(BuiltinClass::arithmetic().clone());
    assert_eq!(
        eval_body(type_is(overflow(), arithmetic.clone()).unwrap()).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        eval_body(type_equal(overflow(), arithmetic).unwrap()).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        eval_body(type_equal(overflow(), BuiltinClass::Overflow.to_type()).unwrap()).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        eval_body(type_is(null(Type::Str).unwrap(), Type::Str).unwrap()).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn test_conversions() {
    assert_eq!(
        eval_body(convert(constant(300), Type::UInt8).unwrap()).unwrap(),
        Value::UInt8(44)
    );
    let checked = try_catch(
        convert_checked(constant(300), Type::UInt8).unwrap(),
        vec![catch(BuiltinClass::Overflow.to_type(), constant(Value::UInt8(0))).unwrap()],
    )
    .unwrap();
    assert_eq!(eval_body(checked).unwrap(), Value::UInt8(0));
}

// Extensions

#[derive(Debug)]
struct Doubled(Node);

impl Extension for Doubled {
    fn name(&self) -> &str {
        "doubled"
    }

    fn value_type(&self) -> Type {
        self.0.value_type()
    }

    fn reduce(&self) -> Result<Node, BuildError> {
        add(self.0.clone(), self.0.clone())
    }
}

#[derive(Debug)]
struct Irreducible;

impl Extension for Irreducible {
    fn name(&self) -> &str {
        "irreducible"
    }

    fn value_type(&self) -> Type {
        Type::Int32
    }

    fn reduce(&self) -> Result<Node, BuildError> {
        Err(BuildError::Invalid("nothing to reduce to"))
    }
}

#[test]
fn test_extension_is_reduced_then_evaluated() {
    let node = Node::Extension(Arc::new(Doubled(constant(21))));
    assert_eq!(eval_body(node).unwrap(), Value::Int32(42));
}

#[test]
fn test_failed_reduction_is_fatal() {
    let err = eval_body(Node::Extension(Arc::new(Irreducible))).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::InvalidReduction { ref name, .. } if name == "irreducible"
    ));
}

// Limits

#[test]
fn test_budget_stops_infinite_loop() {
    let f = lambda(loop_with(empty(), None, None).unwrap(), no_params()).unwrap();
    let err = InterpreterBuilder::new()
        .max_steps(1_000)
        .build(&f)
        .interpret(&[])
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::BudgetExceeded { limit: 1_000 });
}

#[test]
fn test_budget_resets_between_calls() {
    let f = lambda(add(constant(1), constant(2)).unwrap(), no_params()).unwrap();
    let mut interpreter = InterpreterBuilder::new().max_steps(3).build(&f);
    assert_eq!(interpreter.interpret(&[]).unwrap(), Value::Int32(3));
    assert_eq!(interpreter.interpret(&[]).unwrap(), Value::Int32(3));
}

#[test]
fn test_deep_tree_is_evaluated() {
    let mut node = constant(0);
    for _ in 0..3_000 {
        node = add(node, constant(1)).unwrap();
    }
    assert_eq!(eval_body(node).unwrap(), Value::Int32(3_000));
}
