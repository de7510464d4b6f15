//! Crate-level tests. The native operator and conversion rules have one
//! file per module.


use arbor_ir::{ControlAction, EvalResult};

/// Class name of the exception a rule raised.
fn thrown_class(result: EvalResult) -> String {
    match result {
        Err(ControlAction::Throw(exception)) => exception
            .as_object()
            .map(|object| object.class().name().to_string())
            .unwrap_or_default(),
        other => panic!("expected a thrown exception, got {other:?}"),
    }
}

#[test]
fn test_init_tracing_is_idempotent() {
    crate::init_tracing();
    crate::init_tracing();
}
