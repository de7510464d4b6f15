#![allow(
    clippy::result_large_err,
    reason = "ControlAction carries exceptions and jumps by value on every evaluation path"
)]
//! Arbor Eval - tree-walking interpreter for Arbor expression trees.
//!
//! # Architecture
//!
//! The evaluator uses:
//! - `Environment`: parameter and block-variable frames keyed by
//!   parameter identity, with a parent-pointer scope chain
//! - `evaluate_binary`: native binary operator rules, dispatched on the
//!   left operand's runtime kind
//! - `evaluate_unary`: native unary operator rules
//! - `convert` / `is_instance_of`: numeric and reference conversions
//! - `Interpreter`: recursive evaluation where exceptions and jumps travel
//!   on the error channel as `ControlAction`
//! - `Compile`: materializes a lambda as a `Callable` (arity 0-4); every
//!   call runs on a fresh interpreter
//!
//! Tree construction and the runtime `Value` model live in `arbor_ir`.

mod compile;
mod conversions;
mod environment;
pub mod interpreter;
mod operators;
mod unary_operators;

use std::sync::Once;

pub use compile::{Callable, Compile, FromValue, IntoValue, MAX_ARITY};
pub use conversions::{convert, is_instance_of};
pub use environment::{Environment, LocalScope, Scope};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use operators::{evaluate_binary, values_equal};
pub use unary_operators::evaluate_unary;

static TRACING_INIT: Once = Once::new();

/// Install a hierarchical tracing subscriber.
///
/// The filter is read from `ARBOR_LOG`, falling back to `RUST_LOG`. Does
/// nothing when neither is set. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_env("ARBOR_LOG").or_else(|_| EnvFilter::try_from_default_env());
        if let Ok(filter) = filter {
            // Another subscriber may already be installed by the embedder.
            let _ = tracing_subscriber::registry()
                .with(
                    tracing_tree::HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_bracketed_fields(true),
                )
                .with(filter)
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests;
