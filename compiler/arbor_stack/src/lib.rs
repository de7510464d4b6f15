//! Stack growth for recursive tree walks.
//!
//! Evaluation and rewriting recurse once per tree level. A tree built
//! programmatically can be far deeper than anything a parser would emit
//! (a left-leaning chain of ten thousand `Add` nodes is one loop away), so
//! every recursive entry point wraps itself in [`ensure_sufficient_stack`].
//!
//! - **Native targets**: `stacker` allocates a fresh segment when the
//!   remaining stack drops below [`RED_ZONE`].
//! - **WASM targets**: plain passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
///
/// One `eval` frame for a binary node plus its tracing span sits well under
/// this, so a single level of recursion can never skip past the zone.
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Bytes of stack left on the current segment, if the platform reports it.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn remaining_stack() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests;
