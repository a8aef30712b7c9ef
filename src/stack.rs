//! Stack safety for the recursive passes.
//!
//! The parser, resolver, printer and interpreter all recurse on the shape of
//! the tree, so a deeply nested program (or deep Lox recursion) can exhaust
//! the host stack.  Wrapping the recursive entry points in
//! [`ensure_sufficient_stack`] moves onto a freshly allocated segment before
//! that happens.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if less than [`RED_ZONE`] remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
