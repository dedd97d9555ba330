//! Stack growth for the recursive walks.
//!
//! Parsing, resolution, and evaluation all recurse once per nesting level of
//! the source, so deeply nested but legal programs would otherwise exhaust the
//! native stack.  Wrapping each recursive entry point in [`guarded`] moves the
//! walk onto a fresh heap segment when the current one runs low.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated segment.
const SEGMENT: usize = 1024 * 1024;

/// Run `f`, first growing the stack if fewer than [`RED_ZONE`] bytes are left.
#[inline]
pub fn guarded<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}
