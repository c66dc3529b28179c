//! Conditional synchronization primitives.
//!
//! The tree protocol is written against this module instead of
//! `std::sync::atomic` so that the same code runs under loom's model
//! checker. With `RUSTFLAGS="--cfg loom"` and the `loom` feature, the
//! atomics below are loom's interleaving-tracked types; otherwise they are
//! zero-cost re-exports from std.

#[cfg(all(feature = "loom", loom))]
pub(crate) mod atomic {
    pub use loom::sync::atomic::{AtomicBool, AtomicU64, Ordering};
}

#[cfg(not(all(feature = "loom", loom)))]
pub(crate) mod atomic {
    pub use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
}

/// Yield the current thread to the scheduler.
///
/// Under loom this is a modeled yield so the checker can explore the
/// schedules the real yield would allow.
#[cfg(all(feature = "loom", loom))]
pub(crate) fn yield_now() {
    loom::thread::yield_now();
}

#[cfg(not(all(feature = "loom", loom)))]
pub(crate) fn yield_now() {
    std::thread::yield_now();
}
